use serde::{Deserialize, Serialize};
use log::info;
use thiserror::Error;

/// Optional config file looked up in the working directory (`tastesurvey.toml`).
pub const CONFIG_FILE: &str = "tastesurvey";
/// Prefix for environment overrides, e.g. `TASTE_DB_HOST`.
pub const ENV_PREFIX: &str = "TASTE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)] // fields missing from every source keep `Default`
pub struct AppConfig {
    /// `memory`, `postgres` or `rest`.
    pub store_backend: String,

    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_table: String,

    pub rest_url: String,
    pub rest_api_key: String,
    pub rest_table: String,

    /// Shared secret for the admin viewer. Empty disables the viewer.
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_backend: "memory".to_string(),
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_name: "tastesurvey_db".to_string(),
            db_user: "tastesurvey_user".to_string(),
            db_password: String::new(),
            db_table: "taste_responses".to_string(),
            rest_url: String::new(),
            rest_api_key: String::new(),
            rest_table: "taste_responses".to_string(),
            admin_password: String::new(),
        }
    }
}

impl AppConfig {
    /// `tastesurvey.toml` if present, then `TASTE_*` variables; anything
    /// neither sets keeps its default.
    /// A `.env` file is loaded into the environment first when one exists.
    pub fn load() -> Result<Self, ConfigError> {
        // Don't fail if .env doesn't exist
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let loaded: AppConfig = settings.try_deserialize()?;

        info!(
            "Configuration loaded (store backend: {}, admin viewer: {})",
            loaded.store_backend,
            if loaded.admin_password.is_empty() { "disabled" } else { "enabled" }
        );

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_memory_store() {
        let config = AppConfig::default();
        assert_eq!(config.store_backend, "memory");
        assert_eq!(config.db_port, 5432);
        assert!(config.admin_password.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "store_backend = \"postgres\"\ndb_port = 6543\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let loaded: AppConfig = settings.try_deserialize().unwrap();
        assert_eq!(loaded.store_backend, "postgres");
        assert_eq!(loaded.db_port, 6543);
        assert_eq!(loaded.db_table, "taste_responses");
    }
}
