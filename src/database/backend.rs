use log::{info, warn};

use super::{InMemoryStore, PostgresStore, RestStore, ResponseRecord, ResponseStore, Result, StoreError};
use crate::config::AppConfig;

/// The store selected by `store_backend` in the configuration.
pub enum StoreBackend {
    Memory(InMemoryStore),
    Postgres(PostgresStore),
    Rest(RestStore),
}

impl StoreBackend {
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        match config.store_backend.as_str() {
            "memory" => {
                warn!("⚠️ Using in-memory response store - responses are lost on exit");
                Ok(StoreBackend::Memory(InMemoryStore::new()))
            }
            "postgres" => {
                let store = PostgresStore::new(config).await?;
                store.ensure_table().await?;
                Ok(StoreBackend::Postgres(store))
            }
            "rest" => Ok(StoreBackend::Rest(RestStore::new(config)?)),
            other => Err(StoreError::ConnectionFailed(format!(
                "Unknown store backend {:?} (expected memory, postgres or rest)",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory(_) => "memory",
            StoreBackend::Postgres(_) => "postgres",
            StoreBackend::Rest(_) => "rest",
        }
    }
}

impl ResponseStore for StoreBackend {
    async fn insert(&self, record: &ResponseRecord) -> Result<()> {
        info!("💾 Persisting response {} to {} store", record.id, self.name());
        match self {
            StoreBackend::Memory(store) => store.insert(record).await,
            StoreBackend::Postgres(store) => store.insert(record).await,
            StoreBackend::Rest(store) => store.insert(record).await,
        }
    }

    async fn query_all(&self) -> Result<Vec<ResponseRecord>> {
        match self {
            StoreBackend::Memory(store) => store.query_all().await,
            StoreBackend::Postgres(store) => store.query_all().await,
            StoreBackend::Rest(store) => store.query_all().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_backend_is_rejected() {
        let config = AppConfig {
            store_backend: "sqlite".to_string(),
            ..AppConfig::default()
        };

        let result = StoreBackend::from_config(&config).await;
        assert!(matches!(result, Err(StoreError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_memory_backend_round_trip() {
        let store = StoreBackend::from_config(&AppConfig::default()).await.unwrap();
        assert_eq!(store.name(), "memory");

        let record = ResponseRecord::new(Default::default());
        store.insert(&record).await.unwrap();

        let rows = store.query_all().await.unwrap();
        assert_eq!(rows, vec![record]);
    }
}
