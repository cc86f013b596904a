use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use log::{info, error};

use super::{ResponseRecord, ResponseRow, ResponseStore, Result, StoreError};
use crate::config::AppConfig;

/// Response table in PostgreSQL, reached through a deadpool connection pool.
#[derive(Debug)]
pub struct PostgresStore {
    pool: Pool,
    table: String,
}

impl PostgresStore {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let table = checked_table_name(&config.db_table)?;

        info!(
            "Connecting to database: {}@{}:{}/{}",
            config.db_user, config.db_host, config.db_port, config.db_name
        );

        let mut cfg = Config::new();
        cfg.host = Some(config.db_host.clone());
        cfg.port = Some(config.db_port);
        cfg.dbname = Some(config.db_name.clone());
        cfg.user = Some(config.db_user.clone());
        cfg.password = Some(config.db_password.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::ConnectionFailed(format!("Pool creation failed: {}", e)))?;

        // Test connection
        let _client = pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("Connection test failed: {}", e)))?;

        info!("Database connection established successfully");

        Ok(PostgresStore { pool, table })
    }

    /// Creates the response table if it does not exist yet.
    pub async fn ensure_table(&self) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let statement = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                email TEXT,
                name TEXT,
                gender TEXT,
                age BIGINT,
                height BIGINT,
                weight BIGINT,
                preference_1 TEXT,
                preference_2 TEXT,
                submitted_at TIMESTAMPTZ NOT NULL,
                raw_answers JSONB NOT NULL
            )
            "#,
            self.table
        );

        client.batch_execute(&statement).await.map_err(|e| {
            error!("Failed to create table {}: {}", self.table, e);
            StoreError::QueryFailed(format!("Failed to create table: {}", e))
        })?;

        Ok(())
    }
}

impl ResponseStore for PostgresStore {
    async fn insert(&self, record: &ResponseRecord) -> Result<()> {
        let row = ResponseRow::from_record(record)?;

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let statement = format!(
            r#"
            INSERT INTO {}
            (id, email, name, gender, age, height, weight,
             preference_1, preference_2, submitted_at, raw_answers)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
            self.table
        );

        client
            .execute(
                statement.as_str(),
                &[
                    &row.id,
                    &row.email,
                    &row.name,
                    &row.gender,
                    &row.age,
                    &row.height,
                    &row.weight,
                    &row.preference_1,
                    &row.preference_2,
                    &row.submitted_at,
                    &row.raw_answers,
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to insert response {}: {}", row.id, e);
                StoreError::QueryFailed(format!("Failed to insert response: {}", e))
            })?;

        info!("Inserted response {} into {}", row.id, self.table);
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<ResponseRecord>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let statement = format!(
            r#"
            SELECT id, email, name, gender, age, height, weight,
                   preference_1, preference_2, submitted_at, raw_answers
            FROM {}
            ORDER BY submitted_at DESC
            "#,
            self.table
        );

        let rows = client.query(statement.as_str(), &[]).await.map_err(|e| {
            error!("Failed to fetch responses: {}", e);
            StoreError::QueryFailed(format!("Failed to fetch responses: {}", e))
        })?;

        rows.iter()
            .map(|row| {
                ResponseRecord::try_from(ResponseRow {
                    id: row.get("id"),
                    email: row.get("email"),
                    name: row.get("name"),
                    gender: row.get("gender"),
                    age: row.get("age"),
                    height: row.get("height"),
                    weight: row.get("weight"),
                    preference_1: row.get("preference_1"),
                    preference_2: row.get("preference_2"),
                    submitted_at: row.get("submitted_at"),
                    raw_answers: row.get("raw_answers"),
                })
            })
            .collect()
    }
}

/// Table names are spliced into SQL text, so only plain identifiers pass.
fn checked_table_name(table: &str) -> Result<String> {
    let valid = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(table.to_string())
    } else {
        Err(StoreError::ConnectionFailed(format!("Invalid table name: {:?}", table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_check() {
        assert_eq!(checked_table_name("taste_responses").unwrap(), "taste_responses");
        assert!(checked_table_name("").is_err());
        assert!(checked_table_name("1responses").is_err());
        assert!(checked_table_name("responses; DROP TABLE users").is_err());
    }
}
