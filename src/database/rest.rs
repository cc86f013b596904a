use reqwest::{Client, Response};
use log::{info, error, debug};
use url::Url;

use super::{ResponseRecord, ResponseRow, ResponseStore, Result, StoreError};
use crate::config::AppConfig;

/// Hosted response table behind a PostgREST-style HTTP interface
/// (`POST`/`GET` on `<base>/rest/v1/<table>`).
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl RestStore {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let base = Url::parse(&config.rest_url)
            .map_err(|e| StoreError::ConnectionFailed(format!("Invalid REST url {:?}: {}", config.rest_url, e)))?;
        let endpoint = base
            .join(&format!("rest/v1/{}", config.rest_table))
            .map_err(|e| StoreError::ConnectionFailed(format!("Invalid REST table {:?}: {}", config.rest_table, e)))?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| StoreError::ConnectionFailed(format!("HTTP client setup failed: {}", e)))?;

        info!("Using REST response table at {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            api_key: config.rest_api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("REST store returned {}: {}", status, body);
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

impl ResponseStore for RestStore {
    async fn insert(&self, record: &ResponseRecord) -> Result<()> {
        let row = ResponseRow::from_record(record)?;

        debug!("POST {} for response {}", self.endpoint, row.id);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("REST insert request failed: {}", e)))?;

        Self::check_status(response).await?;

        info!("Inserted response {} via REST", row.id);
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<ResponseRecord>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("select", "*"), ("order", "submitted_at.desc")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("REST query request failed: {}", e)))?;

        let rows: Vec<ResponseRow> = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("Failed to parse REST rows: {}", e)))?;

        info!("Fetched {} responses via REST", rows.len());

        rows.into_iter().map(ResponseRecord::try_from).collect()
    }
}
