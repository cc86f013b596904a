pub mod models;
pub mod memory;
pub mod postgres;
pub mod rest;
pub mod backend;

pub use models::{ResponseRecord, ResponseRow};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use rest::RestStore;
pub use backend::StoreBackend;

use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Store rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Failed to decode stored response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence collaborator for completed survey responses.
///
/// Both calls are all-or-nothing: a row is either written in full or the
/// call fails. Rows are never updated once written.
pub trait ResponseStore: Send + Sync {
    fn insert(&self, record: &ResponseRecord) -> impl Future<Output = Result<()>> + Send;

    /// Every stored response, newest first.
    fn query_all(&self) -> impl Future<Output = Result<Vec<ResponseRecord>>> + Send;
}
