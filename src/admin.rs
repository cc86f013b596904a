use std::collections::BTreeMap;
use log::{info, warn};
use thiserror::Error;

use crate::database::{ResponseRecord, ResponseStore, StoreError};

/// Keys the dashboard charts.
pub const PREFERENCE_KEYS: [&str; 2] = ["preference_1", "preference_2"];

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Admin viewer is disabled (no admin password configured)")]
    Disabled,
    #[error("Wrong admin password")]
    Denied,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Static shared-secret check in front of the admin viewer.
pub struct AdminGate {
    secret: String,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn check(&self, attempt: &str) -> Result<(), AdminError> {
        if self.secret.is_empty() {
            return Err(AdminError::Disabled);
        }
        if attempt != self.secret {
            warn!("🔐 Admin access denied");
            return Err(AdminError::Denied);
        }
        Ok(())
    }
}

/// Per-key tallies over all stored responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSummary {
    pub total: usize,
    pub preferences: BTreeMap<String, BTreeMap<String, usize>>,
}

/// Read-only view over the response store, behind the admin gate.
pub struct AdminViewer<'a, S> {
    store: &'a S,
    gate: AdminGate,
}

impl<'a, S: ResponseStore> AdminViewer<'a, S> {
    pub fn new(store: &'a S, gate: AdminGate) -> Self {
        Self { store, gate }
    }

    /// All responses newest first, after the password check.
    pub async fn responses(&self, password: &str) -> Result<Vec<ResponseRecord>, AdminError> {
        self.gate.check(password)?;
        let records = self.store.query_all().await?;
        info!("📋 Admin viewer loaded {} responses", records.len());
        Ok(records)
    }
}

/// Counts the non-empty values of `key`, ordered by value.
pub fn preference_counts(records: &[ResponseRecord], key: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in records.iter().filter_map(|r| r.answers.get(key)) {
        if value.is_empty() {
            continue;
        }
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn summarize(records: &[ResponseRecord]) -> ResponseSummary {
    ResponseSummary {
        total: records.len(),
        preferences: PREFERENCE_KEYS
            .iter()
            .map(|key| (key.to_string(), preference_counts(records, key)))
            .collect(),
    }
}
