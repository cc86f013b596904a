pub mod answers;
pub mod schema;
pub mod engine;
pub mod export;

pub use answers::*;
pub use schema::*;
pub use engine::*;
pub use export::*;

use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

use crate::database::StoreError;

/// Why a submitted step was not accepted.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Required keys with no value or an empty one, in schema order.
    pub missing: Vec<String>,
    /// Values that are present but do not fit their field.
    pub invalid: Vec<FieldIssue>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldIssue {
    pub key: String,
    pub reason: String,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing: {}", self.missing.join(", ")));
        }
        for issue in &self.invalid {
            parts.push(format!("{}: {}", issue.key, issue.reason));
        }
        f.write_str(&parts.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Validation failed ({0})")]
    ValidationFailed(ValidationReport),
    #[error("Response could not be saved: {0}")]
    PersistenceFailed(#[source] StoreError),
    #[error("Unknown step: {0}")]
    UnknownStep(usize),
    #[error("Stale submission for step {received}, session is at step {expected}")]
    StaleSubmission { expected: usize, received: usize },
    #[error("Survey already complete")]
    AlreadyComplete,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema has no steps")]
    Empty,
    #[error("Schema has no terminal step")]
    NoTerminal,
    #[error("Step {0} has no next step but is not the last step")]
    TerminalNotLast(String),
    #[error("Step {step} links to missing step {target}")]
    BadLink { step: String, target: usize },
    #[error("Field key {0} is declared more than once")]
    DuplicateField(String),
    #[error("Choice field {0} has no options")]
    NoOptions(String),
    #[error("Integer field {0} has an empty range")]
    EmptyRange(String),
}
