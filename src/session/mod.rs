pub mod registry;

pub use registry::*;

use serde::{Serialize, Deserialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::database::ResponseRecord;
use crate::survey::Answers;

/// One respondent's pass through the wizard.
///
/// Only `WizardEngine` moves a session; hosts read it through the accessors
/// and may serialise it between requests.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub(crate) current_step: usize,
    pub(crate) answers: Answers,
    pub(crate) submitted: bool,
    /// Set when the terminal step is first entered; its presence means the
    /// single persistence attempt has been spent.
    pub(crate) snapshot: Option<ResponseRecord>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            current_step: 0,
            answers: Answers::new(),
            submitted: false,
            snapshot: None,
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    /// True once the response has been stored successfully.
    pub fn submitted(&self) -> bool {
        self.submitted
    }

    /// The record built when the terminal step was reached, whether or not
    /// storing it succeeded.
    pub fn snapshot(&self) -> Option<&ResponseRecord> {
        self.snapshot.as_ref()
    }

    pub(crate) fn clear(&mut self) {
        self.started_at = Utc::now();
        self.current_step = 0;
        self.answers.clear();
        self.submitted = false;
        self.snapshot = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
