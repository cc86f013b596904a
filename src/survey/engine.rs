use log::{info, error, warn, debug};
use std::sync::Arc;

use crate::database::{ResponseRecord, ResponseStore};
use crate::session::Session;
use super::{Answers, FieldIssue, FormSchema, StepDefinition, ValidationReport, WizardError};

/// What an accepted `submit_step` led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved to a non-terminal step.
    Advanced(usize),
    /// Entered the terminal step. `saved` is true only for the call that
    /// stored the response.
    Completed { saved: bool },
}

/// Drives sessions through a schema and hands each completed session to the
/// response store exactly once.
pub struct WizardEngine<S> {
    schema: Arc<FormSchema>,
    store: S,
}

impl<S: ResponseStore> WizardEngine<S> {
    pub fn new(schema: Arc<FormSchema>, store: S) -> Self {
        Self { schema, store }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_step(&self, session: &Session) -> &StepDefinition {
        let steps = self.schema.steps();
        // A session restored against a shorter schema lands on the terminal step.
        &steps[session.current_step.min(steps.len() - 1)]
    }

    /// Validates `values` for the session's current step and advances it.
    ///
    /// Rejected submissions leave the session untouched. Entering the
    /// terminal step for the first time stores a snapshot of the answers; if
    /// that fails the session has still advanced and the store error is
    /// returned as `PersistenceFailed`.
    pub async fn submit_step(
        &self,
        session: &mut Session,
        step_index: usize,
        values: Answers,
    ) -> Result<StepOutcome, WizardError> {
        if step_index != session.current_step {
            warn!(
                "⚠️ Session {} ignored stale submission for step {} (at step {})",
                session.id, step_index, session.current_step
            );
            return Err(WizardError::StaleSubmission {
                expected: session.current_step,
                received: step_index,
            });
        }

        let step = self.schema.get_step(step_index)?;
        let next = step.next_step.ok_or(WizardError::AlreadyComplete)?;

        let values = values.normalized();
        let report = validate_step(step, &values);
        if !report.is_clean() {
            info!("Session {} step '{}' rejected: {}", session.id, step.key, report);
            return Err(WizardError::ValidationFailed(report));
        }

        session.answers.merge(values);
        session.current_step = next;
        info!("➡️ Session {} advanced from '{}' to step {}", session.id, step.key, next);

        if self.schema.get_step(next)?.is_terminal() {
            let saved = self.persist_once(session).await?;
            return Ok(StepOutcome::Completed { saved });
        }

        Ok(StepOutcome::Advanced(next))
    }

    /// Moves to the previous step without validating or touching answers.
    /// Stale indices and steps without a predecessor are no-ops.
    pub fn go_back(&self, session: &mut Session, step_index: usize) {
        if step_index != session.current_step {
            warn!(
                "⚠️ Session {} ignored stale back navigation from step {} (at step {})",
                session.id, step_index, session.current_step
            );
            return;
        }

        match self.schema.get_step(step_index).ok().and_then(|step| step.prev_step) {
            Some(prev) => {
                session.current_step = prev;
                debug!("Session {} went back from step {} to {}", session.id, step_index, prev);
            }
            None => debug!("Session {} has no step before {}", session.id, step_index),
        }
    }

    pub fn reset(&self, session: &mut Session) {
        session.clear();
        info!("🔄 Session {} reset", session.id);
    }

    async fn persist_once(&self, session: &mut Session) -> Result<bool, WizardError> {
        if session.submitted || session.snapshot.is_some() {
            debug!("Session {} re-entered completion, response already handled", session.id);
            return Ok(false);
        }

        let record = ResponseRecord::new(session.answers.clone());
        // Recorded before the await so a second entry never re-attempts.
        session.snapshot = Some(record.clone());

        match self.store.insert(&record).await {
            Ok(()) => {
                session.submitted = true;
                info!("✅ Session {} stored as response {}", session.id, record.id);
                Ok(true)
            }
            Err(e) => {
                error!("❌ Session {} could not store response {}: {}", session.id, record.id, e);
                Err(WizardError::PersistenceFailed(e))
            }
        }
    }
}

/// Required fields must be present and non-empty; present values must fit
/// their field; keys the step does not declare are refused.
pub fn validate_step(step: &StepDefinition, values: &Answers) -> ValidationReport {
    let mut report = ValidationReport::default();

    for field in &step.fields {
        match values.get(&field.key) {
            Some(value) if !value.is_empty() => {
                if let Err(reason) = field.check(value) {
                    report.invalid.push(FieldIssue { key: field.key.clone(), reason });
                }
            }
            _ if field.required => report.missing.push(field.key.clone()),
            _ => {}
        }
    }

    for key in values.keys() {
        if step.field(key).is_none() {
            report.invalid.push(FieldIssue {
                key: key.to_string(),
                reason: format!("not a field of step '{}'", step.key),
            });
        }
    }

    report
}
