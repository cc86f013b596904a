pub mod admin;
pub mod config;
pub mod database;
pub mod session;
pub mod survey;

pub use admin::{AdminGate, AdminViewer};
pub use config::AppConfig;
pub use database::{ResponseRecord, ResponseStore, StoreBackend, StoreError};
pub use session::{Session, SessionHandle, SessionRegistry};
pub use survey::{Answers, FieldValue, FormSchema, StepOutcome, WizardEngine, WizardError};

/// Initialises `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
