pub mod config;
pub mod error;
pub mod health;
pub mod ledger;
pub mod model;
pub mod naming;
pub mod repair;
pub mod tracker;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use health::{AutoConfirm, Confirm, HealthOutcome, ScriptedConfirm};
pub use ledger::{Ledger, LedgerState, LedgerStore};
pub use model::{JobFile, JobKind, JobNames, JobRecord, JobStatus, NewJob};
pub use tracker::{JobTracker, LaserJobTracker, PrintJobTracker};
