//! Error type for the I/O collaborator crate.
//!
//! Every parse failure is logged at `warn`/`error` before being turned into
//! one of these variants, matching `people_scheduler`'s Tauri commands
//! logging before returning to the frontend — but typed, not a bare
//! `Result<_, String>`, since a library boundary should not return strings
//! (grounded on `solver_core::solver::SolverError`'s typed-enum approach).

use scheduler_core::error::SchedulerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} row {row}: column '{column}' has invalid value '{value}': {reason}")]
    InvalidValue {
        path: String,
        row: usize,
        column: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot parse event date '{0}': {1}")]
    UnparsableEventDate(String, String),

    #[error(transparent)]
    Domain(#[from] SchedulerError),
}

pub type Result<T> = std::result::Result<T, IoError>;
