//! # Scheduler-IO
//!
//! CSV and JSON I/O for the dance-practice scheduling engine
//! (`scheduler-core`): members/responses CSV, cancellations/partnerships
//! JSON, and the schedule/actual-attendance JSON shapes. Every parse
//! failure is turned into a typed [`error::IoError`] rather than a bare
//! string, matching `solver_core::solver::SolverError`'s approach, since a
//! library boundary should not hand callers `Result<_, String>`.

pub mod availability_report;
pub mod bundle;
pub mod cancellations;
pub mod error;
pub mod members;
pub mod partnerships;
pub mod responses;
pub mod schedule;

pub use bundle::{load_period_bundle, PeriodBundle};
pub use error::{IoError, Result};
