//! The assignment pipeline: sanitisation, overlap trimming, permutation
//! enumeration, per-ordering assignment, finalisation, ranking/dedup, and
//! the results applier. [`crate::run_schedule`] wires these together; each
//! module is independently testable against a hand-built `Vec<Person>` /
//! `Vec<Event>`.

pub mod apply;
pub mod assign;
pub mod constraints;
pub mod finalize;
pub mod overlap;
pub mod permute;
pub mod rank;
pub mod sanitize;
