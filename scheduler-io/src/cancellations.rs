//! Cancellations JSON I/O (spec §6), grounded on the cancellation handling
//! in `original_source/src/peeps_scheduler/scheduler.py::run`
//! (`cancelled_event_ids`, `cancelled_availability`) including its three
//! distinct fatal-input conditions: unknown event, unknown email,
//! availability not actually held.
//!
//! Events and per-email opt-outs are identified by the same raw date
//! strings used in `responses.csv`'s `Availability` column (e.g.
//! `"March 5 - 4PM"`), since that is the only identifier a human editing
//! this file by hand would have on offer — event ids are an internal,
//! scheduler-assigned detail.

use crate::error::{IoError, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancellationsFile {
    #[serde(default)]
    pub cancelled_events: HashSet<String>,
    #[serde(default)]
    pub cancelled_availability: HashMap<String, HashSet<String>>,
}

/// Loads a cancellations file. A missing file is not an error — an absent
/// `--cancellations-file` means "nothing is cancelled" (spec §6: the core
/// receives cancellations already-parsed and applied; an empty set is a
/// valid such input).
pub fn load_cancellations_json(path: impl AsRef<Path>) -> Result<CancellationsFile> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Ok(CancellationsFile::default());
    }
    let path_str = path_ref.display().to_string();
    let text = std::fs::read_to_string(path_ref).map_err(|source| IoError::Read {
        path: path_str.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| IoError::Json {
        path: path_str,
        source,
    })
}
