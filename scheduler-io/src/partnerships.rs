//! Partnerships JSON I/O (spec §6): `PersonId -> set<PersonId>`. Self-
//! references and unknown ids are rejected here, before the core ever sees
//! them — the core's contract assumes a well-formed graph.

use crate::error::{IoError, Result};
use scheduler_core::error::SchedulerError;
use scheduler_core::models::{PartnershipRequests, PersonId};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Loads a partnerships file of `{"<id>": [<id>, ...]}` and validates every
/// id against `valid_ids` (the loaded members), rejecting self-references
/// and unknown ids (spec §6).
pub fn load_partnerships_json(
    path: impl AsRef<Path>,
    valid_ids: &HashSet<PersonId>,
) -> Result<PartnershipRequests> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Ok(PartnershipRequests::new());
    }
    let path_str = path_ref.display().to_string();
    let text = std::fs::read_to_string(path_ref).map_err(|source| IoError::Read {
        path: path_str.clone(),
        source,
    })?;
    let raw: HashMap<String, Vec<PersonId>> =
        serde_json::from_str(&text).map_err(|source| IoError::Json {
            path: path_str,
            source,
        })?;

    let mut requests: PartnershipRequests = HashMap::new();
    for (from_raw, targets) in raw {
        let from: PersonId = from_raw.trim().parse().map_err(|_| IoError::InvalidValue {
            path: path_ref.display().to_string(),
            row: 0,
            column: "<partnership key>",
            value: from_raw.clone(),
            reason: "not an integer person id".to_string(),
        })?;
        if !valid_ids.contains(&from) {
            return Err(SchedulerError::UnknownPartnershipTarget { from, to: from }.into());
        }
        let mut set = HashSet::new();
        for to in targets {
            if to == from {
                return Err(SchedulerError::SelfPartnership(from).into());
            }
            if !valid_ids.contains(&to) {
                return Err(SchedulerError::UnknownPartnershipTarget { from, to }.into());
            }
            set.insert(to);
        }
        requests.insert(from, set);
    }
    Ok(requests)
}
