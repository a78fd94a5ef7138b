//! The ranker/deduper (spec §4.9): structural deduplication of equivalent
//! schedules, six-key lexicographic ranking, and top-tier selection.

use crate::models::{EventId, PersonId, Role, Schedule};
use std::collections::HashSet;

/// Canonical form for structural equality: the valid events sorted by id,
/// each reduced to its sorted `(person_id, role)` attendee set. Attendee
/// append-order and alternate composition never participate.
fn canonical_key(schedule: &Schedule) -> Vec<(EventId, Vec<(PersonId, Role)>)> {
    let mut events: Vec<(EventId, Vec<(PersonId, Role)>)> = schedule
        .valid_events
        .iter()
        .map(|e| (e.id, e.attendee_signature()))
        .collect();
    events.sort_by_key(|(id, _)| *id);
    events
}

/// Drops structurally-equivalent duplicate schedules, keeping the first
/// occurrence of each canonical form.
pub fn dedup_schedules(schedules: Vec<Schedule>) -> Vec<Schedule> {
    let mut seen: HashSet<Vec<(EventId, Vec<(PersonId, Role)>)>> = HashSet::new();
    let mut result = Vec::new();
    for schedule in schedules {
        if seen.insert(canonical_key(&schedule)) {
            result.push(schedule);
        }
    }
    result
}

/// Dedupes, then returns the subset tying on the full six-key ranking tuple
/// with the best (spec §4.9). Empty input yields an empty tier, the
/// "search-empty" outcome (spec §7).
pub fn top_tier(schedules: Vec<Schedule>) -> Vec<Schedule> {
    let deduped = dedup_schedules(schedules);
    let Some(best_key) = deduped.iter().map(|s| s.metrics.rank_key()).max() else {
        return deduped;
    };
    deduped
        .into_iter()
        .filter(|s| s.metrics.rank_key() == best_key)
        .collect()
}
