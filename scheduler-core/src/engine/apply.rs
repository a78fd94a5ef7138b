//! The results applier (spec §4.10): the single source of truth for how
//! `priority` evolves across periods. Given canonical member records, the
//! period's responses, and an authoritative attendance record (which may
//! diverge from what the scheduler itself chose — people added or removed,
//! roles switched), reconstructs the outgoing people vector and runs it
//! through the §4.6 finaliser after resetting attendees' priority to zero.
//!
//! Grounded on `original_source/src/peeps_scheduler/utils.py::apply_event_results`:
//! canonical members are reloaded fresh (ignoring any `availability`/
//! `event_limit` they might carry, since those are response-scoped, not
//! canonical), `responded` is set from email membership in the responses
//! record, and the actual attendance record drives `num_events_this_period`
//! and `assigned_event_dates` before the ordinary finaliser runs.

use super::finalize::finalize_people;
use crate::models::{EventId, Person, PersonId, Role};
use std::collections::HashSet;

/// The canonical, cross-period fields of a member record — the subset of
/// [`Person`] that survives from one period to the next independent of any
/// particular period's responses (spec §6: Members record).
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub id: PersonId,
    pub full_name: String,
    pub display_name: String,
    pub email: String,
    pub primary_role: Role,
    pub index: u32,
    pub priority: i32,
    pub total_attended: u32,
    pub active: bool,
    pub date_joined: String,
}

/// One event's authoritative attendance, as actually happened — which may
/// differ from what the scheduler chose (spec §4.10).
#[derive(Debug, Clone)]
pub struct ActualEventAttendance {
    pub event_id: EventId,
    pub date: i64,
    pub attendees: Vec<ActualAttendee>,
}

#[derive(Debug, Clone)]
pub struct ActualAttendee {
    pub person_id: PersonId,
    pub role: Role,
}

/// Reconstructs the outgoing people vector from canonical member records,
/// the set of emails that responded this period, and the authoritative
/// attendance record, then applies the §4.6 finaliser.
///
/// Procedure (spec §4.10):
/// 1. Rebuild a `Person` per member record, with `priority`/`total_attended`/
///    `index` taken verbatim and `responded` set from email membership.
/// 2. For each event in the attendance record, for each listed attendee,
///    increment `num_events_this_period` and append the event's date.
/// 3. Reset `priority` to `0` for every person with
///    `num_events_this_period >= 1` — this is the one place that reset
///    happens; the plain per-ordering finaliser never does it.
/// 4. Run the §4.6 finaliser (fairness bump for unscheduled responders,
///    re-sort by descending priority, reassign `index`).
pub fn apply_results(
    members: &[MemberRecord],
    responded_emails: &HashSet<String>,
    attendance: &[ActualEventAttendance],
) -> Vec<Person> {
    let mut people: Vec<Person> = members
        .iter()
        .map(|m| Person {
            id: m.id,
            full_name: m.full_name.clone(),
            display_name: m.display_name.clone(),
            email: m.email.clone(),
            primary_role: m.primary_role,
            switch_pref: crate::models::SwitchPreference::PrimaryOnly,
            active: m.active,
            date_joined: m.date_joined.clone(),
            availability: HashSet::new(),
            event_limit: 0,
            min_interval_days: 0,
            responded: normalize_email(&m.email)
                .map(|e| responded_emails.contains(&e))
                .unwrap_or(false),
            priority: m.priority,
            total_attended: m.total_attended,
            index: m.index,
            num_events_this_period: 0,
            assigned_event_dates: Vec::new(),
            original_priority: m.priority,
        })
        .collect();

    let id_to_idx: std::collections::HashMap<PersonId, usize> =
        people.iter().enumerate().map(|(i, p)| (p.id, i)).collect();

    for event in attendance {
        for attendee in &event.attendees {
            if let Some(&idx) = id_to_idx.get(&attendee.person_id) {
                people[idx].num_events_this_period += 1;
                people[idx].assigned_event_dates.push(event.date);
            }
        }
    }

    for person in people.iter_mut() {
        if person.num_events_this_period >= 1 {
            person.priority = 0;
        }
    }

    finalize_people(&mut people);
    people
}

/// Case-insensitive email normalisation, grounded on
/// `original_source/src/peeps_scheduler/file_io.py::normalize_email`: lower
/// and trim. Returns `None` for an empty address so an empty-email member
/// never spuriously matches an empty-email response row.
fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Derives the responded-email set from a responses record's email column,
/// normalising each address the same way `apply_results` does.
pub fn responded_emails_from_rows<'a>(emails: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    emails.into_iter().filter_map(normalize_email).collect()
}
