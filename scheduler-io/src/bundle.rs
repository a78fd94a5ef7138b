//! Assembles the in-memory `{people, events, partnerships}` bundle
//! `scheduler_core::run_schedule` consumes, from the parsed members,
//! responses, cancellations, and partnerships collaborators (spec §6).
//!
//! Grounded on `original_source/src/peeps_scheduler/scheduler.py::run`'s
//! data-loading section: members and responses are joined by normalised
//! email, new events are minted from first-seen availability date strings,
//! and cancellations are validated and applied before the people vector is
//! handed to the core.

use crate::cancellations::CancellationsFile;
use crate::error::{IoError, Result};
use crate::members::load_members_csv;
use crate::partnerships::load_partnerships_json;
use crate::responses::{parse_event_date, ResponseRecord};
use scheduler_core::engine::apply::MemberRecord;
use scheduler_core::error::SchedulerError;
use scheduler_core::models::{Event, EventId, PartnershipRequests, Person, PersonId, SchedulerConfig};
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub struct PeriodBundle {
    pub people: Vec<Person>,
    pub events: Vec<Event>,
    pub partnerships: PartnershipRequests,
}

fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Assigns sequential event ids to every distinct date string seen across
/// all responses, in first-seen order, grounded on
/// `csv_loader.py::convert_to_json`'s `unique_events` dict.
fn mint_events(
    responses: &[ResponseRecord],
    year: i32,
    config: &SchedulerConfig,
) -> Result<(HashMap<String, EventId>, Vec<Event>)> {
    let default_minutes = config
        .duration_table
        .iter()
        .map(|entry| entry.minutes)
        .max()
        .unwrap_or(90);

    let mut raw_to_id: HashMap<String, EventId> = HashMap::new();
    let mut events = Vec::new();
    let mut next_id: EventId = 0;

    for response in responses {
        for raw in &response.availability_raw {
            if raw_to_id.contains_key(raw) {
                continue;
            }
            let date = parse_event_date(raw, year)?;
            let minutes = response.duration_override_minutes.unwrap_or(default_minutes);
            let id = next_id;
            next_id += 1;
            events.push(Event::new(id, date, minutes, config));
            raw_to_id.insert(raw.clone(), id);
        }
    }
    Ok((raw_to_id, events))
}

#[allow(clippy::too_many_arguments)]
pub fn load_period_bundle(
    members_path: impl AsRef<Path>,
    responses_path: impl AsRef<Path>,
    cancellations_path: Option<&Path>,
    partnerships_path: Option<&Path>,
    year: i32,
    config: &SchedulerConfig,
) -> Result<PeriodBundle> {
    let members = load_members_csv(members_path)?;
    let responses = crate::responses::load_responses_csv(responses_path)?;
    let cancellations = match cancellations_path {
        Some(path) => crate::cancellations::load_cancellations_json(path)?,
        None => CancellationsFile::default(),
    };

    let (raw_to_id, events) = mint_events(&responses, year, config)?;

    for cancelled in &cancellations.cancelled_events {
        if !raw_to_id.contains_key(cancelled) {
            log::error!("cancellation refers to unknown event: {cancelled}");
            return Err(SchedulerError::UnknownCancelledEvent(cancelled.clone()).into());
        }
    }

    let member_emails: HashSet<String> = members
        .iter()
        .filter_map(|m| normalize_email(&m.email))
        .collect();
    for email in cancellations.cancelled_availability.keys() {
        let normalized = normalize_email(email).unwrap_or_default();
        if !member_emails.contains(&normalized) {
            return Err(SchedulerError::UnknownCancelledEmail(email.clone()).into());
        }
    }

    let mut responses_by_email: HashMap<String, &ResponseRecord> = HashMap::new();
    for response in &responses {
        if let Some(email) = normalize_email(&response.email) {
            responses_by_email.insert(email, response);
        }
    }

    let mut people = Vec::with_capacity(members.len());
    for member in &members {
        let normalized_email = normalize_email(&member.email);
        let response = normalized_email.as_ref().and_then(|e| responses_by_email.get(e));

        match response {
            None => {
                people.push(person_without_response(member));
            }
            Some(response) => {
                people.push(person_with_response(member, response, &raw_to_id, &cancellations)?);
            }
        }
    }

    let valid_ids: HashSet<PersonId> = members.iter().map(|m| m.id).collect();
    let partnerships = match partnerships_path {
        Some(path) => load_partnerships_json(path, &valid_ids)?,
        None => PartnershipRequests::new(),
    };

    Ok(PeriodBundle {
        people,
        events,
        partnerships,
    })
}

fn person_without_response(member: &MemberRecord) -> Person {
    Person {
        id: member.id,
        full_name: member.full_name.clone(),
        display_name: member.display_name.clone(),
        email: member.email.clone(),
        primary_role: member.primary_role,
        switch_pref: scheduler_core::models::SwitchPreference::PrimaryOnly,
        active: member.active,
        date_joined: member.date_joined.clone(),
        availability: HashSet::new(),
        event_limit: 0,
        min_interval_days: 0,
        responded: false,
        priority: member.priority,
        total_attended: member.total_attended,
        index: member.index,
        num_events_this_period: 0,
        assigned_event_dates: Vec::new(),
        original_priority: member.priority,
    }
}

fn person_with_response(
    member: &MemberRecord,
    response: &ResponseRecord,
    raw_to_id: &HashMap<String, EventId>,
    cancellations: &CancellationsFile,
) -> Result<Person> {
    let normalized_email = normalize_email(&member.email).unwrap_or_default();
    let cancelled_for_email = cancellations.cancelled_availability.get(&response.email);

    if let Some(cancelled_dates) = cancelled_for_email {
        for cancelled in cancelled_dates {
            if !response.availability_raw.contains(cancelled) {
                return Err(SchedulerError::CancelledAvailabilityNotHeld {
                    email: response.email.clone(),
                    event_id: *raw_to_id.get(cancelled).unwrap_or(&0),
                }
                .into());
            }
        }
    }

    let mut availability = HashSet::new();
    for raw in &response.availability_raw {
        if cancellations.cancelled_events.contains(raw) {
            continue;
        }
        if cancelled_for_email.is_some_and(|set| set.contains(raw)) {
            continue;
        }
        if let Some(&id) = raw_to_id.get(raw) {
            availability.insert(id);
        }
    }

    let _ = normalized_email;
    Ok(Person {
        id: member.id,
        full_name: member.full_name.clone(),
        display_name: member.display_name.clone(),
        email: member.email.clone(),
        primary_role: member.primary_role,
        switch_pref: response.switch_pref,
        active: member.active,
        date_joined: member.date_joined.clone(),
        availability,
        event_limit: response.event_limit,
        min_interval_days: response.min_interval_days,
        responded: true,
        priority: member.priority,
        total_attended: member.total_attended,
        index: member.index,
        num_events_this_period: 0,
        assigned_event_dates: Vec::new(),
        original_priority: member.priority,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_members(path: &Path) {
        let mut f = std::fs::File::create(path).unwrap();
        writeln!(
            f,
            "id,Name,Display Name,Email Address,Role,Index,Priority,Total Attended,Active,Date Joined"
        )
        .unwrap();
        writeln!(f, "1,Alice Alpha,Alice,alice@test.com,Leader,0,0,0,TRUE,2024-01-01").unwrap();
        writeln!(f, "2,Bob Beta,Bob,bob@test.com,Follower,1,0,0,TRUE,2024-01-01").unwrap();
        // Carol never responds this period.
        writeln!(f, "3,Carol Gamma,Carol,carol@test.com,Follower,2,0,0,TRUE,2024-01-01").unwrap();
    }

    fn write_responses(path: &Path) {
        let mut f = std::fs::File::create(path).unwrap();
        writeln!(
            f,
            "Timestamp,Email Address,Preferred Role,Secondary Role,Max Sessions,Availability"
        )
        .unwrap();
        writeln!(
            f,
            "2025-01-01 10:00:00,alice@test.com,Leader,I only want to dance my primary role,2,\"March 5 - 4PM, March 12 - 4PM\""
        )
        .unwrap();
        writeln!(
            f,
            "2025-01-01 11:00:00,bob@test.com,Follower,I only want to dance my primary role,1,\"March 5 - 4PM\""
        )
        .unwrap();
    }

    #[test]
    fn builds_bundle_with_non_responder_having_empty_availability() {
        let dir = tempfile::tempdir().unwrap();
        let members_path = dir.path().join("members.csv");
        let responses_path = dir.path().join("responses.csv");
        write_members(&members_path);
        write_responses(&responses_path);

        let config = SchedulerConfig::default();
        let bundle =
            load_period_bundle(&members_path, &responses_path, None, None, 2025, &config).unwrap();

        assert_eq!(bundle.events.len(), 2);
        let alice = bundle.people.iter().find(|p| p.id == 1).unwrap();
        assert_eq!(alice.availability.len(), 2);
        assert!(alice.responded);

        let carol = bundle.people.iter().find(|p| p.id == 3).unwrap();
        assert!(carol.availability.is_empty());
        assert!(!carol.responded);
        assert_eq!(carol.event_limit, 0);
    }

    #[test]
    fn applies_cancelled_event_to_everyones_availability() {
        let dir = tempfile::tempdir().unwrap();
        let members_path = dir.path().join("members.csv");
        let responses_path = dir.path().join("responses.csv");
        let cancellations_path = dir.path().join("cancellations.json");
        write_members(&members_path);
        write_responses(&responses_path);
        std::fs::write(
            &cancellations_path,
            r#"{"cancelled_events": ["March 5 - 4PM"]}"#,
        )
        .unwrap();

        let config = SchedulerConfig::default();
        let bundle = load_period_bundle(
            &members_path,
            &responses_path,
            Some(&cancellations_path),
            None,
            2025,
            &config,
        )
        .unwrap();

        let alice = bundle.people.iter().find(|p| p.id == 1).unwrap();
        assert_eq!(alice.availability.len(), 1);
        let bob = bundle.people.iter().find(|p| p.id == 2).unwrap();
        assert!(bob.availability.is_empty());
    }

    #[test]
    fn rejects_cancelled_availability_not_originally_held() {
        let dir = tempfile::tempdir().unwrap();
        let members_path = dir.path().join("members.csv");
        let responses_path = dir.path().join("responses.csv");
        let cancellations_path = dir.path().join("cancellations.json");
        write_members(&members_path);
        write_responses(&responses_path);
        std::fs::write(
            &cancellations_path,
            r#"{"cancelled_availability": {"alice@test.com": ["March 19 - 4PM"]}}"#,
        )
        .unwrap();

        let config = SchedulerConfig::default();
        let err = load_period_bundle(
            &members_path,
            &responses_path,
            Some(&cancellations_path),
            None,
            2025,
            &config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IoError::Domain(SchedulerError::CancelledAvailabilityNotHeld { .. })
        ));
    }

    #[test]
    fn rejects_unknown_cancelled_email() {
        let dir = tempfile::tempdir().unwrap();
        let members_path = dir.path().join("members.csv");
        let responses_path = dir.path().join("responses.csv");
        let cancellations_path = dir.path().join("cancellations.json");
        write_members(&members_path);
        write_responses(&responses_path);
        std::fs::write(
            &cancellations_path,
            r#"{"cancelled_availability": {"nobody@test.com": ["March 5 - 4PM"]}}"#,
        )
        .unwrap();

        let config = SchedulerConfig::default();
        let err = load_period_bundle(
            &members_path,
            &responses_path,
            Some(&cancellations_path),
            None,
            2025,
            &config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IoError::Domain(SchedulerError::UnknownCancelledEmail(_))
        ));
    }
}
