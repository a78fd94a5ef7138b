//! Schedule JSON output and authoritative-attendance JSON input (spec §6),
//! grounded on `original_source/src/peeps_scheduler/utils.py::apply_event_results`,
//! which reads back exactly the shape this module writes (`valid_events`,
//! each with `id`, `date`, `duration_minutes`, `attendees: [{id, role}]`) —
//! the Results Applier's round-trip property (spec §8) depends on the two
//! shapes matching.

use crate::error::{IoError, Result};
use scheduler_core::engine::apply::{ActualAttendee, ActualEventAttendance};
use scheduler_core::models::{Person, PersonId, Role, Schedule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_date(unix_seconds: i64) -> String {
    chrono::DateTime::from_timestamp(unix_seconds, 0)
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn parse_date(raw: &str) -> Result<i64> {
    chrono::NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|e| IoError::UnparsableEventDate(raw.to_string(), e.to_string()))
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Leader => "Leader",
        Role::Follower => "Follower",
    }
}

fn role_from_str(raw: &str) -> Result<Role> {
    Ok(scheduler_core::models::Role::parse(raw)?)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonSlot {
    pub id: PersonId,
    #[serde(default)]
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEventOutput {
    pub id: u32,
    pub date: String,
    pub duration_minutes: u32,
    pub attendees: Vec<PersonSlot>,
    pub alternates: Vec<PersonSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub valid_events: Vec<ScheduleEventOutput>,
    pub num_unique_attendees: u32,
    pub total_attendees: u32,
    pub priority_fulfilled: i64,
    pub normalized_utilization: f64,
    pub mutual_unique_fulfilled: u32,
    pub mutual_repeat_fulfilled: u32,
    pub one_sided_fulfilled: u32,
}

fn name_lookup(people: &[Person]) -> HashMap<PersonId, &str> {
    people.iter().map(|p| (p.id, p.display_name.as_str())).collect()
}

fn slots_for(ids: &[PersonId], role: Role, names: &HashMap<PersonId, &str>) -> Vec<PersonSlot> {
    ids.iter()
        .map(|&id| PersonSlot {
            id,
            name: names.get(&id).copied().unwrap_or_default().to_string(),
            role: role_to_str(role).to_string(),
        })
        .collect()
}

/// Builds the serialisable output shape from an in-memory [`Schedule`],
/// resolving display names from `people`.
pub fn to_schedule_output(schedule: &Schedule, people: &[Person]) -> ScheduleOutput {
    let names = name_lookup(people);
    let valid_events = schedule
        .valid_events
        .iter()
        .map(|event| {
            let mut attendees = Vec::new();
            let mut alternates = Vec::new();
            for role in [Role::Leader, Role::Follower] {
                attendees.extend(slots_for(
                    event.attendees.get(&role).map(|v| v.as_slice()).unwrap_or(&[]),
                    role,
                    &names,
                ));
                alternates.extend(slots_for(
                    event.alternates.get(&role).map(|v| v.as_slice()).unwrap_or(&[]),
                    role,
                    &names,
                ));
            }
            ScheduleEventOutput {
                id: event.id,
                date: format_date(event.date),
                duration_minutes: event.duration_minutes,
                attendees,
                alternates,
            }
        })
        .collect();

    ScheduleOutput {
        valid_events,
        num_unique_attendees: schedule.metrics.num_unique_attendees,
        total_attendees: schedule.metrics.total_attendees,
        priority_fulfilled: schedule.metrics.priority_fulfilled,
        normalized_utilization: schedule.metrics.normalized_utilization,
        mutual_unique_fulfilled: schedule.metrics.mutual_unique_fulfilled,
        mutual_repeat_fulfilled: schedule.metrics.mutual_repeat_fulfilled,
        one_sided_fulfilled: schedule.metrics.one_sided_fulfilled,
    }
}

/// Writes a chosen schedule as `results.json` (spec §6: Output: Schedule).
pub fn write_schedule_json(schedule: &Schedule, people: &[Person], path: impl AsRef<Path>) -> Result<()> {
    let output = to_schedule_output(schedule, people);
    let path_str = path.as_ref().display().to_string();
    let json = serde_json::to_string_pretty(&output).map_err(|source| IoError::Json {
        path: path_str.clone(),
        source,
    })?;
    std::fs::write(&path, json).map_err(|source| IoError::Write {
        path: path_str,
        source,
    })
}

/// Loads an authoritative attendance record for the Results Applier.
///
/// This deliberately accepts the same `valid_events` shape
/// [`write_schedule_json`] produces, so that feeding a chosen schedule's own
/// `results.json` back through `apply-results` exercises the round-trip
/// property in spec §8 ("Running the Results Applier with an attendance
/// record that matches the scheduler's own chosen schedule reproduces the
/// same updated member vector as running the Period Finaliser on that
/// schedule").
pub fn load_actual_attendance_json(path: impl AsRef<Path>) -> Result<Vec<ActualEventAttendance>> {
    let path_str = path.as_ref().display().to_string();
    let text = std::fs::read_to_string(&path).map_err(|source| IoError::Read {
        path: path_str.clone(),
        source,
    })?;
    let parsed: ScheduleOutput = serde_json::from_str(&text).map_err(|source| IoError::Json {
        path: path_str,
        source,
    })?;

    parsed
        .valid_events
        .into_iter()
        .map(|event| {
            let date = parse_date(&event.date)?;
            let attendees = event
                .attendees
                .into_iter()
                .map(|slot| {
                    Ok(ActualAttendee {
                        person_id: slot.id,
                        role: role_from_str(&slot.role)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ActualEventAttendance {
                event_id: event.id,
                date,
                attendees,
            })
        })
        .collect()
}
