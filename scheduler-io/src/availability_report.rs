//! Availability report (SPEC_FULL §4.13, ambient reporting feature):
//! who responded, who has no usable availability, who hasn't responded at
//! all. Grounded on `original_source/src/peeps_scheduler/availability_report.py`.
//!
//! This is a read-only view built from the same bundle-assembly inputs as
//! `load_period_bundle`, but it reports on raw date strings rather than
//! resolved event ids, since its audience is a human deciding whether to
//! cancel or fill an event, not the scheduler.

use crate::cancellations::CancellationsFile;
use crate::error::Result;
use crate::members::load_members_csv;
use crate::responses::load_responses_csv;
use scheduler_core::models::Role;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct DateAvailability {
    pub leaders: Vec<String>,
    pub followers: Vec<String>,
    pub leader_fill: Vec<String>,
    pub follower_fill: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AvailabilityReport {
    /// Raw date string -> who's available, keyed for stable iteration.
    pub by_date: BTreeMap<String, DateAvailability>,
    pub no_availability: Vec<String>,
    pub non_responders: Vec<String>,
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Builds an [`AvailabilityReport`] directly from `members.csv` and
/// `responses.csv`, applying cancellations the same way
/// [`crate::bundle::load_period_bundle`] does, but reporting on display
/// names and raw date strings for human consumption.
pub fn build_availability_report(
    members_path: impl AsRef<Path>,
    responses_path: impl AsRef<Path>,
    cancellations: &CancellationsFile,
) -> Result<AvailabilityReport> {
    let members = load_members_csv(members_path)?;
    let responses = load_responses_csv(responses_path)?;

    let mut report = AvailabilityReport::default();
    let mut responders: HashSet<String> = HashSet::new();

    for response in &responses {
        let normalized = normalize_email(&response.email);
        let member = members
            .iter()
            .find(|m| normalize_email(&m.email) == normalized);
        let Some(member) = member else {
            log::warn!("availability report: no member matches response email {}", response.email);
            continue;
        };
        if !responders.insert(normalized.clone()) {
            log::warn!("availability report: duplicate response for {}", response.email);
            continue;
        }

        let cancelled_for_email = cancellations.cancelled_availability.get(&response.email);
        let available_dates: Vec<&String> = response
            .availability_raw
            .iter()
            .filter(|raw| !cancellations.cancelled_events.contains(raw.as_str()))
            .filter(|raw| !cancelled_for_email.is_some_and(|set| set.contains(raw.as_str())))
            .collect();

        if available_dates.is_empty() {
            report.no_availability.push(member.display_name.clone());
            continue;
        }

        for date in available_dates {
            let entry = report.by_date.entry(date.clone()).or_default();
            match response.primary_role {
                Role::Leader => entry.leaders.push(member.display_name.clone()),
                Role::Follower => entry.followers.push(member.display_name.clone()),
            }
            if response.switch_pref != scheduler_core::models::SwitchPreference::PrimaryOnly {
                match response.primary_role.opposite() {
                    Role::Leader => entry.leader_fill.push(member.display_name.clone()),
                    Role::Follower => entry.follower_fill.push(member.display_name.clone()),
                }
            }
        }
    }

    report.non_responders = members
        .iter()
        .filter(|m| m.active && !responders.contains(&normalize_email(&m.email)))
        .map(|m| m.display_name.clone())
        .collect();
    report.non_responders.sort();
    report.no_availability.sort();

    Ok(report)
}
