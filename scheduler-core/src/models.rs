//! Domain model for the scheduling engine: people, events, partnership
//! requests, and the schedule that assignment produces.
//!
//! These types carry no I/O and no ambient state; everything a caller needs
//! is passed in explicitly (see [`crate::run_schedule`]).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{Result, SchedulerError};

pub type PersonId = u32;
pub type EventId = u32;

/// Dance role. Total, with an involutive [`Role::opposite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Leader,
    Follower,
}

impl Role {
    /// Parses a role from the free-text values members/responses data uses.
    ///
    /// # Example
    ///
    /// ```
    /// use scheduler_core::models::Role;
    /// assert_eq!(Role::parse("Lead").unwrap(), Role::Leader);
    /// assert_eq!(Role::parse("FOLLOW").unwrap(), Role::Follower);
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "leader" | "lead" => Ok(Role::Leader),
            "follower" | "follow" => Ok(Role::Follower),
            other => Err(SchedulerError::UnknownRole(other.to_string())),
        }
    }

    pub fn opposite(self) -> Role {
        match self {
            Role::Leader => Role::Follower,
            Role::Follower => Role::Leader,
        }
    }
}

/// Governs whether a person may be assigned (or promoted into) their
/// non-primary role for a given event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchPreference {
    /// Will only ever attend in their primary role.
    PrimaryOnly,
    /// Will attend in the secondary role once the primary role is full.
    SwitchIfPrimaryFull,
    /// Will be promoted from alternate into the secondary role if an event
    /// would otherwise fail to meet its minimum.
    SwitchIfNeeded,
}

impl SwitchPreference {
    /// Parses the full free-text phrases collected by the response form.
    /// Unlike [`Role::parse`], the recognised phrases are whole sentences,
    /// matched by substring, because that is how the source response data
    /// arrives.
    pub fn parse(raw: &str) -> Result<Self> {
        let lower = raw.trim().to_lowercase();
        if lower.contains("only") && lower.contains("primary") {
            Ok(SwitchPreference::PrimaryOnly)
        } else if lower.contains("if it lets me attend") || lower.contains("primary is full") {
            Ok(SwitchPreference::SwitchIfPrimaryFull)
        } else if lower.contains("if needed") || lower.contains("event needs it") {
            Ok(SwitchPreference::SwitchIfNeeded)
        } else {
            Err(SchedulerError::UnknownSwitchPreference(raw.to_string()))
        }
    }
}

/// A member of the practice roster.
///
/// Fields split into three lifetimes: identity/attributes that are stable
/// across periods, response-scoped attributes that are re-supplied every
/// period, cross-period state that the engine evolves
/// ([`crate::engine::finalize`], [`crate::engine::apply`]), and transient
/// per-evaluation scratch state that every permutation walk resets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub full_name: String,
    pub display_name: String,
    pub email: String,
    pub primary_role: Role,
    pub switch_pref: SwitchPreference,
    pub active: bool,
    pub date_joined: String,

    pub availability: HashSet<EventId>,
    pub event_limit: u32,
    pub min_interval_days: i64,
    pub responded: bool,

    pub priority: i32,
    pub total_attended: u32,
    pub index: u32,

    #[serde(skip, default)]
    pub num_events_this_period: u32,
    #[serde(skip, default)]
    pub assigned_event_dates: Vec<i64>,
    #[serde(skip, default)]
    pub original_priority: i32,
}

impl Person {
    /// Resets the transient, per-evaluation scratch fields. Called once per
    /// permutation walk, on a freshly cloned vector, never on the canonical
    /// roster.
    pub fn reset_transient(&mut self) {
        self.original_priority = self.priority;
        self.num_events_this_period = 0;
        self.assigned_event_dates.clear();
    }
}

/// A candidate timed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Unix-epoch seconds; whole-day interval checks operate on the
    /// calendar day this falls on, per [`crate::engine::constraints`].
    pub date: i64,
    pub duration_minutes: u32,
    pub min_role: u32,
    pub max_role: u32,

    pub attendees: HashMap<Role, Vec<PersonId>>,
    pub alternates: HashMap<Role, Vec<PersonId>>,
}

impl Event {
    pub fn new(id: EventId, date: i64, duration_minutes: u32, config: &SchedulerConfig) -> Self {
        let min_role = config.min_role_for_duration(duration_minutes);
        Event {
            id,
            date,
            duration_minutes,
            min_role,
            max_role: config.abs_max_role,
            attendees: HashMap::from([(Role::Leader, Vec::new()), (Role::Follower, Vec::new())]),
            alternates: HashMap::from([(Role::Leader, Vec::new()), (Role::Follower, Vec::new())]),
        }
    }

    pub fn attendee_count(&self, role: Role) -> usize {
        self.attendees.get(&role).map_or(0, |v| v.len())
    }

    pub fn alternate_count(&self, role: Role) -> usize {
        self.alternates.get(&role).map_or(0, |v| v.len())
    }

    /// (E3) Meets the duration-derived minimum for both roles.
    pub fn meets_min(&self) -> bool {
        self.attendee_count(Role::Leader) >= self.min_role as usize
            && self.attendee_count(Role::Follower) >= self.min_role as usize
    }

    /// (E4) Meets the absolute floor for both roles, independent of
    /// duration. A necessary but not sufficient condition for validity.
    pub fn meets_absolute_min(&self, config: &SchedulerConfig) -> bool {
        self.attendee_count(Role::Leader) >= config.abs_min_role as usize
            && self.attendee_count(Role::Follower) >= config.abs_min_role as usize
    }

    /// Swaps this event's duration/min_role for the next lower table entry.
    /// No-op if already at the shortest entry. Returns whether a downgrade
    /// happened.
    pub fn downgrade_duration(&mut self, config: &SchedulerConfig) -> bool {
        match config.next_lower_duration(self.duration_minutes) {
            Some(entry) => {
                self.duration_minutes = entry.minutes;
                self.min_role = entry.min_role;
                true
            }
            None => false,
        }
    }

    pub fn clear_participants(&mut self) {
        for list in self.attendees.values_mut() {
            list.clear();
        }
        for list in self.alternates.values_mut() {
            list.clear();
        }
    }

    /// Canonical `(person_id, role)` set used for structural equality and
    /// hashing in the ranker (spec §4.9): attendee append-order does not
    /// participate.
    pub fn attendee_signature(&self) -> Vec<(PersonId, Role)> {
        let mut sig: Vec<(PersonId, Role)> = Vec::new();
        for (&role, ids) in &self.attendees {
            for &id in ids {
                sig.push((id, role));
            }
        }
        sig.sort_unstable_by_key(|(id, role)| (*id, *role as u8));
        sig
    }
}

/// One row of a `requests: PersonId -> set<PersonId>` graph: "I would like
/// to be in a session with these people". Mutuality is derived, not stored.
pub type PartnershipRequests = HashMap<PersonId, HashSet<PersonId>>;

/// A fully evaluated schedule for one permutation/cap combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub valid_events: Vec<Event>,
    pub metrics: ScheduleMetrics,
}

/// Aggregate metrics computed by [`crate::engine::finalize`], used by the
/// ranker's six-key lexicographic order (spec §4.9).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMetrics {
    pub num_unique_attendees: u32,
    pub total_attendees: u32,
    pub priority_fulfilled: i64,
    pub mutual_unique_fulfilled: u32,
    pub normalized_utilization: f64,
    pub mutual_repeat_fulfilled: u32,
    pub one_sided_fulfilled: u32,
}

impl ScheduleMetrics {
    pub fn partnerships_fulfilled(&self) -> u32 {
        self.mutual_unique_fulfilled + self.mutual_repeat_fulfilled
    }

    /// The six-key ranking tuple (spec §4.9), highest-is-best in every
    /// position. `normalized_utilization` is rounded to avoid float-equality
    /// surprises when comparing otherwise-identical schedules.
    pub fn rank_key(&self) -> (u32, i64, u32, i64, u32, u32) {
        (
            self.num_unique_attendees,
            self.priority_fulfilled,
            self.mutual_unique_fulfilled,
            (self.normalized_utilization * 1_000.0).round() as i64,
            self.mutual_repeat_fulfilled,
            self.one_sided_fulfilled,
        )
    }
}

/// One entry in the duration-to-role-capacity table (spec §6, §9 Open
/// Question). `name` is descriptive only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationTableEntry {
    pub name: String,
    pub minutes: u32,
    pub min_role: u32,
}

/// Tunables carried explicitly through the call chain rather than as
/// ambient/global state (spec §9 design note).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub abs_min_role: u32,
    pub abs_max_role: u32,
    pub max_events: usize,
    /// Sorted descending by `minutes`.
    pub duration_table: Vec<DurationTableEntry>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            abs_min_role: 2,
            abs_max_role: 4,
            max_events: 7,
            duration_table: vec![
                DurationTableEntry {
                    name: "long".to_string(),
                    minutes: 150,
                    min_role: 3,
                },
                DurationTableEntry {
                    name: "short".to_string(),
                    minutes: 90,
                    min_role: 2,
                },
            ],
        }
    }
}

impl SchedulerConfig {
    /// Resolves the duration-derived `min_role` floor: the highest-minutes
    /// table entry whose `minutes` is `<= duration_minutes`, falling back to
    /// the shortest entry for durations below every threshold.
    pub fn min_role_for_duration(&self, duration_minutes: u32) -> u32 {
        self.duration_table
            .iter()
            .filter(|entry| entry.minutes <= duration_minutes)
            .max_by_key(|entry| entry.minutes)
            .or_else(|| self.duration_table.iter().min_by_key(|entry| entry.minutes))
            .map(|entry| entry.min_role)
            .unwrap_or(self.abs_min_role)
    }

    /// The table entry immediately below `duration_minutes`, for downgrade.
    fn next_lower_duration(&self, duration_minutes: u32) -> Option<&DurationTableEntry> {
        self.duration_table
            .iter()
            .filter(|entry| entry.minutes < duration_minutes)
            .max_by_key(|entry| entry.minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_accepts_known_variants() {
        for raw in ["Leader", "leader", "LEADER", "lead", "Lead"] {
            assert_eq!(Role::parse(raw).unwrap(), Role::Leader);
        }
        for raw in ["Follower", "follower", "FOLLOWER", "follow", "Follow"] {
            assert_eq!(Role::parse(raw).unwrap(), Role::Follower);
        }
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert!(Role::parse("dancer").is_err());
    }

    #[test]
    fn role_opposite_is_involutive() {
        assert_eq!(Role::Leader.opposite(), Role::Follower);
        assert_eq!(Role::Follower.opposite(), Role::Leader);
        assert_eq!(Role::Leader.opposite().opposite(), Role::Leader);
    }

    #[test]
    fn switch_preference_parse_matches_full_sentences() {
        assert_eq!(
            SwitchPreference::parse("I only want to dance my primary role").unwrap(),
            SwitchPreference::PrimaryOnly
        );
        assert_eq!(
            SwitchPreference::parse(
                "I'm happy to dance my secondary role if it lets me attend when my primary is full"
            )
            .unwrap(),
            SwitchPreference::SwitchIfPrimaryFull
        );
        assert_eq!(
            SwitchPreference::parse("I'll switch roles if needed to fill an event").unwrap(),
            SwitchPreference::SwitchIfNeeded
        );
    }

    #[test]
    fn duration_table_resolves_long_and_short() {
        let config = SchedulerConfig::default();
        assert_eq!(config.min_role_for_duration(150), 3);
        assert_eq!(config.min_role_for_duration(90), 2);
        assert_eq!(config.min_role_for_duration(200), 3);
        assert_eq!(config.min_role_for_duration(10), 2);
    }

    #[test]
    fn event_downgrade_moves_long_to_short() {
        let config = SchedulerConfig::default();
        let mut event = Event::new(1, 0, 150, &config);
        assert_eq!(event.min_role, 3);
        assert!(event.downgrade_duration(&config));
        assert_eq!(event.duration_minutes, 90);
        assert_eq!(event.min_role, 2);
        assert!(!event.downgrade_duration(&config));
    }

    #[test]
    fn attendee_signature_ignores_append_order() {
        let config = SchedulerConfig::default();
        let mut a = Event::new(1, 0, 90, &config);
        let mut b = Event::new(1, 0, 90, &config);
        a.attendees.get_mut(&Role::Leader).unwrap().extend([1, 2]);
        b.attendees.get_mut(&Role::Leader).unwrap().extend([2, 1]);
        assert_eq!(a.attendee_signature(), b.attendee_signature());
    }
}
