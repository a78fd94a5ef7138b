//! The constraint checker (spec §4.1): a pure predicate with no side
//! effects, used both during assignment and during alternate validation.

use crate::models::{Event, Person};

/// Converts a unix-epoch-seconds timestamp to a whole-day index, so that
/// interval checks operate on calendar days rather than raw seconds.
fn day_index(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(86_400)
}

/// May `person` attend `event` given their current transient state?
///
/// All four conditions must hold (spec §4.1):
/// - the event is in the person's availability;
/// - they have not exhausted their session cap for the period;
/// - every already-assigned date for this person is at least
///   `min_interval_days` whole days from this event's date, in either
///   direction — a later assignment blocks an earlier candidate equally,
///   because `assigned_event_dates` accumulates across the whole ordering,
///   not just prior ones;
/// - `min_interval_days == 0` permits same-day double-booking.
pub fn can_attend(person: &Person, event: &Event) -> bool {
    if !person.availability.contains(&event.id) {
        return false;
    }
    if person.num_events_this_period >= person.event_limit {
        return false;
    }
    if person.min_interval_days == 0 {
        return true;
    }
    let candidate_day = day_index(event.date);
    person.assigned_event_dates.iter().all(|&assigned| {
        (day_index(assigned) - candidate_day).abs() >= person.min_interval_days
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, SwitchPreference};
    use std::collections::HashSet;

    fn person(availability: &[u32], event_limit: u32, min_interval_days: i64) -> Person {
        Person {
            id: 1,
            full_name: "Test Person".to_string(),
            display_name: "Test".to_string(),
            email: "test@example.com".to_string(),
            primary_role: Role::Leader,
            switch_pref: SwitchPreference::PrimaryOnly,
            active: true,
            date_joined: "2024-01-01".to_string(),
            availability: availability.iter().copied().collect::<HashSet<_>>(),
            event_limit,
            min_interval_days,
            responded: true,
            priority: 0,
            total_attended: 0,
            index: 0,
            num_events_this_period: 0,
            assigned_event_dates: Vec::new(),
            original_priority: 0,
        }
    }

    fn event(id: u32, date: i64) -> Event {
        use crate::models::SchedulerConfig;
        Event::new(id, date, 90, &SchedulerConfig::default())
    }

    #[test]
    fn blocks_when_not_available() {
        let p = person(&[2], 5, 0);
        assert!(!can_attend(&p, &event(1, 0)));
    }

    #[test]
    fn blocks_when_event_limit_exhausted() {
        let mut p = person(&[1], 1, 0);
        p.num_events_this_period = 1;
        assert!(!can_attend(&p, &event(1, 0)));
    }

    #[test]
    fn zero_min_interval_allows_same_day_double_booking() {
        let mut p = person(&[1, 2], 2, 0);
        p.assigned_event_dates.push(0);
        assert!(can_attend(&p, &event(2, 0)));
    }

    #[test]
    fn min_interval_blocks_nearby_event() {
        let mut p = person(&[1, 2], 2, 3);
        p.assigned_event_dates.push(0);
        assert!(!can_attend(&p, &event(2, 86_400)));
    }

    #[test]
    fn min_interval_allows_distant_event() {
        let mut p = person(&[1, 2], 2, 3);
        p.assigned_event_dates.push(0);
        assert!(can_attend(&p, &event(2, 4 * 86_400)));
    }

    #[test]
    fn bidirectional_blocks_future_assignment_against_prior_candidate() {
        // A candidate at day 10 with a future assignment at day 11 and
        // min_interval_days=2 must be blocked, exactly as a past assignment
        // would block it.
        let mut p = person(&[1, 2], 2, 2);
        p.assigned_event_dates.push(11 * 86_400);
        assert!(!can_attend(&p, &event(1, 10 * 86_400)));
    }
}
