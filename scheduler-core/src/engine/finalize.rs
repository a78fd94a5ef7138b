//! The period finaliser (spec §4.6), schedule metrics (§4.7), and
//! partnership fulfilment (§4.8). Runs once per evaluated ordering, on that
//! ordering's cloned people vector — never on the canonical roster.

use crate::models::{Event, PartnershipRequests, Person, Role, ScheduleMetrics};

/// Applies the fairness bump to people who responded but weren't scheduled,
/// leaves attendees' priority untouched (see [`crate::engine::apply`] for
/// the symmetric reset, which only happens there), then re-sorts the people
/// vector stably by descending priority and reassigns `index`.
///
/// Note the asymmetry: this finaliser does **not** reset an attendee's
/// priority to zero. That reset is the Results Applier's job, once actual
/// attendance (not just this ordering's hypothetical one) is known.
pub fn finalize_people(people: &mut [Person]) {
    for person in people.iter_mut() {
        if person.num_events_this_period == 0 {
            if person.responded {
                person.priority += 1;
            }
        } else {
            person.total_attended += person.num_events_this_period;
        }
    }
    people.sort_by(|a, b| b.priority.cmp(&a.priority));
    for (idx, person) in people.iter_mut().enumerate() {
        person.index = idx as u32;
    }
}

/// Computes the aggregate metrics for one finalised ordering (spec §4.7).
pub fn compute_metrics(
    people: &[Person],
    valid_events: &[Event],
    partnerships: &PartnershipRequests,
) -> ScheduleMetrics {
    let num_unique_attendees = people.iter().filter(|p| p.num_events_this_period >= 1).count() as u32;
    let total_attendees: u32 = people.iter().map(|p| p.num_events_this_period).sum();
    let priority_fulfilled: i64 = people
        .iter()
        .filter(|p| p.num_events_this_period >= 1)
        .map(|p| p.original_priority as i64)
        .sum();

    let normalized_utilization = normalized_utilization(people);
    let (mutual_unique_fulfilled, mutual_repeat_fulfilled, one_sided_fulfilled) =
        partnership_fulfilment(valid_events, partnerships);

    ScheduleMetrics {
        num_unique_attendees,
        total_attendees,
        priority_fulfilled,
        mutual_unique_fulfilled,
        normalized_utilization,
        mutual_repeat_fulfilled,
        one_sided_fulfilled,
    }
}

/// Mean, over people who responded, have non-empty availability, and have
/// `event_limit > 0`, of `min(attended, availability, event_limit) /
/// min(availability, event_limit)`, expressed as a percentage. Zero if no
/// such person exists (spec §4.7) — not an error.
fn normalized_utilization(people: &[Person]) -> f64 {
    let eligible: Vec<&Person> = people
        .iter()
        .filter(|p| p.responded && !p.availability.is_empty() && p.event_limit > 0)
        .collect();
    if eligible.is_empty() {
        return 0.0;
    }
    let sum: f64 = eligible
        .iter()
        .map(|p| {
            let availability_count = p.availability.len() as u32;
            let denom = availability_count.min(p.event_limit) as f64;
            let numer = p
                .num_events_this_period
                .min(availability_count)
                .min(p.event_limit) as f64;
            numer / denom
        })
        .sum();
    (sum / eligible.len() as f64) * 100.0
}

/// Spec §4.8: for each valid event, for each ordered pair of distinct
/// attendees, classify as mutual (both requested each other), one-sided
/// (only one did), or neither, then aggregate across events.
fn partnership_fulfilment(
    valid_events: &[Event],
    requests: &PartnershipRequests,
) -> (u32, u32, u32) {
    use std::collections::HashMap;

    let mut mutual_pair_event_count: HashMap<(u32, u32), u32> = HashMap::new();
    let mut one_sided_event_count: u32 = 0;

    for event in valid_events {
        let attendees: Vec<u32> = event
            .attendees
            .get(&Role::Leader)
            .into_iter()
            .flatten()
            .chain(event.attendees.get(&Role::Follower).into_iter().flatten())
            .copied()
            .collect();

        for i in 0..attendees.len() {
            for j in (i + 1)..attendees.len() {
                let a = attendees[i];
                let b = attendees[j];
                let a_wants_b = requests.get(&a).is_some_and(|s| s.contains(&b));
                let b_wants_a = requests.get(&b).is_some_and(|s| s.contains(&a));
                if a_wants_b && b_wants_a {
                    let key = (a.min(b), a.max(b));
                    *mutual_pair_event_count.entry(key).or_insert(0) += 1;
                } else if a_wants_b || b_wants_a {
                    one_sided_event_count += 1;
                }
            }
        }
    }

    let mutual_unique_fulfilled = mutual_pair_event_count.len() as u32;
    let mutual_repeat_fulfilled: u32 = mutual_pair_event_count
        .values()
        .map(|&count| count - 1)
        .sum();

    (
        mutual_unique_fulfilled,
        mutual_repeat_fulfilled,
        one_sided_event_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PersonId, Role, SchedulerConfig, SwitchPreference};
    use std::collections::{HashMap, HashSet};

    fn person(id: u32, priority: i32, responded: bool) -> Person {
        Person {
            id,
            full_name: format!("Person {id}"),
            display_name: format!("P{id}"),
            email: format!("p{id}@example.com"),
            primary_role: Role::Leader,
            switch_pref: SwitchPreference::PrimaryOnly,
            active: true,
            date_joined: "2024-01-01".to_string(),
            availability: HashSet::new(),
            event_limit: 0,
            min_interval_days: 0,
            responded,
            priority,
            total_attended: 0,
            index: 0,
            num_events_this_period: 0,
            assigned_event_dates: Vec::new(),
            original_priority: priority,
        }
    }

    #[test]
    fn unscheduled_responded_people_get_priority_bump() {
        let mut people = vec![person(1, 3, true)];
        finalize_people(&mut people);
        assert_eq!(people[0].priority, 4);
    }

    #[test]
    fn unscheduled_non_responders_are_unchanged() {
        let mut people = vec![person(1, 3, false)];
        finalize_people(&mut people);
        assert_eq!(people[0].priority, 3);
    }

    #[test]
    fn attendees_keep_their_priority_in_plain_finalize() {
        let mut attendee = person(2, 3, true);
        attendee.num_events_this_period = 1;
        let mut people = vec![attendee];
        finalize_people(&mut people);
        // Plain finalize does not reset attendees' priority to zero; only
        // the results applier does, once actual attendance is known.
        assert_eq!(people[0].priority, 3);
        assert_eq!(people[0].total_attended, 1);
    }

    #[test]
    fn index_reflects_descending_priority_after_finalize() {
        let mut p1 = person(1, 1, true);
        let mut p2 = person(2, 5, true);
        let mut p3 = person(3, 3, true);
        p1.num_events_this_period = 1;
        p2.num_events_this_period = 1;
        p3.num_events_this_period = 1;
        let mut people = vec![p1, p2, p3];
        finalize_people(&mut people);
        assert_eq!(people[0].id, 2);
        assert_eq!(people[0].index, 0);
        assert_eq!(people[1].id, 3);
        assert_eq!(people[1].index, 1);
        assert_eq!(people[2].id, 1);
        assert_eq!(people[2].index, 2);
    }

    fn person_with_availability(
        id: PersonId,
        availability: &[u32],
        event_limit: u32,
        attended: u32,
    ) -> Person {
        let mut p = person(id, 0, true);
        p.availability = availability.iter().copied().collect();
        p.event_limit = event_limit;
        p.num_events_this_period = attended;
        p
    }

    #[test]
    fn normalized_utilization_excludes_non_responders_and_empty_availability() {
        let mut p1 = person_with_availability(1, &[1, 2], 4, 1);
        let mut p2 = person_with_availability(2, &[1], 1, 1);
        let mut p3 = person_with_availability(3, &[1, 2, 3], 3, 0);
        for p in [&mut p1, &mut p2, &mut p3] {
            p.responded = true;
        }
        let mut p4 = person_with_availability(4, &[1], 1, 0);
        p4.responded = false;
        let mut p5 = person_with_availability(5, &[], 1, 0);
        p5.responded = true;

        let people = vec![p1, p2, p3, p4, p5];
        let result = normalized_utilization(&people);
        // (1/2 + 1/1 + 0/3) / 3 * 100
        assert!((result - 50.0).abs() < 1e-6);
    }

    #[test]
    fn normalized_utilization_is_zero_with_no_eligible_people() {
        let p = person_with_availability(1, &[], 1, 0);
        assert_eq!(normalized_utilization(&[p]), 0.0);
    }

    #[test]
    fn partnership_fulfilment_counts_mutual_and_one_sided() {
        let config = SchedulerConfig::default();
        let mut e1 = Event::new(1, 0, 90, &config);
        e1.attendees.insert(Role::Leader, vec![1]);
        e1.attendees.insert(Role::Follower, vec![2]);

        let mut e2 = Event::new(2, 0, 90, &config);
        e2.attendees.insert(Role::Leader, vec![1]);
        e2.attendees.insert(Role::Follower, vec![2]);

        let mut e3 = Event::new(3, 0, 90, &config);
        e3.attendees.insert(Role::Leader, vec![1]);
        e3.attendees.insert(Role::Follower, vec![3]);

        let mut requests: PartnershipRequests = HashMap::new();
        requests.insert(1, HashSet::from([2, 3]));
        requests.insert(2, HashSet::from([1]));
        // person 3 does not request 1 back -> one-sided.

        let (mutual_unique, mutual_repeat, one_sided) =
            partnership_fulfilment(&[e1, e2, e3], &requests);
        assert_eq!(mutual_unique, 1);
        assert_eq!(mutual_repeat, 1);
        assert_eq!(one_sided, 1);
    }
}
