//! The overlap trimmer (spec §4.3): when more candidate events survive
//! sanitisation than `max_events` allows, iteratively removes the event
//! whose attendee pool overlaps most with the others.

use crate::models::{Event, Person, SchedulerConfig};
use std::collections::HashMap;

fn shared_availability(a: &Event, b: &Event, people: &[Person]) -> usize {
    people
        .iter()
        .filter(|p| p.availability.contains(&a.id) && p.availability.contains(&b.id))
        .count()
}

/// `overlap(X) = sum over Y != X of shared(X, Y)`.
fn overlap_scores(events: &[Event], people: &[Person]) -> HashMap<u32, usize> {
    let mut scores: HashMap<u32, usize> = events.iter().map(|e| (e.id, 0)).collect();
    for i in 0..events.len() {
        for j in (i + 1)..events.len() {
            let shared = shared_availability(&events[i], &events[j], people);
            *scores.get_mut(&events[i].id).unwrap() += shared;
            *scores.get_mut(&events[j].id).unwrap() += shared;
        }
    }
    scores
}

fn summed_priority(event: &Event, people: &[Person]) -> i64 {
    people
        .iter()
        .filter(|p| p.availability.contains(&event.id))
        .map(|p| p.priority as i64)
        .sum()
}

/// Picks the single event to drop this step: maximum overlap, tiebroken by
/// minimum summed priority over its available people, tiebroken by lowest
/// id (spec §4.3 step 4).
fn find_event_to_remove(events: &[Event], people: &[Person]) -> usize {
    let scores = overlap_scores(events, people);
    let max_overlap = *scores.values().max().unwrap_or(&0);
    let candidates: Vec<&Event> = events
        .iter()
        .filter(|e| scores[&e.id] == max_overlap)
        .collect();

    let chosen_id = if candidates.len() == 1 {
        candidates[0].id
    } else {
        candidates
            .iter()
            .map(|e| (e.id, summed_priority(e, people)))
            .min_by_key(|&(id, priority)| (priority, id))
            .map(|(id, _)| id)
            .unwrap()
    };

    events.iter().position(|e| e.id == chosen_id).unwrap()
}

/// Removes events one at a time until `events.len() <= config.max_events`.
pub fn trim_overlap(mut events: Vec<Event>, people: &[Person], config: &SchedulerConfig) -> Vec<Event> {
    while events.len() > config.max_events {
        let idx = find_event_to_remove(&events, people);
        events.remove(idx);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, SwitchPreference};
    use std::collections::HashSet;

    fn person(id: u32, priority: i32, availability: &[u32]) -> Person {
        Person {
            id,
            full_name: format!("Person {id}"),
            display_name: format!("P{id}"),
            email: format!("p{id}@example.com"),
            primary_role: Role::Leader,
            switch_pref: SwitchPreference::PrimaryOnly,
            active: true,
            date_joined: "2024-01-01".to_string(),
            availability: availability.iter().copied().collect::<HashSet<_>>(),
            event_limit: 1,
            min_interval_days: 0,
            responded: true,
            priority,
            total_attended: 0,
            index: 0,
            num_events_this_period: 0,
            assigned_event_dates: Vec::new(),
            original_priority: 0,
        }
    }

    #[test]
    fn removes_highest_overlap_event_first() {
        let config = SchedulerConfig {
            max_events: 2,
            ..SchedulerConfig::default()
        };
        let events = vec![
            Event::new(1, 0, 90, &config),
            Event::new(2, 0, 90, &config),
            Event::new(3, 0, 90, &config),
        ];
        // Event 1 overlaps with both others on every person; events 2 and 3
        // share no one with each other.
        let people = vec![
            person(1, 0, &[1, 2]),
            person(2, 0, &[1, 3]),
            person(3, 0, &[1, 2, 3]),
        ];
        let survivors = trim_overlap(events, &people, &config);
        assert_eq!(survivors.len(), 2);
        assert!(!survivors.iter().any(|e| e.id == 1));
    }

    #[test]
    fn tiebreak_removes_lowest_summed_priority() {
        let config = SchedulerConfig {
            max_events: 1,
            ..SchedulerConfig::default()
        };
        let events = vec![Event::new(1, 0, 90, &config), Event::new(2, 0, 90, &config)];
        // With exactly two events, overlap(1) == overlap(2) == shared(1,2)
        // always, so this always falls to the priority tiebreak: event 2's
        // available people have lower summed priority and should go.
        let people = vec![person(1, 5, &[1, 2]), person(2, 1, &[1])];
        let survivors = trim_overlap(events, &people, &config);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, 1);
    }
}
