//! The assignment pass (spec §4.5): for one event ordering and one
//! `target_max` cap, greedily fills every event in sequence, promoting
//! alternates where needed, balancing and possibly downgrading overfull or
//! underfull events, then committing or dropping each one before moving to
//! the next. Person state (`num_events_this_period`, `assigned_event_dates`)
//! updates on commit, so an earlier event in the ordering can block a later
//! one — this is why the permutation walker must consider every ordering.

use super::constraints::can_attend;
use crate::models::{Event, Person, PersonId, Role, SchedulerConfig, SwitchPreference};
use std::collections::HashMap;

fn effective_max(event: &Event, target_max: u32) -> usize {
    event.max_role.min(target_max) as usize
}

/// Step A: primary pass over people in their current vector order.
fn primary_pass(event: &mut Event, people: &[Person], target_max: u32) {
    let cap = effective_max(event, target_max);
    for person in people {
        if !can_attend(person, event) {
            continue;
        }
        let primary = person.primary_role;
        if event.attendee_count(primary) < cap {
            event.attendees.get_mut(&primary).unwrap().push(person.id);
        } else if person.switch_pref == SwitchPreference::SwitchIfPrimaryFull
            && event.attendee_count(primary.opposite()) < cap
        {
            event
                .attendees
                .get_mut(&primary.opposite())
                .unwrap()
                .push(person.id);
        } else {
            event.alternates.get_mut(&primary).unwrap().push(person.id);
        }
    }
}

/// Step B: promote `SwitchIfNeeded` alternates from the opposite role's
/// alternate list to rescue an underfilled role.
fn needed_switch_promotion(
    event: &mut Event,
    people: &[Person],
    id_to_idx: &HashMap<PersonId, usize>,
    target_max: u32,
) {
    let cap = effective_max(event, target_max);
    for &role in &[Role::Leader, Role::Follower] {
        let opposite = role.opposite();
        while event.attendee_count(role) < event.min_role as usize {
            let candidate_pos = event
                .alternates
                .get(&opposite)
                .unwrap()
                .iter()
                .position(|pid| people[id_to_idx[pid]].switch_pref == SwitchPreference::SwitchIfNeeded);

            let Some(pos) = candidate_pos else { break };
            if event.attendee_count(role) >= cap {
                break;
            }
            let pid = event.alternates.get_mut(&opposite).unwrap().remove(pos);
            event.attendees.get_mut(&role).unwrap().push(pid);
        }
    }
}

/// Step C: while both roles are above the absolute minimum, demote the
/// most-recently-added attendee from the over-filled role until the roles
/// are equal or the over-filled role hits its own `min_role` floor. Then, if
/// the event still doesn't meet its duration-derived minimum, downgrade the
/// duration and re-evaluate.
fn balance_and_downgrade(event: &mut Event, config: &SchedulerConfig) {
    if !event.meets_absolute_min(config) {
        return;
    }
    loop {
        let leader_count = event.attendee_count(Role::Leader);
        let follower_count = event.attendee_count(Role::Follower);
        let (over, over_count, under_count) = if leader_count > follower_count {
            (Role::Leader, leader_count, follower_count)
        } else if follower_count > leader_count {
            (Role::Follower, follower_count, leader_count)
        } else {
            break;
        };
        if over_count <= under_count || over_count <= event.min_role as usize {
            break;
        }
        let demoted = event.attendees.get_mut(&over).unwrap().pop().unwrap();
        event.alternates.get_mut(&over).unwrap().push(demoted);
    }

    while !event.meets_min() {
        if !event.downgrade_duration(config) {
            break;
        }
    }
}

/// Step D: commit a valid event's attendees into their person-state, or
/// clear the event entirely.
fn commit_or_abort(event: &mut Event, people: &mut [Person], id_to_idx: &HashMap<PersonId, usize>) {
    if event.meets_min() {
        for role in [Role::Leader, Role::Follower] {
            for &pid in event.attendees.get(&role).unwrap() {
                let person = &mut people[id_to_idx[&pid]];
                person.num_events_this_period += 1;
                person.assigned_event_dates.push(event.date);
            }
        }
    } else {
        event.clear_participants();
    }
}

/// Runs the assignment pass for one ordering against one `target_max` cap.
/// `people` carries cross-ordering-fresh transient state and is mutated in
/// place; `events` is the trimmed, sanitised candidate set and `ordering`
/// gives the processing sequence as indices into it. Returns the events that
/// ended up valid, in processing order.
pub fn run_assignment_pass(
    people: &mut [Person],
    events: &[Event],
    ordering: &[usize],
    target_max: u32,
    config: &SchedulerConfig,
) -> Vec<Event> {
    let id_to_idx: HashMap<PersonId, usize> =
        people.iter().enumerate().map(|(i, p)| (p.id, i)).collect();

    let mut working: Vec<Event> = ordering.iter().map(|&i| events[i].clone()).collect();

    for event in working.iter_mut() {
        primary_pass(event, people, target_max);
        needed_switch_promotion(event, people, &id_to_idx, target_max);
        balance_and_downgrade(event, config);
        commit_or_abort(event, people, &id_to_idx);
    }

    validate_alternates(&mut working, people);

    working.into_iter().filter(|e| e.meets_min()).collect()
}

/// Step E: after every event in the ordering has been processed, re-check
/// each remaining alternate against `can_attend` using the now-settled
/// person state and drop any who became ineligible — e.g. by hitting their
/// `event_limit` or violating spacing because of an event later in the
/// ordering.
fn validate_alternates(events: &mut [Event], people: &[Person]) {
    for event in events.iter_mut() {
        if !event.meets_min() {
            continue;
        }
        for role in [Role::Leader, Role::Follower] {
            let event_ref: &Event = event;
            let survivors: Vec<PersonId> = event_ref
                .alternates
                .get(&role)
                .unwrap()
                .iter()
                .copied()
                .filter(|pid| {
                    let idx = people.iter().position(|p| p.id == *pid).unwrap();
                    can_attend(&people[idx], event_ref)
                })
                .collect();
            event.alternates.insert(role, survivors);
        }
    }
}
