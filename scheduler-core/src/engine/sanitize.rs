//! The event sanitiser (spec §4.2): drops events that cannot possibly meet
//! the absolute minimum regardless of ordering.

use crate::models::{Event, Person, Role, SchedulerConfig};

/// "Available" here ignores `event_limit` and `min_interval_days` — it is a
/// necessary feasibility check on raw availability, not the full
/// [`crate::engine::constraints::can_attend`] predicate.
fn available_count(event: &Event, people: &[Person], role: Role) -> usize {
    people
        .iter()
        .filter(|p| p.primary_role == role && p.availability.contains(&event.id))
        .count()
}

/// Drops any event whose available-leader or available-follower count is
/// below `config.abs_min_role`. Order of the surviving events is preserved.
pub fn sanitize_events(events: Vec<Event>, people: &[Person], config: &SchedulerConfig) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| {
            available_count(event, people, Role::Leader) >= config.abs_min_role as usize
                && available_count(event, people, Role::Follower) >= config.abs_min_role as usize
        })
        .collect()
}
