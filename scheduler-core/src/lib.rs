//! # Scheduler-Core: Dance-Practice Session Scheduling Engine
//!
//! This crate assigns a roster of people to a set of candidate timed
//! sessions, subject to per-person role identity, availability, session
//! caps, minimum spacing, and per-event role balance. It chooses the
//! assignment that maximises distinct attendance, favours people passed
//! over in prior periods, and satisfies pairing preferences where possible.
//!
//! The crate performs no I/O. Callers (see `scheduler-io`, `scheduler-cli`)
//! are responsible for loading the `{people, events, partnerships}` bundle
//! and for persisting the resulting [`models::Schedule`] and updated people
//! vector.
//!
//! ## Quick Example
//!
//! ```no_run
//! use scheduler_core::{run_schedule, models::*};
//! use std::collections::HashMap;
//!
//! # fn load_people() -> Vec<Person> { vec![] }
//! # fn load_events() -> Vec<Event> { vec![] }
//! let people = load_people();
//! let events = load_events();
//! let partnerships = HashMap::new();
//! let config = SchedulerConfig::default();
//!
//! match run_schedule(people, events, &partnerships, &config) {
//!     Ok(ScheduleOutcome::Found { top_tier }) => {
//!         println!("{} schedules tied for first", top_tier.len());
//!     }
//!     Ok(ScheduleOutcome::Empty { diagnostic }) => {
//!         println!("no valid schedule: {diagnostic}");
//!     }
//!     Err(e) => eprintln!("input error: {e}"),
//! }
//! ```

pub mod engine;
pub mod error;
pub mod models;

use engine::{assign, finalize, overlap, permute, rank, sanitize};
use error::Result;
use models::{PartnershipRequests, Person, Schedule, SchedulerConfig};

/// The non-error result of running the scheduler.
///
/// Search-empty (no ordering produced any valid event, across every cap and
/// every ordering) is a distinct, non-fatal outcome, not an error: the
/// caller receives a diagnostic and no schedule is emitted (spec §7).
#[derive(Debug, Clone)]
pub enum ScheduleOutcome {
    /// The deduped set of schedules tying on the full six-key ranking
    /// tuple. Never empty.
    Found { top_tier: Vec<Schedule> },
    /// No ordering, under any evaluated `target_max`, produced a single
    /// valid event.
    Empty { diagnostic: String },
}

/// Runs the full outer search loop (spec §2, §4.4–§4.9): sanitise, trim,
/// then for every `target_max` in `[config.abs_min_role, config.abs_max_role]`
/// evaluate every ordering of the trimmed event set, finalise and score each
/// one, pool the results across caps, dedup, and return the top tier.
///
/// `people` and `events` are consumed; this function clones them internally
/// once per (cap, ordering) pair so that the search never mutates shared
/// state. Evaluation units are independent and are distributed across a
/// scoped thread pool (spec §5: "embarrassingly parallel, no shared mutable
/// data across workers").
pub fn run_schedule(
    people: Vec<Person>,
    events: Vec<models::Event>,
    partnerships: &PartnershipRequests,
    config: &SchedulerConfig,
) -> Result<ScheduleOutcome> {
    let sanitized = sanitize::sanitize_events(events, &people, config);
    let trimmed = overlap::trim_overlap(sanitized, &people, config);

    if trimmed.is_empty() {
        return Ok(ScheduleOutcome::Empty {
            diagnostic: "no candidate events survived sanitisation and trimming".to_string(),
        });
    }

    let orderings = permute::permutation_indices(trimmed.len());
    let caps: Vec<u32> = (config.abs_min_role..=config.abs_max_role).collect();

    let schedules = evaluate_all(&people, &trimmed, &orderings, &caps, partnerships, config);

    if schedules.is_empty() {
        return Ok(ScheduleOutcome::Empty {
            diagnostic: format!(
                "no ordering produced a valid event across {} cap(s) x {} ordering(s)",
                caps.len(),
                orderings.len()
            ),
        });
    }

    let top_tier = rank::top_tier(schedules);
    Ok(ScheduleOutcome::Found { top_tier })
}

/// Evaluates every (cap, ordering) pair, each against a fresh clone of
/// `people` and `trimmed`, across a scoped thread pool sized to the
/// available parallelism. Each worker thread owns its slice of work and
/// returns fully-formed `Schedule`s; there is no shared mutable state to
/// synchronise (spec §5).
fn evaluate_all(
    people: &[Person],
    trimmed: &[models::Event],
    orderings: &[Vec<usize>],
    caps: &[u32],
    partnerships: &PartnershipRequests,
    config: &SchedulerConfig,
) -> Vec<Schedule> {
    let units: Vec<(u32, &Vec<usize>)> = caps
        .iter()
        .flat_map(|&cap| orderings.iter().map(move |ordering| (cap, ordering)))
        .collect();

    let worker_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(units.len().max(1));

    if worker_count <= 1 || units.len() <= 1 {
        return units
            .iter()
            .filter_map(|&(cap, ordering)| {
                evaluate_one(people, trimmed, ordering, cap, partnerships, config)
            })
            .collect();
    }

    let chunk_size = units.len().div_ceil(worker_count);
    std::thread::scope(|scope| {
        let handles: Vec<_> = units
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(|| {
                    chunk
                        .iter()
                        .filter_map(|&(cap, ordering)| {
                            evaluate_one(people, trimmed, ordering, cap, partnerships, config)
                        })
                        .collect::<Vec<Schedule>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().expect("scheduling worker thread panicked"))
            .collect()
    })
}

/// One (cap, ordering) evaluation unit: clone people, run the assignment
/// pass, finalise, and compute metrics. Returns `None` if the ordering
/// produced no valid events (nothing to rank).
fn evaluate_one(
    people: &[Person],
    trimmed: &[models::Event],
    ordering: &[usize],
    target_max: u32,
    partnerships: &PartnershipRequests,
    config: &SchedulerConfig,
) -> Option<Schedule> {
    let mut people = people.to_vec();
    for person in people.iter_mut() {
        person.reset_transient();
    }

    let valid_events = assign::run_assignment_pass(&mut people, trimmed, ordering, target_max, config);
    if valid_events.is_empty() {
        return None;
    }

    finalize::finalize_people(&mut people);
    let metrics = finalize::compute_metrics(&people, &valid_events, partnerships);

    Some(Schedule {
        valid_events,
        metrics,
    })
}
