//! scheduler-cli: command-line entry point for the dance-practice
//! scheduling engine.
//!
//! # Commands
//!
//! - `run`: load a period's members/responses (+ optional cancellations/
//!   partnerships) and produce `results.json`.
//! - `apply-results`: fold an authoritative attendance record back into
//!   `members.csv`.
//! - `availability-report`: a read-only report of who responded, who has
//!   no availability, and who hasn't responded at all.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scheduler_core::engine::apply::{apply_results, responded_emails_from_rows, MemberRecord};
use scheduler_core::models::{Person, SchedulerConfig};
use scheduler_core::ScheduleOutcome;
use scheduler_io::cancellations::load_cancellations_json;
use scheduler_io::members::{load_members_csv, save_members_csv};
use scheduler_io::responses::load_responses_csv;
use scheduler_io::schedule::{load_actual_attendance_json, write_schedule_json};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scheduler-cli")]
#[command(author = "dance-practice-scheduler")]
#[command(version = "0.1.0")]
#[command(about = "Dance-practice session scheduler CLI", long_about = None)]
struct Cli {
    /// Increase log verbosity to debug.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a period's data and produce results.json.
    Run {
        /// Folder containing members.csv and responses.csv
        #[arg(long, value_name = "DIR")]
        data_folder: PathBuf,

        /// Override the default MAX_EVENTS trim threshold.
        #[arg(long)]
        max_events: Option<usize>,

        /// Optional cancellations.json
        #[arg(long, value_name = "FILE")]
        cancellations_file: Option<PathBuf>,

        /// Optional partnerships.json
        #[arg(long, value_name = "FILE")]
        partnerships_file: Option<PathBuf>,

        /// Index into a tied top tier, used when --non-interactive is set.
        #[arg(long, default_value_t = 0)]
        sequence_choice: usize,

        /// Auto-pick `--sequence-choice` instead of prompting on a tie.
        #[arg(long)]
        non_interactive: bool,

        /// Archive the chosen schedule into this sqlite history database.
        #[arg(long, value_name = "FILE", requires = "period_slug")]
        history_db: Option<PathBuf>,

        /// Slug to archive this period under (required with --history-db).
        #[arg(long, value_name = "SLUG")]
        period_slug: Option<String>,
    },

    /// Fold an authoritative attendance record back into members.csv.
    ApplyResults {
        /// Folder containing members.csv (and optionally responses.csv)
        #[arg(long, value_name = "DIR")]
        period_folder: PathBuf,

        /// Authoritative attendance JSON (defaults to results.json in the folder)
        #[arg(long, value_name = "FILE")]
        results_file: Option<PathBuf>,
    },

    /// Print who responded, who has no availability, and who hasn't responded.
    AvailabilityReport {
        /// Folder containing members.csv and responses.csv
        #[arg(long, value_name = "DIR")]
        data_folder: PathBuf,

        /// Optional cancellations.json
        #[arg(long, value_name = "FILE")]
        cancellations_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    match cli.command {
        Commands::Run {
            data_folder,
            max_events,
            cancellations_file,
            partnerships_file,
            sequence_choice,
            non_interactive,
            history_db,
            period_slug,
        } => cmd_run(
            &data_folder,
            max_events,
            cancellations_file.as_deref(),
            partnerships_file.as_deref(),
            sequence_choice,
            non_interactive,
            history_db.as_deref(),
            period_slug.as_deref(),
        ),

        Commands::ApplyResults {
            period_folder,
            results_file,
        } => cmd_apply_results(&period_folder, results_file.as_deref()),

        Commands::AvailabilityReport {
            data_folder,
            cancellations_file,
        } => cmd_availability_report(&data_folder, cancellations_file.as_deref()),
    }
}

fn cmd_run(
    data_folder: &Path,
    max_events: Option<usize>,
    cancellations_file: Option<&Path>,
    partnerships_file: Option<&Path>,
    sequence_choice: usize,
    non_interactive: bool,
    history_db: Option<&Path>,
    period_slug: Option<&str>,
) -> Result<()> {
    let members_path = data_folder.join("members.csv");
    let responses_path = data_folder.join("responses.csv");

    let mut config = SchedulerConfig::default();
    if let Some(max_events) = max_events {
        config.max_events = max_events;
    }

    let year = chrono::Utc::now().format("%Y").to_string().parse().unwrap_or(2025);
    let bundle = scheduler_io::load_period_bundle(
        &members_path,
        &responses_path,
        cancellations_file,
        partnerships_file,
        year,
        &config,
    )
    .with_context(|| format!("failed to load period data from {}", data_folder.display()))?;

    tracing::info!(
        people = bundle.people.len(),
        events = bundle.events.len(),
        "loaded period bundle"
    );

    let outcome = scheduler_core::run_schedule(bundle.people.clone(), bundle.events, &bundle.partnerships, &config)
        .context("scheduler rejected the input data")?;

    let top_tier = match outcome {
        ScheduleOutcome::Found { top_tier } => top_tier,
        ScheduleOutcome::Empty { diagnostic } => {
            anyhow::bail!("no valid schedule found: {diagnostic}");
        }
    };

    tracing::info!(tied = top_tier.len(), "search complete");

    let chosen = if top_tier.len() == 1 {
        &top_tier[0]
    } else if non_interactive {
        top_tier
            .get(sequence_choice)
            .with_context(|| format!("--sequence-choice {sequence_choice} is out of range (0..{})", top_tier.len()))?
    } else {
        let index = prompt_for_choice(top_tier.len())?;
        &top_tier[index]
    };

    let results_path = data_folder.join("results.json");
    write_schedule_json(chosen, &bundle.people, &results_path)
        .with_context(|| format!("failed to write {}", results_path.display()))?;

    println!("Wrote {}", results_path.display());

    if let (Some(history_db), Some(period_slug)) = (history_db, period_slug) {
        let member_records: Vec<MemberRecord> = bundle.people.iter().map(person_to_member_record).collect();
        let store = scheduler_history::HistoryStore::open(history_db)
            .with_context(|| format!("failed to open history database {}", history_db.display()))?;
        store
            .record_period(period_slug, &member_records, chosen)
            .with_context(|| format!("failed to archive period '{period_slug}'"))?;
        println!("Archived period '{period_slug}' into {}", history_db.display());
    }

    Ok(())
}

/// Prompts on stdin/stdout for which of `count` tied schedules to keep,
/// grounded on `src/peeps_scheduler/main.py`'s interactive tie-break.
fn prompt_for_choice(count: usize) -> Result<usize> {
    loop {
        print!("{count} schedules tied for first place. Pick one [0-{}]: ", count - 1);
        io::stdout().flush().ok();
        let mut line = String::new();
        io::stdin().read_line(&mut line).context("failed to read choice from stdin")?;
        match line.trim().parse::<usize>() {
            Ok(choice) if choice < count => return Ok(choice),
            _ => println!("Enter a number between 0 and {}.", count - 1),
        }
    }
}

fn cmd_apply_results(period_folder: &Path, results_file: Option<&Path>) -> Result<()> {
    let members_path = period_folder.join("members.csv");
    let responses_path = period_folder.join("responses.csv");
    let results_path = results_file
        .map(PathBuf::from)
        .unwrap_or_else(|| period_folder.join("results.json"));

    let members = load_members_csv(&members_path)
        .with_context(|| format!("failed to load {}", members_path.display()))?;

    let responded_emails = if responses_path.exists() {
        let responses = load_responses_csv(&responses_path)
            .with_context(|| format!("failed to load {}", responses_path.display()))?;
        responded_emails_from_rows(responses.iter().map(|r| r.email.as_str()))
    } else {
        tracing::warn!("no responses.csv found in {}; nobody will be marked as responded", period_folder.display());
        Default::default()
    };

    let attendance = load_actual_attendance_json(&results_path)
        .with_context(|| format!("failed to load {}", results_path.display()))?;

    let updated_people = apply_results(&members, &responded_emails, &attendance);
    let updated_members: Vec<MemberRecord> = updated_people.iter().map(person_to_member_record).collect();

    save_members_csv(&updated_members, &members_path)
        .with_context(|| format!("failed to write {}", members_path.display()))?;

    println!(
        "Updated {} member record(s) in {}",
        updated_members.len(),
        members_path.display()
    );
    Ok(())
}

/// The Results Applier hands back a full [`Person`] (it runs the §4.6
/// finaliser); only the canonical cross-period fields get persisted.
fn person_to_member_record(person: &Person) -> MemberRecord {
    MemberRecord {
        id: person.id,
        full_name: person.full_name.clone(),
        display_name: person.display_name.clone(),
        email: person.email.clone(),
        primary_role: person.primary_role,
        index: person.index,
        priority: person.priority,
        total_attended: person.total_attended,
        active: person.active,
        date_joined: person.date_joined.clone(),
    }
}

fn cmd_availability_report(data_folder: &Path, cancellations_file: Option<&Path>) -> Result<()> {
    let members_path = data_folder.join("members.csv");
    let responses_path = data_folder.join("responses.csv");

    let cancellations = match cancellations_file {
        Some(path) => load_cancellations_json(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Default::default(),
    };

    let report = scheduler_io::availability_report::build_availability_report(
        &members_path,
        &responses_path,
        &cancellations,
    )
    .with_context(|| format!("failed to build availability report from {}", data_folder.display()))?;

    for (date, availability) in &report.by_date {
        println!("{date}:");
        println!("  leaders:   {}", availability.leaders.join(", "));
        println!("  followers: {}", availability.followers.join(", "));
        if !availability.leader_fill.is_empty() {
            println!("  leader-fill:   {}", availability.leader_fill.join(", "));
        }
        if !availability.follower_fill.is_empty() {
            println!("  follower-fill: {}", availability.follower_fill.join(", "));
        }
    }

    if !report.no_availability.is_empty() {
        println!("\nResponded with no usable availability: {}", report.no_availability.join(", "));
    }
    if !report.non_responders.is_empty() {
        println!("\nHave not responded: {}", report.non_responders.join(", "));
    }

    Ok(())
}
