//! Period history archive: persisting each period's canonical members
//! snapshot and chosen schedule, and reconstructing a prior period for use
//! as spacing/assignment context.
//!
//! Grounded on `chzelada-people_scheduler/src-tauri/src/db/connection.rs`'s
//! migration-table pattern (`_migrations` table, `include_str!` SQL files
//! applied idempotently inside a version check loop) and on
//! `original_source/src/peeps_scheduler/db/migrate.py`,
//! `db/snapshot_generator.py`, and `db/import_period_data.py`.
//!
//! Unlike `scheduler_core::models::SchedulerConfig`, which is threaded
//! explicitly through the call chain, the sqlite connection here is a
//! genuine process-wide singleton — one file, one connection — so it uses
//! an `once_cell` + `parking_lot` global-connection pattern rather than
//! being passed around by value.

use crate::error::{HistoryError, Result};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rusqlite::Connection;
use scheduler_core::engine::apply::MemberRecord;
use scheduler_core::models::{EventId, PersonId, Role, Schedule};
use std::path::{Path, PathBuf};

static DB_CONNECTION: OnceCell<Mutex<Connection>> = OnceCell::new();

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema",
    include_str!("../migrations/001_initial_schema.sql"),
)];

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Leader => "Leader",
        Role::Follower => "Follower",
    }
}

fn role_from_str(raw: &str) -> Role {
    match raw {
        "Follower" => Role::Follower,
        _ => Role::Leader,
    }
}

/// One event's committed membership, reconstructed from the archive.
#[derive(Debug, Clone)]
pub struct PeriodEventRecord {
    pub id: EventId,
    pub date: i64,
    pub duration_minutes: u32,
    pub attendees: Vec<(PersonId, Role)>,
}

/// The reconstruction of one prior period: its canonical members (the
/// outgoing state of the §4.6/§4.10 finaliser) plus the events it actually
/// ran, for use as `recent_assignments`-style spacing context by a caller
/// wiring up the next period (grounded on `db/import_period_data.py`).
#[derive(Debug, Clone)]
pub struct PeriodSnapshot {
    pub slug: String,
    pub members: Vec<MemberRecord>,
    pub events: Vec<PeriodEventRecord>,
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT DEFAULT CURRENT_TIMESTAMP
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM _migrations WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;
        if count == 0 {
            conn.execute_batch(sql)?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
        }
    }
    Ok(())
}

/// A handle onto the process-wide history connection. Constructing one
/// opens (creating if absent) the sqlite file at `path` and runs any
/// pending migrations; a second `open` call in the same process is a
/// programming error, matching `connection.rs::init_db`'s
/// `expect("Database already initialized")`.
pub struct HistoryStore {
    _private: (),
}

impl HistoryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        run_migrations(&conn)?;
        DB_CONNECTION
            .set(Mutex::new(conn))
            .map_err(|_| HistoryError::AlreadyInitialized)?;
        Ok(HistoryStore { _private: () })
    }

    fn connection() -> Result<&'static Mutex<Connection>> {
        DB_CONNECTION.get().ok_or(HistoryError::NotInitialized)
    }

    /// Persists a period's canonical members snapshot and chosen schedule,
    /// grounded on `db/snapshot_generator.py`.
    pub fn record_period(&self, slug: &str, members: &[MemberRecord], schedule: &Schedule) -> Result<()> {
        let conn = Self::connection()?.lock();
        let recorded_at = chrono::Utc::now().to_rfc3339();

        conn.execute(
            "INSERT OR REPLACE INTO periods (slug, recorded_at) VALUES (?1, ?2)",
            rusqlite::params![slug, recorded_at],
        )?;

        conn.execute(
            "DELETE FROM member_snapshots WHERE period_slug = ?1",
            [slug],
        )?;
        for member in members {
            conn.execute(
                "INSERT INTO member_snapshots
                    (period_slug, person_id, full_name, display_name, email, primary_role, idx, priority, total_attended, active, date_joined)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    slug,
                    member.id,
                    member.full_name,
                    member.display_name,
                    member.email,
                    role_to_str(member.primary_role),
                    member.index,
                    member.priority,
                    member.total_attended,
                    member.active,
                    member.date_joined,
                ],
            )?;
        }

        conn.execute("DELETE FROM schedule_events WHERE period_slug = ?1", [slug])?;
        conn.execute(
            "DELETE FROM schedule_attendees WHERE period_slug = ?1",
            [slug],
        )?;
        for event in &schedule.valid_events {
            conn.execute(
                "INSERT INTO schedule_events (period_slug, event_id, event_date, duration_minutes)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![slug, event.id, event.date, event.duration_minutes],
            )?;
            for role in [Role::Leader, Role::Follower] {
                for &person_id in event.attendees.get(&role).into_iter().flatten() {
                    conn.execute(
                        "INSERT INTO schedule_attendees (period_slug, event_id, person_id, role)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![slug, event.id, person_id, role_to_str(role)],
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Reconstructs a prior period's members and the events it actually
    /// ran, grounded on `db/import_period_data.py`'s period-by-period
    /// reconstruction.
    pub fn import_period(&self, slug: &str) -> Result<PeriodSnapshot> {
        let conn = Self::connection()?.lock();

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM periods WHERE slug = ?1",
            [slug],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(HistoryError::UnknownPeriod(slug.to_string()));
        }

        let mut member_stmt = conn.prepare(
            "SELECT person_id, full_name, display_name, email, primary_role, idx, priority, total_attended, active, date_joined
             FROM member_snapshots WHERE period_slug = ?1 ORDER BY idx",
        )?;
        let members = member_stmt
            .query_map([slug], |row| {
                Ok(MemberRecord {
                    id: row.get(0)?,
                    full_name: row.get(1)?,
                    display_name: row.get(2)?,
                    email: row.get(3)?,
                    primary_role: role_from_str(&row.get::<_, String>(4)?),
                    index: row.get(5)?,
                    priority: row.get(6)?,
                    total_attended: row.get(7)?,
                    active: row.get(8)?,
                    date_joined: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut event_stmt = conn.prepare(
            "SELECT event_id, event_date, duration_minutes FROM schedule_events WHERE period_slug = ?1 ORDER BY event_id",
        )?;
        let mut events: Vec<PeriodEventRecord> = event_stmt
            .query_map([slug], |row| {
                Ok(PeriodEventRecord {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    duration_minutes: row.get(2)?,
                    attendees: Vec::new(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut attendee_stmt = conn.prepare(
            "SELECT event_id, person_id, role FROM schedule_attendees WHERE period_slug = ?1",
        )?;
        let attendee_rows = attendee_stmt
            .query_map([slug], |row| {
                Ok((
                    row.get::<_, EventId>(0)?,
                    row.get::<_, PersonId>(1)?,
                    role_from_str(&row.get::<_, String>(2)?),
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (event_id, person_id, role) in attendee_rows {
            if let Some(event) = events.iter_mut().find(|e| e.id == event_id) {
                event.attendees.push((person_id, role));
            }
        }

        Ok(PeriodSnapshot {
            slug: slug.to_string(),
            members,
            events,
        })
    }

    /// Copies the sqlite file to `dest_dir` with a timestamped name,
    /// grounded on `db/backup.py::backup`. No retention/rotation policy —
    /// the caller decides what to do with old backups (spec §5: "log
    /// rotation ... out of scope" is carried forward to backup retention).
    pub fn backup(&self, source_path: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let source_path = source_path.as_ref();
        let dest_dir = dest_dir.as_ref();
        std::fs::create_dir_all(dest_dir).map_err(|source| HistoryError::Backup {
            path: dest_dir.display().to_string(),
            source,
        })?;
        let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let dest_path = dest_dir.join(format!("{timestamp}_backup.db"));
        std::fs::copy(source_path, &dest_path).map_err(|source| HistoryError::Backup {
            path: dest_path.display().to_string(),
            source,
        })?;
        Ok(dest_path)
    }
}
