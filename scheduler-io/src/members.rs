//! Members record CSV I/O (spec §6, SPEC_FULL §4.11), grounded on
//! `original_source/tests/test_peep.py::TestDataConversion` for the exact
//! column set and round-trip shape.

use crate::error::{IoError, Result};
use scheduler_core::engine::apply::MemberRecord;
use scheduler_core::error::SchedulerError;
use scheduler_core::models::{PersonId, Role};
use serde::Deserialize;
use std::path::Path;

/// One row of `members.csv`: `id, Name, Display Name, Email Address, Role,
/// Index, Priority, Total Attended, Active, Date Joined`.
#[derive(Debug, Clone, Deserialize)]
struct MemberRow {
    #[serde(rename = "id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Display Name")]
    display_name: String,
    #[serde(rename = "Email Address")]
    email: String,
    #[serde(rename = "Role")]
    role: String,
    #[serde(rename = "Index")]
    index: String,
    #[serde(rename = "Priority")]
    priority: String,
    #[serde(rename = "Total Attended")]
    total_attended: String,
    #[serde(rename = "Active")]
    active: String,
    #[serde(rename = "Date Joined")]
    date_joined: String,
}

fn parse_bool(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn parse_member_row(row: MemberRow, path: &str, line: usize) -> Result<MemberRecord> {
    if row.id.trim().is_empty() {
        return Err(SchedulerError::MissingPersonId(row.name.clone()).into());
    }
    let id: PersonId = row.id.trim().parse().map_err(|_| IoError::InvalidValue {
        path: path.to_string(),
        row: line,
        column: "id",
        value: row.id.clone(),
        reason: "not an integer".to_string(),
    })?;
    if row.role.trim().is_empty() {
        return Err(SchedulerError::MissingPersonRole {
            id: row.id.clone(),
        }
        .into());
    }
    let primary_role = Role::parse(&row.role)?;

    let parse_u32 = |field: &str, column: &'static str| -> Result<u32> {
        field.trim().parse().map_err(|_| IoError::InvalidValue {
            path: path.to_string(),
            row: line,
            column,
            value: field.to_string(),
            reason: "not an integer".to_string(),
        })
    };
    let parse_i32 = |field: &str, column: &'static str| -> Result<i32> {
        field.trim().parse().map_err(|_| IoError::InvalidValue {
            path: path.to_string(),
            row: line,
            column,
            value: field.to_string(),
            reason: "not an integer".to_string(),
        })
    };

    Ok(MemberRecord {
        id,
        full_name: row.name,
        display_name: row.display_name,
        email: row.email,
        primary_role,
        index: parse_u32(&row.index, "Index")?,
        priority: parse_i32(&row.priority, "Priority")?,
        total_attended: parse_u32(&row.total_attended, "Total Attended")?,
        active: parse_bool(&row.active),
        date_joined: row.date_joined,
    })
}

/// Loads `members.csv` into canonical member records, duplicate-id checked
/// (spec §3 I1).
pub fn load_members_csv(path: impl AsRef<Path>) -> Result<Vec<MemberRecord>> {
    let path_str = path.as_ref().display().to_string();
    let mut reader = csv::Reader::from_path(&path).map_err(|source| IoError::Csv {
        path: path_str.clone(),
        source,
    })?;

    let mut records = Vec::new();
    let mut seen_ids = std::collections::HashSet::new();
    for (i, result) in reader.deserialize::<MemberRow>().enumerate() {
        let row = result.map_err(|source| {
            log::warn!("{path_str}: malformed row {}: {source}", i + 2);
            IoError::Csv {
                path: path_str.clone(),
                source,
            }
        })?;
        let record = parse_member_row(row, &path_str, i + 2)?;
        if !seen_ids.insert(record.id) {
            log::error!("{path_str}: duplicate person id {}", record.id);
            return Err(SchedulerError::DuplicatePersonId(record.id).into());
        }
        records.push(record);
    }
    Ok(records)
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Leader => "Leader",
        Role::Follower => "Follower",
    }
}

/// Writes the same column set back out (round-trip integrity is a tested
/// property: `original_source/tests/test_peep.py::test_to_csv_roundtrip_integrity`).
pub fn save_members_csv(records: &[MemberRecord], path: impl AsRef<Path>) -> Result<()> {
    let path_str = path.as_ref().display().to_string();
    let mut writer = csv::Writer::from_path(&path).map_err(|source| IoError::Csv {
        path: path_str.clone(),
        source,
    })?;

    writer
        .write_record([
            "id",
            "Name",
            "Display Name",
            "Email Address",
            "Role",
            "Index",
            "Priority",
            "Total Attended",
            "Active",
            "Date Joined",
        ])
        .map_err(|source| IoError::Csv {
            path: path_str.clone(),
            source,
        })?;

    for record in records {
        writer
            .write_record([
                record.id.to_string(),
                record.full_name.clone(),
                record.display_name.clone(),
                record.email.clone(),
                role_to_str(record.primary_role).to_string(),
                record.index.to_string(),
                record.priority.to_string(),
                record.total_attended.to_string(),
                record.active.to_string().to_uppercase(),
                record.date_joined.clone(),
            ])
            .map_err(|source| IoError::Csv {
                path: path_str.clone(),
                source,
            })?;
    }
    writer.flush().map_err(|source| IoError::Write {
        path: path_str,
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_typical_member_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("members.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "id,Name,Display Name,Email Address,Role,Index,Priority,Total Attended,Active,Date Joined"
        )
        .unwrap();
        writeln!(
            f,
            "42,Alice Alpha,Alice,alice@test.com,Leader,5,3,7,TRUE,2022-01-01"
        )
        .unwrap();

        let members = load_members_csv(&path).unwrap();
        assert_eq!(members.len(), 1);
        let m = &members[0];
        assert_eq!(m.id, 42);
        assert_eq!(m.full_name, "Alice Alpha");
        assert_eq!(m.display_name, "Alice");
        assert_eq!(m.email, "alice@test.com");
        assert_eq!(m.primary_role, Role::Leader);
        assert_eq!(m.index, 5);
        assert_eq!(m.priority, 3);
        assert_eq!(m.total_attended, 7);
        assert!(m.active);
        assert_eq!(m.date_joined, "2022-01-01");
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("members.csv");
        let original = vec![MemberRecord {
            id: 123,
            full_name: "Bob Beta".to_string(),
            display_name: "Bob".to_string(),
            email: "bob@test.com".to_string(),
            primary_role: Role::Follower,
            index: 2,
            priority: 1,
            total_attended: 4,
            active: false,
            date_joined: "2023-05-15".to_string(),
        }];
        save_members_csv(&original, &path).unwrap();
        let recreated = load_members_csv(&path).unwrap();
        assert_eq!(recreated.len(), 1);
        assert_eq!(recreated[0].id, original[0].id);
        assert_eq!(recreated[0].full_name, original[0].full_name);
        assert_eq!(recreated[0].primary_role, original[0].primary_role);
        assert_eq!(recreated[0].active, original[0].active);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("members.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "id,Name,Display Name,Email Address,Role,Index,Priority,Total Attended,Active,Date Joined"
        )
        .unwrap();
        writeln!(f, "1,A,A,a@test.com,Leader,0,0,0,TRUE,2024-01-01").unwrap();
        writeln!(f, "1,B,B,b@test.com,Follower,1,0,0,TRUE,2024-01-01").unwrap();

        let err = load_members_csv(&path).unwrap_err();
        assert!(matches!(
            err,
            IoError::Domain(SchedulerError::DuplicatePersonId(1))
        ));
    }
}
