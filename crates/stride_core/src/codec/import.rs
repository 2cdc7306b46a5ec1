//! JSON import with id-based deduplication.
//!
//! # Responsibility
//! - Parse a previously exported JSON document back into entries.
//! - Skip records whose id already exists, keeping the first occurrence.
//!
//! # Invariants
//! - Parse-then-apply: the whole document is decoded before any row is
//!   written, and all inserts share one transaction. A failed import leaves
//!   the store untouched.
//! - Importing the same document twice imports nothing the second time.
//! - A decodable record that fails domain validation is skipped and counted,
//!   never a reason to abort the rest of the restore.

use crate::codec::iso_to_epoch_ms;
use crate::codec::wire::{parse_side_label_lenient, ExportDocument, WireEntry};
use crate::model::entry::{
    ActivityType, EntryId, EntryKind, InjuryCheckIn, JournalEntry, Sport,
};
use crate::repo::entry_repo::{ensure_entry_connection_ready, insert_entry, RepoError};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Outcome counters for one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    /// Entries written to the store.
    pub imported: usize,
    /// Entries skipped because their id was already present, either in the
    /// store or earlier in the same document.
    pub duplicates: usize,
    /// Decodable entries dropped because they fail domain validation,
    /// e.g. a legacy record with an empty title.
    pub skipped: usize,
}

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug)]
pub enum ImportError {
    /// The document is not valid JSON or not the expected shape.
    Parse(serde_json::Error),
    /// One record is malformed beyond what lenient parsing tolerates.
    InvalidEntry { id: String, reason: String },
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse import document: {err}"),
            Self::InvalidEntry { id, reason } => {
                write!(f, "invalid imported entry `{id}`: {reason}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidEntry { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Imports an exported JSON document into the store behind `conn`.
///
/// Inlined photo attachments in the document are ignored: imported entries
/// start with an empty photo set, matching the historical importer.
pub fn import_json(conn: &mut Connection, json: &str) -> ImportResult<ImportSummary> {
    ensure_entry_connection_ready(conn)?;

    let document: ExportDocument = serde_json::from_str(json)?;

    let mut seen = existing_entry_ids(conn)?;
    let mut pending: Vec<JournalEntry> = Vec::new();
    let mut duplicates = 0usize;
    let mut skipped = 0usize;

    for wire in &document.entries {
        let entry = entry_from_wire(wire)?;
        if !seen.insert(entry.id) {
            duplicates += 1;
            continue;
        }
        // Legacy backups may hold records current validation would refuse
        // to create; drop those and keep restoring the rest.
        if let Err(err) = entry.validate() {
            warn!(
                "event=import module=codec status=skip id={} error={err}",
                wire.id
            );
            skipped += 1;
            continue;
        }
        pending.push(entry);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for entry in &pending {
        insert_entry(&tx, entry)?;
    }
    tx.commit().map_err(RepoError::from)?;

    let summary = ImportSummary {
        imported: pending.len(),
        duplicates,
        skipped,
    };
    info!(
        "event=import module=codec status=ok imported={} duplicates={} skipped={}",
        summary.imported, summary.duplicates, summary.skipped
    );
    Ok(summary)
}

fn existing_entry_ids(conn: &Connection) -> ImportResult<HashSet<EntryId>> {
    let mut stmt = conn.prepare("SELECT id FROM entries;")?;
    let mut rows = stmt.query([])?;
    let mut ids = HashSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.insert(parse_entry_id(&value)?);
    }
    Ok(ids)
}

fn entry_from_wire(wire: &WireEntry) -> ImportResult<JournalEntry> {
    let id = parse_entry_id(&wire.id)?;
    let date = parse_date(&wire.date, &wire.id, "date")?;

    // Unknown subtype labels degrade to Other so newer exports still load.
    let activity_type = ActivityType::parse_label_lenient(&wire.activity_type);

    let kind = match activity_type {
        ActivityType::Reflection => EntryKind::Reflection,
        ActivityType::WeeklyRecap => EntryKind::WeeklyRecap {
            end_date: match wire.end_date.as_deref() {
                Some(value) => parse_date(value, &wire.id, "endDate")?,
                None => {
                    return Err(invalid(&wire.id, "weekly recap without endDate"));
                }
            },
            week_feeling: wire
                .week_feeling
                .ok_or_else(|| invalid(&wire.id, "weekly recap without weekFeeling"))?,
        },
        ActivityType::Injury => EntryKind::Injury {
            injury_name: wire.injury_name.clone().unwrap_or_default(),
            // Older exports omit the start date; fall back to the entry date.
            injury_start_date: match wire.injury_start_date.as_deref() {
                Some(value) => parse_date(value, &wire.id, "injuryStartDate")?,
                None => date,
            },
            injury_details: wire.injury_details.clone().unwrap_or_default(),
            injury_side: parse_side_label_lenient(wire.injury_side.as_deref().unwrap_or("")),
            check_ins: wire
                .injury_check_ins
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|check_in| {
                    Ok(InjuryCheckIn {
                        date: parse_date(&check_in.date, &wire.id, "injuryCheckIns.date")?,
                        pain: check_in.pain,
                        notes: check_in.notes.clone(),
                    })
                })
                .collect::<ImportResult<Vec<_>>>()?,
        },
        ActivityType::Milestone => EntryKind::Milestone {
            milestone_title: wire.milestone_title.clone().unwrap_or_default(),
            achievement_value: wire.achievement_value.clone().unwrap_or_default(),
            milestone_date: match wire.milestone_date.as_deref() {
                Some(value) => parse_date(value, &wire.id, "milestoneDate")?,
                None => date,
            },
            milestone_notes: wire.milestone_notes.clone().unwrap_or_default(),
        },
        sport_type => {
            let sport = Sport::from_activity_type(sport_type)
                .ok_or_else(|| invalid(&wire.id, "subtype is not a sport"))?;
            EntryKind::Activity {
                sport,
                // A stray golf score on a non-golf record is dropped, not an error.
                golf_score: if sport == Sport::Golf {
                    wire.golf_score
                } else {
                    None
                },
            }
        }
    };

    let mut entry =
        JournalEntry::with_id(id, kind, date, wire.title.clone(), wire.text.clone());
    entry.strava_link = wire.strava_link.clone();
    // Reflections never carry a feeling; drop one leniently if present.
    if !matches!(entry.kind, EntryKind::Reflection) {
        entry.feeling = wire.feeling;
    }
    Ok(entry)
}

fn parse_entry_id(value: &str) -> ImportResult<EntryId> {
    Uuid::parse_str(value).map_err(|_| ImportError::InvalidEntry {
        id: value.to_string(),
        reason: "id is not a valid uuid".to_string(),
    })
}

fn parse_date(value: &str, id: &str, field: &str) -> ImportResult<i64> {
    iso_to_epoch_ms(value)
        .ok_or_else(|| invalid(id, &format!("{field} `{value}` is not an ISO-8601 timestamp")))
}

fn invalid(id: &str, reason: &str) -> ImportError {
    ImportError::InvalidEntry {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}
