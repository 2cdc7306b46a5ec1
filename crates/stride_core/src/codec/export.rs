//! Entry set export to JSON, plain text and CSV.
//!
//! # Responsibility
//! - Produce the full-fidelity JSON interchange document, inlining photo
//!   bytes through a caller-supplied content source.
//! - Produce the two write-only human formats (text blocks, CSV rows).
//!
//! # Invariants
//! - Exporting an empty filtered set is an error; no output is produced.
//! - CSV carries only the six envelope columns; subtype fields are dropped.

use crate::codec::epoch_ms_to_iso;
use crate::codec::wire::{side_label, ExportDocument, WireCheckIn, WireEntry, WirePhoto};
use crate::model::entry::{ActivityType, EntryKind, JournalEntry};
use crate::photos::PhotoContentSource;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{Months, TimeZone, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
    Csv,
}

impl ExportFormat {
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "txt",
            Self::Csv => "csv",
        }
    }
}

/// Date range presets offered by the export screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeFilter {
    AllTime,
    LastMonth,
    LastThreeMonths,
    /// Inclusive epoch-millisecond bounds.
    Custom { from: i64, to: i64 },
}

impl DateRangeFilter {
    /// Human label recorded in the export header.
    pub fn label(self) -> &'static str {
        match self {
            Self::AllTime => "All Time",
            Self::LastMonth => "Last Month",
            Self::LastThreeMonths => "Last 3 Months",
            Self::Custom { .. } => "Custom Range",
        }
    }

    /// Inclusive date bounds for the entry list query, relative to `now_ms`.
    pub fn bounds(self, now_ms: i64) -> (Option<i64>, Option<i64>) {
        match self {
            Self::AllTime => (None, None),
            Self::LastMonth => (months_back(now_ms, 1), None),
            Self::LastThreeMonths => (months_back(now_ms, 3), None),
            Self::Custom { from, to } => (Some(from), Some(to)),
        }
    }
}

fn months_back(now_ms: i64, months: u32) -> Option<i64> {
    Utc.timestamp_millis_opt(now_ms)
        .single()
        .and_then(|dt| dt.checked_sub_months(Months::new(months)))
        .map(|dt| dt.timestamp_millis())
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug)]
pub enum ExportError {
    /// The filter matched no entries; nothing to export.
    EmptyResult,
    /// An entry carries a timestamp outside the formattable range.
    InvalidTimestamp(i64),
    Serialize(serde_json::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyResult => write!(f, "no entries matched the export filter"),
            Self::InvalidTimestamp(ms) => write!(f, "timestamp {ms} cannot be formatted"),
            Self::Serialize(err) => write!(f, "failed to serialize export document: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Serializes `entries` in the requested format.
///
/// `date_range` and `included_types` describe the filter that produced
/// `entries`; they are recorded in the JSON header. `photos` supplies image
/// bytes for JSON inlining and is not touched by the other formats.
pub fn export_entries<P: PhotoContentSource + ?Sized>(
    entries: &[JournalEntry],
    format: ExportFormat,
    date_range: DateRangeFilter,
    included_types: &[ActivityType],
    photos: &P,
) -> ExportResult<String> {
    if entries.is_empty() {
        return Err(ExportError::EmptyResult);
    }

    let output = match format {
        ExportFormat::Json => export_json(entries, date_range, included_types, photos)?,
        ExportFormat::Text => export_text(entries)?,
        ExportFormat::Csv => export_csv(entries)?,
    };

    info!(
        "event=export module=codec status=ok format={} entries={}",
        format.file_extension(),
        entries.len()
    );
    Ok(output)
}

fn export_json<P: PhotoContentSource + ?Sized>(
    entries: &[JournalEntry],
    date_range: DateRangeFilter,
    included_types: &[ActivityType],
    photos: &P,
) -> ExportResult<String> {
    let export_date = Utc::now().timestamp_millis();
    let document = ExportDocument {
        activity_types: included_types
            .iter()
            .map(|kind| kind.label().to_string())
            .collect(),
        date_range: date_range.label().to_string(),
        entries: entries
            .iter()
            .map(|entry| wire_entry(entry, photos))
            .collect::<ExportResult<Vec<_>>>()?,
        export_date: iso(export_date)?,
        total_entries: entries.len(),
    };

    Ok(serde_json::to_string_pretty(&document)?)
}

fn wire_entry<P: PhotoContentSource + ?Sized>(
    entry: &JournalEntry,
    photos: &P,
) -> ExportResult<WireEntry> {
    let mut wire = WireEntry {
        achievement_value: None,
        activity_type: entry.activity_type().label().to_string(),
        date: iso(entry.date)?,
        end_date: None,
        feeling: entry.feeling,
        golf_score: None,
        id: entry.id.to_string(),
        injury_check_ins: None,
        injury_details: None,
        injury_name: None,
        injury_side: None,
        injury_start_date: None,
        milestone_date: None,
        milestone_notes: None,
        milestone_title: None,
        photos: inline_photos(entry, photos),
        strava_link: entry.strava_link.clone(),
        text: entry.text.clone(),
        title: entry.title.clone(),
        week_feeling: None,
    };

    match &entry.kind {
        EntryKind::Activity { golf_score, .. } => {
            wire.golf_score = *golf_score;
        }
        EntryKind::Reflection => {}
        EntryKind::WeeklyRecap {
            end_date,
            week_feeling,
        } => {
            wire.end_date = Some(iso(*end_date)?);
            wire.week_feeling = Some(*week_feeling);
        }
        EntryKind::Injury {
            injury_name,
            injury_start_date,
            injury_details,
            injury_side,
            check_ins,
        } => {
            wire.injury_name = Some(injury_name.clone());
            wire.injury_start_date = Some(iso(*injury_start_date)?);
            wire.injury_details = Some(injury_details.clone());
            wire.injury_side = Some(side_label(*injury_side).to_string());
            wire.injury_check_ins = Some(
                check_ins
                    .iter()
                    .map(|check_in| {
                        Ok(WireCheckIn {
                            date: iso(check_in.date)?,
                            notes: check_in.notes.clone(),
                            pain: check_in.pain,
                        })
                    })
                    .collect::<ExportResult<Vec<_>>>()?,
            );
        }
        EntryKind::Milestone {
            milestone_title,
            achievement_value,
            milestone_date,
            milestone_notes,
        } => {
            wire.milestone_title = Some(milestone_title.clone());
            wire.achievement_value = Some(achievement_value.clone());
            wire.milestone_date = Some(iso(*milestone_date)?);
            wire.milestone_notes = Some(milestone_notes.clone());
        }
    }

    Ok(wire)
}

// Unloadable photo content is skipped rather than failing the export; the
// record itself still round-trips.
fn inline_photos<P: PhotoContentSource + ?Sized>(
    entry: &JournalEntry,
    photos: &P,
) -> Option<Vec<WirePhoto>> {
    if entry.photos.is_empty() {
        return None;
    }

    let inlined: Vec<WirePhoto> = entry
        .photos
        .iter()
        .filter_map(|photo| match photos.load_photo(photo.id) {
            Ok(bytes) => Some(WirePhoto {
                caption: photo.caption.clone(),
                id: photo.id.to_string(),
                image_data: BASE64.encode(bytes),
            }),
            Err(err) => {
                warn!(
                    "event=photo_inline module=codec status=skip photo_id={} error={err}",
                    photo.id
                );
                None
            }
        })
        .collect();

    if inlined.is_empty() {
        None
    } else {
        Some(inlined)
    }
}

fn export_text(entries: &[JournalEntry]) -> ExportResult<String> {
    let mut out = String::new();
    for entry in entries {
        let date = Utc
            .timestamp_millis_opt(entry.date)
            .single()
            .ok_or(ExportError::InvalidTimestamp(entry.date))?;
        let _ = writeln!(out, "{}", entry.title);
        let _ = writeln!(out, "Date: {}", date.format("%Y-%m-%d %H:%M"));
        let _ = writeln!(out, "Activity Type: {}\n", entry.activity_type().label());
        let _ = writeln!(out, "{}\n", entry.text);
        if let Some(link) = entry.strava_link.as_deref() {
            let _ = writeln!(out, "Strava Link: {link}\n");
        }
        let _ = writeln!(out, "-------------------\n");
    }
    Ok(out)
}

fn export_csv(entries: &[JournalEntry]) -> ExportResult<String> {
    let mut out = String::from("id,date,title,text,stravaLink,activityType\n");
    for entry in entries {
        let date = Utc
            .timestamp_millis_opt(entry.date)
            .single()
            .ok_or(ExportError::InvalidTimestamp(entry.date))?;
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            csv_escape(&entry.id.to_string()),
            csv_escape(&date.format("%Y-%m-%d %H:%M:%S").to_string()),
            csv_escape(&entry.title),
            csv_escape(&entry.text),
            csv_escape(entry.strava_link.as_deref().unwrap_or("")),
            csv_escape(entry.activity_type().label()),
        );
    }
    Ok(out)
}

fn iso(ms: i64) -> ExportResult<String> {
    epoch_ms_to_iso(ms).ok_or(ExportError::InvalidTimestamp(ms))
}

/// Escapes one CSV field: quotes are doubled, and the field is wrapped in
/// quotes when it contains a comma, quote or newline.
pub fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::csv_escape;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(csv_escape("Morning run"), "Morning run");
        assert_eq!(csv_escape(""), "");
    }

    #[test]
    fn special_fields_are_quoted_and_doubled() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn escaped_field_recovers_under_csv_grammar() {
        let original = "tempo, \"hard\"\nsplits";
        let escaped = csv_escape(original);

        // Unquote and un-double per RFC-4180.
        assert!(escaped.starts_with('"') && escaped.ends_with('"'));
        let inner = &escaped[1..escaped.len() - 1];
        assert_eq!(inner.replace("\"\"", "\""), original);
    }
}
