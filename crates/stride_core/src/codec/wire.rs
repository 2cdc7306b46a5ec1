//! Wire schema for the JSON interchange document.
//!
//! Field declaration order is alphabetical on purpose: serde emits struct
//! fields in declaration order, which gives the deterministic sorted-key
//! output the historical exporter produced. Do not reorder.

use crate::model::entry::InjurySide;
use serde::{Deserialize, Serialize};

/// Top-level export document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Labels of the subtypes included by the export filter.
    pub activity_types: Vec<String>,
    /// Human label of the date range filter, e.g. "All Time".
    pub date_range: String,
    pub entries: Vec<WireEntry>,
    /// ISO-8601 timestamp of the export itself.
    pub export_date: String,
    pub total_entries: usize,
}

/// Flat all-optional entry record, one historical schema for every subtype.
///
/// `activityType` selects which optional group is meaningful; groups not
/// owned by the subtype are omitted entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievement_value: Option<String>,
    pub activity_type: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feeling: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub golf_score: Option<i32>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injury_check_ins: Option<Vec<WireCheckIn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injury_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injury_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injury_side: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injury_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<WirePhoto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strava_link: Option<String>,
    pub text: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_feeling: Option<u8>,
}

/// Check-in as exported inside `injuryCheckIns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCheckIn {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub pain: u8,
}

/// Inlined photo attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePhoto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub id: String,
    /// Base64-encoded image bytes.
    pub image_data: String,
}

/// Wire label for an injury side.
pub fn side_label(side: InjurySide) -> &'static str {
    match side {
        InjurySide::Left => "Left",
        InjurySide::Right => "Right",
        InjurySide::NotApplicable => "N/A",
    }
}

/// Lenient side parse: anything unknown reads as not-applicable, matching
/// how old importers treated newer exports.
pub fn parse_side_label_lenient(value: &str) -> InjurySide {
    match value {
        "Left" => InjurySide::Left,
        "Right" => InjurySide::Right,
        _ => InjurySide::NotApplicable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_keys_are_emitted_sorted() {
        let doc = ExportDocument {
            activity_types: vec!["Run".to_string()],
            date_range: "All Time".to_string(),
            entries: vec![],
            export_date: "2024-01-01T00:00:00Z".to_string(),
            total_entries: 0,
        };
        let json = serde_json::to_string(&doc).unwrap();
        let key_positions: Vec<usize> = [
            "\"activityTypes\"",
            "\"dateRange\"",
            "\"entries\"",
            "\"exportDate\"",
            "\"totalEntries\"",
        ]
        .iter()
        .map(|key| json.find(key).unwrap())
        .collect();
        assert!(key_positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn absent_groups_are_omitted_not_null() {
        let entry = WireEntry {
            achievement_value: None,
            activity_type: "Run".to_string(),
            date: "2024-01-01T00:00:00Z".to_string(),
            end_date: None,
            feeling: Some(7),
            golf_score: None,
            id: "00000000-0000-4000-8000-000000000001".to_string(),
            injury_check_ins: None,
            injury_details: None,
            injury_name: None,
            injury_side: None,
            injury_start_date: None,
            milestone_date: None,
            milestone_notes: None,
            milestone_title: None,
            photos: None,
            strava_link: None,
            text: "easy".to_string(),
            title: "Morning run".to_string(),
            week_feeling: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("injuryName"));
        assert!(!json.contains("null"));
        assert!(json.contains("\"feeling\":7"));
    }
}
