//! Journal entry domain model.
//!
//! # Responsibility
//! - Define the entry envelope shared by every subtype.
//! - Model subtype-specific fields as a tagged union, one variant per group.
//! - Validate field ranges before anything reaches persistence.
//!
//! # Invariants
//! - `id` is stable across export/import and never reused.
//! - `feeling` and `week_feeling` are in 1..=10 when present.
//! - Check-in `pain` is in 0..=10; 0 conventionally means "resolved".
//! - At most [`MAX_PHOTOS_PER_ENTRY`] photos per entry.

use crate::model::photo::JournalPhoto;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a journal entry.
pub type EntryId = Uuid;

/// Maximum number of photo attachments per entry.
pub const MAX_PHOTOS_PER_ENTRY: usize = 5;

/// Milliseconds in one day.
pub const DAY_MS: i64 = 86_400_000;

/// A weekly recap covers its end date plus the six days before it.
pub const RECAP_SPAN_DAYS: i64 = 6;

/// Closed set of entry discriminators, matching historical export labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActivityType {
    Run,
    Walk,
    Hike,
    Bike,
    Swim,
    Lift,
    Yoga,
    Golf,
    Milestone,
    Reflection,
    Other,
    WeeklyRecap,
    Injury,
}

impl ActivityType {
    pub const ALL: [ActivityType; 13] = [
        ActivityType::Run,
        ActivityType::Walk,
        ActivityType::Hike,
        ActivityType::Bike,
        ActivityType::Swim,
        ActivityType::Lift,
        ActivityType::Yoga,
        ActivityType::Golf,
        ActivityType::Milestone,
        ActivityType::Reflection,
        ActivityType::Other,
        ActivityType::WeeklyRecap,
        ActivityType::Injury,
    ];

    /// Human-facing label, identical to the strings in existing exports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Run => "Run",
            Self::Walk => "Walk",
            Self::Hike => "Hike",
            Self::Bike => "Bike",
            Self::Swim => "Swim",
            Self::Lift => "Lift",
            Self::Yoga => "Yoga",
            Self::Golf => "Golf",
            Self::Milestone => "Milestone",
            Self::Reflection => "Reflection",
            Self::Other => "Other",
            Self::WeeklyRecap => "Weekly Recap",
            Self::Injury => "Injury",
        }
    }

    /// Strict label parse. Returns `None` for unknown strings.
    pub fn parse_label(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.label() == value)
    }

    /// Lenient label parse used by the importer: unknown strings become
    /// `Other` so newer exports still load on older builds.
    pub fn parse_label_lenient(value: &str) -> Self {
        Self::parse_label(value).unwrap_or(Self::Other)
    }
}

impl Display for ActivityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Plain sport subtypes carried by [`EntryKind::Activity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sport {
    Run,
    Walk,
    Hike,
    Bike,
    Swim,
    Lift,
    Yoga,
    Golf,
    Other,
}

impl Sport {
    pub fn activity_type(self) -> ActivityType {
        match self {
            Self::Run => ActivityType::Run,
            Self::Walk => ActivityType::Walk,
            Self::Hike => ActivityType::Hike,
            Self::Bike => ActivityType::Bike,
            Self::Swim => ActivityType::Swim,
            Self::Lift => ActivityType::Lift,
            Self::Yoga => ActivityType::Yoga,
            Self::Golf => ActivityType::Golf,
            Self::Other => ActivityType::Other,
        }
    }

    /// Maps a discriminator back to a sport, for subtypes that are sports.
    pub fn from_activity_type(kind: ActivityType) -> Option<Self> {
        match kind {
            ActivityType::Run => Some(Self::Run),
            ActivityType::Walk => Some(Self::Walk),
            ActivityType::Hike => Some(Self::Hike),
            ActivityType::Bike => Some(Self::Bike),
            ActivityType::Swim => Some(Self::Swim),
            ActivityType::Lift => Some(Self::Lift),
            ActivityType::Yoga => Some(Self::Yoga),
            ActivityType::Golf => Some(Self::Golf),
            ActivityType::Other => Some(Self::Other),
            _ => None,
        }
    }
}

/// Side of the body affected by an injury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjurySide {
    Left,
    Right,
    NotApplicable,
}

/// Dated pain observation nested inside an injury entry.
///
/// Value type only: check-ins have no identity or lifecycle of their own and
/// are persisted inline with the owning entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryCheckIn {
    /// Observation date in epoch milliseconds.
    pub date: i64,
    /// Pain level 0..=10, 0 meaning resolved.
    pub pain: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Subtype-specific field groups, one variant per discriminator family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A logged workout. `golf_score` is only meaningful for `Sport::Golf`.
    Activity {
        sport: Sport,
        golf_score: Option<i32>,
    },
    /// Free-form journaling, no feeling score by design.
    Reflection,
    /// Week summary. The envelope `date` is derived as `end_date - 6 days`.
    WeeklyRecap { end_date: i64, week_feeling: u8 },
    Injury {
        injury_name: String,
        injury_start_date: i64,
        injury_details: String,
        injury_side: InjurySide,
        check_ins: Vec<InjuryCheckIn>,
    },
    Milestone {
        milestone_title: String,
        achievement_value: String,
        milestone_date: i64,
        milestone_notes: String,
    },
}

impl EntryKind {
    /// Discriminator for this variant, as used in filters and exports.
    pub fn activity_type(&self) -> ActivityType {
        match self {
            Self::Activity { sport, .. } => sport.activity_type(),
            Self::Reflection => ActivityType::Reflection,
            Self::WeeklyRecap { .. } => ActivityType::WeeklyRecap,
            Self::Injury { .. } => ActivityType::Injury,
            Self::Milestone { .. } => ActivityType::Milestone,
        }
    }
}

/// One journal record of any subtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Stable global id, preserved verbatim across export/import.
    pub id: EntryId,
    /// Display/creation date in epoch milliseconds.
    pub date: i64,
    /// Non-empty for every subtype except injury drafts.
    pub title: String,
    /// Free-form body, may be empty for some subtypes.
    pub text: String,
    /// Loosely validated link; any non-empty string is accepted.
    pub strava_link: Option<String>,
    /// Feeling 1..=10. Not applicable to reflections.
    pub feeling: Option<u8>,
    pub kind: EntryKind,
    /// Owned attachments, deleted together with the entry.
    pub photos: Vec<JournalPhoto>,
}

impl JournalEntry {
    /// Creates an entry with a freshly generated id.
    pub fn new(kind: EntryKind, date: i64, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), kind, date, title, text)
    }

    /// Creates an entry with a caller-provided id.
    ///
    /// Used by the importer, where identity already exists externally.
    pub fn with_id(
        id: EntryId,
        kind: EntryKind,
        date: i64,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date,
            title: title.into(),
            text: text.into(),
            strava_link: None,
            feeling: None,
            kind,
            photos: Vec::new(),
        }
    }

    pub fn activity_type(&self) -> ActivityType {
        self.kind.activity_type()
    }

    /// Sort key for listing: the recap end date when present, else `date`.
    pub fn display_date(&self) -> i64 {
        match &self.kind {
            EntryKind::WeeklyRecap { end_date, .. } => *end_date,
            _ => self.date,
        }
    }

    /// Checks every declared field range.
    ///
    /// Write paths must call this before any SQL mutation.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.title.trim().is_empty() && !matches!(self.kind, EntryKind::Injury { .. }) {
            return Err(EntryValidationError::EmptyTitle {
                kind: self.activity_type(),
            });
        }

        if let Some(feeling) = self.feeling {
            if matches!(self.kind, EntryKind::Reflection) {
                return Err(EntryValidationError::FeelingOnReflection);
            }
            if !(1..=10).contains(&feeling) {
                return Err(EntryValidationError::FeelingOutOfRange(feeling));
            }
        }

        match &self.kind {
            EntryKind::Activity { sport, golf_score } => {
                if golf_score.is_some() && *sport != Sport::Golf {
                    return Err(EntryValidationError::GolfScoreNotApplicable);
                }
            }
            EntryKind::WeeklyRecap { week_feeling, .. } => {
                if !(1..=10).contains(week_feeling) {
                    return Err(EntryValidationError::WeekFeelingOutOfRange(*week_feeling));
                }
            }
            EntryKind::Injury { check_ins, .. } => {
                for (index, check_in) in check_ins.iter().enumerate() {
                    if check_in.pain > 10 {
                        return Err(EntryValidationError::PainOutOfRange {
                            index,
                            pain: check_in.pain,
                        });
                    }
                }
            }
            EntryKind::Reflection | EntryKind::Milestone { .. } => {}
        }

        if self.photos.len() > MAX_PHOTOS_PER_ENTRY {
            return Err(EntryValidationError::TooManyPhotos(self.photos.len()));
        }

        Ok(())
    }
}

/// Validation failure for a single entry field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    EmptyTitle { kind: ActivityType },
    FeelingOutOfRange(u8),
    FeelingOnReflection,
    WeekFeelingOutOfRange(u8),
    PainOutOfRange { index: usize, pain: u8 },
    GolfScoreNotApplicable,
    TooManyPhotos(usize),
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle { kind } => write!(f, "{kind} entries require a non-empty title"),
            Self::FeelingOutOfRange(value) => {
                write!(f, "feeling must be between 1 and 10, got {value}")
            }
            Self::FeelingOnReflection => write!(f, "reflections do not carry a feeling score"),
            Self::WeekFeelingOutOfRange(value) => {
                write!(f, "week feeling must be between 1 and 10, got {value}")
            }
            Self::PainOutOfRange { index, pain } => {
                write!(f, "check-in {index}: pain must be between 0 and 10, got {pain}")
            }
            Self::GolfScoreNotApplicable => {
                write!(f, "golf score is only valid on golf activities")
            }
            Self::TooManyPhotos(count) => write!(
                f,
                "entries allow at most {MAX_PHOTOS_PER_ENTRY} photos, got {count}"
            ),
        }
    }
}

impl Error for EntryValidationError {}

/// Derives the recap display date from the week's end date.
pub fn recap_start_date(end_date: i64) -> i64 {
    end_date - RECAP_SPAN_DAYS * DAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_entry(feeling: Option<u8>) -> JournalEntry {
        let mut entry = JournalEntry::new(
            EntryKind::Activity {
                sport: Sport::Run,
                golf_score: None,
            },
            1_700_000_000_000,
            "Morning run",
            "Easy 5k",
        );
        entry.feeling = feeling;
        entry
    }

    #[test]
    fn feeling_boundaries() {
        assert!(run_entry(Some(10)).validate().is_ok());
        assert!(run_entry(Some(1)).validate().is_ok());
        assert_eq!(
            run_entry(Some(11)).validate(),
            Err(EntryValidationError::FeelingOutOfRange(11))
        );
        assert_eq!(
            run_entry(Some(0)).validate(),
            Err(EntryValidationError::FeelingOutOfRange(0))
        );
    }

    #[test]
    fn reflection_rejects_feeling() {
        let mut entry = JournalEntry::new(
            EntryKind::Reflection,
            1_700_000_000_000,
            "Thoughts",
            "Long week",
        );
        entry.feeling = Some(5);
        assert_eq!(
            entry.validate(),
            Err(EntryValidationError::FeelingOnReflection)
        );
    }

    #[test]
    fn empty_title_allowed_only_for_injury() {
        let entry = JournalEntry::new(
            EntryKind::Activity {
                sport: Sport::Walk,
                golf_score: None,
            },
            0,
            "  ",
            "body",
        );
        assert!(matches!(
            entry.validate(),
            Err(EntryValidationError::EmptyTitle { .. })
        ));

        let draft = JournalEntry::new(
            EntryKind::Injury {
                injury_name: "Shin splints".to_string(),
                injury_start_date: 0,
                injury_details: String::new(),
                injury_side: InjurySide::Left,
                check_ins: vec![],
            },
            0,
            "",
            "",
        );
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn check_in_pain_range() {
        let mut entry = JournalEntry::new(
            EntryKind::Injury {
                injury_name: "Knee".to_string(),
                injury_start_date: 0,
                injury_details: "left knee".to_string(),
                injury_side: InjurySide::Right,
                check_ins: vec![
                    InjuryCheckIn {
                        date: 0,
                        pain: 0,
                        notes: None,
                    },
                    InjuryCheckIn {
                        date: 1,
                        pain: 11,
                        notes: None,
                    },
                ],
            },
            0,
            "Knee",
            "",
        );
        assert_eq!(
            entry.validate(),
            Err(EntryValidationError::PainOutOfRange { index: 1, pain: 11 })
        );

        if let EntryKind::Injury { check_ins, .. } = &mut entry.kind {
            check_ins[1].pain = 10;
        }
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn golf_score_requires_golf() {
        let entry = JournalEntry::new(
            EntryKind::Activity {
                sport: Sport::Swim,
                golf_score: Some(88),
            },
            0,
            "Laps",
            "",
        );
        assert_eq!(
            entry.validate(),
            Err(EntryValidationError::GolfScoreNotApplicable)
        );
    }

    #[test]
    fn recap_display_date_uses_end_date() {
        let entry = JournalEntry::new(
            EntryKind::WeeklyRecap {
                end_date: 1_700_000_000_000,
                week_feeling: 7,
            },
            recap_start_date(1_700_000_000_000),
            "Week 46",
            "Solid volume",
        );
        assert_eq!(entry.display_date(), 1_700_000_000_000);
        assert_eq!(entry.date, 1_700_000_000_000 - 6 * DAY_MS);
    }

    #[test]
    fn label_parse_is_lenient_only_on_request() {
        assert_eq!(
            ActivityType::parse_label("Weekly Recap"),
            Some(ActivityType::WeeklyRecap)
        );
        assert_eq!(ActivityType::parse_label("Parkour"), None);
        assert_eq!(
            ActivityType::parse_label_lenient("Parkour"),
            ActivityType::Other
        );
    }
}
