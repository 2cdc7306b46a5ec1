//! User preferences record.
//!
//! # Responsibility
//! - Hold the single per-user settings record (welcome flag, theme,
//!   notification schedule, entry tile order, default activity).
//! - Stamp `updated_at` on every mutation helper.
//!
//! # Invariants
//! - `entry_type_order` is always a permutation of [`ENTRY_TILE_NAMES`].
//! - At most one record exists; creation happens lazily through
//!   `PreferencesRepository::load_or_default`, never implicitly elsewhere.

use crate::model::entry::ActivityType;
use chrono::Utc;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The five creatable entry tiles, in default display order.
pub const ENTRY_TILE_NAMES: [&str; 5] =
    ["Activity", "Reflection", "Weekly Recap", "Injury", "Milestone"];

/// Visual theme choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemePreference {
    Light,
    Dark,
    System,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// Weekly notification slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    /// ISO weekday, 1 = Monday .. 7 = Sunday.
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
}

impl WeeklySchedule {
    pub fn new(weekday: u8, hour: u8, minute: u8) -> Result<Self, PreferencesValidationError> {
        if !(1..=7).contains(&weekday) || hour > 23 || minute > 59 {
            return Err(PreferencesValidationError::InvalidSchedule {
                weekday,
                hour,
                minute,
            });
        }
        Ok(Self {
            weekday,
            hour,
            minute,
        })
    }
}

impl Default for WeeklySchedule {
    /// Monday 09:00, the slot new installs start with.
    fn default() -> Self {
        Self {
            weekday: 1,
            hour: 9,
            minute: 0,
        }
    }
}

/// The per-user settings record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreferences {
    pub has_seen_welcome: bool,
    pub last_seen_app_version: String,
    /// Permutation of [`ENTRY_TILE_NAMES`] controlling tile display order.
    pub entry_type_order: Vec<String>,
    pub theme: ThemePreference,
    pub notifications_enabled: bool,
    pub notification_schedule: WeeklySchedule,
    pub default_activity_type: ActivityType,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds, stamped by every mutation helper.
    pub updated_at: i64,
}

impl UserPreferences {
    /// Defaults for a fresh install.
    pub fn new_default(now_ms: i64) -> Self {
        Self {
            has_seen_welcome: false,
            last_seen_app_version: "1.0.0".to_string(),
            entry_type_order: ENTRY_TILE_NAMES.iter().map(|s| s.to_string()).collect(),
            theme: ThemePreference::System,
            notifications_enabled: true,
            notification_schedule: WeeklySchedule::default(),
            default_activity_type: ActivityType::Run,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn mark_welcome_seen(&mut self) {
        self.has_seen_welcome = true;
        self.touch();
    }

    pub fn mark_app_version_seen(&mut self, version: impl Into<String>) {
        self.last_seen_app_version = version.into();
        self.touch();
    }

    pub fn set_theme(&mut self, theme: ThemePreference) {
        self.theme = theme;
        self.touch();
    }

    pub fn toggle_notifications(&mut self) {
        self.notifications_enabled = !self.notifications_enabled;
        self.touch();
    }

    pub fn set_notification_schedule(&mut self, schedule: WeeklySchedule) {
        self.notification_schedule = schedule;
        self.touch();
    }

    pub fn set_default_activity_type(&mut self, kind: ActivityType) {
        self.default_activity_type = kind;
        self.touch();
    }

    /// Replaces the tile order. Rejects anything that is not a permutation
    /// of the five fixed tile names.
    pub fn set_entry_type_order(
        &mut self,
        order: Vec<String>,
    ) -> Result<(), PreferencesValidationError> {
        if !is_tile_permutation(&order) {
            return Err(PreferencesValidationError::InvalidEntryTypeOrder(order));
        }
        self.entry_type_order = order;
        self.touch();
        Ok(())
    }

    pub fn reset_entry_type_order(&mut self) {
        self.entry_type_order = ENTRY_TILE_NAMES.iter().map(|s| s.to_string()).collect();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().timestamp_millis();
    }
}

/// Returns whether `order` is a permutation of the fixed tile names.
pub fn is_tile_permutation(order: &[String]) -> bool {
    if order.len() != ENTRY_TILE_NAMES.len() {
        return false;
    }
    ENTRY_TILE_NAMES
        .iter()
        .all(|name| order.iter().filter(|o| o.as_str() == *name).count() == 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferencesValidationError {
    InvalidEntryTypeOrder(Vec<String>),
    InvalidSchedule { weekday: u8, hour: u8, minute: u8 },
}

impl Display for PreferencesValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEntryTypeOrder(order) => {
                write!(f, "entry type order {order:?} is not a permutation of the fixed tile names")
            }
            Self::InvalidSchedule {
                weekday,
                hour,
                minute,
            } => write!(
                f,
                "invalid weekly schedule: weekday={weekday} hour={hour} minute={minute}"
            ),
        }
    }
}

impl Error for PreferencesValidationError {}
