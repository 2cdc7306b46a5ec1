//! User preferences repository.
//!
//! # Responsibility
//! - Lazily create the singleton preferences row on first access.
//! - Persist preference mutations with an `updated_at` stamp.
//!
//! # Invariants
//! - `load_or_default` creates at most one row, even under concurrent calls
//!   (single fixed row id + `INSERT OR IGNORE` inside an immediate
//!   transaction).
//! - The record is never deleted.

use crate::db::migrations::latest_version;
use crate::model::entry::ActivityType;
use crate::model::preferences::{
    is_tile_permutation, PreferencesValidationError, ThemePreference, UserPreferences,
    WeeklySchedule, ENTRY_TILE_NAMES,
};
use crate::repo::entry_repo::{table_exists, table_has_column, RepoError, RepoResult};
use chrono::Utc;
use rusqlite::{params, Connection, Row, TransactionBehavior};

const PREFERENCES_ROW_ID: i64 = 1;

const PREFERENCES_SELECT_SQL: &str = "SELECT
    has_seen_welcome,
    last_seen_app_version,
    entry_type_order,
    theme,
    notifications_enabled,
    notify_weekday,
    notify_hour,
    notify_minute,
    default_activity_type,
    created_at,
    updated_at
FROM preferences
WHERE id = 1";

/// Repository interface for the singleton preferences record.
pub trait PreferencesRepository {
    /// Returns the record, creating it with defaults exactly once if absent.
    fn load_or_default(&mut self) -> RepoResult<UserPreferences>;
    /// Persists the record and stamps `updated_at`.
    fn save(&mut self, preferences: &UserPreferences) -> RepoResult<UserPreferences>;
}

/// SQLite-backed preferences repository.
pub struct SqlitePreferencesRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePreferencesRepository<'conn> {
    /// Constructs a repository from a migrated, ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_preferences_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PreferencesRepository for SqlitePreferencesRepository<'_> {
    fn load_or_default(&mut self) -> RepoResult<UserPreferences> {
        let now = Utc::now().timestamp_millis();
        let default_order = serde_json::to_string(&ENTRY_TILE_NAMES)
            .map_err(|err| RepoError::InvalidData(format!("default tile order: {err}")))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT OR IGNORE INTO preferences (id, entry_type_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3);",
            params![PREFERENCES_ROW_ID, default_order, now],
        )?;
        let row = tx.query_row(PREFERENCES_SELECT_SQL, [], parse_preferences_row)?;
        tx.commit()?;

        row.into_domain()
    }

    fn save(&mut self, preferences: &UserPreferences) -> RepoResult<UserPreferences> {
        validate_preferences(preferences)?;

        let mut stamped = preferences.clone();
        stamped.updated_at = Utc::now().timestamp_millis();

        let order_json = serde_json::to_string(&stamped.entry_type_order)
            .map_err(|err| RepoError::InvalidData(format!("tile order: {err}")))?;

        let changed = self.conn.execute(
            "UPDATE preferences
             SET
                has_seen_welcome = ?1,
                last_seen_app_version = ?2,
                entry_type_order = ?3,
                theme = ?4,
                notifications_enabled = ?5,
                notify_weekday = ?6,
                notify_hour = ?7,
                notify_minute = ?8,
                default_activity_type = ?9,
                updated_at = ?10
             WHERE id = ?11;",
            params![
                stamped.has_seen_welcome,
                stamped.last_seen_app_version,
                order_json,
                stamped.theme.as_str(),
                stamped.notifications_enabled,
                i64::from(stamped.notification_schedule.weekday),
                i64::from(stamped.notification_schedule.hour),
                i64::from(stamped.notification_schedule.minute),
                activity_label_db(stamped.default_activity_type),
                stamped.updated_at,
                PREFERENCES_ROW_ID,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::InvalidData(
                "preferences row is missing; call load_or_default first".to_string(),
            ));
        }

        Ok(stamped)
    }
}

fn validate_preferences(preferences: &UserPreferences) -> RepoResult<()> {
    if !is_tile_permutation(&preferences.entry_type_order) {
        return Err(PreferencesValidationError::InvalidEntryTypeOrder(
            preferences.entry_type_order.clone(),
        )
        .into());
    }
    // Re-run range checks in case the struct was mutated directly.
    WeeklySchedule::new(
        preferences.notification_schedule.weekday,
        preferences.notification_schedule.hour,
        preferences.notification_schedule.minute,
    )?;
    Ok(())
}

/// Raw column values, decoded to domain types in [`PreferencesRow::into_domain`].
struct PreferencesRow {
    has_seen_welcome: bool,
    last_seen_app_version: String,
    order_json: String,
    theme_text: String,
    notifications_enabled: bool,
    weekday: i64,
    hour: i64,
    minute: i64,
    type_text: String,
    created_at: i64,
    updated_at: i64,
}

fn parse_preferences_row(row: &Row<'_>) -> rusqlite::Result<PreferencesRow> {
    Ok(PreferencesRow {
        has_seen_welcome: row.get("has_seen_welcome")?,
        last_seen_app_version: row.get("last_seen_app_version")?,
        order_json: row.get("entry_type_order")?,
        theme_text: row.get("theme")?,
        notifications_enabled: row.get("notifications_enabled")?,
        weekday: row.get("notify_weekday")?,
        hour: row.get("notify_hour")?,
        minute: row.get("notify_minute")?,
        type_text: row.get("default_activity_type")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl PreferencesRow {
    fn into_domain(self) -> RepoResult<UserPreferences> {
        let entry_type_order: Vec<String> =
            serde_json::from_str(&self.order_json).map_err(|err| {
                RepoError::InvalidData(format!(
                    "invalid tile order json in preferences.entry_type_order: {err}"
                ))
            })?;

        let theme = ThemePreference::parse(&self.theme_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid theme `{}` in preferences.theme",
                self.theme_text
            ))
        })?;

        let default_activity_type = parse_activity_label_db(&self.type_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid activity `{}` in preferences.default_activity_type",
                self.type_text
            ))
        })?;

        let schedule = WeeklySchedule::new(
            clamp_u8(self.weekday, "preferences.notify_weekday")?,
            clamp_u8(self.hour, "preferences.notify_hour")?,
            clamp_u8(self.minute, "preferences.notify_minute")?,
        )?;

        Ok(UserPreferences {
            has_seen_welcome: self.has_seen_welcome,
            last_seen_app_version: self.last_seen_app_version,
            entry_type_order,
            theme,
            notifications_enabled: self.notifications_enabled,
            notification_schedule: schedule,
            default_activity_type,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn clamp_u8(value: i64, column: &str) -> RepoResult<u8> {
    u8::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value {value} out of range in {column}")))
}

fn activity_label_db(kind: ActivityType) -> &'static str {
    match kind {
        ActivityType::Run => "run",
        ActivityType::Walk => "walk",
        ActivityType::Hike => "hike",
        ActivityType::Bike => "bike",
        ActivityType::Swim => "swim",
        ActivityType::Lift => "lift",
        ActivityType::Yoga => "yoga",
        ActivityType::Golf => "golf",
        ActivityType::Milestone => "milestone",
        ActivityType::Reflection => "reflection",
        ActivityType::Other => "other",
        ActivityType::WeeklyRecap => "weekly_recap",
        ActivityType::Injury => "injury",
    }
}

fn parse_activity_label_db(value: &str) -> Option<ActivityType> {
    ActivityType::ALL
        .iter()
        .copied()
        .find(|kind| activity_label_db(*kind) == value)
}

fn ensure_preferences_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected = latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual != expected {
        return Err(RepoError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        });
    }

    if !table_exists(conn, "preferences")? {
        return Err(RepoError::MissingRequiredTable("preferences"));
    }

    for column in ["id", "entry_type_order", "theme", "created_at", "updated_at"] {
        if !table_has_column(conn, "preferences", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "preferences",
                column,
            });
        }
    }

    Ok(())
}
