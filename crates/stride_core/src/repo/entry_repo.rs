//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `entries` and `photos` tables.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `JournalEntry::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - Entry + photo writes happen in one transaction; no orphaned photo rows.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::entry::{
    ActivityType, EntryId, EntryKind, EntryValidationError, InjuryCheckIn, InjurySide,
    JournalEntry, Sport,
};
use crate::model::photo::{JournalPhoto, PhotoId};
use crate::model::preferences::PreferencesValidationError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    date,
    title,
    text,
    strava_link,
    activity_type,
    feeling,
    golf_score,
    end_date,
    week_feeling,
    injury_name,
    injury_start_date,
    injury_details,
    injury_side,
    injury_check_ins,
    milestone_title,
    achievement_value,
    milestone_date,
    milestone_notes
FROM entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for journal persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Preferences(PreferencesValidationError),
    Db(DbError),
    NotFound(EntryId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Preferences(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not migrated: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{column}` on table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Preferences(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PreferencesValidationError> for RepoError {
    fn from(value: PreferencesValidationError) -> Self {
        Self::Preferences(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryListQuery {
    /// Subtype filter. `None` matches every subtype; an explicitly empty
    /// set matches nothing.
    pub kinds: Option<Vec<ActivityType>>,
    /// Inclusive lower bound on the envelope `date`, epoch milliseconds.
    pub date_from: Option<i64>,
    /// Inclusive upper bound on the envelope `date`, epoch milliseconds.
    pub date_to: Option<i64>,
    /// Case-insensitive substring match against title or body text.
    pub text_query: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for entry CRUD operations.
pub trait EntryRepository {
    /// Inserts an entry with its photos transactionally.
    fn create_entry(&mut self, entry: &JournalEntry) -> RepoResult<EntryId>;
    /// Rewrites an entry, replacing its photo set.
    fn update_entry(&mut self, entry: &JournalEntry) -> RepoResult<()>;
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>>;
    /// Lists entries sorted by display date descending.
    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<JournalEntry>>;
    /// Removes an entry and its photo rows; returns the removed photo ids so
    /// the caller can drop backing content.
    fn delete_entry(&mut self, id: EntryId) -> RepoResult<Vec<PhotoId>>;
    /// All entry ids currently in the store, for import dedup.
    fn entry_ids(&self) -> RepoResult<HashSet<EntryId>>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Constructs a repository from a migrated, ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_entry_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create_entry(&mut self, entry: &JournalEntry) -> RepoResult<EntryId> {
        entry.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        insert_entry(&tx, entry)?;
        tx.commit()?;

        Ok(entry.id)
    }

    fn update_entry(&mut self, entry: &JournalEntry) -> RepoResult<()> {
        entry.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE entries
             SET
                date = ?2,
                title = ?3,
                text = ?4,
                strava_link = ?5,
                activity_type = ?6,
                feeling = ?7,
                golf_score = ?8,
                end_date = ?9,
                week_feeling = ?10,
                injury_name = ?11,
                injury_start_date = ?12,
                injury_details = ?13,
                injury_side = ?14,
                injury_check_ins = ?15,
                milestone_title = ?16,
                achievement_value = ?17,
                milestone_date = ?18,
                milestone_notes = ?19,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params_from_iter(entry_params(entry)?),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(entry.id));
        }

        // Photo set replacement mirrors the entry's owned list exactly.
        tx.execute(
            "DELETE FROM photos WHERE entry_id = ?1;",
            [entry.id.to_string()],
        )?;
        insert_photos(&tx, entry)?;

        tx.commit()?;
        Ok(())
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut entry = parse_entry_row(row)?;
            entry.photos = load_photos(self.conn, entry.id)?;
            return Ok(Some(entry));
        }

        Ok(None)
    }

    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<JournalEntry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kinds) = query.kinds.as_ref() {
            // Deselecting every type selects nothing, not everything.
            if kinds.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; kinds.len()].join(", ");
            sql.push_str(&format!(" AND activity_type IN ({placeholders})"));
            for kind in kinds {
                bind_values.push(Value::Text(activity_type_to_db(*kind).to_string()));
            }
        }

        if let Some(from) = query.date_from {
            sql.push_str(" AND date >= ?");
            bind_values.push(Value::Integer(from));
        }
        if let Some(to) = query.date_to {
            sql.push_str(" AND date <= ?");
            bind_values.push(Value::Integer(to));
        }

        if let Some(text) = query.text_query.as_ref() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                sql.push_str(
                    " AND (LOWER(title) LIKE ? ESCAPE '\\' OR LOWER(text) LIKE ? ESCAPE '\\')",
                );
                let pattern = like_pattern(trimmed);
                bind_values.push(Value::Text(pattern.clone()));
                bind_values.push(Value::Text(pattern));
            }
        }

        sql.push_str(" ORDER BY COALESCE(end_date, date) DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            let mut entry = parse_entry_row(row)?;
            entry.photos = load_photos(self.conn, entry.id)?;
            entries.push(entry);
        }

        Ok(entries)
    }

    fn delete_entry(&mut self, id: EntryId) -> RepoResult<Vec<PhotoId>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let photo_ids: Vec<PhotoId> = {
            let mut stmt =
                tx.prepare("SELECT id FROM photos WHERE entry_id = ?1 ORDER BY position ASC;")?;
            let mut rows = stmt.query([id.to_string()])?;
            let mut ids = Vec::new();
            while let Some(row) = rows.next()? {
                let value: String = row.get(0)?;
                ids.push(parse_uuid(&value, "photos.id")?);
            }
            ids
        };

        // Photo rows go with the entry via ON DELETE CASCADE.
        let changed = tx.execute("DELETE FROM entries WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.commit()?;
        Ok(photo_ids)
    }

    fn entry_ids(&self) -> RepoResult<HashSet<EntryId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM entries;")?;
        let mut rows = stmt.query([])?;
        let mut ids = HashSet::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.insert(parse_uuid(&value, "entries.id")?);
        }
        Ok(ids)
    }
}

/// Inserts one entry and its photo rows. Callers own transaction scope.
pub(crate) fn insert_entry(conn: &Connection, entry: &JournalEntry) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO entries (
            id,
            date,
            title,
            text,
            strava_link,
            activity_type,
            feeling,
            golf_score,
            end_date,
            week_feeling,
            injury_name,
            injury_start_date,
            injury_details,
            injury_side,
            injury_check_ins,
            milestone_title,
            achievement_value,
            milestone_date,
            milestone_notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19);",
        params_from_iter(entry_params(entry)?),
    )?;
    insert_photos(conn, entry)?;
    Ok(())
}

fn insert_photos(conn: &Connection, entry: &JournalEntry) -> RepoResult<()> {
    for (position, photo) in entry.photos.iter().enumerate() {
        conn.execute(
            "INSERT INTO photos (id, entry_id, caption, position) VALUES (?1, ?2, ?3, ?4);",
            params![
                photo.id.to_string(),
                entry.id.to_string(),
                photo.caption.as_deref(),
                position as i64,
            ],
        )?;
    }
    Ok(())
}

fn load_photos(conn: &Connection, entry_id: EntryId) -> RepoResult<Vec<JournalPhoto>> {
    let mut stmt = conn
        .prepare("SELECT id, caption FROM photos WHERE entry_id = ?1 ORDER BY position ASC;")?;
    let mut rows = stmt.query([entry_id.to_string()])?;
    let mut photos = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        photos.push(JournalPhoto::with_id(
            parse_uuid(&id_text, "photos.id")?,
            row.get("caption")?,
        ));
    }
    Ok(photos)
}

fn opt_text(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::Text)
}

fn opt_int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

fn entry_params(entry: &JournalEntry) -> RepoResult<Vec<Value>> {
    let mut golf_score: Option<i64> = None;
    let mut end_date: Option<i64> = None;
    let mut week_feeling: Option<i64> = None;
    let mut injury_name: Option<String> = None;
    let mut injury_start_date: Option<i64> = None;
    let mut injury_details: Option<String> = None;
    let mut injury_side: Option<&'static str> = None;
    let mut injury_check_ins: Option<String> = None;
    let mut milestone_title: Option<String> = None;
    let mut achievement_value: Option<String> = None;
    let mut milestone_date: Option<i64> = None;
    let mut milestone_notes: Option<String> = None;

    match &entry.kind {
        EntryKind::Activity {
            golf_score: score, ..
        } => {
            golf_score = score.map(i64::from);
        }
        EntryKind::Reflection => {}
        EntryKind::WeeklyRecap {
            end_date: end,
            week_feeling: feeling,
        } => {
            end_date = Some(*end);
            week_feeling = Some(i64::from(*feeling));
        }
        EntryKind::Injury {
            injury_name: name,
            injury_start_date: start,
            injury_details: details,
            injury_side: side,
            check_ins,
        } => {
            injury_name = Some(name.clone());
            injury_start_date = Some(*start);
            injury_details = Some(details.clone());
            injury_side = Some(side_to_db(*side));
            injury_check_ins = Some(serde_json::to_string(check_ins).map_err(|err| {
                RepoError::InvalidData(format!("failed to serialize check-ins: {err}"))
            })?);
        }
        EntryKind::Milestone {
            milestone_title: title,
            achievement_value: value,
            milestone_date: date,
            milestone_notes: notes,
        } => {
            milestone_title = Some(title.clone());
            achievement_value = Some(value.clone());
            milestone_date = Some(*date);
            milestone_notes = Some(notes.clone());
        }
    }

    Ok(vec![
        Value::Text(entry.id.to_string()),
        Value::Integer(entry.date),
        Value::Text(entry.title.clone()),
        Value::Text(entry.text.clone()),
        opt_text(entry.strava_link.clone()),
        Value::Text(activity_type_to_db(entry.activity_type()).to_string()),
        opt_int(entry.feeling.map(i64::from)),
        opt_int(golf_score),
        opt_int(end_date),
        opt_int(week_feeling),
        opt_text(injury_name),
        opt_int(injury_start_date),
        opt_text(injury_details),
        opt_text(injury_side.map(str::to_string)),
        opt_text(injury_check_ins),
        opt_text(milestone_title),
        opt_text(achievement_value),
        opt_int(milestone_date),
        opt_text(milestone_notes),
    ])
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<JournalEntry> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "entries.id")?;

    let type_text: String = row.get("activity_type")?;
    let activity_type = parse_activity_type_db(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid activity type `{type_text}` in entries.activity_type"
        ))
    })?;

    let kind = match activity_type {
        ActivityType::Reflection => EntryKind::Reflection,
        ActivityType::WeeklyRecap => EntryKind::WeeklyRecap {
            end_date: require_column(row.get("end_date")?, "entries.end_date")?,
            week_feeling: parse_score_u8(
                require_column(row.get::<_, Option<i64>>("week_feeling")?, "entries.week_feeling")?,
                "entries.week_feeling",
            )?,
        },
        ActivityType::Injury => {
            let check_ins = match row.get::<_, Option<String>>("injury_check_ins")? {
                Some(json) => serde_json::from_str::<Vec<InjuryCheckIn>>(&json).map_err(|err| {
                    RepoError::InvalidData(format!(
                        "invalid check-in json in entries.injury_check_ins: {err}"
                    ))
                })?,
                None => Vec::new(),
            };
            let side_text: String =
                require_column(row.get("injury_side")?, "entries.injury_side")?;
            EntryKind::Injury {
                injury_name: require_column(row.get("injury_name")?, "entries.injury_name")?,
                injury_start_date: require_column(
                    row.get("injury_start_date")?,
                    "entries.injury_start_date",
                )?,
                injury_details: require_column(
                    row.get("injury_details")?,
                    "entries.injury_details",
                )?,
                injury_side: parse_side_db(&side_text).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid injury side `{side_text}` in entries.injury_side"
                    ))
                })?,
                check_ins,
            }
        }
        ActivityType::Milestone => EntryKind::Milestone {
            milestone_title: require_column(
                row.get("milestone_title")?,
                "entries.milestone_title",
            )?,
            achievement_value: require_column(
                row.get("achievement_value")?,
                "entries.achievement_value",
            )?,
            milestone_date: require_column(row.get("milestone_date")?, "entries.milestone_date")?,
            milestone_notes: require_column(
                row.get("milestone_notes")?,
                "entries.milestone_notes",
            )?,
        },
        sport_type => {
            // Only sport discriminators remain at this point.
            let sport = Sport::from_activity_type(sport_type).ok_or_else(|| {
                RepoError::InvalidData(format!("`{type_text}` is not a sport subtype"))
            })?;
            EntryKind::Activity {
                sport,
                golf_score: row
                    .get::<_, Option<i64>>("golf_score")?
                    .map(|value| value as i32),
            }
        }
    };

    let feeling = match row.get::<_, Option<i64>>("feeling")? {
        Some(value) => Some(parse_score_u8(value, "entries.feeling")?),
        None => None,
    };

    let mut entry = JournalEntry::with_id(
        id,
        kind,
        row.get("date")?,
        row.get::<_, String>("title")?,
        row.get::<_, String>("text")?,
    );
    entry.strava_link = row.get("strava_link")?;
    entry.feeling = feeling;
    entry.validate()?;
    Ok(entry)
}

fn require_column<T>(value: Option<T>, column: &str) -> RepoResult<T> {
    value.ok_or_else(|| RepoError::InvalidData(format!("unexpected NULL in {column}")))
}

fn parse_score_u8(value: i64, column: &str) -> RepoResult<u8> {
    u8::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value {value} out of range in {column}")))
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

/// Escapes LIKE wildcards and wraps the query in `%`.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn activity_type_to_db(kind: ActivityType) -> &'static str {
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

fn parse_activity_type_db(value: &str) -> Option<ActivityType> {
    match value {
        "run" => Some(ActivityType::Run),
        "walk" => Some(ActivityType::Walk),
        "hike" => Some(ActivityType::Hike),
        "bike" => Some(ActivityType::Bike),
        "swim" => Some(ActivityType::Swim),
        "lift" => Some(ActivityType::Lift),
        "yoga" => Some(ActivityType::Yoga),
        "golf" => Some(ActivityType::Golf),
        "milestone" => Some(ActivityType::Milestone),
        "reflection" => Some(ActivityType::Reflection),
        "other" => Some(ActivityType::Other),
        "weekly_recap" => Some(ActivityType::WeeklyRecap),
        "injury" => Some(ActivityType::Injury),
        _ => None,
    }
}

fn side_to_db(side: InjurySide) -> &'static str {
    match side {
        InjurySide::Left => "left",
        InjurySide::Right => "right",
        InjurySide::NotApplicable => "na",
    }
}

fn parse_side_db(value: &str) -> Option<InjurySide> {
    match value {
        "left" => Some(InjurySide::Left),
        "right" => Some(InjurySide::Right),
        "na" => Some(InjurySide::NotApplicable),
        _ => None,
    }
}

pub(crate) fn ensure_entry_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected = latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual != expected {
        return Err(RepoError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        });
    }

    for table in ["entries", "photos"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in ["id", "date", "title", "text", "activity_type", "end_date"] {
        if !table_has_column(conn, "entries", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "entries",
                column,
            });
        }
    }

    for column in ["id", "entry_id", "caption"] {
        if !table_has_column(conn, "photos", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "photos",
                column,
            });
        }
    }

    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(
    conn: &Connection,
    table: &'static str,
    column: &str,
) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
