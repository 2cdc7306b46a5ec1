//! Core domain logic for the Stride fitness journal.
//! This crate is the single source of truth for business invariants.

pub mod codec;
pub mod db;
pub mod logging;
pub mod model;
pub mod photos;
pub mod repo;
pub mod service;

pub use codec::export::{
    csv_escape, export_entries, DateRangeFilter, ExportError, ExportFormat, ExportResult,
};
pub use codec::import::{import_json, ImportError, ImportResult, ImportSummary};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{
    ActivityType, EntryId, EntryKind, EntryValidationError, InjuryCheckIn, InjurySide,
    JournalEntry, Sport, MAX_PHOTOS_PER_ENTRY,
};
pub use model::photo::{JournalPhoto, PhotoId};
pub use model::preferences::{ThemePreference, UserPreferences, WeeklySchedule};
pub use photos::{FsPhotoStore, PhotoContentSource, PhotoContentStore, PhotoStoreError};
pub use repo::entry_repo::{
    EntryListQuery, EntryRepository, RepoError, RepoResult, SqliteEntryRepository,
};
pub use repo::preferences_repo::{PreferencesRepository, SqlitePreferencesRepository};
pub use service::entry_service::{
    ActivityLogRequest, EntryService, EntryServiceError, InjuryRequest, MilestoneRequest,
    WeeklyRecapRequest,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
