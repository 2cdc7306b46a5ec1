//! Entry use-case service.
//!
//! # Responsibility
//! - Provide typed create entry points, one per creatable subtype.
//! - Coordinate the record store with the photo content store, so cascade
//!   delete covers backing image bytes as well as rows.
//! - Keep the weekly recap date derivation in one place.
//!
//! # Invariants
//! - A recap's envelope `date` is always recomputed from `end_date` on every
//!   create and update that passes through this service.
//! - Photo content is saved before the owning row set is committed, and
//!   removed only after a successful commit.

use crate::model::entry::{
    recap_start_date, EntryId, EntryKind, InjuryCheckIn, InjurySide, JournalEntry, Sport,
};
use crate::model::photo::{JournalPhoto, PhotoId};
use crate::photos::{PhotoContentStore, PhotoStoreError};
use crate::repo::entry_repo::{EntryListQuery, EntryRepository, RepoError};
use log::warn;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, EntryServiceError>;

/// Service error for entry use-cases.
#[derive(Debug)]
pub enum EntryServiceError {
    Repo(RepoError),
    Photo(PhotoStoreError),
}

impl Display for EntryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Photo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EntryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Photo(err) => Some(err),
        }
    }
}

impl From<RepoError> for EntryServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<PhotoStoreError> for EntryServiceError {
    fn from(value: PhotoStoreError) -> Self {
        Self::Photo(value)
    }
}

/// Request model for logging a workout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLogRequest {
    pub sport: Sport,
    /// Epoch milliseconds.
    pub date: i64,
    pub title: String,
    pub text: String,
    pub feeling: Option<u8>,
    pub strava_link: Option<String>,
    /// Only meaningful when `sport == Sport::Golf`.
    pub golf_score: Option<i32>,
}

/// Request model for a weekly recap. The envelope date is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyRecapRequest {
    /// End of the recapped week, epoch milliseconds.
    pub end_date: i64,
    pub week_feeling: u8,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjuryRequest {
    pub date: i64,
    pub title: String,
    pub text: String,
    pub injury_name: String,
    pub injury_start_date: i64,
    pub injury_details: String,
    pub injury_side: InjurySide,
    pub check_ins: Vec<InjuryCheckIn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneRequest {
    pub date: i64,
    pub title: String,
    pub text: String,
    pub milestone_title: String,
    /// Free-text achievement, e.g. "3:45:23".
    pub achievement_value: String,
    pub milestone_date: i64,
    pub milestone_notes: String,
}

/// Use-case service wrapper for entry CRUD plus photo coordination.
pub struct EntryService<R: EntryRepository, P: PhotoContentStore> {
    repo: R,
    photos: P,
}

impl<R: EntryRepository, P: PhotoContentStore> EntryService<R, P> {
    pub fn new(repo: R, photos: P) -> Self {
        Self { repo, photos }
    }

    /// Logs a workout entry.
    pub fn log_activity(&mut self, request: &ActivityLogRequest) -> ServiceResult<EntryId> {
        let mut entry = JournalEntry::new(
            EntryKind::Activity {
                sport: request.sport,
                golf_score: request.golf_score,
            },
            request.date,
            request.title.clone(),
            request.text.clone(),
        );
        entry.feeling = request.feeling;
        entry.strava_link = request.strava_link.clone();
        Ok(self.repo.create_entry(&entry)?)
    }

    /// Writes a free-form reflection.
    pub fn write_reflection(
        &mut self,
        date: i64,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> ServiceResult<EntryId> {
        let entry = JournalEntry::new(EntryKind::Reflection, date, title, text);
        Ok(self.repo.create_entry(&entry)?)
    }

    /// Records a weekly recap, deriving the display date from the end date.
    pub fn recap_week(&mut self, request: &WeeklyRecapRequest) -> ServiceResult<EntryId> {
        let entry = JournalEntry::new(
            EntryKind::WeeklyRecap {
                end_date: request.end_date,
                week_feeling: request.week_feeling,
            },
            recap_start_date(request.end_date),
            request.title.clone(),
            request.text.clone(),
        );
        Ok(self.repo.create_entry(&entry)?)
    }

    /// Records an injury, optionally still a draft (empty title allowed).
    pub fn record_injury(&mut self, request: &InjuryRequest) -> ServiceResult<EntryId> {
        let entry = JournalEntry::new(
            EntryKind::Injury {
                injury_name: request.injury_name.clone(),
                injury_start_date: request.injury_start_date,
                injury_details: request.injury_details.clone(),
                injury_side: request.injury_side,
                check_ins: request.check_ins.clone(),
            },
            request.date,
            request.title.clone(),
            request.text.clone(),
        );
        Ok(self.repo.create_entry(&entry)?)
    }

    /// Records a milestone achievement.
    pub fn record_milestone(&mut self, request: &MilestoneRequest) -> ServiceResult<EntryId> {
        let entry = JournalEntry::new(
            EntryKind::Milestone {
                milestone_title: request.milestone_title.clone(),
                achievement_value: request.achievement_value.clone(),
                milestone_date: request.milestone_date,
                milestone_notes: request.milestone_notes.clone(),
            },
            request.date,
            request.title.clone(),
            request.text.clone(),
        );
        Ok(self.repo.create_entry(&entry)?)
    }

    pub fn get_entry(&self, id: EntryId) -> ServiceResult<Option<JournalEntry>> {
        Ok(self.repo.get_entry(id)?)
    }

    pub fn list_entries(&self, query: &EntryListQuery) -> ServiceResult<Vec<JournalEntry>> {
        Ok(self.repo.list_entries(query)?)
    }

    /// Rewrites an entry. Recap dates are re-derived; photo content belonging
    /// to photos dropped from the entry is removed after the commit.
    pub fn update_entry(&mut self, entry: &JournalEntry) -> ServiceResult<()> {
        let mut entry = entry.clone();
        if let EntryKind::WeeklyRecap { end_date, .. } = entry.kind {
            entry.date = recap_start_date(end_date);
        }

        let previous = self
            .repo
            .get_entry(entry.id)?
            .ok_or(RepoError::NotFound(entry.id))?;

        self.repo.update_entry(&entry)?;

        let kept: HashSet<PhotoId> = entry.photos.iter().map(|photo| photo.id).collect();
        for photo in &previous.photos {
            if !kept.contains(&photo.id) {
                self.remove_content_best_effort(photo.id);
            }
        }

        Ok(())
    }

    /// Attaches a photo, persisting content and record together.
    ///
    /// Content is written first; the row update enforces the per-entry cap
    /// and a failed update removes the freshly written content again.
    pub fn attach_photo(
        &mut self,
        entry_id: EntryId,
        caption: Option<String>,
        bytes: &[u8],
    ) -> ServiceResult<PhotoId> {
        let mut entry = self
            .repo
            .get_entry(entry_id)?
            .ok_or(RepoError::NotFound(entry_id))?;

        let photo = JournalPhoto::new(caption);
        let photo_id = photo.id;
        self.photos.save_photo(photo_id, bytes)?;

        entry.photos.push(photo);
        if let Err(err) = self.repo.update_entry(&entry) {
            self.remove_content_best_effort(photo_id);
            return Err(err.into());
        }

        Ok(photo_id)
    }

    /// Deletes an entry, cascading to photo rows and their backing content.
    pub fn delete_entry(&mut self, id: EntryId) -> ServiceResult<()> {
        let removed = self.repo.delete_entry(id)?;
        for photo_id in removed {
            self.remove_content_best_effort(photo_id);
        }
        Ok(())
    }

    // Row deletion is already committed at this point; content removal
    // failures cannot roll it back, so they are logged and swallowed.
    fn remove_content_best_effort(&self, photo_id: PhotoId) {
        if let Err(err) = self.photos.remove_photo(photo_id) {
            warn!(
                "event=photo_content_remove module=service status=error photo_id={photo_id} error={err}"
            );
        }
    }
}
