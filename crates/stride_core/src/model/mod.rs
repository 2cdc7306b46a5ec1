//! Domain model for the fitness journal.
//!
//! # Responsibility
//! - Define the journal entry record, its subtype variants and validation.
//! - Define photo attachments and the user preferences record.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryId`, never reused.
//! - Subtype-specific fields live on their owning `EntryKind` variant only.

pub mod entry;
pub mod photo;
pub mod preferences;
