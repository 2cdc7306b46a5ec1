//! Persistence layer: repository traits and SQLite implementations.
//!
//! # Responsibility
//! - Keep all SQL behind repository contracts.
//! - Expose typed errors the service and codec layers can act on.

pub mod entry_repo;
pub mod preferences_repo;
