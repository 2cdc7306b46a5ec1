//! Interchange codec: export to JSON/text/CSV, import from JSON.
//!
//! # Responsibility
//! - Serialize filtered entry sets for backup and sharing.
//! - Restore previously exported JSON documents with id-based dedup.
//!
//! # Invariants
//! - JSON is the only round-trip format; text and CSV are write-only.
//! - The wire schema stays compatible with historical exports: flat
//!   all-optional records, camelCase keys, ISO-8601 dates.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

pub mod export;
pub mod import;
pub mod wire;

/// Formats an epoch-milliseconds timestamp as an ISO-8601 UTC string.
///
/// Returns `None` for timestamps outside chrono's representable range.
pub(crate) fn epoch_ms_to_iso(ms: i64) -> Option<String> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Parses an ISO-8601 timestamp back to epoch milliseconds.
pub(crate) fn iso_to_epoch_ms(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}
