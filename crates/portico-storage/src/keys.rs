//! Object key derivation.
//!
//! Keys are `documents/{millis}_{sanitized-filename}`: the millisecond
//! timestamp keeps same-named files from colliding across uploads.

use chrono::{DateTime, Utc};

/// Replace anything outside `[A-Za-z0-9._-]` with `_` and strip leading
/// dots so a filename cannot escape its prefix or hide as a dotfile.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Derive the storage key for an upload from its timestamp and filename.
pub fn derive_object_key(timestamp: DateTime<Utc>, file_name: &str) -> String {
    format!(
        "documents/{}_{}",
        timestamp.timestamp_millis(),
        sanitize_filename(file_name)
    )
}
