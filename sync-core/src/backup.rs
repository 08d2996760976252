//! Backup file naming.
//!
//! Before a download overwrites the local save, the save is copied to
//! `<original path>.backup.<yyyyMMdd_HHmmss>`. A second backup within the
//! same second gets a numeric suffix (`.1`, `.2`, ...) instead of replacing
//! the first.

use chrono::NaiveDateTime;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Marker inserted between the original file name and the timestamp.
pub const BACKUP_MARKER: &str = ".backup.";

/// `chrono` format string for the timestamp suffix (`yyyyMMdd_HHmmss`).
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Highest numeric suffix tried for backups taken within one second.
pub const MAX_BACKUP_SUFFIX: u32 = 99;

/// Build the backup path for `original` taken at `at`.
pub fn backup_path(original: &Path, at: NaiveDateTime) -> PathBuf {
    let mut name = OsString::from(original.as_os_str());
    name.push(BACKUP_MARKER);
    name.push(at.format(BACKUP_TIMESTAMP_FORMAT).to_string());
    PathBuf::from(name)
}

/// Paths to try, in order, for a backup of `original` taken at `at`:
/// the plain timestamped path, then `.1` through [`MAX_BACKUP_SUFFIX`].
pub fn backup_candidates(original: &Path, at: NaiveDateTime) -> impl Iterator<Item = PathBuf> {
    let base = backup_path(original, at);
    std::iter::once(base.clone()).chain((1..=MAX_BACKUP_SUFFIX).map(move |n| {
        let mut name = OsString::from(base.as_os_str());
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }))
}
