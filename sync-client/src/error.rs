//! Error types for sync cycles.

use savesync_core::Fingerprint;
use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that abort a sync cycle.
///
/// None of these escape [`crate::SyncEngine::synchronize`]; they are turned
/// into an `Error` result there.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local file read/write/copy failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Remote store operation failed.
    #[error("remote store unavailable: {0}")]
    Remote(#[from] StoreError),

    /// One or both upload writes failed. The cache is left untouched.
    #[error("upload incomplete: {}", describe_upload(.payload, .record))]
    UploadIncomplete {
        /// Failure writing the save payload blob, if any.
        payload: Option<StoreError>,
        /// Failure writing the hash record blob, if any.
        record: Option<StoreError>,
    },

    /// Could not copy the save aside before a download; nothing was overwritten.
    #[error("backup of {path} failed, download aborted: {source}")]
    BackupFailed {
        /// The save file that was to be backed up.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The downloaded payload hashes to something other than the record.
    /// The save and cache are left untouched.
    #[error("remote payload does not match hash record (record {expected}, payload {actual})")]
    PayloadMismatch {
        /// Fingerprint published in the hash record.
        expected: Fingerprint,
        /// Fingerprint of the payload actually downloaded.
        actual: Fingerprint,
    },
}

impl SyncError {
    /// Wrap an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

fn describe_upload(payload: &Option<StoreError>, record: &Option<StoreError>) -> String {
    match (payload, record) {
        (Some(p), Some(r)) => format!("save blob: {p}; hash record: {r}"),
        (Some(p), None) => format!("save blob: {p}"),
        (None, Some(r)) => format!("hash record: {r}"),
        (None, None) => "unknown failure".to_string(),
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;
