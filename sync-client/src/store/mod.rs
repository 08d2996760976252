//! Remote blob store abstraction.
//!
//! The engine talks to the remote through [`RemoteStore`], a minimal
//! capability set over one named container of named blobs. Any object
//! storage backend can sit behind it.
//!
//! # Design
//!
//! - Writes overwrite unconditionally (last writer wins, no precondition)
//! - Every failure is recoverable: the caller ends the cycle with an error
//!   result and retries on the next poll
//! - Large payloads stream from/to local files; only the hash record is read
//!   into memory
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryStore::new();
//! store.ensure_container().await?;
//! store.upload_text("save.sav.hash", "abc123").await?;
//! assert_eq!(store.read_text("save.sav.hash").await?, Some("abc123".into()));
//! ```

mod fs;
mod memory;
#[cfg(feature = "cloud")]
mod object;

pub use fs::FsStore;
pub use memory::{MemoryStore, StoreOp};
#[cfg(feature = "cloud")]
pub use object::{CloudProvider, ObjectStoreBackend};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Remote store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network, auth, timeout or backend failure.
    #[error("{0}")]
    Unavailable(String),

    /// A blob that had to exist does not.
    #[error("blob not found: {name}")]
    NotFound {
        /// Blob name.
        name: String,
    },

    /// Blob name cannot be mapped onto this backend.
    #[error("invalid blob name: {name:?}")]
    InvalidName {
        /// Blob name.
        name: String,
    },

    /// Reading or writing the local side of a transfer failed.
    #[error("local file {path}: {source}")]
    Local {
        /// Local file involved in the transfer.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Blob store operations used by the sync engine.
///
/// Implementations handle the underlying storage mechanism
/// (shared directory, S3/GCS, in-memory, etc).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create the backing container if it does not exist. Idempotent.
    async fn ensure_container(&self) -> Result<(), StoreError>;

    /// Check whether a blob exists.
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Read a small text blob. `None` if the blob does not exist.
    async fn read_text(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Stream a local file into a blob, replacing any previous content.
    async fn upload_file(&self, name: &str, path: &Path) -> Result<(), StoreError>;

    /// Write a short string as a blob, replacing any previous content.
    async fn upload_text(&self, name: &str, content: &str) -> Result<(), StoreError>;

    /// Stream a blob into a local file, replacing the file.
    ///
    /// Returns `NotFound` if the blob does not exist.
    async fn download_to_file(&self, name: &str, path: &Path) -> Result<(), StoreError>;

    /// Short description for log lines (backend and container).
    fn describe(&self) -> String;
}

/// Reject names that would escape a flat container.
pub(crate) fn validate_blob_name(name: &str) -> Result<(), StoreError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        Err(StoreError::InvalidName {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}
