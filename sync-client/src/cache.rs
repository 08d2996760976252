//! Last-known-remote-fingerprint cache.
//!
//! The cache is the only durable state the engine owns. It answers one
//! question: "what did the remote hash record hold the last time this
//! machine uploaded or downloaded?"

use async_trait::async_trait;
use savesync_core::Fingerprint;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Cache write errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Writing the cache file failed.
    #[error("cache write to {path} failed: {source}")]
    Write {
        /// Cache file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Injected failure (tests).
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Persistent store for the last remote fingerprint this machine observed.
#[async_trait]
pub trait StateCache: Send + Sync {
    /// Read the cached fingerprint. Missing, unreadable or malformed
    /// content reads as `None`.
    async fn read(&self) -> Option<Fingerprint>;

    /// Replace the cached fingerprint.
    async fn write(&self, fingerprint: &Fingerprint) -> Result<(), CacheError>;
}

/// Cache stored as a single text file holding the lowercase hex fingerprint.
#[derive(Debug, Clone)]
pub struct FileStateCache {
    path: PathBuf,
}

impl FileStateCache {
    /// Create a cache backed by `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn write_atomic(&self, content: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, content).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl StateCache for FileStateCache {
    async fn read(&self) -> Option<Fingerprint> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    "Cache read from {} failed, treating as absent: {}",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        match Fingerprint::parse(&content) {
            Ok(fp) => Some(fp),
            Err(e) => {
                if !content.trim().is_empty() {
                    tracing::warn!("Ignoring malformed cache {}: {}", self.path.display(), e);
                }
                None
            }
        }
    }

    async fn write(&self, fingerprint: &Fingerprint) -> Result<(), CacheError> {
        self.write_atomic(fingerprint.as_str())
            .await
            .map_err(|source| CacheError::Write {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!("Cache {} updated to {}", self.path.display(), fingerprint.short());
        Ok(())
    }
}

/// In-memory cache for testing.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateCache {
    inner: Arc<Mutex<MemoryCacheInner>>,
}

#[derive(Debug, Default)]
struct MemoryCacheInner {
    value: Option<Fingerprint>,
    reads: usize,
    writes: usize,
    fail_next_write: Option<String>,
}

impl MemoryStateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache already holding `value`.
    pub fn with_value(value: Fingerprint) -> Self {
        let cache = Self::new();
        cache.inner.lock().unwrap().value = Some(value);
        cache
    }

    /// Current value, without counting a read.
    pub fn value(&self) -> Option<Fingerprint> {
        self.inner.lock().unwrap().value.clone()
    }

    /// Number of `read()` calls.
    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }

    /// Number of successful `write()` calls.
    pub fn writes(&self) -> usize {
        self.inner.lock().unwrap().writes
    }

    /// Cause the next `write()` to fail.
    pub fn fail_next_write(&self, reason: &str) {
        self.inner.lock().unwrap().fail_next_write = Some(reason.to_string());
    }
}

#[async_trait]
impl StateCache for MemoryStateCache {
    async fn read(&self) -> Option<Fingerprint> {
        let mut inner = self.inner.lock().unwrap();
        inner.reads += 1;
        inner.value.clone()
    }

    async fn write(&self, fingerprint: &Fingerprint) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(reason) = inner.fail_next_write.take() {
            return Err(CacheError::Unavailable(reason));
        }
        inner.value = Some(fingerprint.clone());
        inner.writes += 1;
        Ok(())
    }
}
