//! Content hashing.
//!
//! Save files can be large, so the file is streamed through the digest in
//! [`HASH_CHUNK_SIZE`] pieces instead of being read in one shot.

use async_trait::async_trait;
use savesync_core::Fingerprint;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;

/// Read buffer size for hashing (64 KiB).
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Computes the fingerprint of a local file.
#[async_trait]
pub trait ContentHasher: Send + Sync {
    /// Hash the file at `path`.
    ///
    /// Unreadable files (deleted mid-cycle, permission denied) are errors;
    /// the caller aborts the cycle.
    async fn hash(&self, path: &Path) -> std::io::Result<Fingerprint>;
}

/// SHA-256 hasher.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentHasher for Sha256Hasher {
    async fn hash(&self, path: &Path) -> std::io::Result<Fingerprint> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; HASH_CHUNK_SIZE];

        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(Fingerprint::from_digest(&hasher.finalize()))
    }
}

/// Hasher returning preset fingerprints, for tests.
///
/// Files whose bytes were registered with [`StaticHasher::map_content`]
/// report the mapped fingerprint; everything else reports the default.
/// Unreadable files are errors, as with the real hasher.
#[derive(Debug, Clone)]
pub struct StaticHasher {
    inner: Arc<Mutex<StaticHasherInner>>,
}

#[derive(Debug)]
struct StaticHasherInner {
    default: Fingerprint,
    by_content: Vec<(Vec<u8>, Fingerprint)>,
}

impl StaticHasher {
    /// Create a hasher that reports `value` for every file.
    pub fn new(value: Fingerprint) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StaticHasherInner {
                default: value,
                by_content: Vec::new(),
            })),
        }
    }

    /// Change the default fingerprint.
    pub fn set(&self, value: Fingerprint) {
        self.inner.lock().unwrap().default = value;
    }

    /// Report `value` for files containing exactly `content`.
    pub fn map_content(&self, content: impl Into<Vec<u8>>, value: Fingerprint) {
        self.inner
            .lock()
            .unwrap()
            .by_content
            .push((content.into(), value));
    }
}

#[async_trait]
impl ContentHasher for StaticHasher {
    async fn hash(&self, path: &Path) -> std::io::Result<Fingerprint> {
        let bytes = tokio::fs::read(path).await?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .by_content
            .iter()
            .find(|(content, _)| *content == bytes)
            .map_or_else(|| inner.default.clone(), |(_, fp)| fp.clone()))
    }
}
