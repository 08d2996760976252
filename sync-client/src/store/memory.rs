//! In-memory blob store for testing.
//!
//! Allows seeding blobs, injecting failures and capturing the sequence of
//! operations for verification.

use super::{validate_blob_name, RemoteStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A recorded store operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// `ensure_container()`.
    EnsureContainer,
    /// `exists(name)`.
    Exists(String),
    /// `read_text(name)`.
    ReadText(String),
    /// `upload_file(name, _)`.
    UploadFile(String),
    /// `upload_text(name, _)`.
    UploadText(String),
    /// `download_to_file(name, _)`.
    Download(String),
}

/// In-memory blob store.
///
/// Clones share state, so a test can hand one clone to the engine and
/// inspect another. Two engines sharing one store simulate two machines.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    container_created: bool,
    blobs: HashMap<String, Vec<u8>>,
    operations: Vec<StoreOp>,
    fail_next: Vec<(StoreOp, String)>,
    offline: Option<String>,
}

impl MemoryStoreInner {
    fn check(&mut self, op: StoreOp) -> Result<(), StoreError> {
        self.operations.push(op.clone());

        if let Some(reason) = &self.offline {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        if let Some(pos) = self.fail_next.iter().position(|(o, _)| *o == op) {
            let (_, reason) = self.fail_next.remove(pos);
            return Err(StoreError::Unavailable(reason));
        }
        Ok(())
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob without recording an operation.
    pub fn put_blob(&self, name: &str, data: impl Into<Vec<u8>>) {
        let mut inner = self.inner.lock().unwrap();
        inner.blobs.insert(name.to_string(), data.into());
    }

    /// Get a blob's content without recording an operation.
    pub fn blob(&self, name: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.blobs.get(name).cloned()
    }

    /// Get a blob as text without recording an operation.
    pub fn text(&self, name: &str) -> Option<String> {
        self.blob(name)
            .map(|b| String::from_utf8_lossy(&b).into_owned())
    }

    /// Check whether `ensure_container()` has succeeded at least once.
    pub fn container_created(&self) -> bool {
        self.inner.lock().unwrap().container_created
    }

    /// Get all operations performed so far.
    pub fn operations(&self) -> Vec<StoreOp> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Forget recorded operations.
    pub fn clear_operations(&self) {
        self.inner.lock().unwrap().operations.clear();
    }

    /// Cause the next matching operation to fail with `Unavailable`.
    pub fn fail_next(&self, op: StoreOp, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next.push((op, error.to_string()));
    }

    /// Make every operation fail until cleared with `None`.
    pub fn set_offline(&self, reason: Option<&str>) {
        let mut inner = self.inner.lock().unwrap();
        inner.offline = reason.map(str::to_string);
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn ensure_container(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check(StoreOp::EnsureContainer)?;
        inner.container_created = true;
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        validate_blob_name(name)?;
        let mut inner = self.inner.lock().unwrap();
        inner.check(StoreOp::Exists(name.to_string()))?;
        Ok(inner.blobs.contains_key(name))
    }

    async fn read_text(&self, name: &str) -> Result<Option<String>, StoreError> {
        validate_blob_name(name)?;
        let mut inner = self.inner.lock().unwrap();
        inner.check(StoreOp::ReadText(name.to_string()))?;
        Ok(inner
            .blobs
            .get(name)
            .map(|b| String::from_utf8_lossy(b).into_owned()))
    }

    async fn upload_file(&self, name: &str, path: &Path) -> Result<(), StoreError> {
        validate_blob_name(name)?;
        self.inner
            .lock()
            .unwrap()
            .check(StoreOp::UploadFile(name.to_string()))?;

        // Read outside the lock
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| StoreError::Local {
                path: path.to_path_buf(),
                source,
            })?;

        let mut inner = self.inner.lock().unwrap();
        inner.blobs.insert(name.to_string(), data);
        Ok(())
    }

    async fn upload_text(&self, name: &str, content: &str) -> Result<(), StoreError> {
        validate_blob_name(name)?;
        let mut inner = self.inner.lock().unwrap();
        inner.check(StoreOp::UploadText(name.to_string()))?;
        inner
            .blobs
            .insert(name.to_string(), content.as_bytes().to_vec());
        Ok(())
    }

    async fn download_to_file(&self, name: &str, path: &Path) -> Result<(), StoreError> {
        validate_blob_name(name)?;
        let data = {
            let mut inner = self.inner.lock().unwrap();
            inner.check(StoreOp::Download(name.to_string()))?;
            inner.blobs.get(name).cloned().ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })?
        };

        tokio::fs::write(path, data)
            .await
            .map_err(|source| StoreError::Local {
                path: path.to_path_buf(),
                source,
            })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
