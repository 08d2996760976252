//! Directory-backed blob store.
//!
//! The container is a directory (typically a network share or a folder
//! kept in sync by a third-party client); each blob is a file directly
//! inside it. Writes land in a hidden temporary file unique to the writer
//! and are renamed into place, so readers never observe a half-written blob
//! and concurrent writers from different machines never share a temp file.

use super::{validate_blob_name, RemoteStore, StoreError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Suffix of in-flight upload files.
const PARTIAL_SUFFIX: &str = ".partial";

/// Blob store rooted at a local or mounted directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store whose container is `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The container directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_blob_name(name)?;
        Ok(self.root.join(name))
    }

    fn partial_path(&self, name: &str) -> PathBuf {
        let tag = uuid::Uuid::new_v4();
        self.root
            .join(format!(".{name}.{}{PARTIAL_SUFFIX}", tag.as_simple()))
    }

    async fn commit(&self, partial: &Path, target: &Path) -> Result<(), StoreError> {
        if let Err(e) = tokio::fs::rename(partial, target).await {
            let _ = tokio::fs::remove_file(partial).await;
            return Err(unavailable("rename", target, e));
        }
        Ok(())
    }
}

fn unavailable(op: &str, path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Unavailable(format!("{op} {}: {e}", path.display()))
}

#[async_trait]
impl RemoteStore for FsStore {
    async fn ensure_container(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| unavailable("create container", &self.root, e))
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.blob_path(name)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| unavailable("stat", &path, e))
    }

    async fn read_text(&self, name: &str) -> Result<Option<String>, StoreError> {
        let path = self.blob_path(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unavailable("read", &path, e)),
        }
    }

    async fn upload_file(&self, name: &str, path: &Path) -> Result<(), StoreError> {
        let target = self.blob_path(name)?;
        let partial = self.partial_path(name);

        let mut source = tokio::fs::File::open(path)
            .await
            .map_err(|source| StoreError::Local {
                path: path.to_path_buf(),
                source,
            })?;
        let mut dest = tokio::fs::File::create(&partial)
            .await
            .map_err(|e| unavailable("create", &partial, e))?;

        let copied = tokio::io::copy(&mut source, &mut dest).await;
        let synced = match copied {
            Ok(_) => dest.sync_all().await,
            Err(e) => Err(e),
        };
        drop(dest);
        if let Err(e) = synced {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(unavailable("write", &partial, e));
        }

        self.commit(&partial, &target).await
    }

    async fn upload_text(&self, name: &str, content: &str) -> Result<(), StoreError> {
        let target = self.blob_path(name)?;
        let partial = self.partial_path(name);

        if let Err(e) = tokio::fs::write(&partial, content.as_bytes()).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(unavailable("write", &partial, e));
        }
        self.commit(&partial, &target).await
    }

    async fn download_to_file(&self, name: &str, path: &Path) -> Result<(), StoreError> {
        let source = self.blob_path(name)?;
        let mut reader = match tokio::fs::File::open(&source).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(unavailable("open", &source, e)),
        };

        let mut writer = tokio::fs::File::create(path)
            .await
            .map_err(|source| StoreError::Local {
                path: path.to_path_buf(),
                source,
            })?;
        tokio::io::copy(&mut reader, &mut writer)
            .await
            .map_err(|e| unavailable("copy", &source, e))?;
        writer.sync_all().await.map_err(|source| StoreError::Local {
            path: path.to_path_buf(),
            source,
        })
    }

    fn describe(&self) -> String {
        format!("fs:{}", self.root.display())
    }
}
