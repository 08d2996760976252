//! Save file discovery and backup.

use chrono::NaiveDateTime;
use savesync_core::{backup_candidates, is_save_file, select_latest, SaveCandidate};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Outcome of looking for the save file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveLookup {
    /// The newest matching file.
    Found(PathBuf),
    /// The configured directory does not exist.
    DirectoryMissing,
    /// The directory exists but contains no matching file.
    NoMatch,
}

/// Finds the current save file in a directory.
#[derive(Debug, Clone)]
pub struct SaveLocator {
    directory: PathBuf,
    prefix: String,
}

impl SaveLocator {
    /// Look for `<prefix>*.sav` inside `directory`.
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    /// The save directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The file name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// List the directory and pick the most recently modified save.
    ///
    /// Entries that vanish or cannot be stat'ed while listing are skipped.
    pub async fn locate(&self) -> std::io::Result<SaveLookup> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SaveLookup::DirectoryMissing),
            Err(e) => return Err(e),
        };

        let mut candidates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_save_file(name, &self.prefix) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("Skipping unreadable save candidate {}: {}", name, e);
                    continue;
                }
            };
            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Skipping save candidate {} without mtime: {}", name, e);
                    continue;
                }
            };
            candidates.push(SaveCandidate {
                path: entry.path(),
                modified,
            });
        }

        tracing::debug!(
            "Found {} save candidates in {}",
            candidates.len(),
            self.directory.display()
        );

        Ok(match select_latest(candidates) {
            Some(c) => SaveLookup::Found(c.path),
            None => SaveLookup::NoMatch,
        })
    }
}

/// Copy `save` to a fresh timestamped backup path and return that path.
///
/// Existing backups are never overwritten: a path that already exists moves
/// on to the next numbered candidate. Fails with `AlreadyExists` when every
/// candidate for `at` is taken.
pub async fn create_backup(save: &Path, at: NaiveDateTime) -> std::io::Result<PathBuf> {
    let mut source = tokio::fs::File::open(save).await?;

    for backup in backup_candidates(save, at) {
        let mut target = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&backup)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        };

        let copied = async {
            tokio::io::copy(&mut source, &mut target).await?;
            target.sync_all().await
        }
        .await;
        if let Err(e) = copied {
            drop(target);
            let _ = tokio::fs::remove_file(&backup).await;
            return Err(e);
        }
        return Ok(backup);
    }

    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free backup name left for {}", save.display()),
    ))
}
