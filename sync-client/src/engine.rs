//! SyncEngine - one synchronization cycle for a single save file.
//!
//! # Architecture
//!
//! The engine gathers three fingerprints, asks the pure decision table in
//! sync-core which way to go, and performs the transfer through its
//! injected collaborators:
//!
//! ```text
//! Poller / CLI → SyncEngine → decide() (sync-core, pure)
//!                    ↓
//!    GameProbe, SaveLocator, ContentHasher, RemoteStore, StateCache
//! ```
//!
//! # Guarantees
//!
//! - A download never replaces the save without a backup taken in the same
//!   cycle. If the backup fails nothing is overwritten.
//! - The cache is written only after the remote write (upload) or the local
//!   replace (download) fully succeeded, so after any successful transfer the
//!   cache equals the remote hash record.
//! - `synchronize()` never returns an error; failures become
//!   [`SyncAction::Error`] results and the next cycle retries.

use chrono::Local;
use savesync_core::{decide, Decision, Fingerprint, SyncAction, SyncResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cache::StateCache;
use crate::error::{Result, SyncError};
use crate::hasher::{ContentHasher, Sha256Hasher};
use crate::probe::{GameProbe, NoProbe};
use crate::save_file::{create_backup, SaveLocator, SaveLookup};
use crate::store::RemoteStore;

/// Suffix of the staging file a download is written to before replacing the save.
const STAGING_SUFFIX: &str = ".savesync-part";

/// Where the save lives and what the remote blobs are called.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the save files.
    pub save_directory: PathBuf,
    /// Save file name prefix (`<prefix>*.sav`).
    pub save_prefix: String,
    /// Remote blob holding the save content.
    pub save_blob: String,
    /// Remote blob holding the save's fingerprint.
    pub hash_blob: String,
}

impl EngineConfig {
    /// Create a configuration.
    pub fn new(
        save_directory: impl Into<PathBuf>,
        save_prefix: impl Into<String>,
        save_blob: impl Into<String>,
        hash_blob: impl Into<String>,
    ) -> Self {
        Self {
            save_directory: save_directory.into(),
            save_prefix: save_prefix.into(),
            save_blob: save_blob.into(),
            hash_blob: hash_blob.into(),
        }
    }
}

/// The three fingerprints of a cycle and the direction they lead to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    /// The save file the cycle operates on.
    pub save_path: PathBuf,
    /// Fingerprint of the local save.
    pub local: Fingerprint,
    /// Fingerprint held by the remote hash record, if usable.
    pub remote: Option<Fingerprint>,
    /// Last remote fingerprint this machine saw.
    pub cached: Option<Fingerprint>,
    /// What the decision table chose.
    pub decision: Decision,
}

/// Read-only report of what the next cycle would do.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    /// Remote store description.
    pub store: String,
    /// Whether the game probe reported the game as running.
    pub game_running: bool,
    /// Fingerprints and decision, if a save file was found.
    pub plan: Option<SyncPlan>,
    /// Why there is no plan.
    pub note: Option<String>,
}

impl SyncStatus {
    /// The action `synchronize()` would take right now.
    pub fn action(&self) -> SyncAction {
        if self.game_running {
            return SyncAction::Skipped;
        }
        self.plan
            .as_ref()
            .map_or(SyncAction::None, |p| p.decision.action())
    }
}

/// Keeps one save file in step with a remote store.
pub struct SyncEngine {
    store: Arc<dyn RemoteStore>,
    cache: Arc<dyn StateCache>,
    hasher: Arc<dyn ContentHasher>,
    probe: Arc<dyn GameProbe>,
    locator: SaveLocator,
    save_blob: String,
    hash_blob: String,
    cycle_guard: Mutex<()>,
}

impl SyncEngine {
    /// Create an engine with the SHA-256 hasher and no game probe.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn RemoteStore>,
        cache: Arc<dyn StateCache>,
    ) -> Self {
        Self {
            store,
            cache,
            hasher: Arc::new(Sha256Hasher::new()),
            probe: Arc::new(NoProbe),
            locator: SaveLocator::new(config.save_directory, config.save_prefix),
            save_blob: config.save_blob,
            hash_blob: config.hash_blob,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Replace the content hasher.
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the game probe.
    pub fn with_probe(mut self, probe: Arc<dyn GameProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Remote store description, for logs.
    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    /// Run one sync cycle.
    ///
    /// Cycles are serialized: a concurrent caller waits for the running
    /// cycle to finish and then runs its own.
    pub async fn synchronize(&self) -> SyncResult {
        let _guard = self.cycle_guard.lock().await;

        if self.game_running().await {
            tracing::debug!("Game is running, skipping sync cycle");
            return SyncResult::skipped("game is running");
        }

        match self.run_cycle().await {
            Ok(result) => {
                tracing::info!("Sync cycle finished: {}", result);
                result
            }
            Err(e) => {
                tracing::error!("Sync cycle failed: {}", e);
                SyncResult::error(e.to_string())
            }
        }
    }

    /// Report what `synchronize()` would do, without creating the container
    /// or writing anything.
    pub async fn inspect(&self) -> Result<SyncStatus> {
        let _guard = self.cycle_guard.lock().await;

        let game_running = self.game_running().await;
        let (plan, note) = match self.locate().await? {
            Ok(save) => (Some(self.plan(save).await?), None),
            Err(note) => (None, Some(note)),
        };

        Ok(SyncStatus {
            store: self.store.describe(),
            game_running,
            plan,
            note,
        })
    }

    async fn run_cycle(&self) -> Result<SyncResult> {
        let save = match self.locate().await? {
            Ok(save) => save,
            Err(note) => {
                tracing::info!("Nothing to sync: {}", note);
                return Ok(SyncResult::none(note));
            }
        };

        self.store.ensure_container().await?;

        let plan = self.plan(save).await?;
        tracing::debug!(
            "Fingerprints for {}: local={} remote={:?} cached={:?} -> {:?}",
            plan.save_path.display(),
            plan.local.short(),
            plan.remote.as_ref().map(Fingerprint::short),
            plan.cached.as_ref().map(Fingerprint::short),
            plan.decision
        );

        self.execute(plan).await
    }

    async fn execute(&self, plan: SyncPlan) -> Result<SyncResult> {
        let reason = plan.decision.reason();
        match (plan.decision, plan.remote) {
            (Decision::InSync, Some(remote)) => {
                if plan.cached.as_ref() != Some(&remote) {
                    tracing::info!("Repairing stale cache to {}", remote.short());
                    self.update_cache(&remote).await;
                }
                Ok(SyncResult::none(reason))
            }
            (Decision::RemoteChanged, Some(remote)) => {
                let backup = self.download(&plan.save_path, &remote).await?;
                Ok(SyncResult::new(
                    SyncAction::Download,
                    format!(
                        "{} (downloaded {}, backup at {})",
                        reason,
                        remote.short(),
                        backup.display()
                    ),
                ))
            }
            _ => {
                // Bootstrap or LocalChanged
                self.upload(&plan.save_path, &plan.local).await?;
                Ok(SyncResult::new(
                    SyncAction::Upload,
                    format!("{} (uploaded {})", reason, plan.local.short()),
                ))
            }
        }
    }

    async fn game_running(&self) -> bool {
        let probe = Arc::clone(&self.probe);
        match tokio::task::spawn_blocking(move || probe.is_running()).await {
            Ok(Ok(running)) => running,
            Ok(Err(e)) => {
                tracing::warn!("Game probe failed, assuming not running: {}", e);
                false
            }
            Err(e) => {
                tracing::warn!("Game probe task failed, assuming not running: {}", e);
                false
            }
        }
    }

    /// Find the save file. The inner `Err` is a "nothing to sync" note.
    async fn locate(&self) -> Result<std::result::Result<PathBuf, String>> {
        let lookup = self.locator.locate().await.map_err(|e| {
            SyncError::io(
                format!("listing {}", self.locator.directory().display()),
                e,
            )
        })?;

        Ok(match lookup {
            SaveLookup::Found(path) => Ok(path),
            SaveLookup::DirectoryMissing => Err(format!(
                "save directory {} does not exist",
                self.locator.directory().display()
            )),
            SaveLookup::NoMatch => Err(format!(
                "no {}*.sav file in {}",
                self.locator.prefix(),
                self.locator.directory().display()
            )),
        })
    }

    async fn plan(&self, save_path: PathBuf) -> Result<SyncPlan> {
        let local = self
            .hasher
            .hash(&save_path)
            .await
            .map_err(|e| SyncError::io(format!("hashing {}", save_path.display()), e))?;
        let remote = self.read_remote().await?;
        let cached = self.cache.read().await;
        let decision = decide(&local, remote.as_ref(), cached.as_ref());

        Ok(SyncPlan {
            save_path,
            local,
            remote,
            cached,
            decision,
        })
    }

    async fn read_remote(&self) -> Result<Option<Fingerprint>> {
        let Some(raw) = self.store.read_text(&self.hash_blob).await? else {
            return Ok(None);
        };
        match Fingerprint::parse(&raw) {
            Ok(fp) => Ok(Some(fp)),
            Err(e) => {
                tracing::warn!(
                    "Remote hash record {} is unusable, treating as absent: {}",
                    self.hash_blob,
                    e
                );
                Ok(None)
            }
        }
    }

    async fn upload(&self, save: &Path, local: &Fingerprint) -> Result<()> {
        tracing::debug!("Uploading {} as {}", save.display(), self.save_blob);

        // Both writes are attempted even if the first one fails.
        let payload = self.store.upload_file(&self.save_blob, save).await.err();
        let record = self
            .store
            .upload_text(&self.hash_blob, local.as_str())
            .await
            .err();
        if payload.is_some() || record.is_some() {
            return Err(SyncError::UploadIncomplete { payload, record });
        }

        self.update_cache(local).await;
        Ok(())
    }

    async fn download(&self, save: &Path, remote: &Fingerprint) -> Result<PathBuf> {
        let backup = create_backup(save, Local::now().naive_local())
            .await
            .map_err(|source| SyncError::BackupFailed {
                path: save.to_path_buf(),
                source,
            })?;
        tracing::info!("Backed up {} to {}", save.display(), backup.display());

        let staging = staging_path(save);
        if let Err(e) = self.store.download_to_file(&self.save_blob, &staging).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        let staged = match self.hasher.hash(&staging).await {
            Ok(staged) => staged,
            Err(e) => {
                let _ = tokio::fs::remove_file(&staging).await;
                return Err(SyncError::io(format!("hashing {}", staging.display()), e));
            }
        };
        if staged != *remote {
            let _ = tokio::fs::remove_file(&staging).await;
            tracing::warn!(
                "Downloaded payload {} does not match record {}, keeping local save",
                staged.short(),
                remote.short()
            );
            return Err(SyncError::PayloadMismatch {
                expected: remote.clone(),
                actual: staged,
            });
        }
        if let Err(e) = tokio::fs::rename(&staging, save).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(SyncError::io(format!("replacing {}", save.display()), e));
        }

        self.update_cache(remote).await;
        Ok(backup)
    }

    /// Best effort: a lost cache write is repaired by a later in-sync cycle.
    async fn update_cache(&self, fingerprint: &Fingerprint) {
        if let Err(e) = self.cache.write(fingerprint).await {
            tracing::warn!("Failed to update cache: {}", e);
        }
    }
}

fn staging_path(save: &Path) -> PathBuf {
    let mut name = save.as_os_str().to_owned();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}
