//! Scenario harness: simulated machines sharing one remote store.
//!
//! A [`Machine`] is a temp directory holding a save folder and a hash cache
//! file, plus a [`SyncEngine`] wired to them. A [`SharedRemote`] is either an
//! in-memory store (fault injection) or a directory on disk (what a network
//! share looks like). Every machine created from the same remote sees the
//! same blobs.

use crate::assertions::MachineState;
use savesync_client::{
    ContentHasher, EngineConfig, FileStateCache, FsStore, MemoryStore, Poller, RemoteStore,
    Sha256Hasher, StaticProbe, SyncEngine, SyncResult,
};
use savesync_core::BACKUP_MARKER;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use thiserror::Error;

/// Save file name prefix every machine uses.
pub const SAVE_PREFIX: &str = "slot";

/// Remote blob holding the save content.
pub const SAVE_BLOB: &str = "save.sav";

/// Remote blob holding the fingerprint record.
pub const HASH_BLOB: &str = "save.sav.hash";

/// Errors while setting up or inspecting a scenario.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Temp directory or file operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote blob contents at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteState {
    /// Save blob bytes.
    pub save: Option<Vec<u8>>,
    /// Hash record text.
    pub record: Option<String>,
}

/// The remote store shared by all machines in a scenario.
pub enum SharedRemote {
    /// In-memory store with fault injection.
    Memory(MemoryStore),
    /// Directory store.
    Disk {
        /// Keeps the container directory alive.
        dir: TempDir,
        /// Store rooted at `<dir>/container` (created on first sync).
        store: FsStore,
    },
}

impl SharedRemote {
    /// An empty in-memory remote.
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// An empty directory remote; the container directory does not exist yet.
    pub fn disk() -> Result<Self, HarnessError> {
        let dir = tempfile::tempdir()?;
        let store = FsStore::new(dir.path().join("container"));
        Ok(Self::Disk { dir, store })
    }

    /// The store handle to give an engine.
    pub fn store(&self) -> Arc<dyn RemoteStore> {
        match self {
            Self::Memory(store) => Arc::new(store.clone()),
            Self::Disk { store, .. } => Arc::new(store.clone()),
        }
    }

    /// The in-memory store, for fault injection.
    pub fn memory_store(&self) -> Option<&MemoryStore> {
        match self {
            Self::Memory(store) => Some(store),
            Self::Disk { .. } => None,
        }
    }

    /// Read both blobs without going through the engine.
    pub async fn snapshot(&self) -> Result<RemoteState, HarnessError> {
        match self {
            Self::Memory(store) => Ok(RemoteState {
                save: store.blob(SAVE_BLOB),
                record: store.text(HASH_BLOB),
            }),
            Self::Disk { store, .. } => Ok(RemoteState {
                save: read_optional(&store.root().join(SAVE_BLOB)).await?,
                record: read_optional(&store.root().join(HASH_BLOB))
                    .await?
                    .map(|b| String::from_utf8_lossy(&b).into_owned()),
            }),
        }
    }

    /// Overwrite the hash record directly, as a foreign writer would.
    pub async fn put_record(&self, text: &str) -> Result<(), HarnessError> {
        match self {
            Self::Memory(store) => store.put_blob(HASH_BLOB, text),
            Self::Disk { store, .. } => {
                tokio::fs::create_dir_all(store.root()).await?;
                tokio::fs::write(store.root().join(HASH_BLOB), text).await?;
            }
        }
        Ok(())
    }
}

/// One simulated machine.
pub struct Machine {
    name: String,
    disk: TempDir,
    save_dir: PathBuf,
    cache_path: PathBuf,
    probe: StaticProbe,
    engine: Arc<SyncEngine>,
}

impl Machine {
    /// Create a machine with an empty save directory and no cache file.
    pub fn new(name: &str, remote: &SharedRemote) -> Result<Self, HarnessError> {
        let disk = tempfile::tempdir()?;
        let save_dir = disk.path().join("saves");
        std::fs::create_dir_all(&save_dir)?;
        let cache_path = disk.path().join("data").join("last_remote_hash.txt");
        let probe = StaticProbe::running(false);

        let engine = SyncEngine::new(
            EngineConfig::new(&save_dir, SAVE_PREFIX, SAVE_BLOB, HASH_BLOB),
            remote.store(),
            Arc::new(FileStateCache::new(&cache_path)),
        )
        .with_probe(Arc::new(probe.clone()));

        tracing::debug!("Machine {} at {}", name, disk.path().display());

        Ok(Self {
            name: name.to_string(),
            disk,
            save_dir,
            cache_path,
            probe,
            engine: Arc::new(engine),
        })
    }

    /// Machine label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The machine's save directory.
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Shared handle to the engine.
    pub fn engine(&self) -> Arc<SyncEngine> {
        Arc::clone(&self.engine)
    }

    /// A poller over this machine's engine.
    pub fn poller(&self, interval: Duration) -> Poller {
        Poller::new(self.engine(), interval)
    }

    /// Run one cycle.
    pub async fn sync(&self) -> SyncResult {
        self.engine.synchronize().await
    }

    /// Simulate the game starting or stopping.
    pub fn set_game_running(&self, running: bool) {
        self.probe.set_running(running);
    }

    /// Path of a save file in this machine's save directory.
    pub fn save_path(&self, file_name: &str) -> PathBuf {
        self.save_dir.join(file_name)
    }

    /// Write a save file and stamp it `age` in the past.
    ///
    /// Older stamps let a scenario control which save is the newest.
    pub async fn write_save_aged(
        &self,
        file_name: &str,
        content: &[u8],
        age: Duration,
    ) -> Result<PathBuf, HarnessError> {
        let path = self.save_path(file_name);
        tokio::fs::write(&path, content).await?;
        let file = std::fs::OpenOptions::new().write(true).open(&path)?;
        file.set_modified(SystemTime::now() - age)?;
        Ok(path)
    }

    /// Write a save file with the current time as its mtime.
    pub async fn write_save(&self, file_name: &str, content: &[u8]) -> Result<PathBuf, HarnessError> {
        self.write_save_aged(file_name, content, Duration::ZERO).await
    }

    /// Read a save file.
    pub async fn read_save(&self, file_name: &str) -> Result<Vec<u8>, HarnessError> {
        Ok(tokio::fs::read(self.save_path(file_name)).await?)
    }

    /// Raw cache file content, trimmed.
    pub async fn cached(&self) -> Result<Option<String>, HarnessError> {
        Ok(read_optional(&self.cache_path)
            .await?
            .map(|b| String::from_utf8_lossy(&b).trim().to_string()))
    }

    /// Replace the cache file content.
    pub async fn put_cache(&self, text: &str) -> Result<(), HarnessError> {
        if let Some(parent) = self.cache_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.cache_path, text).await?;
        Ok(())
    }

    /// Remove the cache file, as on a fresh install.
    pub async fn forget_cache(&self) -> Result<(), HarnessError> {
        match tokio::fs::remove_file(&self.cache_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Backup files in the save directory, sorted by name.
    pub async fn backups(&self) -> Result<Vec<PathBuf>, HarnessError> {
        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.save_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().contains(BACKUP_MARKER) {
                found.push(entry.path());
            }
        }
        found.sort();
        Ok(found)
    }

    /// Names of every file in the save directory, sorted.
    pub async fn save_dir_listing(&self) -> Result<Vec<String>, HarnessError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.save_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// SHA-256 fingerprint of a save file, as the engine computes it.
    pub async fn fingerprint(&self, file_name: &str) -> Result<String, HarnessError> {
        let fp = Sha256Hasher::new().hash(&self.save_path(file_name)).await?;
        Ok(fp.as_str().to_string())
    }

    /// Capture this machine's state for the assertion helpers.
    pub async fn state(&self, file_name: &str) -> Result<MachineState, HarnessError> {
        Ok(MachineState {
            name: self.name.clone(),
            save: read_optional(&self.save_path(file_name)).await?,
            cached: self.cached().await?,
            backups: self.backups().await?.len(),
        })
    }

    /// Root of the machine's temp disk.
    pub fn disk(&self) -> &Path {
        self.disk.path()
    }
}

/// Two machines over one remote.
pub struct TwoMachines {
    /// The shared remote.
    pub remote: SharedRemote,
    /// First machine ("desktop").
    pub a: Machine,
    /// Second machine ("laptop").
    pub b: Machine,
}

impl TwoMachines {
    /// Two machines over an in-memory remote.
    pub fn in_memory() -> Result<Self, HarnessError> {
        Self::over(SharedRemote::memory())
    }

    /// Two machines over a directory remote.
    pub fn on_disk() -> Result<Self, HarnessError> {
        Self::over(SharedRemote::disk()?)
    }

    fn over(remote: SharedRemote) -> Result<Self, HarnessError> {
        let a = Machine::new("desktop", &remote)?;
        let b = Machine::new("laptop", &remote)?;
        Ok(Self { remote, a, b })
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, HarnessError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn machines_get_separate_disks() {
        let pair = TwoMachines::in_memory().unwrap();
        assert_ne!(pair.a.disk(), pair.b.disk());
        assert!(pair.a.save_dir().is_dir());
        assert_eq!(pair.a.cached().await.unwrap(), None);
    }

    #[tokio::test]
    async fn disk_remote_starts_without_container() {
        let remote = SharedRemote::disk().unwrap();
        assert_eq!(remote.snapshot().await.unwrap(), RemoteState::default());
        assert!(remote.memory_store().is_none());
    }

    #[tokio::test]
    async fn aged_saves_are_older() {
        let pair = TwoMachines::in_memory().unwrap();
        let old = pair
            .a
            .write_save_aged("slot1.sav", b"old", Duration::from_secs(60))
            .await
            .unwrap();
        let new = pair.a.write_save("slot2.sav", b"new").await.unwrap();

        let old_mtime = std::fs::metadata(old).unwrap().modified().unwrap();
        let new_mtime = std::fs::metadata(new).unwrap().modified().unwrap();
        assert!(old_mtime < new_mtime);
    }

    #[tokio::test]
    async fn cache_helpers_round_trip() {
        let pair = TwoMachines::in_memory().unwrap();
        pair.a.put_cache("abc\n").await.unwrap();
        assert_eq!(pair.a.cached().await.unwrap().as_deref(), Some("abc"));
        pair.a.forget_cache().await.unwrap();
        pair.a.forget_cache().await.unwrap();
        assert_eq!(pair.a.cached().await.unwrap(), None);
    }
}
