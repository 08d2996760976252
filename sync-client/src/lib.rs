//! # sync-client
//!
//! Sync engine for savesync: keeps one save file in step with a remote blob
//! store.
//!
//! ## Features
//!
//! - **Hash-based direction**: local, remote and last-seen fingerprints pick
//!   upload vs. download (decision table lives in sync-core)
//! - **Backup before overwrite**: a download never replaces the save without
//!   a timestamped copy first
//! - **Store Abstraction**: Pluggable blob backends (filesystem, memory,
//!   object_store behind the `cloud` feature)
//! - **Safe degradation**: every failure in a cycle becomes an `Error`
//!   result; the poller keeps going
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use savesync_client::{EngineConfig, FileStateCache, FsStore, Poller, SyncEngine};
//!
//! let engine = SyncEngine::new(
//!     EngineConfig::new("/saves", "slot", "save.sav", "save.sav.hash"),
//!     Arc::new(FsStore::new("/mnt/share/savesync")),
//!     Arc::new(FileStateCache::new("last_remote_hash.txt")),
//! );
//!
//! let result = engine.synchronize().await;
//! println!("{result}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod poller;
pub mod probe;
pub mod save_file;
pub mod store;

pub use cache::{CacheError, FileStateCache, MemoryStateCache, StateCache};
pub use engine::{EngineConfig, SyncEngine, SyncPlan, SyncStatus};
pub use error::SyncError;
pub use hasher::{ContentHasher, Sha256Hasher, StaticHasher, HASH_CHUNK_SIZE};
pub use poller::{shutdown_channel, PollStats, Poller, ShutdownHandle, ShutdownSignal};
pub use probe::{GameProbe, NoProbe, ProbeError, ProcessProbe, StaticProbe};
pub use save_file::{create_backup, SaveLocator, SaveLookup};
#[cfg(feature = "cloud")]
pub use store::{CloudProvider, ObjectStoreBackend};
pub use store::{FsStore, MemoryStore, RemoteStore, StoreError, StoreOp};

pub use savesync_core::{Decision, Fingerprint, SyncAction, SyncResult};
