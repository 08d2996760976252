//! # sync-core
//!
//! Pure logic for savesync (no I/O, instant tests).
//!
//! This crate implements the decision table and state machines for
//! single-file save synchronization without any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about the upload/download choice
//!
//! The actual I/O (hashing, blob store, cache file) is performed by
//! `sync-client`, which interprets the decisions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backup;
pub mod decision;
pub mod fingerprint;
pub mod poller;
pub mod selection;

pub use backup::{
    backup_candidates, backup_path, BACKUP_MARKER, BACKUP_TIMESTAMP_FORMAT, MAX_BACKUP_SUFFIX,
};
pub use decision::{decide, Decision, SyncAction, SyncResult};
pub use fingerprint::{Fingerprint, FingerprintError};
pub use poller::{PollAction, PollEvent, PollState};
pub use selection::{is_save_file, select_latest, SaveCandidate, SAVE_EXTENSION};
