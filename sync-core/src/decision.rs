//! Sync direction decision table.
//!
//! Given the local fingerprint, the fingerprint held by the remote hash
//! record (if any), and the fingerprint this machine last saw on the remote
//! (if any), [`decide`] picks exactly one [`Decision`]. Rules are evaluated
//! top to bottom and the first match wins:
//!
//! | remote  | local == remote | remote == cached | decision        |
//! |---------|-----------------|------------------|-----------------|
//! | absent  | -               | -                | `Bootstrap`     |
//! | present | true            | -                | `InSync`        |
//! | present | false           | false            | `RemoteChanged` |
//! | present | false           | true             | `LocalChanged`  |
//!
//! When both sides changed since the last sync the remote side wins
//! (`RemoteChanged`); the local copy survives only as the pre-download backup.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fingerprint::Fingerprint;

/// Outcome of the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// No hash record on the remote yet: upload to seed it.
    Bootstrap,
    /// Local content already matches the remote.
    InSync,
    /// Remote moved since this machine last synced: download.
    RemoteChanged,
    /// Remote is where this machine left it, local moved: upload.
    LocalChanged,
}

impl Decision {
    /// The action this decision performs.
    pub fn action(self) -> SyncAction {
        match self {
            Self::Bootstrap | Self::LocalChanged => SyncAction::Upload,
            Self::RemoteChanged => SyncAction::Download,
            Self::InSync => SyncAction::None,
        }
    }

    /// Human-readable reason, used in results and logs.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Bootstrap => "no remote hash record, seeding remote",
            Self::InSync => "local and remote already match",
            Self::RemoteChanged => "remote changed since last sync",
            Self::LocalChanged => "local changed, remote unchanged since last sync",
        }
    }
}

/// Pick the sync direction. Pure and total over all inputs.
pub fn decide(
    local: &Fingerprint,
    remote: Option<&Fingerprint>,
    cached: Option<&Fingerprint>,
) -> Decision {
    let Some(remote) = remote else {
        return Decision::Bootstrap;
    };

    if local == remote {
        Decision::InSync
    } else if cached != Some(remote) {
        Decision::RemoteChanged
    } else {
        Decision::LocalChanged
    }
}

/// What a sync cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Nothing to do (in sync, or nothing to sync yet).
    None,
    /// Local save pushed to the remote.
    Upload,
    /// Remote save pulled over the local one.
    Download,
    /// Cycle skipped because the game is running.
    Skipped,
    /// Cycle failed; see the message.
    Error,
}

impl SyncAction {
    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `synchronize()` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// What happened.
    pub action: SyncAction,
    /// Human-readable detail.
    pub message: String,
}

impl SyncResult {
    /// Create a result.
    pub fn new(action: SyncAction, message: impl Into<String>) -> Self {
        Self {
            action,
            message: message.into(),
        }
    }

    /// Nothing-to-do result.
    pub fn none(message: impl Into<String>) -> Self {
        Self::new(SyncAction::None, message)
    }

    /// Skipped-cycle result.
    pub fn skipped(message: impl Into<String>) -> Self {
        Self::new(SyncAction::Skipped, message)
    }

    /// Failed-cycle result.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(SyncAction::Error, message)
    }

    /// Check whether this cycle failed.
    pub fn is_error(&self) -> bool {
        self.action == SyncAction::Error
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.message)
    }
}
