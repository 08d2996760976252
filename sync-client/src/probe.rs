//! "Is the game running?" probes.
//!
//! A running game may hold the save file open or rewrite it at any moment,
//! so the engine skips the whole cycle while the probe answers `true`.
//! Probes are synchronous; the engine calls them on the blocking pool.

use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use sysinfo::System;
use thiserror::Error;

/// Probe failures. The engine treats these as "not running".
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The process list could not be inspected.
    #[error("process probe failed: {0}")]
    Failed(String),
}

/// Detects whether the game is currently running.
pub trait GameProbe: Send + Sync {
    /// Check the game. May block.
    fn is_running(&self) -> Result<bool, ProbeError>;
}

/// Probe matching a process name against the system process list.
///
/// Matching ignores case and a trailing `.exe`, so a config written on
/// Windows (`Game.exe`) also works on Linux under Proton (`game.exe`) or
/// natively (`game`).
#[derive(Debug, Clone)]
pub struct ProcessProbe {
    process_name: String,
}

impl ProcessProbe {
    /// Probe for processes named `process_name`.
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
        }
    }

    /// The configured process name.
    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Check whether a single process name matches.
    pub fn matches(&self, candidate: &OsStr) -> bool {
        normalize(&candidate.to_string_lossy()) == normalize(&self.process_name)
    }
}

fn normalize(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

impl GameProbe for ProcessProbe {
    fn is_running(&self) -> Result<bool, ProbeError> {
        if self.process_name.trim().is_empty() {
            return Err(ProbeError::Failed("empty process name".into()));
        }
        let sys = System::new_all();
        Ok(sys
            .processes()
            .values()
            .any(|p| self.matches(p.name().as_ref())))
    }
}

/// Probe that never reports the game as running (no process configured).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

impl GameProbe for NoProbe {
    fn is_running(&self) -> Result<bool, ProbeError> {
        Ok(false)
    }
}

/// Fixed-answer probe for testing. Clones share state.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    answer: Arc<Mutex<Result<bool, String>>>,
}

impl StaticProbe {
    /// Probe that always answers `running`.
    pub fn running(running: bool) -> Self {
        Self {
            answer: Arc::new(Mutex::new(Ok(running))),
        }
    }

    /// Probe that always fails with `reason`.
    pub fn failing(reason: &str) -> Self {
        Self {
            answer: Arc::new(Mutex::new(Err(reason.to_string()))),
        }
    }

    /// Change the answer.
    pub fn set_running(&self, running: bool) {
        *self.answer.lock().unwrap() = Ok(running);
    }
}

impl GameProbe for StaticProbe {
    fn is_running(&self) -> Result<bool, ProbeError> {
        self.answer
            .lock()
            .unwrap()
            .clone()
            .map_err(ProbeError::Failed)
    }
}
