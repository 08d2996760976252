//! # savesync-scenarios
//!
//! Multi-machine scenarios for savesync.
//!
//! Each simulated machine gets its own save directory and hash cache on a
//! temp disk; machines share one remote store. Scenarios drive the real
//! engine (real SHA-256, real files) and check the outcome with the pure
//! helpers in [`assertions`]:
//! - Decision table cases between two machines
//! - Byte-identical round trips and backup-before-overwrite
//! - Remote outages and recovery
//! - Poller lifecycle

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assertions;
pub mod harness;
