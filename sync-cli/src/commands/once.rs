//! Run a single sync cycle.

use anyhow::Result;
use savesync_core::SyncResult;
use std::path::Path;
use tracing::Instrument;

use super::build_engine;
use crate::config::Config;

/// Run the once command. The caller maps an `Error` result to exit code 1.
pub async fn run(config: &Config, data_dir: &Path, mock: bool) -> Result<SyncResult> {
    let engine = build_engine(config, data_dir, mock)?;

    let result = engine
        .synchronize()
        .instrument(tracing::info_span!("sync_cycle", cycle = 1u64))
        .await;

    println!("{}", result);
    Ok(result)
}
