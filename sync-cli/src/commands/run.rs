//! Run the polling service until Ctrl-C.

use anyhow::Result;
use savesync_client::{shutdown_channel, PollStats, Poller, ShutdownSignal};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::build_engine;
use crate::config::Config;

/// Run the run command.
pub async fn run(config: &Config, data_dir: &Path, mock: bool) -> Result<PollStats> {
    let (handle, signal) = shutdown_channel();

    let trigger = handle.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, shutting down");
                trigger.shutdown();
            }
            Err(e) => tracing::warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    let stats = run_until(config, data_dir, mock, signal).await?;
    drop(handle);

    println!("Stopped after {}", stats);
    Ok(stats)
}

/// Poll until `shutdown` fires.
pub async fn run_until(
    config: &Config,
    data_dir: &Path,
    mock: bool,
    shutdown: ShutdownSignal,
) -> Result<PollStats> {
    let engine = build_engine(config, data_dir, mock)?;
    let interval = Duration::from_secs(config.poll.interval_minutes.saturating_mul(60));
    let poller = Poller::new(Arc::new(engine), interval);

    println!(
        "Syncing {}/{}*.sav every {} min (Ctrl-C to stop)",
        config.save.directory.display(),
        config.save.prefix,
        poller.interval().as_secs() / 60
    );

    Ok(poller.run(shutdown).await)
}
