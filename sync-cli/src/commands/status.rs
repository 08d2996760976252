//! Show what the next sync cycle would do.

use anyhow::{Context, Result};
use savesync_client::{Fingerprint, SyncStatus};
use std::path::Path;

use super::build_engine;
use crate::config::Config;

/// Run the status command. Nothing is created or written.
pub async fn run(config: &Config, data_dir: &Path, mock: bool, json: bool) -> Result<SyncStatus> {
    let engine = build_engine(config, data_dir, mock)?;
    let status = engine
        .inspect()
        .await
        .context("Failed to inspect sync state")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", render(&status));
    }
    Ok(status)
}

fn render(status: &SyncStatus) -> String {
    let mut out = String::from("=== savesync status ===\n\n");
    out.push_str(&format!("Store:   {}\n", status.store));
    out.push_str(&format!(
        "Game:    {}\n",
        if status.game_running { "RUNNING" } else { "not running" }
    ));

    match &status.plan {
        Some(plan) => {
            out.push_str(&format!("Save:    {}\n", plan.save_path.display()));
            out.push_str(&format!("Local:   {}\n", plan.local));
            out.push_str(&format!("Remote:  {}\n", show(plan.remote.as_ref())));
            out.push_str(&format!("Cached:  {}\n", show(plan.cached.as_ref())));
            out.push_str(&format!(
                "\nNext:    {} ({})\n",
                status.action(),
                plan.decision.reason()
            ));
        }
        None => {
            if let Some(note) = &status.note {
                out.push_str(&format!("Save:    {}\n", note));
            }
            out.push_str(&format!("\nNext:    {}\n", status.action()));
        }
    }
    out
}

fn show(fp: Option<&Fingerprint>) -> String {
    fp.map_or_else(|| "(none)".to_string(), |f| f.to_string())
}
