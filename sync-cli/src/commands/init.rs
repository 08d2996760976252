//! Write a config template.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::TEMPLATE;

/// Run the init command.
pub async fn run(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create config directory")?;
    }
    tokio::fs::write(config_path, TEMPLATE)
        .await
        .context("Failed to write config file")?;

    println!("Wrote config template to {}", config_path.display());
    println!("Edit [save] and [remote], then run 'savesync once' to test.");

    Ok(())
}
