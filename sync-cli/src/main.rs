//! # savesync
//!
//! Keeps a game save file in sync with a remote blob store.
//!
//! ## Commands
//!
//! - `init`: Write a config template
//! - `once`: Run one sync cycle
//! - `run`: Poll until Ctrl-C
//! - `status`: Show what the next cycle would do
//!
//! ## Example
//!
//! ```bash
//! # Create and edit the config
//! savesync init
//!
//! # Try one cycle against an in-memory store
//! savesync --mock once
//!
//! # Run as a service
//! savesync run --log-file savesync.log
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod commands;
mod config;
mod logging;

use commands::{init, load_config, once, run, status};
use config::Config;

/// Keeps a game save file in sync with a remote blob store.
#[derive(Parser, Debug)]
#[command(name = "savesync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: savesync.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for the hash cache (default: platform data directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "savesync_client=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Use an in-memory remote store instead of the configured backend
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a config template
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run one sync cycle and print the result
    Once,

    /// Sync on an interval until Ctrl-C
    Run,

    /// Show fingerprints and the action the next cycle would take
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    match cli.command {
        Commands::Init { force } => {
            init::run(&config_path, force).await?;
        }
        Commands::Once => {
            let (config, data_dir) = load(&config_path, cli.data_dir)?;
            let result = once::run(&config, &data_dir, cli.mock).await?;
            if result.is_error() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Run => {
            let (config, data_dir) = load(&config_path, cli.data_dir)?;
            run::run(&config, &data_dir, cli.mock).await?;
        }
        Commands::Status { json } => {
            let (config, data_dir) = load(&config_path, cli.data_dir)?;
            status::run(&config, &data_dir, cli.mock, json).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the config and resolve the data directory.
fn load(config_path: &Path, data_dir: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let config = load_config(config_path)?;
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    tracing::debug!(
        "Using config {} and data directory {}",
        config_path.display(),
        data_dir.display()
    );
    Ok((config, data_dir))
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("io", "savesync", "savesync")
        .context("Could not determine home directory")
}

/// Get the default config file path.
fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("savesync.toml"))
}

/// Get the default data directory.
fn default_data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}
