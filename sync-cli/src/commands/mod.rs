//! CLI command implementations.

pub mod init;
pub mod once;
pub mod run;
pub mod status;

use anyhow::{Context, Result};
use savesync_client::{
    EngineConfig, FileStateCache, FsStore, MemoryStore, ProcessProbe, RemoteStore, SyncEngine,
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{Backend, Config, RemoteConfig};

/// Build the engine described by `config`.
///
/// With `mock` the configured backend is replaced by an in-memory store.
pub fn build_engine(config: &Config, data_dir: &Path, mock: bool) -> Result<SyncEngine> {
    let store = build_store(&config.remote, mock)?;
    let cache = FileStateCache::new(config.cache_path(data_dir));

    let engine = SyncEngine::new(
        EngineConfig::new(
            &config.save.directory,
            &config.save.prefix,
            &config.remote.save_blob,
            &config.remote.hash_blob,
        ),
        store,
        Arc::new(cache),
    );

    Ok(match &config.game.process_name {
        Some(name) => {
            let probe = ProcessProbe::new(name);
            tracing::debug!("Cycles are skipped while {} is running", probe.process_name());
            engine.with_probe(Arc::new(probe))
        }
        None => engine,
    })
}

fn build_store(remote: &RemoteConfig, mock: bool) -> Result<Arc<dyn RemoteStore>> {
    if mock {
        return Ok(Arc::new(MemoryStore::new()));
    }
    match remote.backend {
        Backend::Fs => Ok(Arc::new(FsStore::new(&remote.container))),
        Backend::Memory => Ok(Arc::new(MemoryStore::new())),
        Backend::S3 | Backend::Gcs => cloud_store(remote),
    }
}

#[cfg(feature = "cloud")]
fn cloud_store(remote: &RemoteConfig) -> Result<Arc<dyn RemoteStore>> {
    use savesync_client::{CloudProvider, ObjectStoreBackend};

    let provider = match remote.backend {
        Backend::S3 => CloudProvider::S3,
        _ => CloudProvider::Gcs,
    };
    let store = ObjectStoreBackend::from_env(provider, &remote.container, &remote.prefix)
        .with_context(|| format!("Failed to configure {} bucket {}", provider, remote.container))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "cloud"))]
fn cloud_store(remote: &RemoteConfig) -> Result<Arc<dyn RemoteStore>> {
    anyhow::bail!(
        "backend \"{}\" needs savesync built with the `cloud` feature",
        remote.backend
    )
}

/// Load and validate the config file, pointing at `init` if it is missing.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!(
            "No config file at {}. Run 'savesync init' first.",
            path.display()
        );
    }
    Config::load(path).context("Invalid configuration")
}
