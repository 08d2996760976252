//! Configuration loading for savesync.
//!
//! Configuration is loaded from a TOML file (default: `savesync.toml` in the
//! platform config directory).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local save location.
    pub save: SaveConfig,
    /// Remote store.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Last-known-remote-hash cache.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Poll loop.
    #[serde(default)]
    pub poll: PollConfig,
    /// Game detection.
    #[serde(default)]
    pub game: GameConfig,
}

/// Local save location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Directory holding the save files.
    pub directory: PathBuf,
    /// File name prefix; saves match `<prefix>*.sav`.
    pub prefix: String,
}

/// Remote backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Directory (local, network share, or a folder synced by another tool).
    #[default]
    Fs,
    /// In-process memory, for trying things out.
    Memory,
    /// Amazon S3 or compatible.
    S3,
    /// Google Cloud Storage.
    Gcs,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fs => "fs",
            Self::Memory => "memory",
            Self::S3 => "s3",
            Self::Gcs => "gcs",
        })
    }
}

/// Remote store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Backend kind (default: fs).
    #[serde(default)]
    pub backend: Backend,
    /// fs: directory path; s3/gcs: bucket name.
    #[serde(default)]
    pub container: String,
    /// Key prefix inside the bucket (cloud backends only).
    #[serde(default)]
    pub prefix: String,
    /// Blob holding the save content (default: save.sav).
    #[serde(default = "default_save_blob")]
    pub save_blob: String,
    /// Blob holding the save fingerprint (default: save.sav.hash).
    #[serde(default = "default_hash_blob")]
    pub hash_blob: String,
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache file; relative paths resolve under the data directory.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

/// Poll loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Minutes between cycles (default: 5).
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

/// Game detection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// Process name of the game; cycles are skipped while it runs.
    pub process_name: Option<String>,
}

// Default value functions
fn default_save_blob() -> String {
    "save.sav".to_string()
}

fn default_hash_blob() -> String {
    "save.sav.hash".to_string()
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("last_remote_hash.txt")
}

fn default_interval_minutes() -> u64 {
    5
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            container: String::new(),
            prefix: String::new(),
            save_blob: default_save_blob(),
            hash_blob: default_hash_blob(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

/// Template written by `savesync init`.
pub const TEMPLATE: &str = r#"# savesync configuration

[save]
# Directory holding the game's save files
directory = "/path/to/saves"
# Saves are files named <prefix>*.sav; the newest one is synced
prefix = "slot"

[remote]
# "fs" (directory or network share), "memory", "s3" or "gcs"
backend = "fs"
# fs: directory path; s3/gcs: bucket name
container = "/mnt/share/savesync"
# Key prefix inside the bucket (s3/gcs only)
prefix = ""
save_blob = "save.sav"
hash_blob = "save.sav.hash"

[cache]
# Relative paths resolve under the savesync data directory
path = "last_remote_hash.txt"

[poll]
interval_minutes = 5

[game]
# Skip syncing while this process runs (remove to never skip)
# process_name = "Game.exe"
"#;

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn require(value: &str, field: &str) -> Result<(), ConfigError> {
            if value.trim().is_empty() {
                Err(ConfigError::Invalid(format!("{field} must not be empty")))
            } else {
                Ok(())
            }
        }

        if self.save.directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("save.directory must not be empty".into()));
        }
        require(&self.save.prefix, "save.prefix")?;
        require(&self.remote.save_blob, "remote.save_blob")?;
        require(&self.remote.hash_blob, "remote.hash_blob")?;
        if self.remote.save_blob == self.remote.hash_blob {
            return Err(ConfigError::Invalid(
                "remote.save_blob and remote.hash_blob must differ".into(),
            ));
        }
        if self.remote.backend != Backend::Memory {
            require(&self.remote.container, "remote.container")?;
        }
        if self.cache.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("cache.path must not be empty".into()));
        }
        if self.poll.interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "poll.interval_minutes must be at least 1".into(),
            ));
        }
        if let Some(name) = &self.game.process_name {
            require(name, "game.process_name")?;
        }
        Ok(())
    }

    /// Cache file path, with relative paths resolved under `data_dir`.
    pub fn cache_path(&self, data_dir: &Path) -> PathBuf {
        if self.cache.path.is_absolute() {
            self.cache.path.clone()
        } else {
            data_dir.join(&self.cache.path)
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
