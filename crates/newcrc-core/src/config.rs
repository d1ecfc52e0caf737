/// Run configuration.
///
/// Every field has a default, so an empty JSON object (or no config file at
/// all) gives the standard behaviour: look for `CRC.<ext>` in the current
/// directory, read in 8 MiB chunks, forward at most one file-progress event
/// per 100 ms, and use between 2 and 4 workers.
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default read size for the verifier's chunk loop.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Default minimum gap between two forwarded (non-forced) file-progress events.
pub const DEFAULT_THROTTLE_INTERVAL_MS: u64 = 100;

/// Default manifest file stem; candidates are `CRC.crc32`, `CRC.crc32c`, ...
pub const DEFAULT_MANIFEST_STEM: &str = "CRC";

/// Upper bound on the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 4;

/// Lower bound on the default worker count.
pub const MIN_DEFAULT_WORKERS: usize = 2;

/// Maximum number of events that may queue up in the channel.
///
/// A consumer that drains a few hundred events per frame has many seconds
/// of headroom. If it stalls, workers block on `send` rather than growing
/// the heap without bound.
pub const EVENT_CHANNEL_CAPACITY: usize = 4_096;

const _: () = assert!(DEFAULT_CHUNK_SIZE > 0);
const _: () = assert!(EVENT_CHANNEL_CAPACITY > 0);
const _: () = assert!(MIN_DEFAULT_WORKERS <= MAX_DEFAULT_WORKERS);

/// Worker count used when the config does not override it:
/// `min(cpus, 4)` with a floor of 2.
pub fn default_worker_count() -> usize {
    num_cpus::get().clamp(MIN_DEFAULT_WORKERS, MAX_DEFAULT_WORKERS)
}

/// Settings for one verification run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Directory searched for the manifest; relative entry paths resolve here.
    pub base_dir: PathBuf,
    /// Manifest stem; the extension selects the algorithm.
    pub manifest_stem: String,
    /// Bytes read per chunk.
    pub chunk_size: usize,
    pub throttle_interval_ms: u64,
    /// Fixed pool size. `None` uses [`default_worker_count`].
    pub workers: Option<usize>,
    pub channel_capacity: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            manifest_stem: DEFAULT_MANIFEST_STEM.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            throttle_interval_ms: DEFAULT_THROTTLE_INTERVAL_MS,
            workers: None,
            channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl VerifyConfig {
    /// Defaults rooted at `base_dir`.
    pub fn in_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Read and validate a JSON config file.
    pub fn load_json(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be > 0".into()));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channel_capacity must be > 0".into()));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be >= 1".into()));
        }
        if self.manifest_stem.is_empty() {
            return Err(ConfigError::Invalid("manifest_stem must not be empty".into()));
        }
        Ok(())
    }

    /// Pool size for this run.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_worker_count)
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }
}
