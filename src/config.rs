//! Run configuration.
//!
//! Values are layered, lowest precedence first:
//! 1. Built-in defaults
//! 2. A TOML file (`--config <FILE>` or `DEBIAN_PREFLIGHT_CONFIG`)
//! 3. Command line flags (see [`crate::cli::args::Args::apply_to`])
//!
//! Every key in the file is optional.
//!
//! ```toml
//! install_path = "/target"
//! min_disk_bytes = 21474836480
//! connectivity_endpoints = ["http://deb.debian.org/debian/"]
//! probe_timeout_ms = 3000
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checks::disk::DEFAULT_MIN_DISK_BYTES;
use crate::engine::runner::DEFAULT_PROGRESS_CAPACITY;
use crate::platform::network::DEFAULT_ENDPOINTS;
use crate::PreflightError;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "DEBIAN_PREFLIGHT_CONFIG";

/// Configuration for a preflight run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreflightConfig {
    /// Where the desktop will be installed; disk space is measured here
    pub install_path: PathBuf,
    /// Free space required at `install_path`
    pub min_disk_bytes: u64,
    /// Mirrors probed by the connectivity check
    pub connectivity_endpoints: Vec<String>,
    /// Per-probe timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// Deadline for the whole run in milliseconds
    pub timeout_ms: u64,
    /// Buffered progress updates before the runner waits on the consumer
    pub progress_capacity: usize,
    /// Accepted Debian release codenames
    pub supported_codenames: Vec<String>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        PreflightConfig {
            install_path: PathBuf::from("/"),
            min_disk_bytes: DEFAULT_MIN_DISK_BYTES,
            connectivity_endpoints: DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            probe_timeout_ms: 5_000,
            timeout_ms: 120_000,
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
            supported_codenames: vec!["sid".to_string(), "trixie".to_string()],
        }
    }
}

impl PreflightConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, PreflightError> {
        toml::from_str(content).map_err(|e| PreflightError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PreflightError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PreflightError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            PreflightError::Config(msg) => {
                PreflightError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Load from an explicit path, else from `DEBIAN_PREFLIGHT_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, PreflightError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(env_path) if !env_path.is_empty() => Self::from_file(Path::new(&env_path)),
                _ => Ok(Self::default()),
            },
        }
    }
}
