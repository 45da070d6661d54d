//! Platform abstraction layer.
//!
//! Defines the detector ports the validators consume and the typed values
//! they return:
//! - OS release detection
//! - GPU enumeration
//! - Disk space
//! - Internet connectivity
//! - APT source repositories
//!
//! Host-backed implementations live in [`linux`], [`network`] and [`apt`].
//! Tests substitute their own implementations of the traits.
//!
//! # Graceful Degradation
//!
//! Detectors never classify anything. Every failure is reported as a
//! [`DetectError`] and the owning validator decides what it means for the
//! installation.

pub mod apt;
pub mod linux;
pub mod network;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::PreflightConfig;

/// Errors reported by detectors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectError {
    /// Reading a file or directory failed.
    #[error("I/O error in {context}: {message}")]
    Io { context: String, message: String },

    /// An external command could not be run or exited unsuccessfully.
    #[error("command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Output was read but could not be understood.
    #[error("parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// The thing being looked for does not exist on this host.
    #[error("{0}")]
    NotFound(String),

    /// The host is not something this installer supports at all.
    #[error("unsupported system: {0}")]
    Unsupported(String),

    /// The operation did not finish within its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the run.
    #[error("detection cancelled")]
    Cancelled,
}

impl DetectError {
    pub(crate) fn io(context: impl Into<String>, err: &std::io::Error) -> Self {
        DetectError::Io {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        DetectError::Parse {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Result type for detector calls.
pub type DetectResult<T> = Result<T, DetectError>;

/// Installed operating system release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsVersion {
    /// Release codename, lowercase (e.g. `trixie`, `sid`).
    pub codename: String,
    /// Numeric version when the release has one; empty for sid.
    pub version: String,
}

/// One display adapter found on the PCI bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub vendor: String,
    pub model: String,
    /// `vendor:device` hex pair, e.g. `10de:2684`.
    pub pci_id: String,
}

/// Free space on the filesystem holding a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpace {
    pub available_bytes: u64,
    pub total_bytes: u64,
    pub path: PathBuf,
}

/// Outcome of probing a single endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCheck {
    pub endpoint: String,
    pub success: bool,
    pub latency: Duration,
    /// Empty when the probe succeeded.
    pub error_message: String,
}

/// Connectivity over all configured endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    /// True when at least one endpoint answered.
    pub connected: bool,
    pub endpoints: Vec<EndpointCheck>,
}

impl ConnectivityReport {
    /// Build a report from individual probes.
    pub fn from_checks(endpoints: Vec<EndpointCheck>) -> Self {
        ConnectivityReport {
            connected: endpoints.iter().any(|e| e.success),
            endpoints,
        }
    }

    /// Number of endpoints that answered.
    pub fn reachable(&self) -> usize {
        self.endpoints.iter().filter(|e| e.success).count()
    }
}

/// APT source configuration as it concerns `deb-src`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// True when at least one enabled `deb-src` entry exists.
    pub enabled: bool,
    pub configured_lines: Vec<String>,
}

/// Detects the installed Debian release.
#[async_trait]
pub trait OsDetector: Send + Sync {
    async fn detect_version(&self, ctx: &CancellationToken) -> DetectResult<OsVersion>;
}

/// Enumerates GPUs. Returns an error when none are present.
#[async_trait]
pub trait GpuDetector: Send + Sync {
    async fn detect_gpus(&self, ctx: &CancellationToken) -> DetectResult<Vec<GpuInfo>>;
}

/// Measures free space for a path.
#[async_trait]
pub trait DiskSpaceDetector: Send + Sync {
    async fn detect_available_space(
        &self,
        ctx: &CancellationToken,
        path: &Path,
    ) -> DetectResult<DiskSpace>;
}

/// Probes whether the package mirrors are reachable.
#[async_trait]
pub trait ConnectivityChecker: Send + Sync {
    async fn check_internet_connectivity(
        &self,
        ctx: &CancellationToken,
    ) -> DetectResult<ConnectivityReport>;
}

/// Reads the APT source configuration.
#[async_trait]
pub trait SourceRepositoryChecker: Send + Sync {
    async fn check_source_repositories(&self, ctx: &CancellationToken)
        -> DetectResult<SourceSummary>;
}

/// The full set of detectors one run needs.
#[derive(Clone)]
pub struct DetectorPorts {
    pub os: Arc<dyn OsDetector>,
    pub gpu: Arc<dyn GpuDetector>,
    pub disk: Arc<dyn DiskSpaceDetector>,
    pub connectivity: Arc<dyn ConnectivityChecker>,
    pub sources: Arc<dyn SourceRepositoryChecker>,
}

impl DetectorPorts {
    /// Detectors backed by the running host.
    pub fn host(config: &PreflightConfig) -> Self {
        DetectorPorts {
            os: Arc::new(linux::OsReleaseDetector::default()),
            gpu: Arc::new(linux::LspciGpuDetector::default()),
            disk: Arc::new(linux::DfDiskSpaceDetector),
            connectivity: Arc::new(network::HttpConnectivityChecker::new(
                config.connectivity_endpoints.clone(),
                Duration::from_millis(config.probe_timeout_ms),
            )),
            sources: Arc::new(apt::AptSourcesChecker::default()),
        }
    }
}

/// Run a detector future, giving up as soon as `ctx` is cancelled.
///
/// A token that is already cancelled wins without polling `fut`.
pub async fn cancellable<T, F>(ctx: &CancellationToken, fut: F) -> DetectResult<T>
where
    F: Future<Output = DetectResult<T>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(DetectError::Cancelled),
        result = fut => result,
    }
}
