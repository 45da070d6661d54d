//! Mock detector ports for testing.
//!
//! Provides a configurable [`MockHost`] that simulates:
//! - Supported and unsupported Debian releases
//! - Machines with and without a GPU
//! - Full or roomy disks
//! - Online and offline networks
//! - APT configurations with and without `deb-src`
//!
//! Every mock honours the cancellation token the same way the host
//! adapters do, and counts how often it was called.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use debian_preflight::engine::events::{DomainEvent, EventEmitter};
use debian_preflight::platform::{
    cancellable, ConnectivityChecker, ConnectivityReport, DetectError, DetectResult,
    DetectorPorts, DiskSpace, DiskSpaceDetector, EndpointCheck, GpuDetector, GpuInfo, OsDetector,
    OsVersion, SourceRepositoryChecker, SourceSummary,
};

pub const GB: u64 = 1024 * 1024 * 1024;

/// One canned detector response.
pub struct MockDetector<T> {
    response: DetectResult<T>,
    delay: Duration,
    calls: AtomicUsize,
}

impl<T: Clone + Send + Sync + 'static> MockDetector<T> {
    pub fn new(response: DetectResult<T>, delay: Duration) -> Self {
        MockDetector {
            response,
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self, ctx: &CancellationToken) -> DetectResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.clone();
        let delay = self.delay;
        cancellable(ctx, async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            response
        })
        .await
    }
}

#[async_trait]
impl OsDetector for MockDetector<OsVersion> {
    async fn detect_version(&self, ctx: &CancellationToken) -> DetectResult<OsVersion> {
        self.respond(ctx).await
    }
}

#[async_trait]
impl GpuDetector for MockDetector<Vec<GpuInfo>> {
    async fn detect_gpus(&self, ctx: &CancellationToken) -> DetectResult<Vec<GpuInfo>> {
        self.respond(ctx).await
    }
}

#[async_trait]
impl DiskSpaceDetector for MockDetector<DiskSpace> {
    async fn detect_available_space(
        &self,
        ctx: &CancellationToken,
        path: &Path,
    ) -> DetectResult<DiskSpace> {
        self.respond(ctx).await.map(|mut space| {
            space.path = path.to_path_buf();
            space
        })
    }
}

#[async_trait]
impl ConnectivityChecker for MockDetector<ConnectivityReport> {
    async fn check_internet_connectivity(
        &self,
        ctx: &CancellationToken,
    ) -> DetectResult<ConnectivityReport> {
        self.respond(ctx).await
    }
}

#[async_trait]
impl SourceRepositoryChecker for MockDetector<SourceSummary> {
    async fn check_source_repositories(
        &self,
        ctx: &CancellationToken,
    ) -> DetectResult<SourceSummary> {
        self.respond(ctx).await
    }
}

/// Mock host configuration
#[derive(Debug, Clone)]
pub struct MockHost {
    pub os: DetectResult<OsVersion>,
    pub gpus: DetectResult<Vec<GpuInfo>>,
    pub disk: DetectResult<DiskSpace>,
    pub connectivity: DetectResult<ConnectivityReport>,
    pub sources: DetectResult<SourceSummary>,
    /// Artificial latency added to every detector call
    pub delay: Duration,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::healthy()
    }
}

impl MockHost {
    /// A trixie machine where every requirement is met
    pub fn healthy() -> Self {
        MockHost {
            os: Ok(OsVersion {
                codename: "trixie".to_string(),
                version: "13".to_string(),
            }),
            gpus: Ok(vec![GpuInfo {
                vendor: "NVIDIA Corporation".to_string(),
                model: "AD102 [GeForce RTX 4090]".to_string(),
                pci_id: "10de:2684".to_string(),
            }]),
            disk: Ok(DiskSpace {
                available_bytes: 120 * GB,
                total_bytes: 500 * GB,
                path: "/".into(),
            }),
            connectivity: Ok(ConnectivityReport::from_checks(vec![EndpointCheck {
                endpoint: "http://deb.debian.org/debian/".to_string(),
                success: true,
                latency: Duration::from_millis(12),
                error_message: String::new(),
            }])),
            sources: Ok(SourceSummary {
                enabled: true,
                configured_lines: vec![
                    "deb-src http://deb.debian.org/debian trixie main".to_string(),
                ],
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn with_release(mut self, codename: &str, version: &str) -> Self {
        self.os = Ok(OsVersion {
            codename: codename.to_string(),
            version: version.to_string(),
        });
        self
    }

    pub fn without_gpu(mut self) -> Self {
        self.gpus = Err(DetectError::NotFound("no GPU detected".to_string()));
        self
    }

    pub fn with_available_bytes(mut self, bytes: u64) -> Self {
        self.disk = Ok(DiskSpace {
            available_bytes: bytes,
            total_bytes: 500 * GB,
            path: "/".into(),
        });
        self
    }

    pub fn offline(mut self) -> Self {
        self.connectivity = Ok(ConnectivityReport::from_checks(vec![EndpointCheck {
            endpoint: "http://deb.debian.org/debian/".to_string(),
            success: false,
            latency: Duration::from_secs(5),
            error_message: "connection refused".to_string(),
        }]));
        self
    }

    pub fn without_deb_src(mut self) -> Self {
        self.sources = Ok(SourceSummary {
            enabled: false,
            configured_lines: Vec::new(),
        });
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn build(&self) -> MockPorts {
        MockPorts {
            os: Arc::new(MockDetector::new(self.os.clone(), self.delay)),
            gpu: Arc::new(MockDetector::new(self.gpus.clone(), self.delay)),
            disk: Arc::new(MockDetector::new(self.disk.clone(), self.delay)),
            connectivity: Arc::new(MockDetector::new(self.connectivity.clone(), self.delay)),
            sources: Arc::new(MockDetector::new(self.sources.clone(), self.delay)),
        }
    }

    pub fn ports(&self) -> DetectorPorts {
        self.build().ports()
    }
}

/// Mock detectors kept concretely typed so tests can read call counts.
pub struct MockPorts {
    pub os: Arc<MockDetector<OsVersion>>,
    pub gpu: Arc<MockDetector<Vec<GpuInfo>>>,
    pub disk: Arc<MockDetector<DiskSpace>>,
    pub connectivity: Arc<MockDetector<ConnectivityReport>>,
    pub sources: Arc<MockDetector<SourceSummary>>,
}

impl MockPorts {
    pub fn ports(&self) -> DetectorPorts {
        DetectorPorts {
            os: self.os.clone(),
            gpu: self.gpu.clone(),
            disk: self.disk.clone(),
            connectivity: self.connectivity.clone(),
            sources: self.sources.clone(),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.os.calls()
            + self.gpu.calls()
            + self.disk.calls()
            + self.connectivity.calls()
            + self.sources.calls()
    }
}

/// Emitter that keeps every event for inspection.
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEmitter {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(DomainEvent::event_type).collect()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: &DomainEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
