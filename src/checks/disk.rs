//! Free disk space check.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::orchestrator::Validator;
use crate::engine::result::{
    format_gb, CheckValue, RequirementName, Severity, UserGuidance, ValidationResult,
};
use crate::platform::DiskSpaceDetector;

pub const NAME: &str = "Disk Space";

/// 10 GB, the footprint of the full desktop task plus download cache.
pub const DEFAULT_MIN_DISK_BYTES: u64 = 10 * 1024 * 1024 * 1024;

pub struct DiskSpaceValidator {
    detector: Arc<dyn DiskSpaceDetector>,
    path: PathBuf,
    min_bytes: u64,
}

impl DiskSpaceValidator {
    pub fn new(detector: Arc<dyn DiskSpaceDetector>, path: PathBuf, min_bytes: u64) -> Self {
        DiskSpaceValidator {
            detector,
            path,
            min_bytes,
        }
    }

    fn free_space_steps() -> [&'static str; 3] {
        [
            "Remove packages you no longer need: sudo apt autoremove",
            "Clear the APT download cache: sudo apt clean",
            "Free space or choose a larger install partition",
        ]
    }
}

#[async_trait]
impl Validator for DiskSpaceValidator {
    fn name(&self) -> &str {
        NAME
    }

    fn requirement(&self) -> RequirementName {
        RequirementName::DiskSpace
    }

    async fn validate(&self, ctx: &CancellationToken) -> ValidationResult {
        let expected = CheckValue::bytes(self.min_bytes);

        match self.detector.detect_available_space(ctx, &self.path).await {
            Ok(space) if space.available_bytes >= self.min_bytes => ValidationResult::pass(
                RequirementName::DiskSpace,
                CheckValue::bytes(space.available_bytes),
                expected,
            ),
            Ok(space) => ValidationResult::fail(
                RequirementName::DiskSpace,
                Severity::High,
                CheckValue::bytes(space.available_bytes),
                expected,
                UserGuidance::new(format!(
                    "Insufficient disk space: {} available, {} required",
                    format_gb(space.available_bytes),
                    format_gb(self.min_bytes)
                ))
                .with_reason(format!(
                    "The desktop installation needs {} free on {}",
                    format_gb(self.min_bytes),
                    space.path.display()
                ))
                .with_steps(Self::free_space_steps()),
            ),
            Err(err) => ValidationResult::fail(
                RequirementName::DiskSpace,
                Severity::High,
                CheckValue::text(err.to_string()),
                expected,
                UserGuidance::new(format!(
                    "Could not measure free space on {}",
                    self.path.display()
                ))
                .with_reason(err.to_string())
                .with_step(format!("Check the path manually: df -h {}", self.path.display()))
                .with_steps(Self::free_space_steps()),
            ),
        }
    }
}
