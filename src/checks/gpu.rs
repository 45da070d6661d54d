//! GPU presence check.
//!
//! A missing GPU degrades the desktop (software rendering) but never blocks
//! installation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::orchestrator::Validator;
use crate::engine::result::{CheckValue, RequirementName, Severity, UserGuidance, ValidationResult};
use crate::platform::GpuDetector;

pub const NAME: &str = "GPU Support";

pub struct GpuValidator {
    detector: Arc<dyn GpuDetector>,
}

impl GpuValidator {
    pub fn new(detector: Arc<dyn GpuDetector>) -> Self {
        GpuValidator { detector }
    }

    fn no_gpu(reason: String) -> ValidationResult {
        ValidationResult::warning(
            RequirementName::GpuSupport,
            Severity::Medium,
            CheckValue::text(reason.clone()),
            CheckValue::text("at least one GPU"),
            UserGuidance::new("No GPU detected; the desktop will fall back to software rendering")
                .with_reason(reason)
                .with_steps([
                    "Install pciutils if lspci is missing: sudo apt install pciutils",
                    "Check that the graphics card is seated and enabled in firmware",
                ])
                .with_doc_url("https://wiki.debian.org/GraphicsCard"),
        )
    }
}

#[async_trait]
impl Validator for GpuValidator {
    fn name(&self) -> &str {
        NAME
    }

    fn requirement(&self) -> RequirementName {
        RequirementName::GpuSupport
    }

    async fn validate(&self, ctx: &CancellationToken) -> ValidationResult {
        match self.detector.detect_gpus(ctx).await {
            Ok(gpus) if !gpus.is_empty() => ValidationResult::pass(
                RequirementName::GpuSupport,
                CheckValue::Gpus { gpus },
                CheckValue::text("at least one GPU"),
            ),
            Ok(_) => Self::no_gpu("the detector returned no display adapters".to_string()),
            Err(err) => Self::no_gpu(err.to_string()),
        }
    }
}
