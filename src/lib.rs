//! debian-preflight library
//!
//! Pre-installation validation for a Debian desktop installer.
//!
//! This library provides:
//! - Detector ports for the host facts an installation depends on
//! - One validator per requirement, classifying detector output with guidance
//! - A validation session that aggregates results into a single outcome
//! - A runner that streams live progress to an asynchronous consumer
//! - Domain events and an optional session repository
//!
//! # Example
//!
//! ```no_run
//! use debian_preflight::{run_preflight, DetectorPorts, PreflightConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let config = PreflightConfig::default();
//! let ports = DetectorPorts::host(&config);
//! let session = run_preflight(&config, &ports, &CancellationToken::new()).await;
//! println!("Outcome: {}", session.overall_result());
//! # }
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod platform;
pub mod version;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use engine::events::TracingEmitter;

// Re-exports for public API
pub use config::PreflightConfig;
pub use engine::orchestrator::{ValidationOrchestrator, Validator};
pub use engine::result::{
    CheckValue, RequirementName, Severity, UserGuidance, ValidationResult, ValidationStatus,
};
pub use engine::runner::{ProgressStatus, ProgressUpdate, Runner};
pub use engine::session::{SessionSnapshot, ValidationOutcome, ValidationSession};
pub use platform::{DetectError, DetectorPorts};

/// Errors outside per-check classification.
#[derive(Debug, Error)]
pub enum PreflightError {
    /// `Runner::run` was called a second time.
    #[error("validation run already started")]
    AlreadyRun,

    /// Configuration file unreadable or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Build the standard orchestrator for `config`.
pub fn build_orchestrator(config: &PreflightConfig, ports: &DetectorPorts) -> ValidationOrchestrator {
    ValidationOrchestrator::new(checks::default_validators(ports, config))
        .with_emitter(std::sync::Arc::new(TracingEmitter))
}

/// Run every standard check once, without progress streaming.
///
/// Per-check failures are classified into the returned session; this never
/// fails.
pub async fn run_preflight(
    config: &PreflightConfig,
    ports: &DetectorPorts,
    ctx: &CancellationToken,
) -> ValidationSession {
    build_orchestrator(config, ports).execute_validations(ctx).await
}
