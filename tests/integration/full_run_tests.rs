//! Full run integration tests.
//!
//! Tests for complete validation runs through the standard validators,
//! including outcome classification, event emission and panic isolation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use debian_preflight::checks::default_validators;
use debian_preflight::engine::events::DomainEvent;
use debian_preflight::engine::result::ResultError;
use debian_preflight::{
    build_orchestrator, run_preflight, CheckValue, PreflightConfig, RequirementName, Severity,
    UserGuidance, ValidationOrchestrator, ValidationOutcome, ValidationResult, ValidationStatus,
    Validator,
};

use crate::mocks::{MockHost, RecordingEmitter, GB};

async fn run_host(host: MockHost) -> debian_preflight::ValidationSession {
    let config = PreflightConfig::default();
    run_preflight(&config, &host.ports(), &CancellationToken::new()).await
}

#[tokio::test]
async fn test_all_pass_is_success() {
    let session = run_host(MockHost::healthy()).await;

    assert!(session.is_completed());
    assert_eq!(session.len(), 5);
    assert_eq!(session.overall_result(), ValidationOutcome::Success);
    assert!(session.can_proceed());
    assert!(session.blocking_results().is_empty());
    assert!(session.warning_results().is_empty());
}

#[tokio::test]
async fn test_bookworm_is_blocked() {
    let session = run_host(MockHost::healthy().with_release("bookworm", "12.5")).await;

    assert_eq!(session.overall_result(), ValidationOutcome::Blocked);
    assert!(!session.can_proceed());

    let blocking = session.blocking_results();
    assert_eq!(blocking.len(), 1);
    assert_eq!(blocking[0].requirement(), RequirementName::DebianVersion);
    assert_eq!(blocking[0].severity(), Severity::Critical);
    assert!(blocking[0]
        .guidance()
        .format()
        .contains("Upgrade to Debian Sid or Trixie"));
}

#[tokio::test]
async fn test_missing_gpu_is_warnings_and_can_proceed() {
    let session = run_host(MockHost::healthy().without_gpu()).await;

    assert_eq!(session.overall_result(), ValidationOutcome::Warnings);
    assert!(session.can_proceed());
    assert!(session.blocking_results().is_empty());

    let warnings = session.warning_results();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].requirement(), RequirementName::GpuSupport);
}

#[tokio::test]
async fn test_low_disk_is_blocked() {
    let available = (5.2 * GB as f64) as u64;
    let session = run_host(MockHost::healthy().with_available_bytes(available)).await;

    assert_eq!(session.overall_result(), ValidationOutcome::Blocked);
    let blocking = session.blocking_results();
    assert_eq!(blocking.len(), 1);
    assert_eq!(blocking[0].requirement(), RequirementName::DiskSpace);
    assert_eq!(blocking[0].severity(), Severity::High);
}

#[tokio::test]
async fn test_blocker_outranks_warnings() {
    let session = run_host(
        MockHost::healthy()
            .without_gpu()
            .without_deb_src()
            .offline(),
    )
    .await;

    assert_eq!(session.overall_result(), ValidationOutcome::Blocked);
    assert!(session.has_blockers());
    assert!(session.has_warnings());
    assert_eq!(session.blocking_results().len(), 1);
    assert_eq!(session.warning_results().len(), 2);

    let summary = session.summary();
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.warnings, 2);
    assert_eq!(summary.blocking, 1);
    assert_eq!(summary.total, 5);
}

#[tokio::test]
async fn test_results_follow_validator_order() {
    let session = run_host(MockHost::healthy()).await;
    let order: Vec<RequirementName> = session.results().iter().map(|r| r.requirement()).collect();

    assert_eq!(
        order,
        vec![
            RequirementName::DebianVersion,
            RequirementName::GpuSupport,
            RequirementName::DiskSpace,
            RequirementName::InternetConnectivity,
            RequirementName::SourceRepositories,
        ]
    );
}

#[tokio::test]
async fn test_every_non_passing_result_has_guidance() {
    let session = run_host(
        MockHost::healthy()
            .with_release("bullseye", "11")
            .without_gpu()
            .with_available_bytes(GB)
            .offline()
            .without_deb_src(),
    )
    .await;

    assert_eq!(session.summary().passed, 0);
    for result in session.results() {
        assert!(!result.guidance().is_empty(), "{} has no guidance", result.requirement());
        if result.is_blocking() {
            assert!(!result.guidance().steps().is_empty());
        }
        assert!(!(result.is_blocking() && result.is_warning()));
    }
}

#[tokio::test]
async fn test_pre_cancelled_token_still_yields_every_result() {
    let mocks = MockHost::healthy().build();
    let config = PreflightConfig::default();
    let ctx = CancellationToken::new();
    ctx.cancel();

    let session = run_preflight(&config, &mocks.ports(), &ctx).await;

    assert!(session.is_completed());
    assert_eq!(session.len(), 5);
    assert_eq!(mocks.total_calls(), 5);
    assert_eq!(session.overall_result(), ValidationOutcome::Blocked);
}

#[tokio::test]
async fn test_progress_callback_called_per_validator() {
    let config = PreflightConfig::default();
    let orchestrator = build_orchestrator(&config, &MockHost::healthy().without_gpu().ports());

    let mut seen = Vec::new();
    let session = orchestrator
        .execute_validations_with_progress(&CancellationToken::new(), |name, result| {
            seen.push((name.to_string(), result.status()));
        })
        .await;

    assert_eq!(seen.len(), session.len());
    assert_eq!(seen[0].0, "Debian Version");
    assert_eq!(seen[1], ("GPU Support".to_string(), ValidationStatus::Warning));
}

#[tokio::test]
async fn test_empty_orchestrator_is_success() {
    let orchestrator = ValidationOrchestrator::new(Vec::new());
    let session = orchestrator.execute_validations(&CancellationToken::new()).await;

    assert!(session.is_completed());
    assert!(session.is_empty());
    assert_eq!(session.overall_result(), ValidationOutcome::Success);
    assert!(session.can_proceed());
}

#[tokio::test]
async fn test_event_order_for_blocked_run() {
    let config = PreflightConfig::default();
    let emitter = Arc::new(RecordingEmitter::default());
    let orchestrator = ValidationOrchestrator::new(default_validators(
        &MockHost::healthy()
            .without_gpu()
            .with_available_bytes(GB)
            .ports(),
        &config,
    ))
    .with_emitter(emitter.clone());

    let session = orchestrator.execute_validations(&CancellationToken::new()).await;

    assert_eq!(
        emitter.event_types(),
        vec![
            "validation.started",
            "requirement.failed",
            "requirement.failed",
            "validation.blocked",
            "validation.completed",
        ]
    );

    let events = emitter.events();
    assert!(events.iter().all(|e| e.session_id() == session.id()));
    match &events[3] {
        DomainEvent::ValidationBlocked { requirements, .. } => {
            assert_eq!(requirements, &vec![RequirementName::DiskSpace]);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match &events[4] {
        DomainEvent::ValidationCompleted { outcome, .. } => {
            assert_eq!(*outcome, ValidationOutcome::Blocked);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_event_order_for_warning_run() {
    let config = PreflightConfig::default();
    let emitter = Arc::new(RecordingEmitter::default());
    let orchestrator = build_orchestrator(&config, &MockHost::healthy().without_deb_src().ports())
        .with_emitter(emitter.clone());

    orchestrator.execute_validations(&CancellationToken::new()).await;

    assert_eq!(
        emitter.event_types(),
        vec![
            "validation.started",
            "requirement.failed",
            "validation.warning",
            "validation.completed",
        ]
    );
}

#[tokio::test]
async fn test_successful_run_emits_no_failures() {
    let config = PreflightConfig::default();
    let emitter = Arc::new(RecordingEmitter::default());
    let orchestrator =
        build_orchestrator(&config, &MockHost::healthy().ports()).with_emitter(emitter.clone());

    orchestrator.execute_validations(&CancellationToken::new()).await;

    assert_eq!(
        emitter.event_types(),
        vec!["validation.started", "validation.completed"]
    );
}

struct PanickingValidator;

#[async_trait]
impl Validator for PanickingValidator {
    fn name(&self) -> &str {
        "Distribution"
    }

    fn requirement(&self) -> RequirementName {
        RequirementName::Distribution
    }

    async fn validate(&self, _ctx: &CancellationToken) -> ValidationResult {
        panic!("detector exploded");
    }
}

struct FixedValidator(ValidationResult);

#[async_trait]
impl Validator for FixedValidator {
    fn name(&self) -> &str {
        "Fixed"
    }

    fn requirement(&self) -> RequirementName {
        self.0.requirement()
    }

    async fn validate(&self, _ctx: &CancellationToken) -> ValidationResult {
        self.0.clone()
    }
}

#[tokio::test]
async fn test_panicking_validator_is_isolated() {
    let mut orchestrator = ValidationOrchestrator::new(vec![Arc::new(PanickingValidator)]);
    orchestrator.register(Arc::new(FixedValidator(ValidationResult::pass(
        RequirementName::DiskSpace,
        CheckValue::bytes(20 * GB),
        CheckValue::bytes(10 * GB),
    ))));

    let session = orchestrator.execute_validations(&CancellationToken::new()).await;

    assert_eq!(session.len(), 2);
    let results = session.results();
    assert_eq!(results[0].requirement(), RequirementName::Distribution);
    assert_eq!(results[0].status(), ValidationStatus::Fail);
    assert_eq!(results[0].severity(), Severity::High);
    assert!(!results[0].guidance().steps().is_empty());
    assert!(results[1].is_passing());
    assert_eq!(session.overall_result(), ValidationOutcome::Blocked);
}

#[tokio::test]
async fn test_non_blocking_failure_counts_as_warning() {
    let result = ValidationResult::new(
        RequirementName::SourceRepositories,
        ValidationStatus::Fail,
        Severity::Medium,
        CheckValue::None,
        CheckValue::None,
        UserGuidance::new("Mirror list is stale"),
    )
    .unwrap();
    let orchestrator = ValidationOrchestrator::new(vec![Arc::new(FixedValidator(result))]);

    let session = orchestrator.execute_validations(&CancellationToken::new()).await;

    assert_eq!(session.overall_result(), ValidationOutcome::Warnings);
    assert!(session.can_proceed());
    assert_eq!(session.warning_results().len(), 1);
}

#[test]
fn test_external_blocking_result_needs_steps() {
    let without_steps = ValidationResult::new(
        RequirementName::DiskSpace,
        ValidationStatus::Fail,
        Severity::High,
        CheckValue::bytes(GB),
        CheckValue::bytes(10 * GB),
        UserGuidance::new("Insufficient disk space"),
    );
    assert!(matches!(
        without_steps,
        Err(ResultError::MissingSteps {
            requirement: RequirementName::DiskSpace
        })
    ));

    let result = ValidationResult::new(
        RequirementName::DiskSpace,
        ValidationStatus::Fail,
        Severity::High,
        CheckValue::bytes(GB),
        CheckValue::bytes(10 * GB),
        UserGuidance::new("Insufficient disk space").with_step("Free up space"),
    )
    .unwrap();
    assert!(result.is_blocking());
    assert!(!result.guidance().steps().is_empty());
}

#[test]
fn test_external_warning_needs_message() {
    let err = ValidationResult::new(
        RequirementName::GpuSupport,
        ValidationStatus::Warning,
        Severity::Medium,
        CheckValue::None,
        CheckValue::None,
        UserGuidance::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ResultError::MissingGuidance { .. }));
}
