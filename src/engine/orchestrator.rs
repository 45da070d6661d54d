//! Validator execution orchestrator.
//!
//! Owns the ordered validators and runs them one after another against a
//! fresh [`ValidationSession`].
//!
//! # Graceful Degradation
//!
//! This module handles errors gracefully:
//! - Detector errors: Classified by the validator itself into Fail/Warning
//! - Validator panics: Caught and converted to a blocking Fail result
//! - Cancelled token: Each remaining validator still runs and reports its
//!   own cancellation result; the loop never exits early
//! - Empty validator list: Returns a completed, empty (Success) session
//!
//! Every validator contributes exactly one result per session, regardless of
//! what the others do. No function in this module will panic.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use super::events::{DomainEvent, EventEmitter, NoopEmitter};
use super::result::{CheckValue, RequirementName, Severity, UserGuidance, ValidationResult};
use super::session::{ValidationOutcome, ValidationSession};

/// Checks one installation requirement.
///
/// Implementations translate whatever their detector reports, including
/// errors and cancellation, into a classified [`ValidationResult`].
#[async_trait]
pub trait Validator: Send + Sync {
    /// Human-readable check name.
    fn name(&self) -> &str;

    fn requirement(&self) -> RequirementName;

    async fn validate(&self, ctx: &CancellationToken) -> ValidationResult;
}

/// Runs validators in registration order.
pub struct ValidationOrchestrator {
    validators: Vec<Arc<dyn Validator>>,
    emitter: Arc<dyn EventEmitter>,
}

impl ValidationOrchestrator {
    pub fn new(validators: Vec<Arc<dyn Validator>>) -> Self {
        ValidationOrchestrator {
            validators,
            emitter: Arc::new(NoopEmitter),
        }
    }

    /// Route domain events to `emitter`.
    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Append a validator to the end of the run order.
    pub fn register(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    /// Run every validator and return the completed session.
    pub async fn execute_validations(&self, ctx: &CancellationToken) -> ValidationSession {
        self.execute_validations_with_progress(ctx, |_, _| {}).await
    }

    /// Like [`execute_validations`](Self::execute_validations), calling
    /// `progress_fn(validator_name, result)` right after each result is recorded.
    pub async fn execute_validations_with_progress<F>(
        &self,
        ctx: &CancellationToken,
        mut progress_fn: F,
    ) -> ValidationSession
    where
        F: FnMut(&str, &ValidationResult) + Send,
    {
        let session = ValidationSession::new();
        self.begin(&session);

        for validator in &self.validators {
            let result = Self::execute_one(validator.as_ref(), ctx).await;
            self.record(&session, result.clone());
            progress_fn(validator.name(), &result);
        }

        self.finish(&session);
        session
    }

    pub(crate) fn begin(&self, session: &ValidationSession) {
        info!(
            session_id = %session.id(),
            validators = self.validators.len(),
            "Starting validation"
        );
        self.emitter
            .emit(&DomainEvent::started(session.id(), self.validators.len()));
    }

    /// Add a result to the session and announce it if it did not pass.
    pub(crate) fn record(&self, session: &ValidationSession, result: ValidationResult) {
        if !result.is_passing() {
            self.emitter
                .emit(&DomainEvent::requirement_failed(session.id(), &result));
        }
        session.add_result(result);
    }

    /// Complete the session and emit the closing events.
    pub(crate) fn finish(&self, session: &ValidationSession) {
        session.complete();

        match session.overall_result() {
            ValidationOutcome::Blocked => {
                let requirements = session
                    .blocking_results()
                    .iter()
                    .map(ValidationResult::requirement)
                    .collect();
                self.emitter
                    .emit(&DomainEvent::blocked(session.id(), requirements));
            }
            ValidationOutcome::Warnings => {
                let requirements = session
                    .warning_results()
                    .iter()
                    .map(ValidationResult::requirement)
                    .collect();
                self.emitter
                    .emit(&DomainEvent::warning(session.id(), requirements));
            }
            ValidationOutcome::Success | ValidationOutcome::PartialSuccess => {}
        }

        info!(
            session_id = %session.id(),
            outcome = %session.overall_result(),
            duration_ms = session.duration().as_millis() as u64,
            "Validation finished"
        );
        self.emitter.emit(&DomainEvent::completed(session));
    }

    /// Run one validator, turning a panic into a blocking failure.
    pub(crate) async fn execute_one(
        validator: &dyn Validator,
        ctx: &CancellationToken,
    ) -> ValidationResult {
        let requirement = validator.requirement();
        let span = info_span!("validator", name = validator.name(), %requirement);
        let start = Instant::now();

        let outcome = AssertUnwindSafe(validator.validate(ctx))
            .catch_unwind()
            .instrument(span)
            .await;

        match outcome {
            Ok(result) => {
                debug!(
                    %requirement,
                    status = %result.status(),
                    severity = %result.severity(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Validator finished"
                );
                result
            }
            Err(_) => {
                error!(%requirement, name = validator.name(), "Validator panicked");
                panicked_result(requirement, validator.name())
            }
        }
    }
}

fn panicked_result(requirement: RequirementName, name: &str) -> ValidationResult {
    ValidationResult::fail(
        requirement,
        Severity::High,
        CheckValue::None,
        CheckValue::None,
        UserGuidance::new(format!("The {} check could not be completed", name))
            .with_reason("The check stopped with an internal error")
            .with_steps([
                "Re-run the preflight with --verbose to capture diagnostics",
                "Report the problem to the installer maintainers",
            ]),
    )
}
