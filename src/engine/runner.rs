//! Single-use runner that streams progress to an asynchronous consumer.
//!
//! The runner owns a bounded progress channel. A consumer takes the
//! receiving side with [`Runner::progress`] and drains it on its own task
//! while [`Runner::run`] executes the validators. The channel is closed
//! exactly once, after the session has been completed; closure is the only
//! completion signal.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use debian_preflight::engine::orchestrator::ValidationOrchestrator;
//! # use debian_preflight::engine::runner::Runner;
//! # use tokio_util::sync::CancellationToken;
//! # async fn demo(orchestrator: ValidationOrchestrator) {
//! let runner = Arc::new(Runner::new(orchestrator, 8));
//! let mut progress = runner.progress().expect("receiver taken once");
//! let display = tokio::spawn(async move {
//!     while let Some(update) = progress.recv().await {
//!         println!("{}", update.message);
//!     }
//! });
//! runner.run(&CancellationToken::new()).await.expect("first run");
//! display.await.expect("display task");
//! # }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::orchestrator::{ValidationOrchestrator, Validator};
use super::repository::SessionRepository;
use super::result::{RequirementName, ValidationResult, ValidationStatus};
use super::session::ValidationSession;
use crate::PreflightError;

/// Progress channel capacity used when none is configured.
pub const DEFAULT_PROGRESS_CAPACITY: usize = 8;

/// State of a check as seen by a progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    /// The check has started and has not resolved yet.
    Running,
    Resolved(ValidationStatus),
}

/// Transient notification about one check.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub requirement: RequirementName,
    pub validator: String,
    pub status: ProgressStatus,
    pub message: String,
    /// Present only once the check has resolved.
    pub result: Option<ValidationResult>,
}

impl ProgressUpdate {
    pub fn running(validator: &dyn Validator) -> Self {
        ProgressUpdate {
            requirement: validator.requirement(),
            validator: validator.name().to_string(),
            status: ProgressStatus::Running,
            message: format!("Checking {}...", validator.name()),
            result: None,
        }
    }

    pub fn resolved(validator: &dyn Validator, result: ValidationResult) -> Self {
        ProgressUpdate {
            requirement: result.requirement(),
            validator: validator.name().to_string(),
            status: ProgressStatus::Resolved(result.status()),
            message: result.format_message(),
            result: Some(result),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.status, ProgressStatus::Resolved(_))
    }
}

/// Executes one validation run and publishes its progress.
pub struct Runner {
    orchestrator: ValidationOrchestrator,
    session: Arc<ValidationSession>,
    sender: Mutex<Option<mpsc::Sender<ProgressUpdate>>>,
    receiver: Mutex<Option<mpsc::Receiver<ProgressUpdate>>>,
    repository: Option<Arc<dyn SessionRepository>>,
}

impl Runner {
    /// Create a runner with a progress buffer of `capacity` (at least 1).
    pub fn new(orchestrator: ValidationOrchestrator, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Runner {
            orchestrator,
            session: Arc::new(ValidationSession::new()),
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            repository: None,
        }
    }

    /// Save the completed session to `repository`.
    pub fn with_repository(mut self, repository: Arc<dyn SessionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// The session this runner writes to. Safe to read while running.
    pub fn session(&self) -> Arc<ValidationSession> {
        Arc::clone(&self.session)
    }

    /// Take the receiving side of the progress channel. Returns `None` after
    /// the first call.
    pub fn progress(&self) -> Option<mpsc::Receiver<ProgressUpdate>> {
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Run every validator once.
    ///
    /// Validator failures never surface here; they are results in the
    /// session. The only error is calling `run` a second time.
    pub async fn run(&self, ctx: &CancellationToken) -> Result<(), PreflightError> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(PreflightError::AlreadyRun)?;

        let session = self.session.as_ref();
        self.orchestrator.begin(session);

        for validator in self.orchestrator.validators() {
            Self::publish(&sender, ProgressUpdate::running(validator.as_ref())).await;

            let result = ValidationOrchestrator::execute_one(validator.as_ref(), ctx).await;
            self.orchestrator.record(session, result.clone());

            Self::publish(&sender, ProgressUpdate::resolved(validator.as_ref(), result)).await;
        }

        self.orchestrator.finish(session);
        drop(sender);

        if let Some(repository) = &self.repository {
            if let Err(e) = repository.save(&session.snapshot()) {
                warn!(session_id = %session.id(), error = %e, "Failed to save session");
            }
        }

        Ok(())
    }

    // Waits while the buffer is full; a consumer that went away is ignored.
    async fn publish(sender: &mpsc::Sender<ProgressUpdate>, update: ProgressUpdate) {
        if sender.send(update).await.is_err() {
            debug!("Progress receiver dropped, continuing without display");
        }
    }
}
