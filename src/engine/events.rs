//! Domain events emitted over the course of a validation run.
//!
//! Events are a closed set. Each carries the session it belongs to and the
//! time it occurred, and serializes with its stable type string as the `type`
//! tag:
//!
//! ```json
//! { "type": "validation.blocked", "session_id": "...", "occurred_at": "...", "requirements": ["disk_space"] }
//! ```
//!
//! Observers receive events through an [`EventEmitter`]. Emitters must not
//! block the orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use super::result::{RequirementName, Severity, ValidationResult, ValidationStatus};
use super::session::{ValidationOutcome, ValidationSession};

/// Notification about the progress or outcome of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    #[serde(rename = "validation.started")]
    ValidationStarted {
        session_id: Uuid,
        occurred_at: DateTime<Utc>,
        validator_count: usize,
    },

    #[serde(rename = "validation.completed")]
    ValidationCompleted {
        session_id: Uuid,
        occurred_at: DateTime<Utc>,
        outcome: ValidationOutcome,
        duration_ms: u64,
    },

    #[serde(rename = "validation.blocked")]
    ValidationBlocked {
        session_id: Uuid,
        occurred_at: DateTime<Utc>,
        requirements: Vec<RequirementName>,
    },

    #[serde(rename = "validation.warning")]
    ValidationWarning {
        session_id: Uuid,
        occurred_at: DateTime<Utc>,
        requirements: Vec<RequirementName>,
    },

    #[serde(rename = "requirement.failed")]
    RequirementFailed {
        session_id: Uuid,
        occurred_at: DateTime<Utc>,
        requirement: RequirementName,
        status: ValidationStatus,
        severity: Severity,
        message: String,
    },
}

impl DomainEvent {
    pub fn started(session_id: Uuid, validator_count: usize) -> Self {
        DomainEvent::ValidationStarted {
            session_id,
            occurred_at: Utc::now(),
            validator_count,
        }
    }

    pub fn completed(session: &ValidationSession) -> Self {
        DomainEvent::ValidationCompleted {
            session_id: session.id(),
            occurred_at: Utc::now(),
            outcome: session.overall_result(),
            duration_ms: u64::try_from(session.duration().as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn blocked(session_id: Uuid, requirements: Vec<RequirementName>) -> Self {
        DomainEvent::ValidationBlocked {
            session_id,
            occurred_at: Utc::now(),
            requirements,
        }
    }

    pub fn warning(session_id: Uuid, requirements: Vec<RequirementName>) -> Self {
        DomainEvent::ValidationWarning {
            session_id,
            occurred_at: Utc::now(),
            requirements,
        }
    }

    pub fn requirement_failed(session_id: Uuid, result: &ValidationResult) -> Self {
        DomainEvent::RequirementFailed {
            session_id,
            occurred_at: Utc::now(),
            requirement: result.requirement(),
            status: result.status(),
            severity: result.severity(),
            message: result.guidance().message().to_string(),
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::ValidationStarted { occurred_at, .. }
            | DomainEvent::ValidationCompleted { occurred_at, .. }
            | DomainEvent::ValidationBlocked { occurred_at, .. }
            | DomainEvent::ValidationWarning { occurred_at, .. }
            | DomainEvent::RequirementFailed { occurred_at, .. } => *occurred_at,
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            DomainEvent::ValidationStarted { session_id, .. }
            | DomainEvent::ValidationCompleted { session_id, .. }
            | DomainEvent::ValidationBlocked { session_id, .. }
            | DomainEvent::ValidationWarning { session_id, .. }
            | DomainEvent::RequirementFailed { session_id, .. } => *session_id,
        }
    }

    /// Stable identifier such as `validation.blocked`.
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ValidationStarted { .. } => "validation.started",
            DomainEvent::ValidationCompleted { .. } => "validation.completed",
            DomainEvent::ValidationBlocked { .. } => "validation.blocked",
            DomainEvent::ValidationWarning { .. } => "validation.warning",
            DomainEvent::RequirementFailed { .. } => "requirement.failed",
        }
    }
}

/// Sink for domain events.
///
/// Called synchronously from the orchestrator, so implementations should
/// hand the event off rather than do slow work inline.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: &DomainEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: &DomainEvent) {}
}

/// Writes every event to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEmitter;

impl EventEmitter for TracingEmitter {
    fn emit(&self, event: &DomainEvent) {
        match event {
            DomainEvent::RequirementFailed {
                requirement,
                status,
                severity,
                message,
                ..
            } => warn!(
                event = event.event_type(),
                requirement = %requirement,
                %status,
                %severity,
                message = %message,
                "Requirement not met"
            ),
            DomainEvent::ValidationBlocked { requirements, .. } => warn!(
                event = event.event_type(),
                ?requirements,
                "Installation blocked"
            ),
            _ => info!(
                event = event.event_type(),
                session_id = %event.session_id(),
                "Validation event"
            ),
        }
    }
}

/// Forwards events to an async observer through an unbounded channel.
///
/// Sending never blocks. Events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    sender: mpsc::UnboundedSender<DomainEvent>,
}

impl ChannelEmitter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelEmitter { sender }, receiver)
    }
}

impl EventEmitter for ChannelEmitter {
    fn emit(&self, event: &DomainEvent) {
        let _ = self.sender.send(event.clone());
    }
}
