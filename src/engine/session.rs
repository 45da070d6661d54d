//! Validation session aggregate.
//!
//! A [`ValidationSession`] is shared between the orchestrator (the only
//! writer) and any number of readers such as a progress display. All state
//! sits behind a single mutex; derived queries evaluate their predicates on
//! the guarded state and never take the lock a second time.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{ValidationResult, ValidationStatus};

/// Overall classification of a session, derived from its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Success,
    Blocked,
    Warnings,
    PartialSuccess,
}

impl ValidationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationOutcome::Success => "success",
            ValidationOutcome::Blocked => "blocked",
            ValidationOutcome::Warnings => "warnings",
            ValidationOutcome::PartialSuccess => "partial_success",
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a result set. First match wins: blocked, warnings, success, partial.
///
/// The partial branch is unreachable with the current status/severity
/// taxonomy (every failure is either blocking or a warning) but keeps the
/// classification total.
pub fn compute_outcome(results: &[ValidationResult]) -> ValidationOutcome {
    if results.iter().any(ValidationResult::is_blocking) {
        ValidationOutcome::Blocked
    } else if results.iter().any(ValidationResult::is_warning) {
        ValidationOutcome::Warnings
    } else if results.iter().all(|r| r.status() == ValidationStatus::Pass) {
        ValidationOutcome::Success
    } else {
        ValidationOutcome::PartialSuccess
    }
}

/// Result counts for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub passed: usize,
    pub warnings: usize,
    pub blocking: usize,
    pub total: usize,
}

/// Serializable copy of a session taken under one lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_result: ValidationOutcome,
    pub can_proceed: bool,
    pub duration_ms: u64,
    pub summary: SessionSummary,
    pub results: Vec<ValidationResult>,
}

impl SessionSnapshot {
    pub fn blocking_results(&self) -> Vec<&ValidationResult> {
        self.results.iter().filter(|r| r.is_blocking()).collect()
    }

    pub fn warning_results(&self) -> Vec<&ValidationResult> {
        self.results.iter().filter(|r| r.is_warning()).collect()
    }
}

#[derive(Debug)]
struct SessionState {
    results: Vec<ValidationResult>,
    overall: ValidationOutcome,
    completed_at: Option<DateTime<Utc>>,
    // Monotonic length of the run, fixed when the session completes.
    final_duration: Option<Duration>,
}

impl SessionState {
    fn recompute(&mut self) {
        self.overall = compute_outcome(&self.results);
    }

    fn has_blockers(&self) -> bool {
        self.results.iter().any(ValidationResult::is_blocking)
    }

    fn has_warnings(&self) -> bool {
        self.results.iter().any(ValidationResult::is_warning)
    }

    fn summary(&self) -> SessionSummary {
        let mut summary = SessionSummary {
            total: self.results.len(),
            ..Default::default()
        };
        for result in &self.results {
            if result.is_passing() {
                summary.passed += 1;
            } else if result.is_blocking() {
                summary.blocking += 1;
            } else if result.is_warning() {
                summary.warnings += 1;
            }
        }
        summary
    }
}

/// One run of all requirement checks.
#[derive(Debug)]
pub struct ValidationSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    state: Mutex<SessionState>,
}

impl ValidationSession {
    pub fn new() -> Self {
        ValidationSession {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: Instant::now(),
            state: Mutex::new(SessionState {
                results: Vec::new(),
                overall: ValidationOutcome::Success,
                completed_at: None,
                final_duration: None,
            }),
        }
    }

    // State is append-only, so a panic elsewhere cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Append a result and reclassify the session.
    pub fn add_result(&self, result: ValidationResult) {
        let mut state = self.lock();
        state.results.push(result);
        state.recompute();
    }

    /// Mark the session finished. Only the first call has any effect.
    pub fn complete(&self) {
        let mut state = self.lock();
        if state.completed_at.is_some() {
            return;
        }
        state.completed_at = Some(Utc::now());
        state.final_duration = Some(self.started.elapsed());
        state.recompute();
    }

    pub fn is_completed(&self) -> bool {
        self.lock().completed_at.is_some()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.lock().completed_at
    }

    /// Time from start to completion, or elapsed time while still running.
    pub fn duration(&self) -> Duration {
        let state = self.lock();
        state.final_duration.unwrap_or_else(|| self.started.elapsed())
    }

    pub fn overall_result(&self) -> ValidationOutcome {
        self.lock().overall
    }

    /// Copy of the results recorded so far, in evaluation order.
    pub fn results(&self) -> Vec<ValidationResult> {
        self.lock().results.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().results.is_empty()
    }

    pub fn has_blockers(&self) -> bool {
        self.lock().has_blockers()
    }

    pub fn has_warnings(&self) -> bool {
        self.lock().has_warnings()
    }

    pub fn blocking_results(&self) -> Vec<ValidationResult> {
        self.lock()
            .results
            .iter()
            .filter(|r| r.is_blocking())
            .cloned()
            .collect()
    }

    pub fn warning_results(&self) -> Vec<ValidationResult> {
        self.lock()
            .results
            .iter()
            .filter(|r| r.is_warning())
            .cloned()
            .collect()
    }

    /// Installation may continue unless something blocks it. Warnings never do.
    pub fn can_proceed(&self) -> bool {
        !self.lock().has_blockers()
    }

    pub fn summary(&self) -> SessionSummary {
        self.lock().summary()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        let duration = state.final_duration.unwrap_or_else(|| self.started.elapsed());
        SessionSnapshot {
            id: self.id,
            started_at: self.started_at,
            completed_at: state.completed_at,
            overall_result: state.overall,
            can_proceed: !state.has_blockers(),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            summary: state.summary(),
            results: state.results.clone(),
        }
    }
}

impl Default for ValidationSession {
    fn default() -> Self {
        Self::new()
    }
}
