//! Validation result and guidance value types.
//!
//! A [`ValidationResult`] records the outcome of one requirement check. Its
//! blocking/warning classification is derived from status and severity and
//! is never stored separately.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::platform::{ConnectivityReport, GpuInfo, OsVersion, SourceSummary};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Errors raised when constructing a result from untrusted parts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResultError {
    #[error("{requirement} is {status} but carries no guidance message")]
    MissingGuidance {
        requirement: RequirementName,
        status: ValidationStatus,
    },

    #[error("{requirement} blocks installation but guidance lists no steps")]
    MissingSteps { requirement: RequirementName },

    #[error("unknown requirement: {0}")]
    UnknownRequirement(String),
}

/// Identifier of one installation requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementName {
    DebianVersion,
    GpuSupport,
    DiskSpace,
    InternetConnectivity,
    SourceRepositories,
    Distribution,
}

impl RequirementName {
    pub const ALL: [RequirementName; 6] = [
        RequirementName::DebianVersion,
        RequirementName::GpuSupport,
        RequirementName::DiskSpace,
        RequirementName::InternetConnectivity,
        RequirementName::SourceRepositories,
        RequirementName::Distribution,
    ];

    /// Stable string form, used as a map key and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementName::DebianVersion => "debian_version",
            RequirementName::GpuSupport => "gpu_support",
            RequirementName::DiskSpace => "disk_space",
            RequirementName::InternetConnectivity => "internet_connectivity",
            RequirementName::SourceRepositories => "source_repositories",
            RequirementName::Distribution => "distribution",
        }
    }
}

impl fmt::Display for RequirementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementName {
    type Err = ResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequirementName::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ResultError::UnknownRequirement(s.to_string()))
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pass,
    Fail,
    Warning,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Pass => write!(f, "pass"),
            ValidationStatus::Fail => write!(f, "fail"),
            ValidationStatus::Warning => write!(f, "warning"),
        }
    }
}

/// How serious a failure is. Only meaningful when the status is `Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Critical and High failures stop the installation.
    pub fn is_blocking_level(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Observed or required value of a check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckValue {
    #[default]
    None,
    Version(OsVersion),
    Gpus { gpus: Vec<GpuInfo> },
    Bytes { bytes: u64 },
    Connectivity(ConnectivityReport),
    Sources(SourceSummary),
    Text { text: String },
}

impl CheckValue {
    pub fn text(text: impl Into<String>) -> Self {
        CheckValue::Text { text: text.into() }
    }

    pub fn bytes(bytes: u64) -> Self {
        CheckValue::Bytes { bytes }
    }
}

/// Render a byte count as gigabytes with one decimal.
pub fn format_gb(bytes: u64) -> String {
    format!("{:.1} GB", bytes as f64 / BYTES_PER_GB)
}

impl fmt::Display for CheckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckValue::None => write!(f, "-"),
            CheckValue::Version(v) if v.version.is_empty() => write!(f, "{}", v.codename),
            CheckValue::Version(v) => write!(f, "{} ({})", v.codename, v.version),
            CheckValue::Gpus { gpus } => {
                let names: Vec<String> = gpus
                    .iter()
                    .map(|g| format!("{} {}", g.vendor, g.model))
                    .collect();
                write!(f, "{}", names.join(", "))
            }
            CheckValue::Bytes { bytes } => write!(f, "{}", format_gb(*bytes)),
            CheckValue::Connectivity(report) => write!(
                f,
                "{}/{} endpoints reachable",
                report.reachable(),
                report.endpoints.len()
            ),
            CheckValue::Sources(summary) if summary.enabled => write!(f, "deb-src enabled"),
            CheckValue::Sources(_) => write!(f, "deb-src not configured"),
            CheckValue::Text { text } => write!(f, "{}", text),
        }
    }
}

/// Remediation text shown to the user for a non-passing check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserGuidance {
    message: String,
    reason: String,
    steps: Vec<String>,
    doc_url: String,
}

impl UserGuidance {
    pub fn new(message: impl Into<String>) -> Self {
        UserGuidance {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.extend(steps.into_iter().map(Into::into));
        self
    }

    pub fn with_doc_url(mut self, url: impl Into<String>) -> Self {
        self.doc_url = url.into();
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn doc_url(&self) -> &str {
        &self.doc_url
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    /// Multi-line rendering. Sections whose source field is empty are left out.
    pub fn format(&self) -> String {
        let mut lines = vec![self.message.clone()];

        if !self.reason.is_empty() {
            lines.push(format!("Reason: {}", self.reason));
        }

        if !self.steps.is_empty() {
            lines.push("How to fix:".to_string());
            for (i, step) in self.steps.iter().enumerate() {
                lines.push(format!("  {}. {}", i + 1, step));
            }
        }

        if !self.doc_url.is_empty() {
            lines.push(format!("Learn more: {}", self.doc_url));
        }

        lines.join("\n")
    }
}

/// Outcome of checking one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    id: Uuid,
    requirement: RequirementName,
    status: ValidationStatus,
    severity: Severity,
    actual: CheckValue,
    expected: CheckValue,
    guidance: UserGuidance,
    detected_at: DateTime<Utc>,
}

impl ValidationResult {
    /// Build a result, checking that non-passing results explain themselves.
    pub fn new(
        requirement: RequirementName,
        status: ValidationStatus,
        severity: Severity,
        actual: CheckValue,
        expected: CheckValue,
        guidance: UserGuidance,
    ) -> Result<Self, ResultError> {
        if status != ValidationStatus::Pass && guidance.is_empty() {
            return Err(ResultError::MissingGuidance {
                requirement,
                status,
            });
        }
        if status == ValidationStatus::Fail
            && severity.is_blocking_level()
            && guidance.steps().is_empty()
        {
            return Err(ResultError::MissingSteps { requirement });
        }

        Ok(Self::build(requirement, status, severity, actual, expected, guidance))
    }

    fn build(
        requirement: RequirementName,
        status: ValidationStatus,
        severity: Severity,
        actual: CheckValue,
        expected: CheckValue,
        guidance: UserGuidance,
    ) -> Self {
        ValidationResult {
            id: Uuid::new_v4(),
            requirement,
            status,
            severity,
            actual,
            expected,
            guidance,
            detected_at: Utc::now(),
        }
    }

    /// A passing result. Passing checks need no guidance.
    pub fn pass(requirement: RequirementName, actual: CheckValue, expected: CheckValue) -> Self {
        Self::build(
            requirement,
            ValidationStatus::Pass,
            Severity::Low,
            actual,
            expected,
            UserGuidance::default(),
        )
    }

    /// A failing result. Callers supply a non-empty guidance message, and
    /// at least one step when `severity` blocks installation. Code outside
    /// the crate goes through [`ValidationResult::new`].
    pub(crate) fn fail(
        requirement: RequirementName,
        severity: Severity,
        actual: CheckValue,
        expected: CheckValue,
        guidance: UserGuidance,
    ) -> Self {
        debug_assert!(!guidance.is_empty(), "failing result without guidance");
        debug_assert!(
            !severity.is_blocking_level() || !guidance.steps().is_empty(),
            "blocking result without steps"
        );
        Self::build(requirement, ValidationStatus::Fail, severity, actual, expected, guidance)
    }

    /// A warning result. Callers supply a non-empty guidance message.
    pub(crate) fn warning(
        requirement: RequirementName,
        severity: Severity,
        actual: CheckValue,
        expected: CheckValue,
        guidance: UserGuidance,
    ) -> Self {
        debug_assert!(!guidance.is_empty(), "warning result without guidance");
        Self::build(requirement, ValidationStatus::Warning, severity, actual, expected, guidance)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn requirement(&self) -> RequirementName {
        self.requirement
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn actual(&self) -> &CheckValue {
        &self.actual
    }

    pub fn expected(&self) -> &CheckValue {
        &self.expected
    }

    pub fn guidance(&self) -> &UserGuidance {
        &self.guidance
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Failed with Critical or High severity.
    pub fn is_blocking(&self) -> bool {
        self.status == ValidationStatus::Fail && self.severity.is_blocking_level()
    }

    /// A warning, or a failure with Medium or Low severity.
    pub fn is_warning(&self) -> bool {
        match self.status {
            ValidationStatus::Warning => true,
            ValidationStatus::Fail => !self.severity.is_blocking_level(),
            ValidationStatus::Pass => false,
        }
    }

    pub fn is_passing(&self) -> bool {
        self.status == ValidationStatus::Pass
    }

    /// One-line summary, e.g. `✗ disk_space: Insufficient disk space`.
    pub fn format_message(&self) -> String {
        match self.status {
            ValidationStatus::Pass => format!("✓ {}: Valid", self.requirement),
            ValidationStatus::Fail => format!("✗ {}: {}", self.requirement, self.guidance.message),
            ValidationStatus::Warning => format!("⚠ {}: {}", self.requirement, self.guidance.message),
        }
    }
}
