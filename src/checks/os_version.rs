//! Debian release check.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::orchestrator::Validator;
use crate::engine::result::{CheckValue, RequirementName, Severity, UserGuidance, ValidationResult};
use crate::platform::{DetectError, OsDetector, OsVersion};

pub const NAME: &str = "Debian Version";

const UPGRADE_DOC: &str = "https://wiki.debian.org/DebianUpgrade";

/// Requires one of the supported release codenames.
pub struct OsVersionValidator {
    detector: Arc<dyn OsDetector>,
    supported: Vec<String>,
}

impl OsVersionValidator {
    pub fn new(detector: Arc<dyn OsDetector>, supported: Vec<String>) -> Self {
        OsVersionValidator {
            detector,
            supported: supported.into_iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    fn expected(&self) -> CheckValue {
        CheckValue::text(self.supported.join(" or "))
    }

    fn is_supported(&self, version: &OsVersion) -> bool {
        let codename = version.codename.to_lowercase();
        let major = version.version.split('.').next().unwrap_or_default();
        self.supported.iter().any(|c| {
            *c == codename
                || (c == "sid" && codename == "unstable")
                || (c == "trixie" && (codename == "testing" || major == "13"))
        })
    }

    fn detection_failed(&self, err: &DetectError) -> ValidationResult {
        ValidationResult::fail(
            RequirementName::DebianVersion,
            Severity::Critical,
            CheckValue::text(err.to_string()),
            self.expected(),
            UserGuidance::new("Could not determine the installed Debian release")
                .with_reason(err.to_string())
                .with_steps([
                    "Confirm this machine runs Debian: cat /etc/os-release",
                    "Upgrade to Debian Sid or Trixie before installing the desktop",
                ])
                .with_doc_url(UPGRADE_DOC),
        )
    }

    fn unsupported(&self, version: OsVersion) -> ValidationResult {
        let guidance = UserGuidance::new(format!(
            "Debian {} is not supported. Upgrade to Debian Sid or Trixie",
            version.codename
        ))
        .with_reason(format!(
            "The desktop packages are only built for {}",
            self.supported.join(" and ")
        ))
        .with_steps([
            "Point /etc/apt/sources.list at trixie (or sid)",
            "Run: sudo apt update && sudo apt full-upgrade",
            "Reboot and re-run the preflight",
        ])
        .with_doc_url(UPGRADE_DOC);

        ValidationResult::fail(
            RequirementName::DebianVersion,
            Severity::Critical,
            CheckValue::Version(version),
            self.expected(),
            guidance,
        )
    }
}

#[async_trait]
impl Validator for OsVersionValidator {
    fn name(&self) -> &str {
        NAME
    }

    fn requirement(&self) -> RequirementName {
        RequirementName::DebianVersion
    }

    async fn validate(&self, ctx: &CancellationToken) -> ValidationResult {
        match self.detector.detect_version(ctx).await {
            Ok(version) if self.is_supported(&version) => ValidationResult::pass(
                RequirementName::DebianVersion,
                CheckValue::Version(version),
                self.expected(),
            ),
            Ok(version) => self.unsupported(version),
            Err(err) => self.detection_failed(&err),
        }
    }
}
