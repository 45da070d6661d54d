//! Mirror reachability check.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::orchestrator::Validator;
use crate::engine::result::{CheckValue, RequirementName, Severity, UserGuidance, ValidationResult};
use crate::platform::{ConnectivityChecker, ConnectivityReport};

pub const NAME: &str = "Internet Connectivity";

const NETWORK_DOC: &str = "https://wiki.debian.org/NetworkConfiguration";

pub struct ConnectivityValidator {
    checker: Arc<dyn ConnectivityChecker>,
}

impl ConnectivityValidator {
    pub fn new(checker: Arc<dyn ConnectivityChecker>) -> Self {
        ConnectivityValidator { checker }
    }

    fn steps() -> [&'static str; 3] {
        [
            "Check the network cable or Wi-Fi connection",
            "Verify DNS resolution: getent hosts deb.debian.org",
            "Configure the APT proxy if this network requires one",
        ]
    }

    fn failure_reason(report: &ConnectivityReport) -> String {
        let failures: Vec<String> = report
            .endpoints
            .iter()
            .filter(|e| !e.success)
            .map(|e| format!("{} ({})", e.endpoint, e.error_message))
            .collect();
        format!("Unreachable: {}", failures.join(", "))
    }
}

#[async_trait]
impl Validator for ConnectivityValidator {
    fn name(&self) -> &str {
        NAME
    }

    fn requirement(&self) -> RequirementName {
        RequirementName::InternetConnectivity
    }

    async fn validate(&self, ctx: &CancellationToken) -> ValidationResult {
        let expected = CheckValue::text("at least one reachable mirror");

        match self.checker.check_internet_connectivity(ctx).await {
            Ok(report) if report.connected => ValidationResult::pass(
                RequirementName::InternetConnectivity,
                CheckValue::Connectivity(report),
                expected,
            ),
            Ok(report) => {
                let reason = Self::failure_reason(&report);
                ValidationResult::fail(
                    RequirementName::InternetConnectivity,
                    Severity::High,
                    CheckValue::Connectivity(report),
                    expected,
                    UserGuidance::new("No Debian mirror is reachable")
                        .with_reason(reason)
                        .with_steps(Self::steps())
                        .with_doc_url(NETWORK_DOC),
                )
            }
            Err(err) => ValidationResult::fail(
                RequirementName::InternetConnectivity,
                Severity::High,
                CheckValue::text(err.to_string()),
                expected,
                UserGuidance::new("Could not check internet connectivity")
                    .with_reason(err.to_string())
                    .with_steps(Self::steps())
                    .with_doc_url(NETWORK_DOC),
            ),
        }
    }
}
