//! `deb-src` repository check.
//!
//! Source repositories are needed to rebuild desktop packages locally. Their
//! absence is worth a warning, never a blocker.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::orchestrator::Validator;
use crate::engine::result::{CheckValue, RequirementName, Severity, UserGuidance, ValidationResult};
use crate::platform::SourceRepositoryChecker;

pub const NAME: &str = "Source Repositories";

const SOURCES_DOC: &str = "https://wiki.debian.org/SourcesList";

pub struct SourceRepositoryValidator {
    checker: Arc<dyn SourceRepositoryChecker>,
}

impl SourceRepositoryValidator {
    pub fn new(checker: Arc<dyn SourceRepositoryChecker>) -> Self {
        SourceRepositoryValidator { checker }
    }

    fn steps() -> [&'static str; 2] {
        [
            "Add a matching deb-src line for each deb line in /etc/apt/sources.list, or add deb-src to Types: in /etc/apt/sources.list.d/debian.sources",
            "Run: sudo apt update",
        ]
    }
}

#[async_trait]
impl Validator for SourceRepositoryValidator {
    fn name(&self) -> &str {
        NAME
    }

    fn requirement(&self) -> RequirementName {
        RequirementName::SourceRepositories
    }

    async fn validate(&self, ctx: &CancellationToken) -> ValidationResult {
        let expected = CheckValue::text("deb-src enabled");

        match self.checker.check_source_repositories(ctx).await {
            Ok(summary) if summary.enabled => ValidationResult::pass(
                RequirementName::SourceRepositories,
                CheckValue::Sources(summary),
                expected,
            ),
            Ok(summary) => ValidationResult::warning(
                RequirementName::SourceRepositories,
                Severity::Low,
                CheckValue::Sources(summary),
                expected,
                UserGuidance::new("Source repositories (deb-src) are not enabled")
                    .with_reason("Some desktop components are rebuilt from source during installation")
                    .with_steps(Self::steps())
                    .with_doc_url(SOURCES_DOC),
            ),
            Err(err) => ValidationResult::warning(
                RequirementName::SourceRepositories,
                Severity::Low,
                CheckValue::text(err.to_string()),
                expected,
                UserGuidance::new("Could not read the APT source configuration")
                    .with_reason(err.to_string())
                    .with_steps(Self::steps())
                    .with_doc_url(SOURCES_DOC),
            ),
        }
    }
}
