//! APT source configuration.
//!
//! Reads `/etc/apt/sources.list` plus the `*.list` and deb822 `*.sources`
//! files under `/etc/apt/sources.list.d/` and reports whether any enabled
//! `deb-src` entry exists.
//!
//! # Graceful Degradation
//!
//! - Missing sources.list: ignored when sources.list.d has entries
//! - Unreadable individual files: skipped, logged at debug level
//! - No readable configuration at all: Returns DetectError::Io

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{cancellable, DetectError, DetectResult, SourceRepositoryChecker, SourceSummary};

const SOURCES_LIST: &str = "/etc/apt/sources.list";
const SOURCES_DIR: &str = "/etc/apt/sources.list.d";

/// One-line format: collect `deb`/`deb-src` lines, return whether `deb-src` is present.
pub fn parse_sources_list(content: &str, lines: &mut Vec<String>) -> bool {
    let mut has_src = false;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let kind = line.split_whitespace().next().unwrap_or_default();
        match kind {
            "deb" => lines.push(line.to_string()),
            "deb-src" => {
                has_src = true;
                lines.push(line.to_string());
            }
            _ => {}
        }
    }
    has_src
}

/// deb822 format: one stanza per blank-line separated block.
pub fn parse_deb822(content: &str, lines: &mut Vec<String>) -> bool {
    let mut has_src = false;
    for stanza in content.split("\n\n") {
        let mut types = "";
        let mut uris = "";
        let mut suites = "";
        let mut enabled = true;

        for line in stanza.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "types" => types = value,
                "uris" => uris = value,
                "suites" => suites = value,
                "enabled" => enabled = !value.eq_ignore_ascii_case("no"),
                _ => {}
            }
        }

        if types.is_empty() || !enabled {
            continue;
        }
        if types.split_whitespace().any(|t| t == "deb-src") {
            has_src = true;
        }
        lines.push(format!("Types: {} URIs: {} Suites: {}", types, uris, suites));
    }
    has_src
}

/// Scans the APT configuration on disk.
#[derive(Debug, Clone)]
pub struct AptSourcesChecker {
    sources_list: PathBuf,
    sources_dir: PathBuf,
}

impl Default for AptSourcesChecker {
    fn default() -> Self {
        AptSourcesChecker {
            sources_list: PathBuf::from(SOURCES_LIST),
            sources_dir: PathBuf::from(SOURCES_DIR),
        }
    }
}

impl AptSourcesChecker {
    pub fn with_paths(sources_list: impl Into<PathBuf>, sources_dir: impl Into<PathBuf>) -> Self {
        AptSourcesChecker {
            sources_list: sources_list.into(),
            sources_dir: sources_dir.into(),
        }
    }

    async fn dir_entries(dir: &Path) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return paths;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            paths.push(entry.path());
        }
        // read_dir order is unspecified
        paths.sort();
        paths
    }

    async fn scan(&self) -> DetectResult<SourceSummary> {
        let mut lines = Vec::new();
        let mut enabled = false;
        let mut read_any = false;

        match tokio::fs::read_to_string(&self.sources_list).await {
            Ok(content) => {
                read_any = true;
                enabled |= parse_sources_list(&content, &mut lines);
            }
            Err(e) => debug!(path = %self.sources_list.display(), error = %e, "Skipping sources.list"),
        }

        for path in Self::dir_entries(&self.sources_dir).await {
            let deb822 = match path.extension().and_then(|e| e.to_str()) {
                Some("sources") => true,
                Some("list") => false,
                _ => continue,
            };
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping unreadable source file");
                    continue;
                }
            };
            read_any = true;
            enabled |= if deb822 {
                parse_deb822(&content, &mut lines)
            } else {
                parse_sources_list(&content, &mut lines)
            };
        }

        if !read_any {
            return Err(DetectError::Io {
                context: self.sources_list.display().to_string(),
                message: "no APT source configuration found".to_string(),
            });
        }

        Ok(SourceSummary {
            enabled,
            configured_lines: lines,
        })
    }
}

#[async_trait]
impl SourceRepositoryChecker for AptSourcesChecker {
    async fn check_source_repositories(
        &self,
        ctx: &CancellationToken,
    ) -> DetectResult<SourceSummary> {
        let summary = cancellable(ctx, self.scan()).await?;
        debug!(
            enabled = summary.enabled,
            entries = summary.configured_lines.len(),
            "Scanned APT sources"
        );
        Ok(summary)
    }
}
