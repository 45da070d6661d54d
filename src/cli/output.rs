//! Output formatting for debian-preflight.
//!
//! Provides terminal and JSON formatters for a finished session, plus the
//! one-line rendering of live progress updates.
//!
//! # Graceful Degradation
//!
//! This module handles errors gracefully:
//! - Non-TTY output: Color disabled via NO_COLOR or --no-color
//! - Empty sessions: Produces valid output with zero checks
//! - Empty guidance fields: Omitted from the rendered block
//!
//! No function in this module will panic.

use crate::checks::CHECK_CATALOG;
use crate::cli::args::OutputFormat;
use crate::engine::result::{ValidationResult, ValidationStatus};
use crate::engine::runner::{ProgressStatus, ProgressUpdate};
use crate::engine::session::{SessionSnapshot, ValidationOutcome};

const RULE: &str =
    "--------------------------------------------------------------------------------";

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a completed session into a string
    fn format(&self, snapshot: &SessionSnapshot) -> String;
}

/// Process exit code for an outcome.
pub fn exit_code(outcome: ValidationOutcome) -> u8 {
    match outcome {
        ValidationOutcome::Success => 0,
        ValidationOutcome::Blocked => 1,
        ValidationOutcome::Warnings | ValidationOutcome::PartialSuccess => 2,
    }
}

fn outcome_description(outcome: ValidationOutcome) -> &'static str {
    match outcome {
        ValidationOutcome::Success => "all checks passed",
        ValidationOutcome::Blocked => "installation blocked",
        ValidationOutcome::Warnings => "warnings detected, installation can proceed",
        ValidationOutcome::PartialSuccess => "some checks inconclusive",
    }
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
    verbose: bool,
    quiet: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool, verbose: bool, quiet: bool) -> Self {
        TerminalFormatter {
            color,
            verbose,
            quiet,
        }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        colorize(self.color, text, color_code)
    }

    fn status_tag(&self, result: &ValidationResult) -> String {
        status_tag(self.color, result.status())
    }

    fn push_result(&self, output: &mut String, result: &ValidationResult) {
        let headline = if result.is_passing() {
            "Valid".to_string()
        } else {
            result.guidance().message().to_string()
        };
        output.push_str(&format!(
            "  {} {}: {}\n",
            self.status_tag(result),
            result.requirement(),
            headline
        ));

        if self.verbose {
            output.push_str(&format!(
                "{}\n",
                self.colorize(
                    &format!(
                        "      actual: {} | expected: {} | severity: {}",
                        result.actual(),
                        result.expected(),
                        result.severity()
                    ),
                    "90"
                )
            ));
        }

        if !result.is_passing() {
            for line in result.guidance().format().lines().skip(1) {
                output.push_str(&format!("      {}\n", line));
            }
        }
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, snapshot: &SessionSnapshot) -> String {
        let mut output = String::new();

        output.push_str(RULE);
        output.push('\n');
        output.push_str("debian-preflight validation report\n");
        output.push_str(&format!("Session: {}\n", snapshot.id));
        output.push_str(&format!("Started: {}\n", snapshot.started_at.to_rfc3339()));
        output.push_str(RULE);
        output.push_str("\n\n");

        let shown: Vec<&ValidationResult> = snapshot
            .results
            .iter()
            .filter(|r| !(self.quiet && r.is_passing()))
            .collect();

        if !shown.is_empty() {
            for result in shown {
                self.push_result(&mut output, result);
            }
            output.push('\n');
        }

        let summary = &snapshot.summary;
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!(
            "SUMMARY: {} passed, {} warnings, {} blocking\n",
            summary.passed, summary.warnings, summary.blocking
        ));
        let outcome = match snapshot.overall_result {
            ValidationOutcome::Success => self.colorize("success", "32"),
            ValidationOutcome::Blocked => self.colorize("blocked", "31"),
            other => self.colorize(other.as_str(), "33"),
        };
        output.push_str(&format!("Outcome: {}\n", outcome));
        output.push_str(&format!(
            "Total time: {:.1}s\n",
            snapshot.duration_ms as f64 / 1000.0
        ));
        output.push_str(&format!(
            "Exit code: {} ({})\n",
            exit_code(snapshot.overall_result),
            outcome_description(snapshot.overall_result)
        ));
        output.push_str(RULE);

        output
    }
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, snapshot: &SessionSnapshot) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(snapshot)
        } else {
            serde_json::to_string(snapshot)
        };
        rendered.unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("failed to serialize session: {e}") }).to_string()
        })
    }
}

/// Get a formatter based on the output format
pub fn get_formatter(
    format: OutputFormat,
    color: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TerminalFormatter::new(color, verbose, quiet)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

/// One line of live progress.
pub fn format_progress(update: &ProgressUpdate, color: bool) -> String {
    let tag = match update.status {
        ProgressStatus::Running => colorize(color, "[....]", "90"),
        ProgressStatus::Resolved(status) => status_tag(color, status),
    };
    match update.status {
        ProgressStatus::Running => format!("  {} {}", tag, update.message),
        ProgressStatus::Resolved(_) => format!("  {} {}", tag, update.validator),
    }
}

/// Listing of every available check.
pub fn format_check_list() -> String {
    let mut output = String::from("Available checks:\n\n");
    for info in CHECK_CATALOG.iter() {
        output.push_str(&format!(
            "  {:<22} {:<22} {}\n",
            info.requirement.as_str(),
            info.name,
            info.description
        ));
    }
    output.trim_end().to_string()
}

fn colorize(enabled: bool, text: &str, color_code: &str) -> String {
    if enabled {
        format!("\x1b[{}m{}\x1b[0m", color_code, text)
    } else {
        text.to_string()
    }
}

fn status_tag(color: bool, status: ValidationStatus) -> String {
    match status {
        ValidationStatus::Pass => colorize(color, "[PASS]", "32"),
        ValidationStatus::Warning => colorize(color, "[WARN]", "33"),
        ValidationStatus::Fail => colorize(color, "[FAIL]", "31"),
    }
}
