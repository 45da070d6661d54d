//! Command line arguments for debian-preflight.

use std::ffi::OsStr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::CONFIG_ENV;
use crate::PreflightConfig;

/// Command to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Subcommand)]
pub enum Command {
    /// Run validation checks (default)
    #[default]
    Check,
    /// List all available checks
    List,
    /// Print version information
    Version,
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Validate that this machine can take the Debian desktop installation.
#[derive(Debug, Clone, Parser)]
#[command(name = "debian-preflight")]
#[command(version = crate::version::VERSION)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Only show failures and warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show detailed diagnostics and debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable colored output (also disabled when NO_COLOR is set)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Deadline for the whole run in milliseconds
    #[arg(long = "timeout", value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Path where the desktop will be installed
    #[arg(long, value_name = "PATH", global = true)]
    pub install_path: Option<PathBuf>,

    /// Configuration file
    #[arg(long, value_name = "FILE", env = CONFIG_ENV, global = true)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Subcommand to run, `check` when none was given.
    pub fn subcommand(&self) -> Command {
        self.command.unwrap_or_default()
    }

    /// Overlay flags onto a loaded configuration.
    pub fn apply_to(&self, config: &mut PreflightConfig) {
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(path) = &self.install_path {
            config.install_path = path.clone();
        }
    }

    /// Whether terminal output should carry ANSI colors.
    pub fn use_color(&self) -> bool {
        !self.no_color
            && !no_color_requested(std::env::var_os(NO_COLOR_ENV).as_deref())
            && self.format == OutputFormat::Text
    }

    /// Filter directive used when `RUST_LOG` does not override it.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            VERBOSE_LOG_DIRECTIVE
        } else {
            DEFAULT_LOG_DIRECTIVE
        }
    }
}

pub const NO_COLOR_ENV: &str = "NO_COLOR";

pub const DEFAULT_LOG_DIRECTIVE: &str = "warn";

/// Debug output for this crate only; dependencies stay at `warn`.
pub const VERBOSE_LOG_DIRECTIVE: &str = "warn,debian_preflight=debug";

/// Any non-empty NO_COLOR value disables color, including "0" and "false".
pub fn no_color_requested(value: Option<&OsStr>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}
