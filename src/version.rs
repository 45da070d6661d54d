//! Version and build information.

use std::fmt;

use serde::Serialize;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build information
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: Option<&'static str>,
    pub build_date: Option<&'static str>,
    pub target: &'static str,
    pub rustc_version: Option<&'static str>,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "debian-preflight {}", self.version)?;

        if let Some(commit) = self.commit {
            write!(f, "\nCommit: {}", commit)?;
        }
        if let Some(date) = self.build_date {
            write!(f, "\nBuilt: {}", date)?;
        }
        write!(f, "\nTarget: {}", self.target)?;
        if let Some(rustc) = self.rustc_version {
            write!(f, "\nRustc: {}", rustc)?;
        }

        Ok(())
    }
}

/// Get build information
pub fn get_build_info() -> BuildInfo {
    BuildInfo {
        version: VERSION,
        commit: option_env!("DEBIAN_PREFLIGHT_GIT_HASH"),
        build_date: option_env!("DEBIAN_PREFLIGHT_BUILD_DATE"),
        target: option_env!("DEBIAN_PREFLIGHT_TARGET").unwrap_or(std::env::consts::ARCH),
        rustc_version: option_env!("DEBIAN_PREFLIGHT_RUSTC_VERSION"),
    }
}
