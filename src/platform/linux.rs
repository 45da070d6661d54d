//! Linux system interface.
//!
//! Provides OS release, GPU and disk information via `/etc`, `lspci` and `df`.
//!
//! # Graceful Degradation
//!
//! This module handles errors gracefully:
//! - File not found: Returns DetectError::Io with the path as context
//! - Command not installed or failing: Returns DetectError::CommandFailed
//! - Unparseable output: Returns DetectError::Parse with details
//! - Non-Debian host: Returns DetectError::Unsupported
//!
//! Child processes are killed when the calling future is dropped, so a
//! cancelled run never leaves `lspci` or `df` behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    cancellable, DetectError, DetectResult, DiskSpace, DiskSpaceDetector, GpuDetector, GpuInfo,
    OsDetector, OsVersion,
};

const OS_RELEASE_PATH: &str = "/etc/os-release";
const DEBIAN_VERSION_PATH: &str = "/etc/debian_version";

/// Run a command and return its stdout.
async fn command_output(program: &str, args: &[&str]) -> DetectResult<String> {
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| DetectError::CommandFailed {
            command: program.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(DetectError::CommandFailed {
            command: program.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Reads `/etc/os-release`, falling back to `/etc/debian_version`.
#[derive(Debug, Clone)]
pub struct OsReleaseDetector {
    os_release: PathBuf,
    debian_version: PathBuf,
}

impl Default for OsReleaseDetector {
    fn default() -> Self {
        OsReleaseDetector {
            os_release: PathBuf::from(OS_RELEASE_PATH),
            debian_version: PathBuf::from(DEBIAN_VERSION_PATH),
        }
    }
}

impl OsReleaseDetector {
    /// Read from alternate locations (used by tests and chroot installs).
    pub fn with_paths(os_release: impl Into<PathBuf>, debian_version: impl Into<PathBuf>) -> Self {
        OsReleaseDetector {
            os_release: os_release.into(),
            debian_version: debian_version.into(),
        }
    }

    async fn read(&self) -> DetectResult<OsVersion> {
        let os_release = tokio::fs::read_to_string(&self.os_release)
            .await
            .map_err(|e| DetectError::io(self.os_release.display().to_string(), &e))?;
        // Missing debian_version is fine; os-release alone is enough.
        let debian_version = tokio::fs::read_to_string(&self.debian_version).await.ok();

        parse_os_release(&os_release, debian_version.as_deref())
    }
}

#[async_trait]
impl OsDetector for OsReleaseDetector {
    async fn detect_version(&self, ctx: &CancellationToken) -> DetectResult<OsVersion> {
        let version = cancellable(ctx, self.read()).await?;
        debug!(codename = %version.codename, version = %version.version, "Detected OS release");
        Ok(version)
    }
}

/// Parse os-release contents into a codename and version.
///
/// Unstable systems report the next testing codename in os-release; the
/// `trixie/sid` style content of `/etc/debian_version` is used to recognise
/// them as `sid`.
pub fn parse_os_release(content: &str, debian_version: Option<&str>) -> DetectResult<OsVersion> {
    let mut id = String::new();
    let mut id_like = String::new();
    let mut codename = String::new();
    let mut version_id = String::new();
    let mut pretty_name = String::new();

    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
        match key {
            "ID" => id = value.to_lowercase(),
            "ID_LIKE" => id_like = value.to_lowercase(),
            "VERSION_CODENAME" => codename = value.to_lowercase(),
            "VERSION_ID" => version_id = value,
            "PRETTY_NAME" => pretty_name = value,
            _ => {}
        }
    }

    if id.is_empty() {
        return Err(DetectError::parse("os-release", "no ID field"));
    }
    if id != "debian" && !id_like.split_whitespace().any(|l| l == "debian") {
        return Err(DetectError::Unsupported(format!(
            "{} is not a Debian system",
            if pretty_name.is_empty() { &id } else { &pretty_name }
        )));
    }

    let debian_version = debian_version.map(str::trim).unwrap_or_default();
    if debian_version.ends_with("/sid") || pretty_name.ends_with("/sid") {
        return Ok(OsVersion {
            codename: "sid".to_string(),
            version: String::new(),
        });
    }

    if codename.is_empty() {
        // Older images omit VERSION_CODENAME but keep it in PRETTY_NAME.
        codename = pretty_name
            .rsplit_once('(')
            .and_then(|(_, rest)| rest.strip_suffix(')'))
            .map(str::to_lowercase)
            .unwrap_or_default();
    }
    if codename.is_empty() {
        return Err(DetectError::parse("os-release", "no release codename"));
    }

    if version_id.is_empty() && !debian_version.is_empty() {
        version_id = debian_version.to_string();
    }

    Ok(OsVersion {
        codename,
        version: version_id,
    })
}

/// Enumerates display adapters with `lspci -mm -nn`.
#[derive(Debug, Clone)]
pub struct LspciGpuDetector {
    program: String,
}

impl Default for LspciGpuDetector {
    fn default() -> Self {
        LspciGpuDetector {
            program: "lspci".to_string(),
        }
    }
}

#[async_trait]
impl GpuDetector for LspciGpuDetector {
    async fn detect_gpus(&self, ctx: &CancellationToken) -> DetectResult<Vec<GpuInfo>> {
        let output = cancellable(ctx, command_output(&self.program, &["-mm", "-nn"])).await?;
        let gpus = parse_lspci(&output);
        debug!(count = gpus.len(), "Enumerated display adapters");

        if gpus.is_empty() {
            return Err(DetectError::NotFound("no GPU detected".to_string()));
        }
        Ok(gpus)
    }
}

/// Split an lspci machine-readable line into its quoted fields.
fn quoted_fields(line: &str) -> Vec<&str> {
    line.split('"')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, field)| field)
        .collect()
}

/// Split `NVIDIA Corporation [10de]` into the name and the bracketed id.
fn split_pci_name(field: &str) -> (String, String) {
    match field.rsplit_once(" [") {
        Some((name, id)) if id.ends_with(']') => {
            (name.trim().to_string(), id.trim_end_matches(']').to_string())
        }
        _ => (field.trim().to_string(), String::new()),
    }
}

/// Parse `lspci -mm -nn` output, keeping VGA, 3D and display controllers.
pub fn parse_lspci(output: &str) -> Vec<GpuInfo> {
    output
        .lines()
        .filter_map(|line| {
            let fields = quoted_fields(line);
            if fields.len() < 3 {
                return None;
            }

            let class = fields[0];
            let is_display = class.starts_with("VGA compatible controller")
                || class.starts_with("3D controller")
                || class.starts_with("Display controller");
            if !is_display {
                return None;
            }

            let (vendor, vendor_id) = split_pci_name(fields[1]);
            let (model, device_id) = split_pci_name(fields[2]);
            let pci_id = if vendor_id.is_empty() || device_id.is_empty() {
                String::new()
            } else {
                format!("{}:{}", vendor_id, device_id)
            };

            Some(GpuInfo {
                vendor,
                model,
                pci_id,
            })
        })
        .collect()
}

/// Measures free space with `df -P -B1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DfDiskSpaceDetector;

#[async_trait]
impl DiskSpaceDetector for DfDiskSpaceDetector {
    async fn detect_available_space(
        &self,
        ctx: &CancellationToken,
        path: &Path,
    ) -> DetectResult<DiskSpace> {
        let path_arg = path.to_string_lossy();
        let output = cancellable(ctx, command_output("df", &["-P", "-B1", &path_arg])).await?;
        let space = parse_df(&output, path)?;
        debug!(
            path = %path.display(),
            available = space.available_bytes,
            total = space.total_bytes,
            "Measured disk space"
        );
        Ok(space)
    }
}

/// Parse POSIX `df -B1` output for a single path.
pub fn parse_df(output: &str, path: &Path) -> DetectResult<DiskSpace> {
    // Filesystem 1-blocks Used Available Capacity Mounted-on
    let line = output
        .lines()
        .skip(1)
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| DetectError::parse("df", "no filesystem line in output"))?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(DetectError::parse("df", format!("unexpected line: {}", line)));
    }

    let total_bytes = parts[1]
        .parse::<u64>()
        .map_err(|e| DetectError::parse("df", format!("total size: {}", e)))?;
    let available_bytes = parts[3]
        .parse::<u64>()
        .map_err(|e| DetectError::parse("df", format!("available size: {}", e)))?;

    Ok(DiskSpace {
        available_bytes,
        total_bytes,
        path: path.to_path_buf(),
    })
}
