//! Requirement validators.
//!
//! One validator per requirement, each wrapping a single detector port:
//! - OS version: Debian release codename
//! - GPU: display adapter presence
//! - Disk: free space at the install path
//! - Connectivity: mirror reachability
//! - Sources: `deb-src` configuration
//!
//! # Graceful Degradation
//!
//! Validators never return errors. Detector failures, including
//! cancellation, are classified per requirement:
//!
//! | Requirement | Detector fails | Requirement unmet | Met |
//! |---|---|---|---|
//! | OS version | Fail/Critical | Fail/Critical | Pass |
//! | GPU | Warning/Medium | - | Pass |
//! | Disk space | Fail/High | Fail/High | Pass |
//! | Connectivity | Fail/High | Fail/High | Pass |
//! | Sources | Warning/Low | Warning/Low | Pass |

pub mod connectivity;
pub mod disk;
pub mod gpu;
pub mod os_version;
pub mod sources;

use std::sync::Arc;

use crate::engine::orchestrator::Validator;
use crate::engine::result::RequirementName;
use crate::platform::DetectorPorts;
use crate::PreflightConfig;

/// Description of a check for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInfo {
    pub requirement: RequirementName,
    pub name: &'static str,
    pub description: &'static str,
}

/// Every check in run order.
pub const CHECK_CATALOG: [CheckInfo; 5] = [
    CheckInfo {
        requirement: RequirementName::DebianVersion,
        name: os_version::NAME,
        description: "Debian release is Sid or Trixie",
    },
    CheckInfo {
        requirement: RequirementName::GpuSupport,
        name: gpu::NAME,
        description: "A display adapter is present for the desktop session",
    },
    CheckInfo {
        requirement: RequirementName::DiskSpace,
        name: disk::NAME,
        description: "Enough free space at the install path",
    },
    CheckInfo {
        requirement: RequirementName::InternetConnectivity,
        name: connectivity::NAME,
        description: "Debian mirrors are reachable",
    },
    CheckInfo {
        requirement: RequirementName::SourceRepositories,
        name: sources::NAME,
        description: "deb-src entries are enabled in APT",
    },
];

/// Build the standard validators in run order.
pub fn default_validators(ports: &DetectorPorts, config: &PreflightConfig) -> Vec<Arc<dyn Validator>> {
    vec![
        Arc::new(os_version::OsVersionValidator::new(
            Arc::clone(&ports.os),
            config.supported_codenames.clone(),
        )),
        Arc::new(gpu::GpuValidator::new(Arc::clone(&ports.gpu))),
        Arc::new(disk::DiskSpaceValidator::new(
            Arc::clone(&ports.disk),
            config.install_path.clone(),
            config.min_disk_bytes,
        )),
        Arc::new(connectivity::ConnectivityValidator::new(Arc::clone(
            &ports.connectivity,
        ))),
        Arc::new(sources::SourceRepositoryValidator::new(Arc::clone(&ports.sources))),
    ]
}
