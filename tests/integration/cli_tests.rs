//! CLI integration tests.
//!
//! Tests for configuration layering: defaults, then the config file, then
//! command line flags.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tempfile::NamedTempFile;

use debian_preflight::cli::args::Args;
use debian_preflight::PreflightConfig;

fn parse(argv: &[&str]) -> Args {
    let mut full = vec!["debian-preflight"];
    full.extend_from_slice(argv);
    Args::try_parse_from(full).unwrap()
}

#[test]
fn test_flags_override_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "install_path = \"/from-file\"").unwrap();
    writeln!(file, "timeout_ms = 1000").unwrap();
    writeln!(file, "min_disk_bytes = 2048").unwrap();

    let args = parse(&[
        "--config",
        file.path().to_str().unwrap(),
        "--install-path",
        "/from-flag",
    ]);
    let mut config = PreflightConfig::load(args.config.as_deref()).unwrap();
    args.apply_to(&mut config);

    assert_eq!(config.install_path, PathBuf::from("/from-flag"));
    assert_eq!(config.timeout_ms, 1000);
    assert_eq!(config.min_disk_bytes, 2048);
}

#[test]
fn test_invalid_config_file_is_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "min_disk_bytes = \"lots\"").unwrap();

    assert!(PreflightConfig::from_file(file.path()).is_err());
}

#[test]
fn test_defaults_without_config_file() {
    let args = parse(&["--timeout", "500"]);
    let mut config = PreflightConfig::from_toml_str("").unwrap();
    args.apply_to(&mut config);

    let defaults = PreflightConfig::default();
    assert_eq!(config.timeout_ms, 500);
    assert_eq!(config.install_path, defaults.install_path);
    assert_eq!(config.min_disk_bytes, defaults.min_disk_bytes);
}
