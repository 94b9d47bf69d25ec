// crates/strongbox-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and lease reporting.
// Purpose: Ensure CLI helpers fail closed and report capped leases exactly.
// Dependencies: strongbox-cli main helpers
// ============================================================================

//! ## Overview
//! Covers `kv put` input resolution, bounded file reads, and the
//! `lease extend` report for capped and uncapped renewals.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use clap::Parser;
use strongbox_core::LeaseExtender;
use tempfile::TempDir;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::Cli;
use super::Commands;
use super::KvCommand;
use super::LeaseCommand;
use super::LeaseExtendCommand;
use super::LeaseKindArg;
use super::ReadLimitError;
use super::extend_lease;
use super::read_bytes_with_limit;
use super::resolve_put_value;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn at(value: &str) -> OffsetDateTime {
    OffsetDateTime::parse(value, &Rfc3339).expect("timestamp")
}

fn extend_command(lease_secs: i64, increment_secs: i64, issued_at: &str) -> LeaseExtendCommand {
    LeaseExtendCommand {
        kind: LeaseKindArg::Secret,
        lease_secs,
        increment_secs,
        issued_at: Some(issued_at.to_string()),
        now: None,
        max_offset_secs: None,
    }
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn put_requires_exactly_one_value_source() {
    assert!(Cli::try_parse_from(["strongbox", "kv", "put", "a/b"]).is_err());
    assert!(
        Cli::try_parse_from(["strongbox", "kv", "put", "a/b", "--value", "x", "--value-file", "f"])
            .is_err()
    );

    let cli = Cli::try_parse_from(["strongbox", "kv", "put", "a/b", "--value", "hello"])
        .expect("parse put");
    let Commands::Kv {
        command: KvCommand::Put(command),
    } = cli.command
    else {
        panic!("unexpected command");
    };
    assert_eq!(resolve_put_value(&command).expect("value"), b"hello");
}

#[test]
fn global_config_flag_is_accepted_after_subcommand() {
    let cli = Cli::try_parse_from(["strongbox", "kv", "list", "sys/", "--config", "custom.toml"])
        .expect("parse list");
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("custom.toml")));
    let Commands::Kv {
        command: KvCommand::List(command),
    } = cli.command
    else {
        panic!("unexpected command");
    };
    assert_eq!(command.prefix, "sys/");
    assert!(!command.json);
}

#[test]
fn lease_extend_defaults_to_secret_kind() {
    let cli = Cli::try_parse_from(["strongbox", "lease", "extend", "--lease-secs", "60"])
        .expect("parse extend");
    let Commands::Lease {
        command: LeaseCommand::Extend(command),
    } = cli.command
    else {
        panic!("unexpected command");
    };
    assert_eq!(command.kind, LeaseKindArg::Secret);
    assert_eq!(command.increment_secs, 0);
}

// ============================================================================
// SECTION: Value Input
// ============================================================================

#[test]
fn value_file_is_read_within_limit() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("value.bin");
    fs::write(&path, [0_u8, 1, 2, 255]).expect("write value");
    assert_eq!(read_bytes_with_limit(&path, 4).expect("read"), vec![0, 1, 2, 255]);
}

#[test]
fn value_file_over_limit_fails_closed() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("value.bin");
    fs::write(&path, [7_u8; 5]).expect("write value");
    let err = read_bytes_with_limit(&path, 4).expect_err("too large");
    assert!(matches!(err, ReadLimitError::TooLarge { size: 5, limit: 4 }));
}

// ============================================================================
// SECTION: Lease Reports
// ============================================================================

#[test]
fn uncapped_renewal_reports_requested_lease() {
    // Issued an hour before now with a one hour lease, so it expires now.
    let extender = LeaseExtender::new(Duration::hours(3));
    let command = extend_command(3600, 7200, "2024-03-01T11:00:00Z");
    let report = extend_lease(&extender, &command, at("2024-03-01T12:00:00Z")).expect("extend");
    assert_eq!(report.requested_secs, 7200);
    assert_eq!(report.lease_secs, 7200);
    assert!(!report.clamped);
    assert_eq!(report.issue_time, "2024-03-01T11:00:00Z");
    assert_eq!(report.expiration_time, "2024-03-01T13:00:00Z");
}

#[test]
fn capped_renewal_is_measured_from_current_expiration() {
    let extender = LeaseExtender::new(Duration::hours(2));
    let command = extend_command(1800, 36_000, "2024-03-01T10:00:00Z");
    let report = extend_lease(&extender, &command, at("2024-03-01T12:00:00Z")).expect("extend");
    assert!(report.clamped);
    // 10:30 expiration plus ten hours, counted from 12:00.
    assert_eq!(report.requested_secs, 30_600);
    // 12:00 + 2h cap minus the 10:30 expiration.
    assert_eq!(report.lease_secs, 12_600);
    assert_eq!(report.expiration_time, "2024-03-01T13:30:00Z");
    assert_eq!(report.kind, "secret");
}

#[test]
fn malformed_timestamp_is_rejected() {
    let extender = LeaseExtender::new(Duration::hours(1));
    let command = extend_command(60, 0, "yesterday");
    let err = extend_lease(&extender, &command, at("2024-03-01T12:00:00Z")).expect_err("bad");
    assert!(err.to_string().contains("--issued-at must be RFC 3339"));
}
