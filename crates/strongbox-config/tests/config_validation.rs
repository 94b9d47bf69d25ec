//! Config loading and physical option tests for strongbox-config.
// crates/strongbox-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Validate strongbox.toml loading and storage option mapping.
// Purpose: Ensure aliases, defaults, and overrides resolve deterministically.
// =============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use strongbox_config::ConfigError;
use strongbox_config::DEFAULT_MAX_LEASE_OFFSET_SECS;
use strongbox_config::MAX_CONFIG_FILE_SIZE;
use strongbox_config::PhysicalOptions;
use strongbox_config::StrongboxConfig;
use strongbox_config::config_toml_example;
use strongbox_core::DEFAULT_PARALLEL_OPERATIONS;
use strongbox_store_sqlite::DatabaseTarget;
use tempfile::TempDir;

type TestResult = Result<(), String>;

fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect()
}

fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

fn ensure(condition: bool, message: &str) -> TestResult {
    if condition { Ok(()) } else { Err(message.to_string()) }
}

// ============================================================================
// SECTION: Physical Options
// ============================================================================

#[test]
fn defaults_fill_every_unset_key() -> TestResult {
    let normalized =
        PhysicalOptions::normalize(&options(&[("path", "/data")])).map_err(|err| err.to_string())?;
    for (key, expected) in [
        ("database", "Vault"),
        ("table", "Vault"),
        ("appname", "Vault"),
        ("connection timeout", "30"),
        ("schema", "main"),
        ("log level", "0"),
    ] {
        ensure(normalized.get(key) == Some(expected), &format!("{key} default missing"))?;
    }
    ensure(normalized.max_parallel() == DEFAULT_PARALLEL_OPERATIONS, "max_parallel default")?;

    let table = normalized.table_config().map_err(|err| err.to_string())?;
    ensure(table.target == DatabaseTarget::Directory(PathBuf::from("/data")), "directory target")?;
    ensure(table.busy_timeout == Duration::from_secs(30), "busy timeout")?;
    ensure(!table.log_statements, "statement logging off by default")?;
    Ok(())
}

#[test]
fn explicit_values_survive_defaulting() -> TestResult {
    let normalized = PhysicalOptions::normalize(&options(&[
        ("path", "/data"),
        ("table", "secrets"),
        ("schema", "kv"),
        ("connectiontimeout", "5"),
        ("loglevel", "1"),
        ("max_parallel", "7"),
    ]))
    .map_err(|err| err.to_string())?;
    let table = normalized.table_config().map_err(|err| err.to_string())?;
    ensure(table.table == "secrets", "table kept")?;
    ensure(table.schema == "kv", "schema kept")?;
    ensure(table.database == "Vault", "database defaulted")?;
    ensure(table.busy_timeout == Duration::from_secs(5), "legacy timeout applied")?;
    ensure(table.log_statements, "legacy log level applied")?;
    ensure(table.max_parallel == 7, "max_parallel parsed")?;
    ensure(normalized.get("connectiontimeout").is_none(), "legacy key removed")?;
    Ok(())
}

#[test]
fn legacy_alias_overrides_canonical_spelling() -> TestResult {
    let normalized = PhysicalOptions::normalize(&options(&[
        ("connection timeout", "10"),
        ("connectiontimeout", "20"),
    ]))
    .map_err(|err| err.to_string())?;
    ensure(normalized.get("connection timeout") == Some("20"), "alias value wins")
}

#[test]
fn unparsable_max_parallel_is_rejected() -> TestResult {
    assert_invalid(
        PhysicalOptions::normalize(&options(&[("max_parallel", "lots")])),
        "failed parsing max_parallel parameter",
    )
}

#[test]
fn unparsable_timeout_is_rejected() -> TestResult {
    let normalized = PhysicalOptions::normalize(&options(&[
        ("path", "/data"),
        ("connection timeout", "soon"),
    ]))
    .map_err(|err| err.to_string())?;
    assert_invalid(normalized.table_config(), "failed parsing connection timeout parameter")
}

#[test]
fn connection_url_is_used_verbatim() -> TestResult {
    let url = "file:/srv/vault.db?mode=rwc";
    let normalized = PhysicalOptions::normalize(&options(&[("connection_url", url)]))
        .map_err(|err| err.to_string())?;
    ensure(normalized.connection_string() == url, "connection string is the url")?;
    let table = normalized.table_config().map_err(|err| err.to_string())?;
    ensure(table.target == DatabaseTarget::Url(url.to_string()), "url target")
}

#[test]
fn assembled_string_is_sorted_and_redacted() -> TestResult {
    let normalized = PhysicalOptions::normalize(&options(&[
        ("path", "/data"),
        ("username", "vault"),
        ("password", "s3cret"),
    ]))
    .map_err(|err| err.to_string())?;
    let expected = "appname=Vault;connection timeout=30;database=Vault;log level=0;\
                    password=***;path=/data;schema=main;table=Vault;user id=vault";
    ensure(normalized.redacted_connection_string() == expected, "redacted assembly")?;
    ensure(normalized.connection_string().contains("password=s3cret"), "raw assembly")
}

#[test]
fn path_is_required_without_url() -> TestResult {
    let normalized =
        PhysicalOptions::normalize(&BTreeMap::new()).map_err(|err| err.to_string())?;
    assert_invalid(normalized.table_config(), "storage.options.path is required")
}

// ============================================================================
// SECTION: Config File
// ============================================================================

#[test]
fn example_config_loads() -> TestResult {
    let config = StrongboxConfig::from_bytes(config_toml_example().as_bytes())
        .map_err(|err| err.to_string())?;
    ensure(config.lease.max_offset_secs == DEFAULT_MAX_LEASE_OFFSET_SECS, "lease default")?;
    let table = config.table_config().map_err(|err| err.to_string())?;
    ensure(table.max_parallel == 128, "max_parallel from example")
}

#[test]
fn load_reads_explicit_path() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("strongbox.toml");
    fs::write(&path, "[storage.options]\npath = \"/data\"\n\n[lease]\nmax_offset_secs = 60\n")
        .map_err(|err| err.to_string())?;
    let config = StrongboxConfig::load(Some(path.as_path())).map_err(|err| err.to_string())?;
    let extender = config.lease_extender().map_err(|err| err.to_string())?;
    ensure(extender.max_offset() == time::Duration::seconds(60), "lease offset")
}

#[test]
fn missing_file_is_io_error() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let result = StrongboxConfig::load(Some(dir.path().join("absent.toml").as_path()));
    ensure(matches!(result, Err(ConfigError::Io(_))), "io error expected")
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let mut bytes = b"# padding\n".repeat(MAX_CONFIG_FILE_SIZE / 10 + 1);
    bytes.extend_from_slice(b"[storage.options]\npath = \"/data\"\n");
    assert_invalid(StrongboxConfig::from_bytes(&bytes), "exceeds size limit")
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    assert_invalid(StrongboxConfig::from_bytes(&[0xff, 0xfe, 0x00]), "must be utf-8")
}

#[test]
fn unknown_fields_and_backends_fail_to_parse() -> TestResult {
    let unknown_field = StrongboxConfig::from_bytes(b"[storage]\nflavour = \"x\"\n");
    ensure(matches!(unknown_field, Err(ConfigError::Parse(_))), "unknown field")?;
    let unknown_backend = StrongboxConfig::from_bytes(b"[storage]\nbackend = \"mssql\"\n");
    ensure(matches!(unknown_backend, Err(ConfigError::Parse(_))), "unknown backend")
}

#[test]
fn invalid_table_name_fails_validation() -> TestResult {
    let toml = b"[storage.options]\npath = \"/data\"\ntable = \"vault; DROP TABLE x\"\n";
    assert_invalid(StrongboxConfig::from_bytes(toml), "invalid table name")
}

#[test]
fn zero_lease_offset_fails_validation() -> TestResult {
    let toml = b"[storage.options]\npath = \"/data\"\n\n[lease]\nmax_offset_secs = 0\n";
    assert_invalid(StrongboxConfig::from_bytes(toml), "max_offset_secs must be greater than zero")
}
