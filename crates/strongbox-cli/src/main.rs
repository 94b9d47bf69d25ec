// crates/strongbox-cli/src/main.rs
// ============================================================================
// Module: Strongbox CLI Entry Point
// Description: Command dispatcher for storage, lease, and config workflows.
// Purpose: Operate a configured physical backend from the command line.
// Dependencies: clap, strongbox-config, strongbox-core, strongbox-store-sqlite,
//               serde_json, tokio, tracing-subscriber.
// ============================================================================

//! ## Overview
//! The Strongbox CLI loads `strongbox.toml`, bootstraps the configured
//! physical backend, and runs one key/value operation per invocation. Lease
//! capping and config validation run without touching storage.
//! Diagnostics go to stderr through `tracing`, filtered by `STRONGBOX_LOG`.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::ArgGroup;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use strongbox_config::StrongboxConfig;
use strongbox_config::config_toml_example;
use strongbox_core::Auth;
use strongbox_core::Entry;
use strongbox_core::LeaseExtender;
use strongbox_core::LeaseOptions;
use strongbox_core::PhysicalBackend;
use strongbox_core::Request;
use strongbox_core::Secret;
use strongbox_store_sqlite::SqliteTableBackend;
use thiserror::Error;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "STRONGBOX_LOG";
/// Tracing filter used when `STRONGBOX_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "warn";
/// Maximum size of a `--value-file` input.
const MAX_VALUE_FILE_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "strongbox", version, disable_help_subcommand = true)]
struct Cli {
    /// Optional config file path (defaults to strongbox.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Key/value operations against the configured backend.
    Kv {
        /// Selected key/value subcommand.
        #[command(subcommand)]
        command: KvCommand,
    },
    /// Lease capping utilities.
    Lease {
        /// Selected lease subcommand.
        #[command(subcommand)]
        command: LeaseCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Key/value subcommands.
#[derive(Subcommand, Debug)]
enum KvCommand {
    /// Store a value under a key, replacing any previous value.
    Put(KvPutCommand),
    /// Print the value stored under a key.
    Get(KvGetCommand),
    /// Delete a key; deleting an absent key succeeds.
    Delete(KvDeleteCommand),
    /// List the immediate children of a prefix.
    List(KvListCommand),
}

/// Arguments for `kv put`.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["value", "value_file"])))]
struct KvPutCommand {
    /// Entry key.
    key: String,
    /// Inline UTF-8 value.
    #[arg(long)]
    value: Option<String>,
    /// File whose bytes become the value.
    #[arg(long, value_name = "PATH")]
    value_file: Option<PathBuf>,
}

/// Arguments for `kv get`.
#[derive(Args, Debug)]
struct KvGetCommand {
    /// Entry key.
    key: String,
    /// Print a JSON object with a base64 value instead of raw bytes.
    #[arg(long)]
    json: bool,
}

/// Arguments for `kv delete`.
#[derive(Args, Debug)]
struct KvDeleteCommand {
    /// Entry key.
    key: String,
}

/// Arguments for `kv list`.
#[derive(Args, Debug)]
struct KvListCommand {
    /// Prefix to list under; empty lists the root.
    #[arg(default_value = "")]
    prefix: String,
    /// Print a JSON array instead of one child per line.
    #[arg(long)]
    json: bool,
}

/// Lease subcommands.
#[derive(Subcommand, Debug)]
enum LeaseCommand {
    /// Compute the admitted lease for a renewal request.
    Extend(LeaseExtendCommand),
}

/// Lease context kinds.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LeaseKindArg {
    /// Token renewal.
    Auth,
    /// Secret renewal.
    Secret,
}

impl LeaseKindArg {
    /// Returns the stable label.
    const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Secret => "secret",
        }
    }
}

/// Arguments for `lease extend`.
#[derive(Args, Debug)]
struct LeaseExtendCommand {
    /// Context kind carrying the lease.
    #[arg(long, value_enum, default_value_t = LeaseKindArg::Secret)]
    kind: LeaseKindArg,
    /// Current lease length in seconds.
    #[arg(long)]
    lease_secs: i64,
    /// Requested increment in seconds.
    #[arg(long, default_value_t = 0)]
    increment_secs: i64,
    /// Issue time (RFC 3339); defaults to now.
    #[arg(long, value_name = "RFC3339")]
    issued_at: Option<String>,
    /// Evaluation instant (RFC 3339); defaults to now.
    #[arg(long, value_name = "RFC3339")]
    now: Option<String>,
    /// Maximum offset in seconds; overrides the config file.
    #[arg(long)]
    max_offset_secs: Option<u64>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the config file and print the resolved connection string.
    Validate,
    /// Print a canonical example config file.
    Example,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// JSON form of `kv get --json`.
#[derive(Debug, Serialize)]
struct EntryOutput {
    /// Entry key.
    key: String,
    /// Base64-encoded value.
    value_base64: String,
}

/// JSON form of `lease extend`.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct LeaseReport {
    /// Context kind.
    kind: &'static str,
    /// Lease that would end the increment past the current expiration, in
    /// seconds from now.
    requested_secs: i64,
    /// Admitted lease, in seconds.
    lease_secs: i64,
    /// Whether the request was capped.
    clamped: bool,
    /// Issue time (RFC 3339).
    issue_time: String,
    /// Expiration under the admitted lease (RFC 3339).
    expiration_time: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors from bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Installs the stderr tracing subscriber.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

/// Executes the CLI command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Kv {
            command,
        } => command_kv(command, config_path).await,
        Commands::Lease {
            command,
        } => command_lease(&command, config_path),
        Commands::Config {
            command,
        } => command_config(&command, config_path),
    }
}

// ============================================================================
// SECTION: Key/Value Commands
// ============================================================================

/// Dispatches key/value subcommands.
async fn command_kv(command: KvCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let backend = open_backend(config_path).await?;
    match command {
        KvCommand::Put(command) => {
            let value = resolve_put_value(&command)?;
            backend
                .put(Entry::new(command.key, value))
                .await
                .map_err(|err| CliError::new(err.to_string()))?;
            Ok(ExitCode::SUCCESS)
        }
        KvCommand::Get(command) => {
            let entry =
                backend.get(&command.key).await.map_err(|err| CliError::new(err.to_string()))?;
            let Some(entry) = entry else {
                return Err(CliError::new(format!("key not found: {}", command.key)));
            };
            if command.json {
                write_json_line(&EntryOutput {
                    key: entry.key,
                    value_base64: BASE64.encode(&entry.value),
                })?;
            } else {
                write_stdout_bytes(&entry.value)
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        KvCommand::Delete(command) => {
            backend.delete(&command.key).await.map_err(|err| CliError::new(err.to_string()))?;
            Ok(ExitCode::SUCCESS)
        }
        KvCommand::List(command) => {
            let children =
                backend.list(&command.prefix).await.map_err(|err| CliError::new(err.to_string()))?;
            if command.json {
                write_json_line(&children)?;
            } else {
                for child in &children {
                    write_stdout_line(child)
                        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads config and bootstraps the table backend on a blocking thread.
async fn open_backend(config_path: Option<&Path>) -> CliResult<SqliteTableBackend> {
    let config = load_config(config_path)?;
    let table = config.table_config().map_err(|err| CliError::new(err.to_string()))?;
    let backend = tokio::task::spawn_blocking(move || SqliteTableBackend::new(table))
        .await
        .map_err(|err| CliError::new(format!("backend init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("backend init failed: {err}")))?;
    tracing::debug!(connections = backend.connection_count(), "storage backend ready");
    Ok(backend)
}

/// Returns the bytes to store for `kv put`.
fn resolve_put_value(command: &KvPutCommand) -> CliResult<Vec<u8>> {
    if let Some(value) = &command.value {
        return Ok(value.as_bytes().to_vec());
    }
    let Some(path) = &command.value_file else {
        return Err(CliError::new("either --value or --value-file is required".to_string()));
    };
    read_bytes_with_limit(path, MAX_VALUE_FILE_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{} is {size} bytes, which exceeds the {limit} byte limit",
            path.display()
        )),
    })
}

// ============================================================================
// SECTION: Lease Commands
// ============================================================================

/// Dispatches lease subcommands.
fn command_lease(command: &LeaseCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    match command {
        LeaseCommand::Extend(command) => {
            let extender = match command.max_offset_secs {
                Some(secs) => {
                    let secs = i64::try_from(secs)
                        .map_err(|_| CliError::new("--max-offset-secs is too large".to_string()))?;
                    LeaseExtender::new(Duration::seconds(secs))
                }
                None => load_config(config_path)?
                    .lease_extender()
                    .map_err(|err| CliError::new(err.to_string()))?,
            };
            let now = match &command.now {
                Some(value) => parse_timestamp("--now", value)?,
                None => OffsetDateTime::now_utc(),
            };
            let report = extend_lease(&extender, command, now)?;
            write_json_line(&report)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Builds the renewal request and runs the extender at `now`.
fn extend_lease(
    extender: &LeaseExtender,
    command: &LeaseExtendCommand,
    now: OffsetDateTime,
) -> CliResult<LeaseReport> {
    let issue_time = match &command.issued_at {
        Some(value) => parse_timestamp("--issued-at", value)?,
        None => now,
    };
    let options = LeaseOptions::new(Duration::seconds(command.lease_secs), issue_time)
        .with_increment(Duration::seconds(command.increment_secs));
    let requested = options
        .incremented_lease(options.lease_increment, now)
        .ok_or_else(|| CliError::new("requested lease is out of range".to_string()))?;
    let mut request = match command.kind {
        LeaseKindArg::Auth => Request::renew_auth("auth/token/renew", Auth {
            client_token: String::new(),
            policies: Vec::new(),
            metadata: BTreeMap::new(),
            lease_options: options,
        }),
        LeaseKindArg::Secret => Request::renew_secret("sys/leases/renew", Secret {
            lease_id: String::new(),
            internal_data: BTreeMap::new(),
            lease_options: options,
        }),
    };
    let response =
        extender.extend_at(&mut request, now).map_err(|err| CliError::new(err.to_string()))?;
    let admitted = response.context.lease_options();
    Ok(LeaseReport {
        kind: command.kind.as_str(),
        requested_secs: requested.whole_seconds(),
        lease_secs: admitted.lease.whole_seconds(),
        clamped: admitted.lease != requested,
        issue_time: format_timestamp(admitted.issue_time)?,
        expiration_time: format_timestamp(admitted.expiration_time())?,
    })
}

/// Parses an RFC 3339 timestamp argument.
fn parse_timestamp(flag: &str, value: &str) -> CliResult<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|err| CliError::new(format!("{flag} must be RFC 3339: {err}")))
}

/// Formats a timestamp as RFC 3339.
fn format_timestamp(value: OffsetDateTime) -> CliResult<String> {
    value.format(&Rfc3339).map_err(|err| CliError::new(format!("timestamp format failed: {err}")))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            let config = load_config(config_path)?;
            let options =
                config.physical_options().map_err(|err| CliError::new(err.to_string()))?;
            write_stdout_line("config ok")
                .and_then(|()| write_stdout_line(&options.redacted_connection_string()))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Example => {
            write_stdout_bytes(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads and validates the config file.
fn load_config(config_path: Option<&Path>) -> CliResult<StrongboxConfig> {
    StrongboxConfig::load(config_path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: I/O Helpers
// ============================================================================

/// Reads a file, failing when it exceeds `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Serializes `value` as one JSON line on stdout.
fn write_json_line<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)?;
    stdout.flush()
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Prints an error and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
