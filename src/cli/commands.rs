//! CLI command implementations
//!
//! Every command loads the config first. `exec` then restores the registry
//! from its snapshot, applies stdin requests in order and writes the
//! snapshot back once, after the last request.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::json;

use crate::config::RegistryConfig;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::registry::{ContentRef, Registry};
use crate::snapshot::{open_registry, save_registry, snapshot_exists};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_error, write_response};
use super::request::{stats, Request};

/// Outcome of one `exec` batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: u64,
    pub rejected: u64,
}

/// Main CLI entry point. This is the only function main.rs calls.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    Logger::set_min_severity(cli.log_level.into());
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Exec { config } => exec(&config),
        Command::Inspect { config } => inspect(&config),
        Command::Digest { file } => digest(&file),
    }
}

fn load_config(config_path: &Path) -> CliResult<RegistryConfig> {
    let config = RegistryConfig::load(config_path)?;
    let path = config_path.display().to_string();
    let data_dir = config.data_path().display().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("config", path.as_str()), ("data_dir", data_dir.as_str())],
    );
    Ok(config)
}

/// Creates the data directory and writes an empty registry.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let checksum = init_registry(&config)?;
    write_response(
        &mut io::stdout().lock(),
        json!({ "initialized": true, "checksum": checksum }),
    )
}

/// Writes an empty registry for `config`. Returns the snapshot checksum.
pub fn init_registry(config: &RegistryConfig) -> CliResult<String> {
    let data_dir = config.data_path();
    if snapshot_exists(data_dir) {
        return Err(CliError::already_initialized());
    }

    let registry: Registry = Registry::new(config.settings());
    let manifest = save_registry(data_dir, &registry)?;

    let dir = data_dir.display().to_string();
    log_event_with_fields(
        Event::RegistryInitialized,
        &[("data_dir", dir.as_str()), ("admin", config.admin.as_str())],
    );
    Ok(manifest.checksum)
}

pub fn exec(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    execute_batch(&config, stdin.lock(), &mut stdout.lock())?;
    Ok(())
}

/// Applies every request line from `input`, writing one response line per
/// request to `output`, then persists the registry.
///
/// A rejected or malformed request produces an error line and the batch
/// continues.
pub fn execute_batch<R: BufRead, W: Write>(
    config: &RegistryConfig,
    input: R,
    output: &mut W,
) -> CliResult<BatchSummary> {
    let data_dir = config.data_path();
    if !snapshot_exists(data_dir) {
        return Err(CliError::not_initialized());
    }

    let mut registry = open_registry(data_dir)?;
    registry.set_reputation_source(config.reputation_source()?);

    log_event(Event::BatchBegin);

    let mut summary = BatchSummary::default();
    for line in read_requests(input) {
        let value = match line {
            Ok(value) => value,
            Err(e) => {
                summary.rejected += 1;
                write_error(output, e.code_str(), e.message())?;
                continue;
            }
        };

        let request = match Request::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                summary.rejected += 1;
                let bad = CliError::bad_request(format!("Invalid request: {}", e));
                write_error(output, bad.code_str(), bad.message())?;
                continue;
            }
        };

        match request.execute(&mut registry) {
            Ok(data) => {
                summary.applied += 1;
                write_response(output, data)?;
            }
            Err(e) => {
                summary.rejected += 1;
                write_error(output, e.code().code(), e.message())?;
            }
        }
    }

    save_registry(data_dir, &registry)?;

    let applied = summary.applied.to_string();
    let rejected = summary.rejected.to_string();
    log_event_with_fields(
        Event::BatchComplete,
        &[("applied", applied.as_str()), ("rejected", rejected.as_str())],
    );
    Ok(summary)
}

pub fn inspect(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    if !snapshot_exists(config.data_path()) {
        return Err(CliError::not_initialized());
    }

    let registry = open_registry(config.data_path())?;
    write_response(&mut io::stdout().lock(), stats(&registry))
}

/// Prints the content reference a file would be registered under.
pub fn digest(file: &Path) -> CliResult<()> {
    let bytes = fs::read(file)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", file.display(), e)))?;
    let content_ref = ContentRef::digest(&bytes);
    write_response(
        &mut io::stdout().lock(),
        json!({ "file": file.display().to_string(), "content_ref": content_ref }),
    )
}
