//! Command-line interface
//!
//! - init: create the data directory and an empty registry
//! - exec: apply NDJSON requests from stdin, one response line each
//! - inspect: print registry counts
//! - digest: print a file's content reference

mod args;
mod commands;
mod errors;
mod io;
mod request;

pub use args::{Cli, Command, LogLevel};
pub use commands::{
    digest, exec, execute_batch, init, init_registry, inspect, run, run_command, BatchSummary,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error, write_response};
pub use request::{stats, Request};
