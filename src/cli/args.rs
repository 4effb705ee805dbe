//! CLI argument definitions using clap
//!
//! Commands:
//! - snipreg init --config <path>
//! - snipreg exec --config <path>
//! - snipreg inspect --config <path>
//! - snipreg digest <file>

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::observability::Severity;

/// snipreg - a strict, deterministic snippet registry
#[derive(Parser, Debug)]
#[command(name = "snipreg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Lowest severity written to the stderr log
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory and an empty registry snapshot
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./snipreg.json")]
        config: PathBuf,
    },

    /// Apply newline-delimited JSON requests from stdin, then persist
    Exec {
        /// Path to configuration file
        #[arg(long, default_value = "./snipreg.json")]
        config: PathBuf,
    },

    /// Print registry counts as JSON
    Inspect {
        /// Path to configuration file
        #[arg(long, default_value = "./snipreg.json")]
        config: PathBuf,
    },

    /// Print the sha256 content reference of a file
    Digest {
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
