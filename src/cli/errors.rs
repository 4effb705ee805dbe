//! CLI-specific error types
//!
//! Any of these aborts the command with a non-zero exit. Registry
//! rejections inside `exec` are not CLI errors; they become error responses.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::snapshot::SnapshotError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout/files)
    IoError,
    /// Request line is not a valid request
    BadRequest,
    /// Snapshot could not be read or written
    SnapshotError,
    AlreadyInitialized,
    NotInitialized,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SNIP_CLI_CONFIG_ERROR",
            Self::IoError => "SNIP_CLI_IO_ERROR",
            Self::BadRequest => "SNIP_CLI_BAD_REQUEST",
            Self::SnapshotError => "SNIP_CLI_SNAPSHOT_ERROR",
            Self::AlreadyInitialized => "SNIP_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "SNIP_CLI_NOT_INITIALIZED",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BadRequest, msg)
    }

    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already holds a registry",
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'snipreg init' first.",
        )
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<SnapshotError> for CliError {
    fn from(e: SnapshotError) -> Self {
        Self::new(CliErrorCode::SnapshotError, e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CliError::not_initialized();
        assert_eq!(err.code_str(), "SNIP_CLI_NOT_INITIALIZED");
        assert!(err.to_string().starts_with("SNIP_CLI_NOT_INITIALIZED: "));
    }

    #[test]
    fn test_from_config_error() {
        let err: CliError = ConfigError::Invalid("admin must not be empty".into()).into();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert!(err.message().contains("admin"));
    }
}
