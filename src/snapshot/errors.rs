//! Snapshot error types
//!
//! Error codes:
//! - SNIP_SNAPSHOT_IO: file could not be read, written or renamed
//! - SNIP_SNAPSHOT_MANIFEST: manifest missing fields or unparseable
//! - SNIP_SNAPSHOT_CORRUPTED: checksum mismatch or undecodable payload
//! - SNIP_SNAPSHOT_INVALID: payload decodes but breaks a registry invariant
//! - SNIP_SNAPSHOT_MISSING: no snapshot in the data directory

use std::fmt;
use std::io;
use std::path::Path;

use crate::registry::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotErrorCode {
    Io,
    Manifest,
    Corrupted,
    Invalid,
    Missing,
}

impl SnapshotErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            SnapshotErrorCode::Io => "SNIP_SNAPSHOT_IO",
            SnapshotErrorCode::Manifest => "SNIP_SNAPSHOT_MANIFEST",
            SnapshotErrorCode::Corrupted => "SNIP_SNAPSHOT_CORRUPTED",
            SnapshotErrorCode::Invalid => "SNIP_SNAPSHOT_INVALID",
            SnapshotErrorCode::Missing => "SNIP_SNAPSHOT_MISSING",
        }
    }
}

impl fmt::Display for SnapshotErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug)]
pub struct SnapshotError {
    code: SnapshotErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl SnapshotError {
    fn new(code: SnapshotErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self {
            code: SnapshotErrorCode::Io,
            message: format!("I/O error at path: {}", path.display()),
            source: Some(source),
        }
    }

    pub fn manifest_error(message: impl Into<String>) -> Self {
        Self::new(SnapshotErrorCode::Manifest, message)
    }

    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::new(SnapshotErrorCode::Corrupted, message)
    }

    /// Snapshot decoded but the registry refused to open it.
    pub fn invalid(cause: RegistryError) -> Self {
        Self::new(
            SnapshotErrorCode::Invalid,
            format!("Snapshot violates registry invariants: {}", cause),
        )
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(SnapshotErrorCode::Invalid, message)
    }

    pub fn missing(dir: &Path) -> Self {
        Self::new(
            SnapshotErrorCode::Missing,
            format!("No registry snapshot in {}", dir.display()),
        )
    }

    pub fn code(&self) -> SnapshotErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
