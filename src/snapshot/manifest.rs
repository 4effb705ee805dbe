//! Snapshot manifest
//!
//! The manifest is the authoritative descriptor of `registry.json`:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "created_at": "2026-02-04T11:30:00Z",
//!   "data_file": "registry.json",
//!   "checksum": "crc32:deadbeef",
//!   "records": 12,
//!   "notifications": 40
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{SnapshotError, SnapshotResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotManifest {
    pub format_version: u8,
    pub created_at: DateTime<Utc>,
    /// File name of the payload, relative to the data directory
    pub data_file: String,
    /// CRC32 of the payload bytes (`crc32:xxxxxxxx`)
    pub checksum: String,
    /// Highest record id in the payload
    pub records: u64,
    /// Length of the notification log in the payload
    pub notifications: u64,
}

impl SnapshotManifest {
    pub fn to_json(&self) -> SnapshotResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            SnapshotError::manifest_error(format!("Failed to serialize manifest: {}", e))
        })
    }

    pub fn from_json(json: &str) -> SnapshotResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            SnapshotError::manifest_error(format!("Failed to parse manifest: {}", e))
        })
    }
}
