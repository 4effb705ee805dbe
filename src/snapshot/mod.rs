//! Registry snapshots
//!
//! A snapshot is the registry's primary state as one JSON document:
//! records, vote state, comments, reviewers, acceptance policy, admin and
//! the notification log. Derived state (content index, author, language
//! and category indices, active counter) is not stored. It is rebuilt on
//! restore, and restore refuses a snapshot whose rebuild fails.
//!
//! # Files
//!
//! - `registry.json`: the payload
//! - `registry.manifest.json`: checksum and counts of the payload
//!
//! Both are written to a temp file, fsynced, then renamed into place. The
//! payload goes first, so a crash between the two renames leaves a manifest
//! whose checksum no longer matches and the load fails loudly.

mod checksum;
mod errors;
mod manifest;

pub use checksum::{compute_checksum, format_checksum, parse_checksum};
pub use errors::{SnapshotError, SnapshotErrorCode, SnapshotResult};
pub use manifest::SnapshotManifest;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::comments::CommentThread;
use crate::events::NotificationLog;
use crate::observability::{log_event_with_fields, Event};
use crate::registry::{
    amount, ActorId, Balance, Category, Language, MemoryRecordTable, Record, RecordId,
    RecordPolicy, RecordStore, RecordTable, Registry, SupportedSet,
};
use crate::review::ReviewCoordinator;
use crate::votes::VoteLedger;

pub const FORMAT_VERSION: u8 = 1;
pub const DATA_FILE: &str = "registry.json";
pub const MANIFEST_FILE: &str = "registry.manifest.json";

/// Primary state of a registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub format_version: u8,
    pub admin: ActorId,
    pub max_versions: usize,
    #[serde(with = "amount")]
    pub posting_fee: Balance,
    pub languages: SupportedSet<Language>,
    pub categories: SupportedSet<Category>,
    /// Every record, in id order
    pub records: Vec<Record>,
    pub votes: VoteLedger,
    pub comments: CommentThread,
    pub reviews: ReviewCoordinator,
    pub notifications: NotificationLog,
}

impl RegistrySnapshot {
    /// Copies the primary state out of `registry`.
    pub fn capture<T: RecordTable>(registry: &Registry<T>) -> Self {
        let store = registry.store();
        let policy = store.policy();
        let records = (1..=store.total_records())
            .filter_map(|raw| store.get(RecordId::new(raw)).ok().cloned())
            .collect();

        Self {
            format_version: FORMAT_VERSION,
            admin: registry.admin().clone(),
            max_versions: policy.max_versions,
            posting_fee: policy.posting_fee,
            languages: policy.languages.clone(),
            categories: policy.categories.clone(),
            records,
            votes: registry.vote_ledger().clone(),
            comments: registry.comment_thread().clone(),
            reviews: registry.review_coordinator().clone(),
            notifications: registry.notification_log().clone(),
        }
    }

    /// Rebuilds a registry, re-deriving every index.
    ///
    /// The returned registry has no reputation source and a fresh metrics
    /// registry.
    pub fn restore(self) -> SnapshotResult<Registry> {
        if self.format_version != FORMAT_VERSION {
            return Err(SnapshotError::invalid_format(format!(
                "Unsupported snapshot format version {}",
                self.format_version
            )));
        }
        if self.max_versions == 0 {
            return Err(SnapshotError::invalid_format("max_versions must be > 0"));
        }

        let policy = RecordPolicy {
            max_versions: self.max_versions,
            posting_fee: self.posting_fee,
            languages: self.languages,
            categories: self.categories,
        };
        let table = MemoryRecordTable::from_records(self.records).map_err(SnapshotError::invalid)?;
        let store = RecordStore::open(table, policy).map_err(SnapshotError::invalid)?;
        let max_id = store.total_records();
        check_record_refs("vote state", self.votes.voted_records(), max_id)?;
        check_record_refs("review log", self.reviews.reviewed_records(), max_id)?;
        self.comments.verify(max_id).map_err(SnapshotError::invalid)?;
        if !self.notifications.is_contiguous() {
            return Err(SnapshotError::invalid_format(
                "Notification sequence numbers are not contiguous",
            ));
        }

        Ok(Registry::from_parts(
            self.admin,
            store,
            self.votes,
            self.comments,
            self.reviews,
            self.notifications,
        ))
    }
}

fn check_record_refs(
    table: &str,
    ids: impl Iterator<Item = RecordId>,
    max_id: u64,
) -> SnapshotResult<()> {
    for id in ids {
        if id.is_zero() || id.value() > max_id {
            return Err(SnapshotError::invalid_format(format!(
                "Snapshot {} references unknown record {}",
                table, id
            )));
        }
    }
    Ok(())
}

pub fn data_path(dir: &Path) -> PathBuf {
    dir.join(DATA_FILE)
}

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

/// True when `dir` holds a snapshot manifest.
pub fn snapshot_exists(dir: &Path) -> bool {
    manifest_path(dir).exists()
}

/// Writes `snapshot` into `dir`, replacing any previous snapshot.
pub fn write_snapshot(dir: &Path, snapshot: &RegistrySnapshot) -> SnapshotResult<SnapshotManifest> {
    let dir_display = dir.display().to_string();
    log_event_with_fields(Event::SnapshotWriteBegin, &[("data_dir", dir_display.as_str())]);

    fs::create_dir_all(dir).map_err(|e| SnapshotError::io_error_at_path(dir, e))?;

    let payload = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| SnapshotError::corrupted(format!("Failed to encode snapshot: {}", e)))?;

    let manifest = SnapshotManifest {
        format_version: FORMAT_VERSION,
        created_at: Utc::now(),
        data_file: DATA_FILE.to_string(),
        checksum: format_checksum(compute_checksum(&payload)),
        records: snapshot.records.len() as u64,
        notifications: snapshot.notifications.len() as u64,
    };

    write_atomic(&data_path(dir), &payload)?;
    write_atomic(&manifest_path(dir), manifest.to_json()?.as_bytes())?;

    let records = manifest.records.to_string();
    log_event_with_fields(
        Event::SnapshotWriteComplete,
        &[
            ("data_dir", dir_display.as_str()),
            ("checksum", manifest.checksum.as_str()),
            ("records", records.as_str()),
        ],
    );
    Ok(manifest)
}

/// Reads and verifies the snapshot in `dir`.
///
/// Fails with `SNIP_SNAPSHOT_CORRUPTED` if the payload does not match the
/// manifest checksum.
pub fn load_snapshot(dir: &Path) -> SnapshotResult<RegistrySnapshot> {
    let dir_display = dir.display().to_string();
    log_event_with_fields(Event::SnapshotLoadBegin, &[("data_dir", dir_display.as_str())]);

    if !snapshot_exists(dir) {
        return Err(SnapshotError::missing(dir));
    }

    let manifest_file = manifest_path(dir);
    let manifest_json = fs::read_to_string(&manifest_file)
        .map_err(|e| SnapshotError::io_error_at_path(&manifest_file, e))?;
    let manifest = SnapshotManifest::from_json(&manifest_json)?;

    let expected = parse_checksum(&manifest.checksum).ok_or_else(|| {
        SnapshotError::manifest_error(format!("Malformed checksum '{}'", manifest.checksum))
    })?;

    let payload_file = dir.join(&manifest.data_file);
    let payload = fs::read(&payload_file).map_err(|e| SnapshotError::io_error_at_path(&payload_file, e))?;

    let actual = compute_checksum(&payload);
    if actual != expected {
        let actual_formatted = format_checksum(actual);
        log_event_with_fields(
            Event::SnapshotCorrupted,
            &[
                ("data_dir", dir_display.as_str()),
                ("expected", manifest.checksum.as_str()),
                ("actual", actual_formatted.as_str()),
            ],
        );
        return Err(SnapshotError::corrupted(format!(
            "Checksum mismatch for {}: manifest {}, file {}",
            payload_file.display(),
            manifest.checksum,
            actual_formatted
        )));
    }

    let snapshot: RegistrySnapshot = serde_json::from_slice(&payload)
        .map_err(|e| SnapshotError::corrupted(format!("Failed to decode snapshot: {}", e)))?;

    log_event_with_fields(
        Event::SnapshotLoadComplete,
        &[
            ("data_dir", dir_display.as_str()),
            ("checksum", manifest.checksum.as_str()),
        ],
    );
    Ok(snapshot)
}

/// Loads and restores the registry stored in `dir`.
pub fn open_registry(dir: &Path) -> SnapshotResult<Registry> {
    load_snapshot(dir)?.restore()
}

/// Captures and writes `registry` into `dir`.
pub fn save_registry<T: RecordTable>(dir: &Path, registry: &Registry<T>) -> SnapshotResult<SnapshotManifest> {
    write_snapshot(dir, &RegistrySnapshot::capture(registry))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> SnapshotResult<()> {
    let temp = path.with_extension("json.tmp");

    let mut file = File::create(&temp).map_err(|e| SnapshotError::io_error_at_path(&temp, e))?;
    file.write_all(bytes)
        .map_err(|e| SnapshotError::io_error_at_path(&temp, e))?;
    file.sync_all()
        .map_err(|e| SnapshotError::io_error_at_path(&temp, e))?;
    drop(file);

    fs::rename(&temp, path).map_err(|e| SnapshotError::io_error_at_path(path, e))
}
