//! Snapshot Restore Tests
//!
//! A registry written to disk and opened again must behave exactly like the
//! one that was written: ids continue, content stays unique, vote flags,
//! comment ids, reviewers and policy survive, and a damaged payload is
//! refused rather than loaded.

use std::fs;

use snipreg::registry::{
    ActorId, Category, CommentId, ContentRef, FeeProof, Language, NewRecord, RecordId, Registry,
    RegistryErrorCode, RegistrySettings, Revision,
};
use serde_json::{json, Value};
use snipreg::snapshot::{
    data_path, load_snapshot, open_registry, save_registry, snapshot_exists, RegistrySnapshot,
    SnapshotErrorCode,
};
use snipreg::votes::VoteDirection;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn actor(name: &str) -> ActorId {
    ActorId::new(name)
}

fn new_record(content: &str, dependencies: Vec<RecordId>) -> NewRecord {
    NewRecord {
        content_ref: ContentRef::new(content),
        title: content.to_string(),
        description: "stored".into(),
        language: Language::Move,
        category: Category::DeFi,
        dependencies,
    }
}

/// Registry with two records, a vote, a reply thread and one review.
fn populated_registry() -> Registry {
    let mut registry = Registry::new(
        RegistrySettings::new("admin")
            .with_max_versions(3)
            .with_posting_fee(7),
    );
    let alice = actor("alice");
    let fee = FeeProof::new(7);

    let first = registry
        .register(&alice, new_record("QmBase", vec![]), fee)
        .unwrap();
    let second = registry
        .register(&alice, new_record("QmLib", vec![first]), fee)
        .unwrap();
    registry
        .cast_vote(&actor("bob"), second, VoteDirection::Up)
        .unwrap();
    let top = registry
        .add_comment(&actor("bob"), first, ContentRef::new("QmC1"), CommentId::TOP_LEVEL)
        .unwrap();
    registry
        .add_comment(&alice, first, ContentRef::new("QmC2"), top)
        .unwrap();
    registry
        .register_reviewer(&actor("admin"), actor("rita"))
        .unwrap();
    registry.mark_reviewed(&actor("rita"), second).unwrap();
    registry
        .set_language_supported(&actor("admin"), Language::Go, false)
        .unwrap();
    registry
}

/// Applies `edit` to the JSON form of a captured snapshot and restores it.
fn restore_edited(edit: impl FnOnce(&mut Value)) -> Result<Registry, SnapshotErrorCode> {
    let snapshot = RegistrySnapshot::capture(&populated_registry());
    let mut value = serde_json::to_value(&snapshot).unwrap();
    edit(&mut value);
    let edited: RegistrySnapshot = serde_json::from_value(value).unwrap();
    edited.restore().map_err(|e| e.code())
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_reopened_registry_matches() {
    let tmp = TempDir::new().unwrap();
    let registry = populated_registry();
    save_registry(tmp.path(), &registry).unwrap();
    assert!(snapshot_exists(tmp.path()));

    let reopened = open_registry(tmp.path()).unwrap();

    assert_eq!(reopened.total_records(), 2);
    assert_eq!(reopened.active_record_count(), 2);
    assert_eq!(reopened.admin(), &actor("admin"));
    assert_eq!(reopened.posting_fee(), 7);
    assert_eq!(reopened.max_versions(), 3);
    assert!(!reopened.is_language_supported(Language::Go));
    assert!(reopened.is_language_supported(Language::Move));
    for raw in 1..=2 {
        let id = RecordId::new(raw);
        assert_eq!(reopened.record(id).unwrap(), registry.record(id).unwrap());
    }
    assert_eq!(
        reopened.vote_stats(RecordId::new(2)).unwrap(),
        registry.vote_stats(RecordId::new(2)).unwrap()
    );
    assert_eq!(reopened.reviewers(RecordId::new(2)).unwrap(), &[actor("rita")]);
    assert_eq!(reopened.comments(RecordId::new(1)).unwrap().count(), 2);
    assert_eq!(
        reopened.notifications_since(0),
        registry.notifications_since(0)
    );
}

/// Operations after reopening continue from the persisted counters and guards.
#[test]
fn test_operations_continue_after_reopen() {
    let tmp = TempDir::new().unwrap();
    save_registry(tmp.path(), &populated_registry()).unwrap();
    let mut registry = open_registry(tmp.path()).unwrap();
    let fee = FeeProof::new(7);

    let err = registry
        .register(&actor("carol"), new_record("QmBase", vec![]), fee)
        .unwrap_err();
    assert_eq!(err.code(), RegistryErrorCode::DuplicateContent);

    let err = registry
        .cast_vote(&actor("bob"), RecordId::new(2), VoteDirection::Down)
        .unwrap_err();
    assert_eq!(err.code(), RegistryErrorCode::AlreadyVoted);

    let third = registry
        .fork(
            &actor("carol"),
            RecordId::new(2),
            Revision {
                content_ref: ContentRef::new("QmFork"),
                title: "fork".into(),
                description: String::new(),
                dependencies: vec![],
            },
            fee,
        )
        .unwrap();
    assert_eq!(third, RecordId::new(3));
    assert_eq!(
        registry.record(third).unwrap().dependencies,
        vec![RecordId::new(1), RecordId::new(2)]
    );

    let comment = registry
        .add_comment(&actor("carol"), third, ContentRef::new("QmC3"), CommentId::new(2))
        .unwrap();
    assert_eq!(comment, CommentId::new(3));

    registry.mark_reviewed(&actor("rita"), third).unwrap();
    let next = registry.notifications_since(0).len() as u64;
    assert_eq!(registry.notifications_since(0).last().unwrap().sequence, next);
}

/// Save, reopen, mutate, save again: the second reopen sees every change.
#[test]
fn test_repeated_save_cycles() {
    let tmp = TempDir::new().unwrap();
    save_registry(tmp.path(), &populated_registry()).unwrap();

    for round in 0..3u64 {
        let mut registry = open_registry(tmp.path()).unwrap();
        registry
            .register(
                &actor("alice"),
                new_record(&format!("QmRound{}", round), vec![]),
                FeeProof::new(7),
            )
            .unwrap();
        save_registry(tmp.path(), &registry).unwrap();
    }

    let registry = open_registry(tmp.path()).unwrap();
    assert_eq!(registry.total_records(), 5);
    assert_eq!(registry.records_by_author(&actor("alice")).len(), 5);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_tampered_snapshot_refused() {
    let tmp = TempDir::new().unwrap();
    save_registry(tmp.path(), &populated_registry()).unwrap();

    let path = data_path(tmp.path());
    let tampered = fs::read_to_string(&path)
        .unwrap()
        .replace("QmBase", "QmEvil");
    fs::write(&path, tampered).unwrap();

    let err = load_snapshot(tmp.path()).unwrap_err();
    assert_eq!(err.code(), SnapshotErrorCode::Corrupted);
    assert!(open_registry(tmp.path()).is_err());
}

#[test]
fn test_open_empty_directory() {
    let tmp = TempDir::new().unwrap();

    assert!(!snapshot_exists(tmp.path()));
    let err = open_registry(tmp.path()).err().unwrap();
    assert_eq!(err.code(), SnapshotErrorCode::Missing);
}

// =============================================================================
// Invariant Check Tests
// =============================================================================

/// The unedited capture restores, so each rejection below is caused by its edit.
#[test]
fn test_unedited_capture_restores() {
    assert!(restore_edited(|_| {}).is_ok());
}

#[test]
fn test_restore_rejects_repeated_dependency() {
    let mut snapshot = RegistrySnapshot::capture(&populated_registry());
    snapshot.records[1].dependencies = vec![RecordId::new(1), RecordId::new(1)];

    let err = snapshot.restore().err().unwrap();
    assert_eq!(err.code(), SnapshotErrorCode::Invalid);
}

#[test]
fn test_restore_rejects_votes_on_unknown_record() {
    let result = restore_edited(|value| {
        let state = value["votes"]["2"].clone();
        value["votes"]["9"] = state;
    });
    assert_eq!(result.err(), Some(SnapshotErrorCode::Invalid));
}

#[test]
fn test_restore_rejects_review_log_for_unknown_record() {
    let result = restore_edited(|value| {
        value["reviews"]["logs"]["7"] = json!(["rita"]);
    });
    assert_eq!(result.err(), Some(SnapshotErrorCode::Invalid));
}

/// The per-record comment index must agree with each comment's record.
#[test]
fn test_restore_rejects_misfiled_comments() {
    let result = restore_edited(|value| {
        value["comments"]["by_record"] = json!({ "2": [1, 2] });
    });
    assert_eq!(result.err(), Some(SnapshotErrorCode::Invalid));
}

#[test]
fn test_restore_rejects_comment_on_unknown_record() {
    let result = restore_edited(|value| {
        value["comments"]["comments"][0]["record_id"] = json!(9);
        value["comments"]["by_record"] = json!({ "1": [2], "9": [1] });
    });
    assert_eq!(result.err(), Some(SnapshotErrorCode::Invalid));
}
