//! CLI Batch Tests
//!
//! `exec` reads one JSON request per line and writes one JSON response per
//! line, in order. A bad request produces an error line and the batch keeps
//! going. State persists between batches.

use std::io::Cursor;

use serde_json::Value;
use snipreg::cli::{execute_batch, init_registry, BatchSummary, CliErrorCode};
use snipreg::config::RegistryConfig;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (TempDir, RegistryConfig) {
    let tmp = TempDir::new().unwrap();
    let mut config = RegistryConfig::new(tmp.path().join("data"), "admin");
    config.max_versions = 2;
    init_registry(&config).unwrap();
    (tmp, config)
}

fn run(config: &RegistryConfig, lines: &[&str]) -> (BatchSummary, Vec<Value>) {
    let input = lines.join("\n");
    let mut output = Vec::new();
    let summary = execute_batch(config, Cursor::new(input), &mut output).unwrap();
    let responses = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (summary, responses)
}

fn register_line(content: &str, deps: &str) -> String {
    format!(
        r#"{{"op":"register","actor":"alice","content_ref":"{}","title":"t","language":"solidity","category":"utility","dependencies":{}}}"#,
        content, deps
    )
}

// =============================================================================
// Batch Tests
// =============================================================================

#[test]
fn test_batch_responses_in_order() {
    let (_tmp, config) = setup();
    let first = register_line("Qm1", "[]");
    let second = register_line("Qm2", "[]");
    let third = register_line("Qm3", "[1,2]");
    let duplicate = register_line("Qm4", "[1,1]");

    let (summary, responses) = run(
        &config,
        &[
            first.as_str(),
            second.as_str(),
            third.as_str(),
            duplicate.as_str(),
        ],
    );

    assert_eq!(summary, BatchSummary { applied: 3, rejected: 1 });
    assert_eq!(responses.len(), 4);
    assert_eq!(responses[2]["status"], "ok");
    assert_eq!(responses[2]["data"]["record_id"], 3);
    assert_eq!(responses[2]["data"]["sequence"], 3);
    assert_eq!(responses[3]["status"], "error");
    assert_eq!(responses[3]["code"], "SNIP_DUPLICATE_DEPENDENCY");
}

/// Malformed lines are answered with an error and do not stop the batch.
#[test]
fn test_bad_lines_do_not_stop_batch() {
    let (_tmp, config) = setup();
    let register = register_line("Qm1", "[]");

    let (summary, responses) = run(
        &config,
        &[
            "{not json",
            "",
            r#"{"op":"launch_rocket"}"#,
            r#"{"op":"deactivate","actor":"alice","record_id":1,"force":true}"#,
            register.as_str(),
        ],
    );

    assert_eq!(summary, BatchSummary { applied: 1, rejected: 3 });
    assert_eq!(responses.len(), 4);
    for response in &responses[..3] {
        assert_eq!(response["status"], "error");
        assert_eq!(response["code"], CliErrorCode::BadRequest.code());
    }
    assert_eq!(responses[3]["status"], "ok");
}

/// Votes, removal and the score quirk through the request surface.
#[test]
fn test_vote_requests() {
    let (_tmp, config) = setup();
    let register = register_line("Qm1", "[]");

    let (_, responses) = run(
        &config,
        &[
            register.as_str(),
            r#"{"op":"cast_vote","actor":"x","record_id":1,"upvote":true}"#,
            r#"{"op":"cast_vote","actor":"x","record_id":1,"upvote":false}"#,
            r#"{"op":"remove_vote","actor":"x","record_id":1}"#,
            r#"{"op":"has_voted","actor":"x","record_id":1}"#,
            r#"{"op":"vote_stats","record_id":1}"#,
        ],
    );

    assert_eq!(responses[1]["data"]["weight"], 1);
    assert_eq!(responses[2]["code"], "SNIP_ALREADY_VOTED");
    assert_eq!(responses[3]["status"], "ok");
    assert_eq!(responses[4]["data"]["voted"], false);
    assert_eq!(responses[5]["data"]["score"], 1);
    assert_eq!(responses[5]["data"]["upvotes"], 1);
}

/// State written by one batch is visible to the next.
#[test]
fn test_state_persists_between_batches() {
    let (_tmp, config) = setup();
    let register = register_line("Qm1", "[]");
    run(&config, &[register.as_str()]);

    let (_, responses) = run(
        &config,
        &[
            r#"{"op":"update","actor":"alice","record_id":1,"content_ref":"Qm2","title":"v2"}"#,
            r#"{"op":"update","actor":"alice","record_id":2,"content_ref":"Qm3","title":"v3"}"#,
            r#"{"op":"update","actor":"alice","record_id":3,"content_ref":"Qm4","title":"v4"}"#,
            r#"{"op":"get_record","record_id":1}"#,
        ],
    );

    assert_eq!(responses[0]["data"]["record_id"], 2);
    assert_eq!(responses[1]["data"]["record_id"], 3);
    assert_eq!(responses[2]["code"], "SNIP_VERSION_LIMIT_EXCEEDED");
    assert_eq!(responses[3]["data"]["active"], true);

    let (_, responses) = run(&config, &[r#"{"op":"stats"}"#]);
    assert_eq!(responses[0]["data"]["total_records"], 3);
    assert_eq!(responses[0]["data"]["active_records"], 3);
    assert_eq!(responses[0]["data"]["notifications"], 3);
}

#[test]
fn test_admin_requests() {
    let (_tmp, config) = setup();

    let (_, responses) = run(
        &config,
        &[
            r#"{"op":"set_posting_fee","actor":"mallory","fee":"5"}"#,
            r#"{"op":"set_posting_fee","actor":"admin","fee":"1000000000000000000"}"#,
            r#"{"op":"register","actor":"alice","content_ref":"Qm1","title":"t","language":"rust","category":"defi","fee":"999"}"#,
            r#"{"op":"register","actor":"alice","content_ref":"Qm1","title":"t","language":"rust","category":"defi","fee":"1000000000000000000"}"#,
            r#"{"op":"register_reviewer","actor":"admin","reviewer":"rita"}"#,
            r#"{"op":"mark_reviewed","actor":"rita","record_id":1}"#,
            r#"{"op":"reviewers","record_id":1}"#,
        ],
    );

    assert_eq!(responses[0]["code"], "SNIP_NOT_ADMIN");
    assert_eq!(responses[1]["status"], "ok");
    assert_eq!(responses[2]["code"], "SNIP_INSUFFICIENT_FEE");
    assert_eq!(responses[3]["data"]["record_id"], 1);
    assert_eq!(responses[6]["data"], serde_json::json!(["rita"]));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_init_twice_fails() {
    let (_tmp, config) = setup();

    let err = init_registry(&config).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::AlreadyInitialized);
}

#[test]
fn test_exec_requires_init() {
    let tmp = TempDir::new().unwrap();
    let config = RegistryConfig::new(tmp.path().join("absent"), "admin");

    let mut output = Vec::new();
    let err = execute_batch(&config, Cursor::new("{}"), &mut output).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::NotInitialized);
    assert!(output.is_empty());
}
