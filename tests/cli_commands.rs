use std::path::{Path, PathBuf};
use std::process::Command;

use action_primitives::{ActionResult, AgentAction};
use agent_core::{AgentOutput, HistoryStore, StateDigest, StepMetadata, StepRecord};
use assert_cmd::prelude::*;
use chrono::{Duration, Utc};
use serde_json::Value;
use steptrail_core_types::ElementIdentity;
use tempfile::TempDir;

fn field(name: &str) -> Option<ElementIdentity> {
    Some(ElementIdentity::new(
        "input",
        format!("/html/body/form/input[@name='{name}']"),
        [("name", name)],
    ))
}

fn record(step: u32, actions: Vec<AgentAction>, elements: Vec<Option<ElementIdentity>>, result: Vec<ActionResult>) -> StepRecord {
    let start = Utc::now();
    StepRecord {
        model_output: Some(AgentOutput::with_actions(actions)),
        result,
        state: StateDigest {
            url: "https://app.example.com/login".to_string(),
            title: "Sign in".to_string(),
            interacted_elements: elements,
            ..StateDigest::default()
        },
        metadata: Some(StepMetadata {
            step_number: step,
            step_start_time: start,
            step_end_time: start + Duration::milliseconds(1500),
            step_interval_ms: None,
        }),
    }
}

fn write_history(dir: &TempDir) -> PathBuf {
    let history = HistoryStore::from_records(vec![
        record(
            1,
            vec![
                AgentAction::input(1, "ada@example.com"),
                AgentAction::input(2, "hunter2-secret"),
                AgentAction::click(3),
            ],
            vec![field("email"), field("password"), None],
            vec![
                ActionResult::extracted("Typed into element 1"),
                ActionResult::extracted("Typed into element 2"),
                ActionResult::error("Element with index 3 not found"),
            ],
        ),
        record(
            2,
            vec![AgentAction::done(true, "Signed in")],
            vec![None],
            vec![ActionResult::done(true, "Signed in")],
        ),
    ]);
    let path = dir.path().join("history.json");
    history.save_to_file(&path, None).unwrap();
    path
}

fn steptrail(dir: &TempDir) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("steptrail");
    let mut cmd = Command::new(bin);
    cmd.arg("--config").arg(dir.path().join("absent.yaml"));
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn inspect_reports_run_summary_as_json() {
    let dir = TempDir::new().unwrap();
    let history = write_history(&dir);

    let stdout = stdout_of(steptrail(&dir).args(["--output", "json", "inspect", path_str(&history)]));
    let report: Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(report["records"].as_u64(), Some(2));
    assert_eq!(report["done"].as_bool(), Some(true));
    assert_eq!(report["successful"].as_bool(), Some(true));
    assert_eq!(report["final_result"].as_str(), Some("Signed in"));
    assert_eq!(report["duration_ms"].as_u64(), Some(3000));
    assert_eq!(report["action_counts"]["input"].as_u64(), Some(2));
    assert_eq!(report["action_counts"]["done"].as_u64(), Some(1));
    assert_eq!(report["urls"].as_array().unwrap().len(), 1);

    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["step_number"].as_u64(), Some(1));
    assert_eq!(errors[0]["message"].as_str(), Some("Element with index 3 not found"));
}

#[test]
fn inspect_flags_configured_secrets_left_in_the_document() {
    let dir = TempDir::new().unwrap();
    let history = write_history(&dir);
    let config = dir.path().join("steptrail.yaml");
    std::fs::write(&config, "sensitive_data:\n  password: hunter2-secret\n").unwrap();

    let bin = assert_cmd::cargo::cargo_bin!("steptrail");
    let stdout = stdout_of(Command::new(bin).args([
        "--config",
        path_str(&config),
        "--output",
        "json",
        "inspect",
        path_str(&history),
    ]));
    let report: Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(report["unredacted_secrets"], serde_json::json!(["password"]));
}

#[test]
fn redact_writes_placeholder_copy_and_keeps_source() {
    let dir = TempDir::new().unwrap();
    let history = write_history(&dir);
    let out = dir.path().join("redacted.json");

    steptrail(&dir)
        .args(["redact", path_str(&history), "--out", path_str(&out), "--secret", "password=hunter2-secret"])
        .assert()
        .success();

    let redacted = std::fs::read_to_string(&out).unwrap();
    assert!(!redacted.contains("hunter2-secret"));
    assert!(redacted.contains("<secret:password>"));
    assert!(std::fs::read_to_string(&history).unwrap().contains("hunter2-secret"));

    let loaded = HistoryStore::load_from_file(&out).unwrap();
    assert_eq!(loaded.len(), 2);
}

#[test]
fn redact_without_secrets_fails() {
    let dir = TempDir::new().unwrap();
    let history = write_history(&dir);
    let out = dir.path().join("redacted.json");

    steptrail(&dir)
        .args(["redact", path_str(&history), "--out", path_str(&out)])
        .assert()
        .failure();
    assert!(!out.exists());
}

#[test]
fn variables_lists_detected_inputs() {
    let dir = TempDir::new().unwrap();
    let history = write_history(&dir);

    let stdout = stdout_of(steptrail(&dir).args(["--output", "json", "variables", path_str(&history)]));
    let variables: Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(variables["email"]["original_value"].as_str(), Some("ada@example.com"));
    assert_eq!(variables["email"]["type"].as_str(), Some("email"));
    assert_eq!(variables["password"]["type"].as_str(), Some("text"));
}

#[test]
fn substitute_rewrites_inputs_for_a_rerun() {
    let dir = TempDir::new().unwrap();
    let history = write_history(&dir);
    let out = dir.path().join("rerun.json");

    steptrail(&dir)
        .args([
            "substitute",
            path_str(&history),
            "--set",
            "email=grace@example.com",
            "--out",
            path_str(&out),
        ])
        .assert()
        .success();

    let rewritten = HistoryStore::load_from_file(&out).unwrap();
    assert_eq!(
        rewritten.model_actions()[0],
        &AgentAction::input(1, "grace@example.com")
    );
    assert_eq!(
        rewritten.model_actions()[1],
        &AgentAction::input(2, "hunter2-secret")
    );
}

#[test]
fn missing_history_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");

    steptrail(&dir)
        .args(["inspect", path_str(&missing)])
        .assert()
        .failure();
}
