mod common;

use action_primitives::AgentAction;
use agent_core::{
    detect_variables, AgentLoopConfig, AgentLoopController, AgentOutput, HistoryStore,
    SensitiveData,
};
use common::{login_page, reply, RecordingExecutor, ScriptedOracle, StaticEnvironment};
use pretty_assertions::assert_eq;

async fn sign_in_history() -> HistoryStore {
    let oracle = ScriptedOracle::new(
        vec![reply(vec![
            AgentAction::input(1, "ana@example.com"),
            AgentAction::input(3, "hunter2-secret"),
            AgentAction::click(2),
        ])],
        Ok(AgentOutput::with_actions(vec![AgentAction::done(true, "signed in")])
            .next_goal("Report the result")),
    );
    let mut agent = AgentLoopController::new(
        "Sign in",
        AgentLoopConfig::minimal().actions_per_step(3),
        StaticEnvironment::new(login_page()),
        RecordingExecutor::new(),
        oracle,
    );
    agent.run().await.history
}

#[tokio::test]
async fn saved_history_loads_back_identically() {
    let history = sign_in_history().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs").join("sign_in.json");

    history.save_to_file(&path, None).unwrap();
    let loaded = HistoryStore::load_from_file(&path).unwrap();

    assert_eq!(loaded, history);
    assert_eq!(loaded.number_of_steps(), 2);
    assert_eq!(loaded.is_successful(), Some(true));
    assert_eq!(loaded.final_result(), Some("signed in"));
    assert_eq!(
        loaded.action_names(),
        vec!["input", "input", "click", "done"]
    );
}

#[tokio::test]
async fn redaction_only_touches_the_document() {
    let history = sign_in_history().await;
    let mut sensitive = SensitiveData::new();
    sensitive.insert_scoped("*.example.com", "password", "hunter2-secret");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("redacted.json");
    history.save_to_file(&path, Some(&sensitive)).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("hunter2-secret"));
    assert!(text.contains("<secret:password>"));

    let reloaded = HistoryStore::load_from_file(&path).unwrap();
    assert_eq!(
        reloaded.model_actions()[1],
        &AgentAction::input(3, "<secret:password>")
    );
    assert_eq!(
        history.model_actions()[1],
        &AgentAction::input(3, "hunter2-secret")
    );
}

#[tokio::test]
async fn placeholder_names_are_not_redacted_again() {
    let history = sign_in_history().await;
    let mut sensitive = SensitiveData::new();
    sensitive.insert("password", "hunter2-secret");
    sensitive.insert("user", "pass");

    let document = history.to_json(Some(&sensitive)).unwrap();
    let reloaded = HistoryStore::from_json(&document).unwrap();

    assert!(!document.contains("<secret:<secret:"));
    assert_eq!(
        reloaded.model_actions()[1],
        &AgentAction::input(3, "<secret:password>")
    );
}

#[tokio::test]
async fn loaded_history_exposes_variables() {
    let history = sign_in_history().await;
    let json = history.to_json(None).unwrap();
    let loaded = HistoryStore::from_json(&json).unwrap();

    let detected = detect_variables(&loaded);

    assert_eq!(detected["email"].original_value, "ana@example.com");
    assert_eq!(detected["text"].original_value, "hunter2-secret");
}

#[test]
fn malformed_document_is_rejected() {
    let err = HistoryStore::from_json("{\"history\": 3}").unwrap_err();
    assert!(err.to_string().starts_with("history document is malformed"));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = HistoryStore::load_from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().starts_with("history I/O failed"));
}
