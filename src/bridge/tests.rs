//! Tests for the entry point.

use super::*;
use crate::config::AgentSettings;
use crate::error::ErrorKind;
use crate::events::read_events;
use crate::model::{AgentId, ResultFormat};
use crate::test_support::{RecordingExecutor, outcome};
use serde_json::json;
use std::sync::atomic::AtomicUsize;
use tempfile::TempDir;

fn bridge(executor: Arc<RecordingExecutor>) -> Bridge {
    Bridge::with_executor(Config::default(), executor)
}

fn options(value: serde_json::Value) -> Options {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_invoke_end_to_end_json_result() {
    let executor = Arc::new(RecordingExecutor::returning(outcome(0, r#"{"result":"4"}"#, "")));
    let bridge = bridge(executor.clone());

    let result = bridge.invoke("claude", "2+2", Options::new()).unwrap();

    assert!(result.success);
    assert_eq!(result.content, "4");
    assert_eq!(result.format, ResultFormat::Json);
    assert_eq!(executor.spawn_count(), 1);
}

#[test]
fn test_unknown_agent_spawns_nothing() {
    let executor = Arc::new(RecordingExecutor::returning(outcome(0, "ok", "")));
    let bridge = bridge(executor.clone());

    let err = bridge.invoke("gpt-9", "hello", Options::new()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnknownAgent);
    assert_eq!(executor.spawn_count(), 0);
}

#[test]
fn test_unsupported_option_spawns_nothing() {
    let executor = Arc::new(RecordingExecutor::returning(outcome(0, "ok", "")));
    let bridge = bridge(executor.clone());

    let err = bridge
        .invoke("codex", "hello", options(json!({"session_id": "s-1"})))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(executor.spawn_count(), 0);
}

#[test]
fn test_empty_prompt_spawns_nothing() {
    let executor = Arc::new(RecordingExecutor::returning(outcome(0, "ok", "")));
    let bridge = bridge(executor.clone());

    let err = bridge.invoke("gemini", "   ", Options::new()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(executor.spawn_count(), 0);
}

#[test]
fn test_zero_timeout_is_rejected() {
    let executor = Arc::new(RecordingExecutor::returning(outcome(0, "ok", "")));
    let bridge = bridge(executor.clone());

    let call = CallOptions {
        timeout: Some(Duration::ZERO),
        ..CallOptions::default()
    };
    let err = bridge
        .invoke_with("gemini", "hi", Options::new(), &call)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(executor.spawn_count(), 0);
}

#[test]
fn test_configured_output_limit_is_applied() {
    let executor = Arc::new(RecordingExecutor::returning(outcome(0, &"a".repeat(500), "")));
    let config = Config {
        output_limit_bytes: 100,
        ..Config::default()
    };
    let bridge = Bridge::with_executor(config, executor);

    let result = bridge.invoke("codex", "long answer", Options::new()).unwrap();

    assert_eq!(result.content.len(), 100);
    assert_eq!(result.truncation.unwrap().original_bytes, 500);
}

#[test]
fn test_configured_agent_settings_reach_the_command() {
    let executor = Arc::new(RecordingExecutor::returning(outcome(0, "ok", "")));
    let mut config = Config::default();
    config.agents.insert(
        AgentId::Gemini,
        AgentSettings {
            model: Some("gemini-2.5-flash".to_string()),
            json_output: Some(true),
            ..AgentSettings::default()
        },
    );
    let bridge = Bridge::with_executor(config, executor.clone());

    bridge.invoke("gemini", "hi", Options::new()).unwrap();

    let argv = executor.commands()[0].argv().to_vec();
    assert!(argv.windows(2).any(|w| w == ["--model", "gemini-2.5-flash"]));
    assert!(argv.windows(2).any(|w| w == ["--output-format", "json"]));
    assert_eq!(executor.spawn_count(), 1);
}

#[test]
fn test_event_log_records_start_and_outcome_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("events.ndjson");
    let config = Config {
        event_log: Some(log_path.clone()),
        ..Config::default()
    };

    let executor = Arc::new(RecordingExecutor::with(|command| {
        if command.program() == "claude" {
            Ok(outcome(0, r#"{"result":"top secret answer"}"#, ""))
        } else {
            Ok(outcome(2, "", "boom"))
        }
    }));
    let bridge = Bridge::with_executor(config, executor);

    bridge.invoke("claude", "question", Options::new()).unwrap();
    bridge.invoke("codex", "question", Options::new()).unwrap_err();

    let events = read_events(&log_path).unwrap();
    let actions: Vec<_> = events.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        [
            EventAction::InvokeStart,
            EventAction::InvokeComplete,
            EventAction::InvokeStart,
            EventAction::InvokeFailed,
        ]
    );
    assert_eq!(events[1].details["format"], "json");
    assert_eq!(events[3].details["kind"], "agent_execution");
    assert_eq!(events[3].details["exit_code"], 2);

    let raw = std::fs::read_to_string(&log_path).unwrap();
    assert!(!raw.contains("top secret answer"));
    assert!(!raw.contains("question"));
}

#[test]
fn test_batch_preserves_order_and_isolates_failures() {
    let executor = Arc::new(RecordingExecutor::with(|command| {
        let prompt = command.stdin().unwrap_or_default().to_string();
        if prompt.contains("fail") {
            Ok(outcome(1, "", "failed on purpose"))
        } else {
            Ok(outcome(0, &format!("answer to {}", prompt), ""))
        }
    }));
    let bridge = bridge(executor.clone());

    let tasks = vec![
        AgentTask::new("codex", "one"),
        AgentTask::new("codex", "please fail"),
        AgentTask::new("nope", "three"),
        AgentTask {
            label: Some("mine".to_string()),
            ..AgentTask::new("claude", "four")
        },
    ];
    let response = bridge.batch(&tasks, Some(2), &CancelToken::new());

    let labels: Vec<_> = response.results.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, ["codex", "codex-2", "nope", "mine"]);

    match &response.results[0].outcome {
        TaskOutcome::Result(result) => assert_eq!(result.content, "answer to one"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    match &response.results[1].outcome {
        TaskOutcome::Error(error) => {
            assert_eq!(error.kind, ErrorKind::AgentExecution);
            assert_eq!(error.exit_code, Some(1));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    match &response.results[2].outcome {
        TaskOutcome::Error(error) => assert_eq!(error.kind, ErrorKind::UnknownAgent),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(response.results[3].is_success());
    assert_eq!(response.succeeded(), 2);
    // The unknown agent never reached the executor
    assert_eq!(executor.spawn_count(), 3);
}

#[test]
fn test_batch_respects_max_concurrency() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let executor = {
        let running = running.clone();
        let peak = peak.clone();
        Arc::new(RecordingExecutor::with(move |_| {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            running.fetch_sub(1, Ordering::SeqCst);
            Ok(outcome(0, "ok", ""))
        }))
    };
    let bridge = bridge(executor.clone());

    let tasks: Vec<_> = (0..8).map(|i| AgentTask::new("codex", format!("task {i}"))).collect();
    let response = bridge.batch(&tasks, Some(3), &CancelToken::new());

    assert_eq!(response.results.len(), 8);
    assert_eq!(response.succeeded(), 8);
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(executor.spawn_count(), 8);
}

#[test]
fn test_batch_with_cancelled_token_reports_cancelled() {
    let executor = Arc::new(RecordingExecutor::returning(outcome(0, "ok", "")));
    let bridge = bridge(executor.clone());
    let cancel = CancelToken::new();
    cancel.cancel();

    let tasks = vec![AgentTask::new("gemini", "a"), AgentTask::new("claude", "b")];
    let response = bridge.batch(&tasks, None, &cancel);

    for result in &response.results {
        match &result.outcome {
            TaskOutcome::Error(error) => assert_eq!(error.kind, ErrorKind::Cancelled),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(executor.spawn_count(), 0);
}

#[test]
fn test_empty_batch() {
    let bridge = bridge(Arc::new(RecordingExecutor::returning(outcome(0, "", ""))));
    let response = bridge.batch(&[], Some(4), &CancelToken::new());
    assert!(response.results.is_empty());
}

#[test]
fn test_list_agents() {
    let bridge = bridge(Arc::new(RecordingExecutor::returning(outcome(0, "", ""))));
    assert_eq!(bridge.list_agents(), ["gemini", "codex", "claude"]);
}

#[test]
fn test_detect_agents_reports_missing_binaries() {
    let mut config = Config::default();
    for id in AgentId::ALL {
        config.agents.insert(
            id,
            AgentSettings {
                binary: Some(format!("nexus-missing-{}-binary", id)),
                ..AgentSettings::default()
            },
        );
    }
    let executor = Arc::new(RecordingExecutor::not_found());
    let bridge = Bridge::with_executor(config, executor.clone());

    let detected = bridge.detect_agents();
    assert_eq!(detected.len(), 3);
    assert!(detected.iter().all(|a| !a.found));
    assert_eq!(detected[1].agent, AgentId::Codex);
    assert_eq!(executor.spawn_count(), 0);
}
