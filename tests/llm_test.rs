//! LLM transport tests against a throwaway HTTP backend

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use finsight::config::LlmConfig;
use finsight::services::{fallback_message, LlmClient};
use finsight::types::{InsightSource, Transport, TransportOutcome};
use serde_json::{json, Value};
use std::time::Duration;

mod common;

/// Serve `body` for every completion request; returns the completion URL.
async fn spawn_backend(status: StatusCode, body: Value, delay: Duration) -> String {
    let completions = move || {
        let body = body.clone();
        async move {
            tokio::time::sleep(delay).await;
            (status, Json(body))
        }
    };
    let app = Router::new()
        .route("/v1/completions", post(completions))
        .route("/v1/models", get(|| async { Json(json!({"data": []})) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

fn config_for(base: &str, cli: &str) -> LlmConfig {
    LlmConfig {
        endpoint_url: format!("{}/v1/completions", base),
        models_url: format!("{}/v1/models", base),
        cli_binary: cli.to_string(),
        timeout_http: Duration::from_secs(5),
        timeout_cli: Duration::from_secs(5),
        ..LlmConfig::default()
    }
}

#[tokio::test]
async fn test_completion_shapes_parse() {
    let shapes = [
        json!({"completion": "Steady climb. Buy, 70"}),
        json!({"choices": [{"text": "Steady climb. Buy, 70", "index": 0}]}),
        json!({"text": "Steady climb. Buy, 70"}),
    ];

    for shape in shapes {
        let base = spawn_backend(StatusCode::OK, shape, Duration::ZERO).await;
        let client = LlmClient::new(config_for(&base, "/nonexistent/runner"));
        assert_eq!(
            client.query_http("prompt").await,
            TransportOutcome::Success("Steady climb. Buy, 70".to_string())
        );
    }
}

#[tokio::test]
async fn test_unknown_shape_is_malformed() {
    let base = spawn_backend(StatusCode::OK, json!({"output": "??"}), Duration::ZERO).await;
    let client = LlmClient::new(config_for(&base, "/nonexistent/runner"));

    assert!(matches!(
        client.query_http("prompt").await,
        TransportOutcome::Malformed(_)
    ));
}

#[tokio::test]
async fn test_error_status_is_unreachable() {
    let base = spawn_backend(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "model not loaded"}),
        Duration::ZERO,
    )
    .await;
    let client = LlmClient::new(config_for(&base, "/nonexistent/runner"));

    assert!(matches!(
        client.query_http("prompt").await,
        TransportOutcome::Unreachable(_)
    ));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let base = spawn_backend(
        StatusCode::OK,
        json!({"completion": "late"}),
        Duration::from_secs(3),
    )
    .await;
    let mut config = config_for(&base, "/nonexistent/runner");
    config.timeout_http = Duration::from_millis(200);
    let client = LlmClient::new(config);

    assert_eq!(client.query_http("prompt").await, TransportOutcome::Timeout);
}

#[tokio::test]
async fn test_http_success_skips_cli() {
    let base = spawn_backend(StatusCode::OK, json!({"completion": "Hold, 55"}), Duration::ZERO).await;
    let client = LlmClient::new(config_for(&base, "/nonexistent/runner"));

    let response = client.query("prompt").await;
    assert_eq!(response.text, "Hold, 55");
    assert_eq!(response.source, InsightSource::Http);
    assert_eq!(response.attempts.len(), 1);
}

#[tokio::test]
async fn test_both_transports_down_gives_fallback() {
    let client = LlmClient::new(common::unreachable_llm());

    let response = client.query("prompt").await;
    assert_eq!(response.text, fallback_message("llama3:8b"));
    assert!(response.is_fallback());
    assert_eq!(response.attempts.len(), 2);
    assert_eq!(response.attempts[0].transport, Transport::Http);
    assert_eq!(response.attempts[1].transport, Transport::Cli);
    assert!(response.attempts.iter().all(|a| !a.outcome.is_success()));
}

#[tokio::test]
async fn test_fallback_text() {
    let text = fallback_message("llama3:8b");
    assert!(text.starts_with("⚠️ Ollama model 'llama3:8b' not reachable.\n"));
    assert!(text.contains("   ollama pull llama3 && ollama serve\n\nFallback analysis:\n"));
    assert!(text.ends_with("- Always verify with real-time market data."));
}

#[cfg(unix)]
#[tokio::test]
async fn test_cli_transport_used_when_http_down() {
    // `echo run <model> --no-stream` prints its arguments and exits 0
    let mut config = common::unreachable_llm();
    config.cli_binary = "echo".to_string();
    let client = LlmClient::new(config);

    let response = client.query("prompt").await;
    assert_eq!(response.source, InsightSource::Cli);
    assert_eq!(response.text, "run llama3:8b --no-stream");
    assert_eq!(response.attempts.len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_cli_is_unreachable() {
    let mut config = common::unreachable_llm();
    config.cli_binary = "false".to_string();
    let client = LlmClient::new(config);

    assert!(matches!(
        client.query_cli("prompt").await,
        TransportOutcome::Unreachable(_)
    ));
}

/// Write an executable shell script under the temp dir.
#[cfg(unix)]
fn write_script(name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let dir = std::env::temp_dir().join(format!("finsight-cli-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("runner.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[tokio::test]
async fn test_slow_cli_times_out_and_is_killed() {
    let marker = std::env::temp_dir().join(format!("finsight-cli-done-{}", std::process::id()));
    let _ = std::fs::remove_file(&marker);
    let script = write_script(
        "slow",
        &format!("cat >/dev/null\nsleep 2\ntouch '{}'\n", marker.display()),
    );

    let mut config = common::unreachable_llm();
    config.cli_binary = script.display().to_string();
    config.timeout_cli = Duration::from_millis(500);
    let client = LlmClient::new(config);

    let started = std::time::Instant::now();
    assert_eq!(client.query_cli("prompt").await, TransportOutcome::Timeout);
    assert!(started.elapsed() < Duration::from_secs(2));

    // A surviving runner would reach the touch after its sleep
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!marker.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_blank_cli_output_is_malformed() {
    let script = write_script("blank", "cat >/dev/null\nprintf '   \\n'\n");

    let mut config = common::unreachable_llm();
    config.cli_binary = script.display().to_string();
    let client = LlmClient::new(config);

    assert_eq!(
        client.query_cli("prompt").await,
        TransportOutcome::Malformed("empty output".to_string())
    );
}

#[tokio::test]
async fn test_availability_probe() {
    let base = spawn_backend(StatusCode::OK, json!({}), Duration::ZERO).await;
    assert!(LlmClient::new(config_for(&base, "ollama")).is_available().await);
    assert!(!LlmClient::new(common::unreachable_llm()).probe(2).await);
}
