//! Local language model client.
//!
//! Tries the HTTP completion endpoint first, then the command-line runner,
//! then gives up with a fixed fallback message. Each attempt yields a
//! [`TransportOutcome`]; nothing here returns an error to the caller.

use crate::config::LlmConfig;
use crate::types::{InsightResponse, InsightSource, Transport, TransportAttempt, TransportOutcome};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Timeout for the model-listing availability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest slice of an unrecognized body kept in a Malformed outcome.
const MAX_BODY_PREVIEW: usize = 200;

/// Message returned when neither transport produced a completion.
pub fn fallback_message(model: &str) -> String {
    format!(
        "⚠️ Ollama model '{}' not reachable.\n\
         Start Ollama server in a terminal with:\n   \
         ollama pull llama3 && ollama serve\n\n\
         Fallback analysis:\n\
         - Review short & long MA trends from rules.\n\
         - Check ViT trend if chart uploaded.\n\
         - Always verify with real-time market data.",
        model
    )
}

/// Extract completion text from any of the accepted response shapes:
/// `{"completion": ..}`, `{"choices": [{"text": ..}]}` or `{"text": ..}`.
///
/// Returns `None` when the body matches none of them.
pub fn parse_completion(body: &Value) -> Option<String> {
    if let Some(completion) = body.get("completion") {
        return completion.as_str().map(str::to_string);
    }
    if let Some(first) = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    {
        return first.get("text").and_then(Value::as_str).map(str::to_string);
    }
    body.get("text").and_then(Value::as_str).map(str::to_string)
}

fn preview(body: &Value) -> String {
    let text = body.to_string();
    match text.char_indices().nth(MAX_BODY_PREVIEW) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}

/// Client for a locally hosted model.
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// One completion request over HTTP.
    pub async fn query_http(&self, prompt: &str) -> TransportOutcome {
        let payload = json!({
            "model": self.config.model_name,
            "prompt": prompt,
            "max_tokens": self.config.max_tokens,
        });

        let response = match self
            .client
            .post(&self.config.endpoint_url)
            .json(&payload)
            .timeout(self.config.timeout_http)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return TransportOutcome::Timeout,
            Err(e) => return TransportOutcome::Unreachable(e.to_string()),
        };

        if response.status() != StatusCode::OK {
            return TransportOutcome::Unreachable(format!("HTTP {}", response.status()));
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) if e.is_timeout() => return TransportOutcome::Timeout,
            Err(e) => return TransportOutcome::Malformed(e.to_string()),
        };

        match parse_completion(&body) {
            Some(text) if !text.trim().is_empty() => TransportOutcome::Success(text),
            Some(_) => TransportOutcome::Malformed("empty completion".to_string()),
            None => TransportOutcome::Malformed(format!(
                "unrecognized response shape: {}",
                preview(&body)
            )),
        }
    }

    /// One non-streaming run of the command-line model runner, prompt on stdin.
    pub async fn query_cli(&self, prompt: &str) -> TransportOutcome {
        let mut child = match Command::new(&self.config.cli_binary)
            .arg("run")
            .arg(&self.config.model_name)
            .arg("--no-stream")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(c) => c,
            Err(e) => {
                return TransportOutcome::Unreachable(format!(
                    "failed to start {}: {}",
                    self.config.cli_binary, e
                ))
            }
        };

        let stdin = child.stdin.take();
        let input = prompt.as_bytes().to_vec();
        let run = async move {
            if let Some(mut stdin) = stdin {
                // The runner may exit without reading everything.
                if let Err(e) = stdin.write_all(&input).await {
                    debug!("CLI stdin write failed: {}", e);
                }
                drop(stdin);
            }
            child.wait_with_output().await
        };

        let output = match tokio::time::timeout(self.config.timeout_cli, run).await {
            Err(_) => return TransportOutcome::Timeout,
            Ok(Err(e)) => return TransportOutcome::Unreachable(e.to_string()),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return TransportOutcome::Unreachable(format!(
                "{} exited with {}: {}",
                self.config.cli_binary,
                output.status,
                stderr.trim()
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            TransportOutcome::Malformed("empty output".to_string())
        } else {
            TransportOutcome::Success(text)
        }
    }

    /// Get a completion: HTTP, then CLI, then the fallback message.
    pub async fn query(&self, prompt: &str) -> InsightResponse {
        let mut attempts = Vec::with_capacity(2);

        for transport in [Transport::Http, Transport::Cli] {
            let outcome = match transport {
                Transport::Http => self.query_http(prompt).await,
                Transport::Cli => self.query_cli(prompt).await,
            };

            if let Some(text) = outcome.text().map(str::to_string) {
                debug!("LLM {} returned {} chars", transport, text.len());
                attempts.push(TransportAttempt { transport, outcome });
                return InsightResponse {
                    text,
                    source: InsightSource::from(transport),
                    attempts,
                };
            }

            warn!("LLM {} attempt failed: {:?}", transport, outcome);
            attempts.push(TransportAttempt { transport, outcome });
        }

        info!(
            "Model '{}' not reachable, using fallback text",
            self.config.model_name
        );
        InsightResponse {
            text: fallback_message(&self.config.model_name),
            source: InsightSource::Fallback,
            attempts,
        }
    }

    /// Whether the backend answers its model listing endpoint.
    pub async fn is_available(&self) -> bool {
        match self
            .client
            .get(&self.config.models_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r.status() == StatusCode::OK,
            Err(e) => {
                debug!("LLM availability check failed: {}", e);
                false
            }
        }
    }

    /// Probe availability up to `attempts` times, for a backend still starting.
    pub async fn probe(&self, attempts: usize) -> bool {
        for attempt in 1..=attempts.max(1) {
            if self.is_available().await {
                return true;
            }
            debug!("LLM backend not available (attempt {})", attempt);
        }
        warn!(
            "LLM backend at {} not reachable. Start it with: ollama serve",
            self.config.models_url
        );
        false
    }
}
