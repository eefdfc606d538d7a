//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use finsight::config::{Config, LlmConfig};
use finsight::error::{AppError, Result};
use finsight::sources::HistorySource;
use finsight::types::{HistoryKey, PricePoint};
use finsight::{build_pipeline, AppState};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// History source serving fixed closes per symbol; unknown symbols are empty.
pub struct StaticSource {
    closes: HashMap<String, Vec<f64>>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(entries: &[(&str, Vec<f64>)]) -> Self {
        Self {
            closes: entries
                .iter()
                .map(|(s, c)| (s.to_string(), c.clone()))
                .collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A source whose every request errors.
    pub fn failing() -> Self {
        Self {
            closes: HashMap::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn points(closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            time: Utc
                .timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0)
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10_000.0,
        })
        .collect()
}

#[async_trait]
impl HistorySource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_history(&self, key: &HistoryKey) -> Result<Vec<PricePoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::ExternalApi("provider down".to_string()));
        }
        Ok(self
            .closes
            .get(&key.symbol)
            .map(|c| points(c))
            .unwrap_or_default())
    }
}

/// A fresh cache directory per test.
pub fn temp_cache_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "finsight-it-{}-{}-{}",
        name,
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// LLM settings with both transports pointing nowhere.
pub fn unreachable_llm() -> LlmConfig {
    LlmConfig {
        endpoint_url: "http://127.0.0.1:1/v1/completions".to_string(),
        models_url: "http://127.0.0.1:1/v1/models".to_string(),
        cli_binary: "/nonexistent/finsight-llm-runner".to_string(),
        timeout_http: Duration::from_secs(2),
        timeout_cli: Duration::from_secs(2),
        ..LlmConfig::default()
    }
}

pub fn test_config(name: &str) -> Config {
    Config {
        cache_dir: temp_cache_dir(name),
        llm: unreachable_llm(),
        ..Config::default()
    }
}

pub fn test_state(name: &str, source: Arc<StaticSource>) -> AppState {
    let config = test_config(name);
    let pipeline = build_pipeline(&config, source, None);
    AppState::new(config, pipeline)
}
