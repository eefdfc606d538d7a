//! Finsight - stock insight assistant
//!
//! Fetches recent price history, computes a naive moving-average signal,
//! optionally classifies an uploaded chart image, and asks a locally hosted
//! language model for a short human-readable insight.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod tui;
pub mod types;

use config::Config;
use services::{
    load_trend_model, ChartAnalyzer, HistoryCache, HistoryFetcher, InsightPipeline, LlmClient,
    Memo, TrendModel,
};
use sources::{HistorySource, YahooFinanceClient};
use std::sync::Arc;

// Re-export commonly used types
pub use types::*;

/// Application state shared across handlers and the terminal UI.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<InsightPipeline>,
    pub history_memo: Arc<Memo<HistoryKey, PriceSeries>>,
}

impl AppState {
    pub fn new(config: Config, pipeline: InsightPipeline) -> Self {
        let history_memo = Arc::new(Memo::new(config.history_memo_ttl));
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            history_memo,
        }
    }

    /// Wire production services: Yahoo Finance, the CSV cache, the LLM
    /// client and the chart classifier, which is loaded here exactly once.
    pub fn from_config(config: Config) -> Self {
        let model = load_trend_model(&config.vision);
        let pipeline = build_pipeline(&config, Arc::new(YahooFinanceClient::new()), model);
        Self::new(config, pipeline)
    }
}

/// Assemble the insight pipeline from its parts.
pub fn build_pipeline(
    config: &Config,
    source: Arc<dyn HistorySource>,
    model: Option<Arc<dyn TrendModel>>,
) -> InsightPipeline {
    let fetcher = HistoryFetcher::new(source, HistoryCache::new(config.cache_dir.clone()));
    InsightPipeline::new(
        fetcher,
        LlmClient::new(config.llm.clone()),
        ChartAnalyzer::new(model),
        config.analysis.clone(),
    )
}
