use super::{ImageReport, PriceSeries, SignalResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which LLM transport was tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Http,
    Cli,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Http => write!(f, "http"),
            Transport::Cli => write!(f, "cli"),
        }
    }
}

/// Result of one transport attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TransportOutcome {
    Success(String),
    Unreachable(String),
    Timeout,
    Malformed(String),
}

impl TransportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransportOutcome::Success(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            TransportOutcome::Success(text) => Some(text),
            _ => None,
        }
    }
}

/// A transport attempt and how it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportAttempt {
    pub transport: Transport,
    pub outcome: TransportOutcome,
}

/// Where the insight text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    Http,
    Cli,
    Fallback,
    /// No LLM call was made (no data for the ticker).
    None,
}

impl From<Transport> for InsightSource {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Http => InsightSource::Http,
            Transport::Cli => InsightSource::Cli,
        }
    }
}

/// Text returned by the insight requester plus the attempts behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightResponse {
    pub text: String,
    pub source: InsightSource,
    pub attempts: Vec<TransportAttempt>,
}

impl InsightResponse {
    pub fn is_fallback(&self) -> bool {
        self.source == InsightSource::Fallback
    }
}

/// Aggregated analysis for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerReport {
    pub ticker: String,
    pub history: Option<PriceSeries>,
    pub signal: Option<SignalResult>,
    pub insight: String,
    pub insight_source: InsightSource,
}

impl TickerReport {
    /// Report for a ticker the provider returned nothing for.
    pub fn no_data(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            history: None,
            signal: None,
            insight: format!("No data available for {}.", ticker),
            insight_source: InsightSource::None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.history.as_ref().is_some_and(|h| !h.is_empty())
    }
}

/// Chart analysis plus the insight written from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInsight {
    pub image: ImageReport,
    /// Ticker whose report was folded into the prompt, if any.
    pub ticker: Option<String>,
    pub insight: InsightResponse,
}
