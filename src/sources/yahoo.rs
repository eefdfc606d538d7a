//! Yahoo Finance chart API client.
//!
//! Provides historical OHLC bars for stocks and ETFs through the unofficial
//! chart endpoint (no API key).

use super::HistorySource;
use crate::error::{AppError, Result};
use crate::types::{HistoryKey, PricePoint};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

/// Normalize symbol for Yahoo Finance API.
/// Yahoo uses hyphens instead of dots for share classes (e.g., BRK-B not BRK.B)
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

/// Turn a decoded chart response into bars. Rows without a close are
/// dropped; missing open/high/low fall back to the close.
fn chart_to_points(data: YahooChartResponse) -> Result<Vec<PricePoint>> {
    if let Some(error) = data.chart.error {
        return Err(AppError::ExternalApi(format!(
            "Yahoo API error: {} - {}",
            error.code, error.description
        )));
    }

    let Some(result) = data.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let Some(close) = closes.get(i).copied().flatten() else {
            continue;
        };
        let Some(time) = Utc.timestamp_opt(timestamp, 0).single() else {
            continue;
        };

        let point = PricePoint {
            time,
            open: opens.get(i).copied().flatten().unwrap_or(close),
            high: highs.get(i).copied().flatten().unwrap_or(close),
            low: lows.get(i).copied().flatten().unwrap_or(close),
            close,
            volume: volumes.get(i).copied().flatten().unwrap_or(0) as f64,
        };

        if point.is_valid() {
            points.push(point);
        }
    }

    Ok(points)
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a different host (used for tests and proxies).
    pub fn with_base_url(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chart_url(&self, key: &HistoryKey) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval={}&includePrePost=false",
            self.base_url,
            normalize_yahoo_symbol(&key.symbol),
            key.period,
            key.interval
        )
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistorySource for YahooFinanceClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_history(&self, key: &HistoryKey) -> Result<Vec<PricePoint>> {
        let url = self.chart_url(key);
        debug!("Fetching Yahoo Finance data: {}", url);

        let response = self.client.get(&url).send().await?;

        // Unknown symbols come back as 404 with an error body; treat as empty.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("Yahoo has no chart for {}", key.symbol);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Yahoo API error: {}",
                response.status()
            )));
        }

        let data: YahooChartResponse = response.json().await?;
        chart_to_points(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HistoryInterval, HistoryPeriod};

    #[test]
    fn test_normalize_yahoo_symbol() {
        assert_eq!(normalize_yahoo_symbol("aapl"), "AAPL");
        assert_eq!(normalize_yahoo_symbol("BRK.B"), "BRK-B");
        assert_eq!(normalize_yahoo_symbol(" msft "), "MSFT");
    }

    #[test]
    fn test_chart_url() {
        let client = YahooFinanceClient::with_base_url("http://localhost:9999/");
        let key = HistoryKey::new("brk.b", HistoryPeriod::OneMonth, HistoryInterval::OneDay);

        assert_eq!(
            client.chart_url(&key),
            "http://localhost:9999/v8/finance/chart/BRK-B?range=1mo&interval=1d&includePrePost=false"
        );
    }

    #[test]
    fn test_chart_to_points_drops_missing_closes() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL"},
                    "timestamp": [1700000000, 1700086400, 1700172800],
                    "indicators": {"quote": [{
                        "open": [150.0, null, 152.0],
                        "high": [155.0, 156.0, null],
                        "low": [148.0, 149.0, 150.0],
                        "close": [153.0, null, 155.0],
                        "volume": [50000000, 51000000, null]
                    }]}
                }],
                "error": null
            }
        }"#;
        let data: YahooChartResponse = serde_json::from_str(json).unwrap();
        let points = chart_to_points(data).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close, 153.0);
        assert_eq!(points[0].time.timestamp(), 1700000000);
        assert_eq!(points[1].high, 155.0);
        assert_eq!(points[1].volume, 0.0);
    }

    #[test]
    fn test_chart_to_points_api_error() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;
        let data: YahooChartResponse = serde_json::from_str(json).unwrap();
        let err = chart_to_points(data).unwrap_err();

        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_chart_to_points_empty_result() {
        let json = r#"{"chart": {"result": [], "error": null}}"#;
        let data: YahooChartResponse = serde_json::from_str(json).unwrap();

        assert!(chart_to_points(data).unwrap().is_empty());
    }
}
