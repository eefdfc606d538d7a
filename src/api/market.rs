use super::{parse_interval, parse_period};
use crate::error::{AppError, Result};
use crate::services::{compute_signal, text_summary};
use crate::types::{HistoryKey, PricePoint, PriceSeries, SignalResult};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Query params for history lookups.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
    pub period: Option<String>,
    pub interval: Option<String>,
}

/// Fetch through the memo; only non-empty series are memoized.
async fn memoized_history(state: &AppState, key: HistoryKey) -> PriceSeries {
    if let Some(series) = state.history_memo.get(&key) {
        debug!("History memo hit for {}", key);
        return series;
    }

    let series = state
        .pipeline
        .fetcher()
        .fetch_history(&key.symbol, key.period, key.interval)
        .await;
    remember(state, &series);
    series
}

fn remember(state: &AppState, series: &PriceSeries) {
    if !series.is_empty() {
        state.history_memo.cleanup();
        state.history_memo.insert(series.key(), series.clone());
    }
}

fn history_key(state: &AppState, symbol: &str, query: &HistoryQuery) -> Result<HistoryKey> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(AppError::BadRequest("symbol is required".to_string()));
    }
    let defaults = &state.config.analysis;
    Ok(HistoryKey::new(
        symbol,
        parse_period(query.period.as_deref(), defaults.period)?,
        parse_interval(query.interval.as_deref(), defaults.interval)?,
    ))
}

/// GET /mcp/fetch_stock?symbol=AAPL,MSFT
///
/// Returns `{symbol: [bars]}` keyed by each symbol as requested; an unknown
/// symbol maps to an empty list.
async fn fetch_stock(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<BTreeMap<String, Vec<PricePoint>>>> {
    let requested: Vec<String> = query
        .symbol
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if requested.is_empty() {
        return Err(AppError::BadRequest("symbol is required".to_string()));
    }

    let defaults = &state.config.analysis;
    let period = parse_period(query.period.as_deref(), defaults.period)?;
    let interval = parse_interval(query.interval.as_deref(), defaults.interval)?;

    let mut out = BTreeMap::new();
    let mut missing = Vec::new();
    for symbol in requested {
        match state
            .history_memo
            .get(&HistoryKey::new(&symbol, period, interval))
        {
            Some(series) => {
                out.insert(symbol, series.points);
            }
            None => missing.push(symbol),
        }
    }

    // `missing` holds no blanks, so results line up one to one
    let fetched = state
        .pipeline
        .fetcher()
        .fetch_many(&missing, period, interval)
        .await;
    for (symbol, series) in missing.into_iter().zip(fetched) {
        remember(&state, &series);
        out.insert(symbol, series.points);
    }

    Ok(Json(out))
}

/// Signal response for one symbol.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResponse {
    pub symbol: String,
    pub points: usize,
    pub last_close: Option<f64>,
    pub signal: SignalResult,
    pub summary: String,
}

/// GET /api/signal/:symbol
async fn get_signal(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SignalResponse>> {
    let key = history_key(&state, &symbol, &query)?;
    let series = memoized_history(&state, key).await;

    let analysis = &state.config.analysis;
    let signal = compute_signal(&series.closes(), analysis.window_short, analysis.window_long);
    let summary = text_summary(&series.symbol, &series, &signal);

    Ok(Json(SignalResponse {
        symbol: series.symbol.clone(),
        points: series.len(),
        last_close: series.last_close(),
        signal,
        summary,
    }))
}

/// GET /api/latest/:symbol
async fn get_latest_close(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let close = state.pipeline.fetcher().latest_close(&symbol).await;
    Ok(Json(serde_json::json!({
        "symbol": symbol.trim().to_uppercase(),
        "close": close,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mcp/fetch_stock", get(fetch_stock))
        .route("/api/signal/:symbol", get(get_signal))
        .route("/api/latest/:symbol", get(get_latest_close))
}
