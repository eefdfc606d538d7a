use super::{parse_interval, parse_period};
use crate::error::{AppError, Result};
use crate::services::read_symbols;
use crate::types::TickerReport;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Optional period/interval overrides.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub period: Option<String>,
    pub interval: Option<String>,
}

/// GET /api/insight/:symbol
async fn ticker_insight(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<TickerReport>> {
    if symbol.trim().is_empty() {
        return Err(AppError::BadRequest("symbol is required".to_string()));
    }
    let defaults = &state.config.analysis;
    let period = parse_period(query.period.as_deref(), defaults.period)?;
    let interval = parse_interval(query.interval.as_deref(), defaults.interval)?;

    let report = state
        .pipeline
        .analyze_ticker_with(&symbol, period, interval)
        .await;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct PortfolioRequest {
    pub symbols: Vec<String>,
    pub period: Option<String>,
    pub interval: Option<String>,
}

/// POST /api/portfolio
async fn portfolio(
    State(state): State<AppState>,
    Json(request): Json<PortfolioRequest>,
) -> Result<Json<Vec<TickerReport>>> {
    let defaults = &state.config.analysis;
    let period = parse_period(request.period.as_deref(), defaults.period)?;
    let interval = parse_interval(request.interval.as_deref(), defaults.interval)?;

    let reports = state
        .pipeline
        .analyze_portfolio_with(&request.symbols, period, interval)
        .await;
    Ok(Json(reports))
}

/// POST /api/portfolio/csv (body: CSV with a `Symbol` column)
async fn portfolio_csv(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
    body: String,
) -> Result<Json<Vec<TickerReport>>> {
    let symbols = read_symbols(body.as_bytes())?;
    if symbols.is_empty() {
        return Err(AppError::BadRequest("no symbols found in CSV".to_string()));
    }

    let defaults = &state.config.analysis;
    let period = parse_period(query.period.as_deref(), defaults.period)?;
    let interval = parse_interval(query.interval.as_deref(), defaults.interval)?;

    let reports = state
        .pipeline
        .analyze_portfolio_with(&symbols, period, interval)
        .await;
    Ok(Json(reports))
}

#[derive(Debug, Serialize)]
pub struct LlmStatus {
    pub available: bool,
    pub model: String,
    pub endpoint: String,
}

/// GET /api/llm/status
async fn llm_status(State(state): State<AppState>) -> Json<LlmStatus> {
    let llm = state.pipeline.llm();
    Json(LlmStatus {
        available: llm.is_available().await,
        model: llm.config().model_name.clone(),
        endpoint: llm.config().endpoint_url.clone(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/insight/:symbol", get(ticker_insight))
        .route("/api/portfolio", post(portfolio))
        .route("/api/portfolio/csv", post(portfolio_csv))
        .route("/api/llm/status", get(llm_status))
}
