pub mod chart;
pub mod health;
pub mod insight;
pub mod market;

use crate::error::{AppError, Result};
use crate::types::{HistoryInterval, HistoryPeriod};
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Largest accepted upload (chart screenshots).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(market::router())
        .merge(chart::router())
        .merge(insight::router())
}

/// The full application: routes, layers and state.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router()
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub(crate) fn parse_period(value: Option<&str>, default: HistoryPeriod) -> Result<HistoryPeriod> {
    match value {
        None => Ok(default),
        Some(v) => HistoryPeriod::from_str(v.trim())
            .ok_or_else(|| AppError::BadRequest(format!("unsupported period: {}", v))),
    }
}

pub(crate) fn parse_interval(
    value: Option<&str>,
    default: HistoryInterval,
) -> Result<HistoryInterval> {
    match value {
        None => Ok(default),
        Some(v) => HistoryInterval::from_str(v.trim())
            .ok_or_else(|| AppError::BadRequest(format!("unsupported interval: {}", v))),
    }
}
