use crate::error::{AppError, Result};
use crate::types::{ImageInsight, ImageReport, TrendLabel};
use crate::AppState;
use axum::{
    extract::{Multipart, Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pull the bytes of the `file` field (or the first field) from an upload.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>> {
    let mut first: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let is_file = field.name() == Some("file");
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if is_file {
            return Ok(bytes.to_vec());
        }
        if first.is_none() {
            first = Some(bytes.to_vec());
        }
    }

    first.ok_or_else(|| AppError::BadRequest("no file uploaded".to_string()))
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub trend: Option<TrendLabel>,
    pub summary: ImageReport,
}

/// POST /mcp/analyze_chart (multipart, field `file`)
async fn analyze_chart(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ChartResponse>> {
    let bytes = read_upload(multipart).await?;
    debug!("Analyzing uploaded chart ({} bytes)", bytes.len());

    let summary = state.pipeline.analyze_image(&bytes).await;

    Ok(Json(ChartResponse {
        trend: summary.trend(),
        summary,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartInsightQuery {
    pub ticker: Option<String>,
}

/// POST /api/chart/insight?ticker=AAPL (multipart, field `file`)
async fn chart_insight(
    State(state): State<AppState>,
    Query(query): Query<ChartInsightQuery>,
    multipart: Multipart,
) -> Result<Json<ImageInsight>> {
    let bytes = read_upload(multipart).await?;
    let insight = state
        .pipeline
        .analyze_image_and_data(&bytes, query.ticker.as_deref())
        .await;
    Ok(Json(insight))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mcp/analyze_chart", post(analyze_chart))
        .route("/api/chart/insight", post(chart_insight))
}
