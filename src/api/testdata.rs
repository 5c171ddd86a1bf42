//! Test-data API endpoints
//!
//! The generate endpoint validates the requested count against the
//! configured per-request maximum before anything is written; the
//! generator itself enforces no bound.

use axum::{
    extract::{Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{ApiError, AppState};

/// Build the test-data router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_handler))
        .route("/clear", delete(clear_handler))
        .route("/stats", get(stats_handler))
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub articles_created: u64,
    pub requested_count: u32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub records_deleted: u64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub total_categories: usize,
    pub categories: Vec<StatsCategory>,
}

#[derive(Debug, Serialize)]
pub struct StatsCategory {
    pub name: String,
    pub slug: String,
}

/// POST /api/v1/testdata/generate?count=N - generate synthetic articles
pub async fn generate_handler(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let max_count = state.testdata_config.max_count;
    let count = query.count.unwrap_or(1000);
    if count <= 0 || count > max_count as i64 {
        return Err(ApiError::validation_error(format!(
            "Count must be between 1 and {}",
            max_count
        )));
    }
    let count = count as u32;

    let articles_created = state.testdata_service.generate(count).await?;

    Ok(Json(GenerateResponse {
        success: true,
        articles_created,
        requested_count: count,
        message: format!("Successfully generated {} test articles", articles_created),
    }))
}

/// DELETE /api/v1/testdata/clear - remove synthetic content
pub async fn clear_handler(
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>, ApiError> {
    let records_deleted = state.testdata_service.clear().await?;

    Ok(Json(ClearResponse {
        success: true,
        records_deleted,
        message: format!("Successfully cleared {} records", records_deleted),
    }))
}

/// GET /api/v1/testdata/stats - category catalog state
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let categories = state.testdata_service.ensure_categories().await?;

    Ok(Json(StatsResponse {
        success: true,
        total_categories: categories.len(),
        categories: categories
            .into_iter()
            .map(|c| StatsCategory {
                name: c.name,
                slug: c.slug,
            })
            .collect(),
    }))
}
