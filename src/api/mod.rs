//! API layer - HTTP handlers and routing
//!
//! Endpoints live under `/api/v1`; uploaded binaries are served from
//! `/uploads`. Authentication is handled by the deployment in front of
//! this server (reverse proxy or gateway), not here.

pub mod articles;
pub mod categories;
pub mod common;
pub mod images;
pub mod pages;
pub mod testdata;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use common::{ApiError, AppState};

/// Build the main API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/articles", articles::router())
        .nest("/categories", categories::router())
        .nest("/pages", pages::router())
        .nest("/images", images::router())
        .nest("/testdata", testdata::router())
}

/// Build the complete router with middleware and static file serving
pub fn build_router(state: AppState, cors_origin: &str, upload_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api/v1", build_api_router())
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
