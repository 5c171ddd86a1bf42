//! Page API endpoints
//!
//! Public routes serve published pages and the navigation menu;
//! authoring routes manage the full set.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::common::{ApiError, AppState};
use crate::models::{CreatePageInput, Page, UpdatePageInput};

/// Build the pages router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pages_handler).post(create_page_handler))
        .route("/all", get(list_all_pages_handler))
        .route("/nav", get(nav_pages_handler))
        .route(
            "/{slug}",
            get(get_page_handler)
                .put(update_page_handler)
                .delete(delete_page_handler),
        )
}

/// Page response
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_published: bool,
    pub show_in_nav: bool,
    pub nav_order: i32,
    pub nav_text: Option<String>,
    pub nav_icon: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            slug: page.slug,
            title: page.title,
            content: page.content,
            meta_description: page.meta_description,
            meta_keywords: page.meta_keywords,
            is_published: page.is_published,
            show_in_nav: page.show_in_nav,
            nav_order: page.nav_order,
            nav_text: page.nav_text,
            nav_icon: page.nav_icon,
            published_at: page.published_at.map(|dt| dt.to_rfc3339()),
            created_at: page.created_at.to_rfc3339(),
            updated_at: page.updated_at.to_rfc3339(),
        }
    }
}

/// Navigation menu entry
#[derive(Debug, Serialize)]
pub struct NavEntry {
    pub slug: String,
    pub label: String,
    pub icon: Option<String>,
    pub order: i32,
}

/// GET /api/v1/pages - list published pages
pub async fn list_pages_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<PageResponse>>, ApiError> {
    let pages = state.page_service.list_published().await?;
    Ok(Json(pages.into_iter().map(PageResponse::from).collect()))
}

/// GET /api/v1/pages/all - list every page (authoring views)
pub async fn list_all_pages_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<PageResponse>>, ApiError> {
    let pages = state.page_service.list().await?;
    Ok(Json(pages.into_iter().map(PageResponse::from).collect()))
}

/// GET /api/v1/pages/nav - navigation menu entries
pub async fn nav_pages_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<NavEntry>>, ApiError> {
    let pages = state.page_service.nav_pages().await?;
    Ok(Json(
        pages
            .iter()
            .map(|p| NavEntry {
                slug: p.slug.clone(),
                label: p.nav_label().to_string(),
                icon: p.nav_icon.clone(),
                order: p.nav_order,
            })
            .collect(),
    ))
}

/// GET /api/v1/pages/{slug} - published page detail
pub async fn get_page_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .page_service
        .get_published_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Page not found: {}", slug)))?;
    Ok(Json(page.into()))
}

/// POST /api/v1/pages - create a page
pub async fn create_page_handler(
    State(state): State<AppState>,
    Json(input): Json<CreatePageInput>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state.page_service.create(input).await?;
    Ok(Json(page.into()))
}

/// PUT /api/v1/pages/{id} - update a page
pub async fn update_page_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePageInput>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state.page_service.update(id, input).await?;
    Ok(Json(page.into()))
}

/// DELETE /api/v1/pages/{id} - delete a page
pub async fn delete_page_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.page_service.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
