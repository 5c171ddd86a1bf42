//! Category API endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::common::{ApiError, AppState};
use crate::models::{Category, CreateCategoryInput};

/// Build the categories router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories_handler).post(create_category_handler))
        .route(
            "/{slug}",
            get(get_category_handler)
                .put(update_category_handler)
                .delete(delete_category_handler),
        )
}

/// Input for updating a category
#[derive(Debug, serde::Deserialize)]
pub struct UpdateCategoryBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Category response
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            slug: category.slug,
            name: category.name,
            description: category.description,
            created_at: category.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/v1/categories - list all categories
pub async fn list_categories_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.category_service.list().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// GET /api/v1/categories/{slug} - category detail
pub async fn get_category_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state
        .category_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", slug)))?;
    Ok(Json(category.into()))
}

/// POST /api/v1/categories - create a category
pub async fn create_category_handler(
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state.category_service.create(input).await?;
    Ok(Json(category.into()))
}

/// PUT /api/v1/categories/{slug} - rename or re-describe a category
pub async fn update_category_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<UpdateCategoryBody>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state
        .category_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", slug)))?;

    let updated = state
        .category_service
        .update(category.id, body.name, body.description)
        .await?;
    Ok(Json(updated.into()))
}

/// DELETE /api/v1/categories/{slug} - delete a category
///
/// Articles in the category become uncategorized; the reserved default
/// category is refused.
pub async fn delete_category_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let category = state
        .category_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", slug)))?;

    state.category_service.delete(category.id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
