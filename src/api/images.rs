//! Image API endpoints
//!
//! Multipart upload, a JSON listing consumed by the editor's image
//! picker, and deletion (which also removes the stored binary).

use axum::{
    extract::{Multipart, Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::common::{ApiError, AppState};
use crate::models::ImageAsset;

/// Build the images router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_images_handler).post(upload_image_handler))
        .route(
            "/{id}",
            get(get_image_handler).delete(delete_image_handler),
        )
}

/// Image listing entry for the editor integration.
///
/// `alt_text` falls back to the original filename so the editor always
/// has something to show.
#[derive(Debug, Serialize)]
pub struct ImageListEntry {
    pub id: i64,
    pub file_name: String,
    pub original_file_name: String,
    pub file_path: String,
    pub alt_text: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl From<ImageAsset> for ImageListEntry {
    fn from(image: ImageAsset) -> Self {
        let alt_text = image
            .alt_text
            .clone()
            .unwrap_or_else(|| image.original_file_name.clone());
        Self {
            id: image.id,
            file_name: image.file_name,
            original_file_name: image.original_file_name,
            file_path: image.file_path,
            alt_text,
            width: image.width,
            height: image.height,
        }
    }
}

/// Full image metadata response
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: i64,
    pub file_name: String,
    pub original_file_name: String,
    pub file_path: String,
    pub content_type: String,
    pub file_size_bytes: i64,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub created_at: String,
}

impl From<ImageAsset> for ImageResponse {
    fn from(image: ImageAsset) -> Self {
        Self {
            id: image.id,
            file_name: image.file_name,
            original_file_name: image.original_file_name,
            file_path: image.file_path,
            content_type: image.content_type,
            file_size_bytes: image.file_size_bytes,
            alt_text: image.alt_text,
            caption: image.caption,
            width: image.width,
            height: image.height,
            created_at: image.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/v1/images - JSON listing for the editor integration
pub async fn list_images_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ImageListEntry>>, ApiError> {
    let images = state.image_service.list().await?;
    Ok(Json(images.into_iter().map(ImageListEntry::from).collect()))
}

/// GET /api/v1/images/{id} - image metadata
pub async fn get_image_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ImageResponse>, ApiError> {
    let image = state
        .image_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Image not found: {}", id)))?;
    Ok(Json(image.into()))
}

/// POST /api/v1/images - upload an image
///
/// Accepts multipart/form-data with a `file` field plus optional
/// `alt_text` and `caption` text fields.
pub async fn upload_image_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageResponse>, ApiError> {
    let mut file: Option<(Vec<u8>, String, String)> = None;
    let mut alt_text: Option<String> = None;
    let mut caption: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field.bytes().await.map_err(|e| {
                    ApiError::validation_error(format!("Failed to read file: {}", e))
                })?;
                file = Some((data.to_vec(), file_name, content_type));
            }
            "alt_text" => {
                alt_text = field.text().await.ok().filter(|s| !s.is_empty());
            }
            "caption" => {
                caption = field.text().await.ok().filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let (data, file_name, content_type) =
        file.ok_or_else(|| ApiError::validation_error("No file provided"))?;

    let asset = state
        .image_service
        .save_upload(&data, &file_name, &content_type, alt_text, caption)
        .await?;

    Ok(Json(asset.into()))
}

/// DELETE /api/v1/images/{id} - delete an image and its binary
pub async fn delete_image_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.image_service.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
