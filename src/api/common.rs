//! Shared API state and error envelope
//!
//! `AppState` carries the services into the handlers; `ApiError` is the
//! JSON error envelope every endpoint returns on failure, with service
//! errors mapped onto HTTP status codes here so handlers can use `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::TestDataConfig;
use crate::services::{
    ArticleService, ArticleServiceError, CategoryService, CategoryServiceError, ImageService,
    ImageServiceError, PageService, PageServiceError, TestDataService, TestDataServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub article_service: Arc<ArticleService>,
    pub category_service: Arc<CategoryService>,
    pub page_service: Arc<PageService>,
    pub image_service: Arc<ImageService>,
    pub testdata_service: Arc<TestDataService>,
    pub testdata_config: Arc<TestDataConfig>,
}

/// Error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self)).into_response()
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(e: ArticleServiceError) -> Self {
        match e {
            ArticleServiceError::NotFound(_) => Self::not_found(e.to_string()),
            ArticleServiceError::ValidationError(_) => Self::validation_error(e.to_string()),
            ArticleServiceError::DuplicateSlug(_) => Self::conflict(e.to_string()),
            ArticleServiceError::InternalError(inner) => {
                tracing::error!(error = %inner, "Article operation failed");
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::NotFound(_) => Self::not_found(e.to_string()),
            CategoryServiceError::ValidationError(_) => Self::validation_error(e.to_string()),
            CategoryServiceError::DuplicateName(_) | CategoryServiceError::DuplicateSlug(_) => {
                Self::conflict(e.to_string())
            }
            CategoryServiceError::CannotDeleteDefault => Self::validation_error(e.to_string()),
            CategoryServiceError::InternalError(inner) => {
                tracing::error!(error = %inner, "Category operation failed");
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<PageServiceError> for ApiError {
    fn from(e: PageServiceError) -> Self {
        match e {
            PageServiceError::NotFound(_) => Self::not_found(e.to_string()),
            PageServiceError::ValidationError(_) => Self::validation_error(e.to_string()),
            PageServiceError::DuplicateSlug(_) => Self::conflict(e.to_string()),
            PageServiceError::InternalError(inner) => {
                tracing::error!(error = %inner, "Page operation failed");
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<ImageServiceError> for ApiError {
    fn from(e: ImageServiceError) -> Self {
        match e {
            ImageServiceError::NotFound(_) => Self::not_found(e.to_string()),
            ImageServiceError::ValidationError(_) => Self::validation_error(e.to_string()),
            ImageServiceError::InternalError(inner) => {
                tracing::error!(error = %inner, "Image operation failed");
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<TestDataServiceError> for ApiError {
    fn from(e: TestDataServiceError) -> Self {
        match e {
            TestDataServiceError::ValidationError(_) => Self::validation_error(e.to_string()),
            TestDataServiceError::InternalError(inner) => {
                tracing::error!(error = %inner, "Test-data operation failed");
                Self::internal_error("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::validation_error("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal_error("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_slug_maps_to_conflict() {
        let api: ApiError = ArticleServiceError::DuplicateSlug("post".to_string()).into();
        assert_eq!(api.error.code, "CONFLICT");
        assert!(api.error.message.contains("post"));
    }

    #[test]
    fn test_internal_error_is_not_leaked() {
        let api: ApiError =
            ArticleServiceError::InternalError(anyhow::anyhow!("db password wrong")).into();
        assert_eq!(api.error.code, "INTERNAL_ERROR");
        assert!(!api.error.message.contains("password"));
    }
}
