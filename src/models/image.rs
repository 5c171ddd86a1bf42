//! Image asset model
//!
//! Metadata rows for uploaded binaries. The generated `file_name` is
//! unique and doubles as the key into the file store; the binary itself
//! never passes through the repository layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uploaded image metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: i64,
    /// Generated unique filename (storage key)
    pub file_name: String,
    /// Filename as uploaded by the user
    pub original_file_name: String,
    /// Public path the file is served from
    pub file_path: String,
    pub content_type: String,
    pub file_size_bytes: i64,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    /// Pixel width, when it could be read from the file header
    pub width: Option<i32>,
    /// Pixel height, when it could be read from the file header
    pub height: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a stored upload
#[derive(Debug, Clone)]
pub struct CreateImageInput {
    pub file_name: String,
    pub original_file_name: String,
    pub file_path: String,
    pub content_type: String,
    pub file_size_bytes: i64,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}
