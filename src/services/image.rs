//! Image service
//!
//! Upload handling for image assets: validation against the upload
//! configuration, unique filename resolution, binary storage through
//! the `FileStore` collaborator, and best-effort pixel-dimension
//! probing from the file header.
//!
//! The service owns the pairing invariant between the metadata row and
//! the stored binary: a delete removes the row first and then the
//! binary, logging (not failing) when the file is already gone.

use crate::config::UploadConfig;
use crate::db::repositories::ImageRepository;
use crate::models::{CreateImageInput, ImageAsset};
use crate::services::slug;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

/// Error types for image service operations
#[derive(Debug, thiserror::Error)]
pub enum ImageServiceError {
    /// Image not found
    #[error("Image not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Binary storage collaborator.
///
/// The image service never touches paths directly; it hands the store a
/// filename and bytes and records whatever public path comes back.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes under the given filename, returning the public path
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String>;

    /// Remove a stored file
    async fn delete(&self, file_name: &str) -> Result<()>;

    /// Check whether a file is stored
    async fn exists(&self, file_name: &str) -> Result<bool>;
}

/// Local-disk file store serving files under a public URL prefix.
pub struct LocalFileStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            public_prefix: "/uploads".to_string(),
        }
    }

    pub fn with_public_prefix(root: PathBuf, public_prefix: impl Into<String>) -> Self {
        Self {
            root,
            public_prefix: public_prefix.into(),
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)
                .await
                .with_context(|| format!("Failed to create upload dir: {:?}", self.root))?;
        }

        let path = self.root.join(file_name);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write file: {:?}", path))?;

        Ok(format!("{}/{}", self.public_prefix, file_name))
    }

    async fn delete(&self, file_name: &str) -> Result<()> {
        let path = self.root.join(file_name);
        fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to delete file: {:?}", path))?;
        Ok(())
    }

    async fn exists(&self, file_name: &str) -> Result<bool> {
        Ok(self.root.join(file_name).exists())
    }
}

/// Image service
pub struct ImageService {
    repo: Arc<dyn ImageRepository>,
    store: Arc<dyn FileStore>,
    config: Arc<UploadConfig>,
}

impl ImageService {
    pub fn new(
        repo: Arc<dyn ImageRepository>,
        store: Arc<dyn FileStore>,
        config: Arc<UploadConfig>,
    ) -> Self {
        Self { repo, store, config }
    }

    /// Store an uploaded image and record its metadata.
    ///
    /// Rejects empty uploads, disallowed MIME types, and oversized files
    /// before anything is written. The generated filename is resolved
    /// against recorded filenames; the binary goes to the file store and
    /// the row is recorded with whatever dimensions the header yields.
    pub async fn save_upload(
        &self,
        bytes: &[u8],
        original_file_name: &str,
        content_type: &str,
        alt_text: Option<String>,
        caption: Option<String>,
    ) -> Result<ImageAsset, ImageServiceError> {
        if bytes.is_empty() {
            return Err(ImageServiceError::ValidationError(
                "File is required".to_string(),
            ));
        }
        if !self.config.is_type_allowed(content_type) {
            return Err(ImageServiceError::ValidationError(format!(
                "Invalid file type: {}. Allowed types: {:?}",
                content_type, self.config.allowed_types
            )));
        }
        if bytes.len() as u64 > self.config.max_file_size {
            return Err(ImageServiceError::ValidationError(format!(
                "File too large. Maximum size: {} bytes",
                self.config.max_file_size
            )));
        }

        let repo = self.repo.clone();
        let file_name = slug::resolve_unique_file_name(original_file_name, move |candidate| {
            let repo = repo.clone();
            async move { repo.exists_by_file_name(&candidate).await }
        })
        .await
        .context("Failed to resolve unique filename")?;

        let file_path = self
            .store
            .save(&file_name, bytes)
            .await
            .context("Failed to store uploaded file")?;

        let dimensions = probe_dimensions(bytes);
        if dimensions.is_none() {
            tracing::warn!(file = %file_name, "Could not read image dimensions");
        }

        let input = CreateImageInput {
            file_name: file_name.clone(),
            original_file_name: original_file_name.to_string(),
            file_path,
            content_type: content_type.to_string(),
            file_size_bytes: bytes.len() as i64,
            alt_text,
            caption,
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
        };

        let asset = self
            .repo
            .create(&input)
            .await
            .context("Failed to record uploaded image")?;

        tracing::info!(image_id = asset.id, file = %asset.file_name, "Stored upload");
        Ok(asset)
    }

    /// Get image metadata by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<ImageAsset>, ImageServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get image by ID")?)
    }

    /// List all images, newest first
    pub async fn list(&self) -> Result<Vec<ImageAsset>, ImageServiceError> {
        Ok(self.repo.list().await.context("Failed to list images")?)
    }

    /// Delete an image row and its stored binary.
    pub async fn delete(&self, id: i64) -> Result<(), ImageServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get image")?
            .ok_or_else(|| ImageServiceError::NotFound(id.to_string()))?;

        self.repo
            .delete(id)
            .await
            .context("Failed to delete image record")?;

        if let Err(e) = self.store.delete(&existing.file_name).await {
            tracing::error!(file = %existing.file_name, error = %e, "Failed to delete stored file");
        }

        tracing::info!(image_id = id, file = %existing.file_name, "Deleted image");
        Ok(())
    }
}

/// Read pixel dimensions from an image header, if the format is one we
/// recognize (PNG, GIF, JPEG). Anything else yields None.
fn probe_dimensions(bytes: &[u8]) -> Option<(i32, i32)> {
    png_dimensions(bytes)
        .or_else(|| gif_dimensions(bytes))
        .or_else(|| jpeg_dimensions(bytes))
}

fn png_dimensions(bytes: &[u8]) -> Option<(i32, i32)> {
    const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    if bytes.len() < 24 || bytes[..8] != SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width as i32, height as i32))
}

fn gif_dimensions(bytes: &[u8]) -> Option<(i32, i32)> {
    if bytes.len() < 10 || (&bytes[..6] != b"GIF87a" && &bytes[..6] != b"GIF89a") {
        return None;
    }
    let width = u16::from_le_bytes(bytes[6..8].try_into().ok()?);
    let height = u16::from_le_bytes(bytes[8..10].try_into().ok()?);
    Some((width as i32, height as i32))
}

fn jpeg_dimensions(bytes: &[u8]) -> Option<(i32, i32)> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }

    // Walk the marker segments until a start-of-frame carries the size
    let mut pos = 2;
    while pos + 9 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        // SOF0..SOF15 except DHT (C4), JPG (C8), DAC (CC)
        let is_sof = (0xC0..=0xCF).contains(&marker)
            && marker != 0xC4
            && marker != 0xC8
            && marker != 0xCC;
        if is_sof {
            let height = u16::from_be_bytes(bytes[pos + 5..pos + 7].try_into().ok()?);
            let width = u16::from_be_bytes(bytes[pos + 7..pos + 9].try_into().ok()?);
            return Some((width as i32, height as i32));
        }
        let len = u16::from_be_bytes(bytes[pos + 2..pos + 4].try_into().ok()?) as usize;
        if len < 2 {
            return None;
        }
        pos += 2 + len;
    }
    None
}
