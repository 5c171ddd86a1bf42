//! Image repository
//!
//! Metadata rows for uploaded binaries. The filename-existence check
//! backs the unique-filename resolver; the binary itself is handled by
//! the file store, never by this layer.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateImageInput, ImageAsset};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Image repository trait
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Record a stored upload
    async fn create(&self, input: &CreateImageInput) -> Result<ImageAsset>;

    /// Get image by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ImageAsset>>;

    /// Get image by generated filename
    async fn get_by_file_name(&self, file_name: &str) -> Result<Option<ImageAsset>>;

    /// List all images, newest first
    async fn list(&self) -> Result<Vec<ImageAsset>>;

    /// Delete an image row
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a generated filename already exists
    async fn exists_by_file_name(&self, file_name: &str) -> Result<bool>;
}

/// SQLx-based image repository supporting SQLite and MySQL.
pub struct SqlxImageRepository {
    pool: DynDatabasePool,
}

impl SqlxImageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ImageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ImageRepository for SqlxImageRepository {
    async fn create(&self, input: &CreateImageInput) -> Result<ImageAsset> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_image_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_image_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ImageAsset>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_image_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_image_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_file_name(&self, file_name: &str) -> Result<Option<ImageAsset>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_image_by_file_name_sqlite(self.pool.as_sqlite().unwrap(), file_name).await
            }
            DatabaseDriver::Mysql => {
                get_image_by_file_name_mysql(self.pool.as_mysql().unwrap(), file_name).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<ImageAsset>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_images_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_images_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_image_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_image_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn exists_by_file_name(&self, file_name: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_file_name_sqlite(self.pool.as_sqlite().unwrap(), file_name).await
            }
            DatabaseDriver::Mysql => {
                exists_by_file_name_mysql(self.pool.as_mysql().unwrap(), file_name).await
            }
        }
    }
}

const IMAGE_COLUMNS: &str = "id, file_name, original_file_name, file_path, content_type, file_size_bytes, alt_text, caption, width, height, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_image_sqlite(pool: &SqlitePool, input: &CreateImageInput) -> Result<ImageAsset> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO images (file_name, original_file_name, file_path, content_type, file_size_bytes, alt_text, caption, width, height, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.file_name)
    .bind(&input.original_file_name)
    .bind(&input.file_path)
    .bind(&input.content_type)
    .bind(input.file_size_bytes)
    .bind(&input.alt_text)
    .bind(&input.caption)
    .bind(input.width)
    .bind(input.height)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create image record")?;

    Ok(ImageAsset {
        id: result.last_insert_rowid(),
        file_name: input.file_name.clone(),
        original_file_name: input.original_file_name.clone(),
        file_path: input.file_path.clone(),
        content_type: input.content_type.clone(),
        file_size_bytes: input.file_size_bytes,
        alt_text: input.alt_text.clone(),
        caption: input.caption.clone(),
        width: input.width,
        height: input.height,
        created_at: now,
        updated_at: now,
    })
}

async fn get_image_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ImageAsset>> {
    let row = sqlx::query(&format!("SELECT {} FROM images WHERE id = ?", IMAGE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get image by ID")?;

    Ok(row.map(|row| row_to_image_sqlite(&row)))
}

async fn get_image_by_file_name_sqlite(
    pool: &SqlitePool,
    file_name: &str,
) -> Result<Option<ImageAsset>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM images WHERE file_name = ?",
        IMAGE_COLUMNS
    ))
    .bind(file_name)
    .fetch_optional(pool)
    .await
    .context("Failed to get image by filename")?;

    Ok(row.map(|row| row_to_image_sqlite(&row)))
}

async fn list_images_sqlite(pool: &SqlitePool) -> Result<Vec<ImageAsset>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM images ORDER BY created_at DESC, id DESC",
        IMAGE_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list images")?;

    Ok(rows.iter().map(row_to_image_sqlite).collect())
}

async fn delete_image_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM images WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete image record")?;
    Ok(())
}

async fn exists_by_file_name_sqlite(pool: &SqlitePool, file_name: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM images WHERE file_name = ?")
        .bind(file_name)
        .fetch_one(pool)
        .await
        .context("Failed to check image filename existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_image_sqlite(row: &sqlx::sqlite::SqliteRow) -> ImageAsset {
    ImageAsset {
        id: row.get("id"),
        file_name: row.get("file_name"),
        original_file_name: row.get("original_file_name"),
        file_path: row.get("file_path"),
        content_type: row.get("content_type"),
        file_size_bytes: row.get("file_size_bytes"),
        alt_text: row.get("alt_text"),
        caption: row.get("caption"),
        width: row.get("width"),
        height: row.get("height"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_image_mysql(pool: &MySqlPool, input: &CreateImageInput) -> Result<ImageAsset> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO images (file_name, original_file_name, file_path, content_type, file_size_bytes, alt_text, caption, width, height, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.file_name)
    .bind(&input.original_file_name)
    .bind(&input.file_path)
    .bind(&input.content_type)
    .bind(input.file_size_bytes)
    .bind(&input.alt_text)
    .bind(&input.caption)
    .bind(input.width)
    .bind(input.height)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create image record")?;

    Ok(ImageAsset {
        id: result.last_insert_id() as i64,
        file_name: input.file_name.clone(),
        original_file_name: input.original_file_name.clone(),
        file_path: input.file_path.clone(),
        content_type: input.content_type.clone(),
        file_size_bytes: input.file_size_bytes,
        alt_text: input.alt_text.clone(),
        caption: input.caption.clone(),
        width: input.width,
        height: input.height,
        created_at: now,
        updated_at: now,
    })
}

async fn get_image_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ImageAsset>> {
    let row = sqlx::query(&format!("SELECT {} FROM images WHERE id = ?", IMAGE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get image by ID")?;

    Ok(row.map(|row| row_to_image_mysql(&row)))
}

async fn get_image_by_file_name_mysql(
    pool: &MySqlPool,
    file_name: &str,
) -> Result<Option<ImageAsset>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM images WHERE file_name = ?",
        IMAGE_COLUMNS
    ))
    .bind(file_name)
    .fetch_optional(pool)
    .await
    .context("Failed to get image by filename")?;

    Ok(row.map(|row| row_to_image_mysql(&row)))
}

async fn list_images_mysql(pool: &MySqlPool) -> Result<Vec<ImageAsset>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM images ORDER BY created_at DESC, id DESC",
        IMAGE_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list images")?;

    Ok(rows.iter().map(row_to_image_mysql).collect())
}

async fn delete_image_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM images WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete image record")?;
    Ok(())
}

async fn exists_by_file_name_mysql(pool: &MySqlPool, file_name: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM images WHERE file_name = ?")
        .bind(file_name)
        .fetch_one(pool)
        .await
        .context("Failed to check image filename existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_image_mysql(row: &sqlx::mysql::MySqlRow) -> ImageAsset {
    ImageAsset {
        id: row.get("id"),
        file_name: row.get("file_name"),
        original_file_name: row.get("original_file_name"),
        file_path: row.get("file_path"),
        content_type: row.get("content_type"),
        file_size_bytes: row.get("file_size_bytes"),
        alt_text: row.get("alt_text"),
        caption: row.get("caption"),
        width: row.get("width"),
        height: row.get("height"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxImageRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxImageRepository::new(pool)
    }

    fn test_input(file_name: &str) -> CreateImageInput {
        CreateImageInput {
            file_name: file_name.to_string(),
            original_file_name: "photo.png".to_string(),
            file_path: format!("/uploads/{}", file_name),
            content_type: "image/png".to_string(),
            file_size_bytes: 2048,
            alt_text: Some("A photo".to_string()),
            caption: None,
            width: Some(640),
            height: Some(480),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;

        let created = repo
            .create(&test_input("photo_20240101_abcd1234.png"))
            .await
            .expect("create failed");
        assert!(created.id > 0);
        assert_eq!(created.width, Some(640));

        let by_name = repo
            .get_by_file_name("photo_20240101_abcd1234.png")
            .await
            .expect("get failed")
            .expect("not found");
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_name.file_path, "/uploads/photo_20240101_abcd1234.png");
    }

    #[tokio::test]
    async fn test_exists_by_file_name() {
        let repo = setup_test_repo().await;

        assert!(!repo
            .exists_by_file_name("missing.png")
            .await
            .expect("check failed"));
        repo.create(&test_input("present.png"))
            .await
            .expect("create failed");
        assert!(repo
            .exists_by_file_name("present.png")
            .await
            .expect("check failed"));
    }

    #[tokio::test]
    async fn test_duplicate_file_name_rejected() {
        let repo = setup_test_repo().await;

        repo.create(&test_input("dup.png")).await.expect("create failed");
        let result = repo.create(&test_input("dup.png")).await;
        assert!(result.is_err(), "Duplicate filename must be rejected");
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let repo = setup_test_repo().await;

        let first = repo.create(&test_input("a.png")).await.expect("create failed");
        repo.create(&test_input("b.png")).await.expect("create failed");

        let all = repo.list().await.expect("list failed");
        assert_eq!(all.len(), 2);

        repo.delete(first.id).await.expect("delete failed");
        let remaining = repo.list().await.expect("list failed");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file_name, "b.png");
    }
}
