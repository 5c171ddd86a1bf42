//! Category repository
//!
//! Database operations for the flat category taxonomy. Name and slug
//! each carry a unique index; the service layer pre-checks both but the
//! index is the authoritative guard.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Category;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &Category) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// Get category by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// List all categories ordered by name
    async fn list(&self) -> Result<Vec<Category>>;

    /// Update name and description
    async fn update(&self, category: &Category) -> Result<Category>;

    /// Delete a category (articles fall back to uncategorized via the
    /// FK's ON DELETE SET NULL)
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Check if a name already exists
    async fn exists_by_name(&self, name: &str) -> Result<bool>;

    /// Delete every category except the one with the given slug,
    /// returning the number deleted
    async fn delete_all_except(&self, keep_slug: &str) -> Result<u64>;
}

/// SQLx-based category repository supporting SQLite and MySQL.
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_category_sqlite(self.pool.as_sqlite().unwrap(), category).await
            }
            DatabaseDriver::Mysql => {
                create_category_mysql(self.pool.as_mysql().unwrap(), category).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_category_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_sqlite(self.pool.as_sqlite().unwrap(), "slug", slug).await
            }
            DatabaseDriver::Mysql => {
                get_category_mysql(self.pool.as_mysql().unwrap(), "slug", slug).await
            }
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_sqlite(self.pool.as_sqlite().unwrap(), "name", name).await
            }
            DatabaseDriver::Mysql => {
                get_category_mysql(self.pool.as_mysql().unwrap(), "name", name).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_categories_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_categories_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_category_sqlite(self.pool.as_sqlite().unwrap(), category).await
            }
            DatabaseDriver::Mysql => {
                update_category_mysql(self.pool.as_mysql().unwrap(), category).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_category_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                delete_category_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_category_sqlite(self.pool.as_sqlite().unwrap(), "slug", slug).await
            }
            DatabaseDriver::Mysql => {
                exists_category_mysql(self.pool.as_mysql().unwrap(), "slug", slug).await
            }
        }
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_category_sqlite(self.pool.as_sqlite().unwrap(), "name", name).await
            }
            DatabaseDriver::Mysql => {
                exists_category_mysql(self.pool.as_mysql().unwrap(), "name", name).await
            }
        }
    }

    async fn delete_all_except(&self, keep_slug: &str) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_all_except_sqlite(self.pool.as_sqlite().unwrap(), keep_slug).await
            }
            DatabaseDriver::Mysql => {
                delete_all_except_mysql(self.pool.as_mysql().unwrap(), keep_slug).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let result = sqlx::query(
        "INSERT INTO categories (slug, name, description, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&category.slug)
    .bind(&category.name)
    .bind(&category.description)
    .bind(category.created_at)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    let mut created = category.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_category_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query(
        "SELECT id, slug, name, description, created_at FROM categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by ID")?;

    Ok(row.map(|row| row_to_category_sqlite(&row)))
}

async fn get_category_sqlite(
    pool: &SqlitePool,
    column: &str,
    value: &str,
) -> Result<Option<Category>> {
    let row = sqlx::query(&format!(
        "SELECT id, slug, name, description, created_at FROM categories WHERE {} = ?",
        column
    ))
    .bind(value)
    .fetch_optional(pool)
    .await
    .context("Failed to get category")?;

    Ok(row.map(|row| row_to_category_sqlite(&row)))
}

async fn list_categories_sqlite(pool: &SqlitePool) -> Result<Vec<Category>> {
    let rows = sqlx::query(
        "SELECT id, slug, name, description, created_at FROM categories ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list categories")?;

    Ok(rows.iter().map(row_to_category_sqlite).collect())
}

async fn update_category_sqlite(pool: &SqlitePool, category: &Category) -> Result<Category> {
    sqlx::query("UPDATE categories SET name = ?, description = ? WHERE id = ?")
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.id)
        .execute(pool)
        .await
        .context("Failed to update category")?;

    get_category_by_id_sqlite(pool, category.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category not found after update: {}", category.id))
}

async fn delete_category_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;
    Ok(())
}

async fn exists_category_sqlite(pool: &SqlitePool, column: &str, value: &str) -> Result<bool> {
    let row = sqlx::query(&format!(
        "SELECT COUNT(*) as count FROM categories WHERE {} = ?",
        column
    ))
    .bind(value)
    .fetch_one(pool)
    .await
    .context("Failed to check category existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn delete_all_except_sqlite(pool: &SqlitePool, keep_slug: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM categories WHERE slug != ?")
        .bind(keep_slug)
        .execute(pool)
        .await
        .context("Failed to delete categories")?;
    Ok(result.rows_affected())
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_category_mysql(pool: &MySqlPool, category: &Category) -> Result<Category> {
    let result = sqlx::query(
        "INSERT INTO categories (slug, name, description, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&category.slug)
    .bind(&category.name)
    .bind(&category.description)
    .bind(category.created_at)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    let mut created = category.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_category_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query(
        "SELECT id, slug, name, description, created_at FROM categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by ID")?;

    Ok(row.map(|row| row_to_category_mysql(&row)))
}

async fn get_category_mysql(
    pool: &MySqlPool,
    column: &str,
    value: &str,
) -> Result<Option<Category>> {
    let row = sqlx::query(&format!(
        "SELECT id, slug, name, description, created_at FROM categories WHERE {} = ?",
        column
    ))
    .bind(value)
    .fetch_optional(pool)
    .await
    .context("Failed to get category")?;

    Ok(row.map(|row| row_to_category_mysql(&row)))
}

async fn list_categories_mysql(pool: &MySqlPool) -> Result<Vec<Category>> {
    let rows = sqlx::query(
        "SELECT id, slug, name, description, created_at FROM categories ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list categories")?;

    Ok(rows.iter().map(row_to_category_mysql).collect())
}

async fn update_category_mysql(pool: &MySqlPool, category: &Category) -> Result<Category> {
    sqlx::query("UPDATE categories SET name = ?, description = ? WHERE id = ?")
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.id)
        .execute(pool)
        .await
        .context("Failed to update category")?;

    get_category_by_id_mysql(pool, category.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category not found after update: {}", category.id))
}

async fn delete_category_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;
    Ok(())
}

async fn exists_category_mysql(pool: &MySqlPool, column: &str, value: &str) -> Result<bool> {
    let row = sqlx::query(&format!(
        "SELECT COUNT(*) as count FROM categories WHERE {} = ?",
        column
    ))
    .bind(value)
    .fetch_one(pool)
    .await
    .context("Failed to check category existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn delete_all_except_mysql(pool: &MySqlPool, keep_slug: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM categories WHERE slug != ?")
        .bind(keep_slug)
        .execute(pool)
        .await
        .context("Failed to delete categories")?;
    Ok(result.rows_affected())
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> Category {
    Category {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}
