//! Page repository
//!
//! Database operations for standalone pages, including the navigation
//! query used to build the site menu.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreatePageInput, Page, UpdatePageInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Page repository trait
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Create a new page
    async fn create(&self, input: &CreatePageInput, slug: &str) -> Result<Page>;

    /// Get page by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Page>>;

    /// Get page by slug (any status)
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>>;

    /// List all pages ordered by title (authoring views)
    async fn list(&self) -> Result<Vec<Page>>;

    /// List published pages ordered by title
    async fn list_published(&self) -> Result<Vec<Page>>;

    /// List published pages flagged for the navigation menu, ordered by
    /// nav_order then nav_text
    async fn list_nav(&self) -> Result<Vec<Page>>;

    /// Update a page
    async fn update(&self, id: i64, input: &UpdatePageInput) -> Result<Page>;

    /// Delete a page
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Check if a slug exists for a different page (for updates)
    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool>;
}

/// SQLx-based page repository supporting SQLite and MySQL.
pub struct SqlxPageRepository {
    pool: DynDatabasePool,
}

impl SqlxPageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PageRepository for SqlxPageRepository {
    async fn create(&self, input: &CreatePageInput, slug: &str) -> Result<Page> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_page_sqlite(self.pool.as_sqlite().unwrap(), input, slug).await
            }
            DatabaseDriver::Mysql => {
                create_page_mysql(self.pool.as_mysql().unwrap(), input, slug).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Page>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_page_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_page_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_page_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_page_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Page>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_pages_sqlite(self.pool.as_sqlite().unwrap(), false).await,
            DatabaseDriver::Mysql => list_pages_mysql(self.pool.as_mysql().unwrap(), false).await,
        }
    }

    async fn list_published(&self) -> Result<Vec<Page>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_pages_sqlite(self.pool.as_sqlite().unwrap(), true).await,
            DatabaseDriver::Mysql => list_pages_mysql(self.pool.as_mysql().unwrap(), true).await,
        }
    }

    async fn list_nav(&self) -> Result<Vec<Page>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_nav_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_nav_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdatePageInput) -> Result<Page> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_page_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_page_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_page_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_page_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_page_slug_sqlite(self.pool.as_sqlite().unwrap(), slug, None).await
            }
            DatabaseDriver::Mysql => {
                exists_page_slug_mysql(self.pool.as_mysql().unwrap(), slug, None).await
            }
        }
    }

    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_page_slug_sqlite(self.pool.as_sqlite().unwrap(), slug, Some(exclude_id))
                    .await
            }
            DatabaseDriver::Mysql => {
                exists_page_slug_mysql(self.pool.as_mysql().unwrap(), slug, Some(exclude_id)).await
            }
        }
    }
}

const PAGE_COLUMNS: &str = "id, slug, title, content, meta_description, meta_keywords, is_published, show_in_nav, nav_order, nav_text, nav_icon, published_at, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_page_sqlite(pool: &SqlitePool, input: &CreatePageInput, slug: &str) -> Result<Page> {
    let now = Utc::now();
    let published_at = if input.is_published { Some(now) } else { None };

    let result = sqlx::query(
        r#"
        INSERT INTO pages (slug, title, content, meta_description, meta_keywords, is_published, show_in_nav, nav_order, nav_text, nav_icon, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(slug)
    .bind(&input.title)
    .bind(&input.content)
    .bind(&input.meta_description)
    .bind(&input.meta_keywords)
    .bind(input.is_published)
    .bind(input.show_in_nav)
    .bind(input.nav_order)
    .bind(&input.nav_text)
    .bind(&input.nav_icon)
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create page")?;

    Ok(Page {
        id: result.last_insert_rowid(),
        slug: slug.to_string(),
        title: input.title.clone(),
        content: input.content.clone(),
        meta_description: input.meta_description.clone(),
        meta_keywords: input.meta_keywords.clone(),
        is_published: input.is_published,
        show_in_nav: input.show_in_nav,
        nav_order: input.nav_order,
        nav_text: input.nav_text.clone(),
        nav_icon: input.nav_icon.clone(),
        published_at,
        created_at: now,
        updated_at: now,
    })
}

async fn get_page_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Page>> {
    let row = sqlx::query(&format!("SELECT {} FROM pages WHERE id = ?", PAGE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get page by ID")?;

    Ok(row.map(|row| row_to_page_sqlite(&row)))
}

async fn get_page_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Page>> {
    let row = sqlx::query(&format!("SELECT {} FROM pages WHERE slug = ?", PAGE_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get page by slug")?;

    Ok(row.map(|row| row_to_page_sqlite(&row)))
}

async fn list_pages_sqlite(pool: &SqlitePool, published_only: bool) -> Result<Vec<Page>> {
    let query = if published_only {
        format!(
            "SELECT {} FROM pages WHERE is_published = 1 ORDER BY title ASC",
            PAGE_COLUMNS
        )
    } else {
        format!("SELECT {} FROM pages ORDER BY title ASC", PAGE_COLUMNS)
    };

    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("Failed to list pages")?;

    Ok(rows.iter().map(row_to_page_sqlite).collect())
}

async fn list_nav_sqlite(pool: &SqlitePool) -> Result<Vec<Page>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM pages
        WHERE is_published = 1 AND show_in_nav = 1
        ORDER BY nav_order ASC, nav_text ASC
        "#,
        PAGE_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list navigation pages")?;

    Ok(rows.iter().map(row_to_page_sqlite).collect())
}

async fn update_page_sqlite(pool: &SqlitePool, id: i64, input: &UpdatePageInput) -> Result<Page> {
    let existing = get_page_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Page not found: {}", id))?;

    let now = Utc::now();
    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_content = input.content.as_ref().unwrap_or(&existing.content);
    let new_meta_description = input
        .meta_description
        .clone()
        .or(existing.meta_description.clone());
    let new_meta_keywords = input.meta_keywords.clone().or(existing.meta_keywords.clone());
    let new_is_published = input.is_published.unwrap_or(existing.is_published);
    let new_show_in_nav = input.show_in_nav.unwrap_or(existing.show_in_nav);
    let new_nav_order = input.nav_order.unwrap_or(existing.nav_order);
    let new_nav_text = input.nav_text.clone().or(existing.nav_text.clone());
    let new_nav_icon = input.nav_icon.clone().or(existing.nav_icon.clone());

    let new_published_at = if new_is_published && !existing.is_published {
        Some(now)
    } else if !new_is_published {
        None
    } else {
        existing.published_at
    };

    sqlx::query(
        r#"
        UPDATE pages
        SET slug = ?, title = ?, content = ?, meta_description = ?, meta_keywords = ?, is_published = ?, show_in_nav = ?, nav_order = ?, nav_text = ?, nav_icon = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_slug)
    .bind(new_title)
    .bind(new_content)
    .bind(&new_meta_description)
    .bind(&new_meta_keywords)
    .bind(new_is_published)
    .bind(new_show_in_nav)
    .bind(new_nav_order)
    .bind(&new_nav_text)
    .bind(&new_nav_icon)
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update page")?;

    get_page_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Page not found after update: {}", id))
}

async fn delete_page_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM pages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete page")?;
    Ok(())
}

async fn exists_page_slug_sqlite(
    pool: &SqlitePool,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check page slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_page_sqlite(row: &sqlx::sqlite::SqliteRow) -> Page {
    Page {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        meta_description: row.get("meta_description"),
        meta_keywords: row.get("meta_keywords"),
        is_published: row.get("is_published"),
        show_in_nav: row.get("show_in_nav"),
        nav_order: row.get("nav_order"),
        nav_text: row.get("nav_text"),
        nav_icon: row.get("nav_icon"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_page_mysql(pool: &MySqlPool, input: &CreatePageInput, slug: &str) -> Result<Page> {
    let now = Utc::now();
    let published_at = if input.is_published { Some(now) } else { None };

    let result = sqlx::query(
        r#"
        INSERT INTO pages (slug, title, content, meta_description, meta_keywords, is_published, show_in_nav, nav_order, nav_text, nav_icon, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(slug)
    .bind(&input.title)
    .bind(&input.content)
    .bind(&input.meta_description)
    .bind(&input.meta_keywords)
    .bind(input.is_published)
    .bind(input.show_in_nav)
    .bind(input.nav_order)
    .bind(&input.nav_text)
    .bind(&input.nav_icon)
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create page")?;

    Ok(Page {
        id: result.last_insert_id() as i64,
        slug: slug.to_string(),
        title: input.title.clone(),
        content: input.content.clone(),
        meta_description: input.meta_description.clone(),
        meta_keywords: input.meta_keywords.clone(),
        is_published: input.is_published,
        show_in_nav: input.show_in_nav,
        nav_order: input.nav_order,
        nav_text: input.nav_text.clone(),
        nav_icon: input.nav_icon.clone(),
        published_at,
        created_at: now,
        updated_at: now,
    })
}

async fn get_page_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Page>> {
    let row = sqlx::query(&format!("SELECT {} FROM pages WHERE id = ?", PAGE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get page by ID")?;

    Ok(row.map(|row| row_to_page_mysql(&row)))
}

async fn get_page_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Page>> {
    let row = sqlx::query(&format!("SELECT {} FROM pages WHERE slug = ?", PAGE_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get page by slug")?;

    Ok(row.map(|row| row_to_page_mysql(&row)))
}

async fn list_pages_mysql(pool: &MySqlPool, published_only: bool) -> Result<Vec<Page>> {
    let query = if published_only {
        format!(
            "SELECT {} FROM pages WHERE is_published = 1 ORDER BY title ASC",
            PAGE_COLUMNS
        )
    } else {
        format!("SELECT {} FROM pages ORDER BY title ASC", PAGE_COLUMNS)
    };

    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("Failed to list pages")?;

    Ok(rows.iter().map(row_to_page_mysql).collect())
}

async fn list_nav_mysql(pool: &MySqlPool) -> Result<Vec<Page>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM pages
        WHERE is_published = 1 AND show_in_nav = 1
        ORDER BY nav_order ASC, nav_text ASC
        "#,
        PAGE_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list navigation pages")?;

    Ok(rows.iter().map(row_to_page_mysql).collect())
}

async fn update_page_mysql(pool: &MySqlPool, id: i64, input: &UpdatePageInput) -> Result<Page> {
    let existing = get_page_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Page not found: {}", id))?;

    let now = Utc::now();
    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_content = input.content.as_ref().unwrap_or(&existing.content);
    let new_meta_description = input
        .meta_description
        .clone()
        .or(existing.meta_description.clone());
    let new_meta_keywords = input.meta_keywords.clone().or(existing.meta_keywords.clone());
    let new_is_published = input.is_published.unwrap_or(existing.is_published);
    let new_show_in_nav = input.show_in_nav.unwrap_or(existing.show_in_nav);
    let new_nav_order = input.nav_order.unwrap_or(existing.nav_order);
    let new_nav_text = input.nav_text.clone().or(existing.nav_text.clone());
    let new_nav_icon = input.nav_icon.clone().or(existing.nav_icon.clone());

    let new_published_at = if new_is_published && !existing.is_published {
        Some(now)
    } else if !new_is_published {
        None
    } else {
        existing.published_at
    };

    sqlx::query(
        r#"
        UPDATE pages
        SET slug = ?, title = ?, content = ?, meta_description = ?, meta_keywords = ?, is_published = ?, show_in_nav = ?, nav_order = ?, nav_text = ?, nav_icon = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_slug)
    .bind(new_title)
    .bind(new_content)
    .bind(&new_meta_description)
    .bind(&new_meta_keywords)
    .bind(new_is_published)
    .bind(new_show_in_nav)
    .bind(new_nav_order)
    .bind(&new_nav_text)
    .bind(&new_nav_icon)
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update page")?;

    get_page_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Page not found after update: {}", id))
}

async fn delete_page_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM pages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete page")?;
    Ok(())
}

async fn exists_page_slug_mysql(
    pool: &MySqlPool,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check page slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_page_mysql(row: &sqlx::mysql::MySqlRow) -> Page {
    Page {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        meta_description: row.get("meta_description"),
        meta_keywords: row.get("meta_keywords"),
        is_published: row.get("is_published"),
        show_in_nav: row.get("show_in_nav"),
        nav_order: row.get("nav_order"),
        nav_text: row.get("nav_text"),
        nav_icon: row.get("nav_icon"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
