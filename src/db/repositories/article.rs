//! Article repository
//!
//! Database operations for articles, including the public listing
//! queries (published filter + optional category slug) and the bulk
//! insertion path used by the test-data generator.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    Article, BulkArticleRow, CategoryCount, CreateArticleInput, Tag, UpdateArticleInput,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Create a new article
    async fn create(&self, input: &CreateArticleInput, slug: &str) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Get article by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// List articles with pagination, all statuses (authoring views)
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Article>>;

    /// Count total articles (all statuses)
    async fn count(&self) -> Result<i64>;

    /// Update an article
    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<Article>;

    /// Delete an article
    async fn delete(&self, id: i64) -> Result<()>;

    /// List published articles, newest first, optionally restricted to
    /// a category slug
    async fn list_published(
        &self,
        category_slug: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Article>>;

    /// Count published articles, optionally restricted to a category slug
    async fn count_published(&self, category_slug: Option<&str>) -> Result<i64>;

    /// Per-category published-article counts; categories with no
    /// published articles are excluded. Ordered by count descending,
    /// then category name ascending.
    async fn category_counts(&self) -> Result<Vec<CategoryCount>>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Check if a slug exists for a different article (for updates)
    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool>;

    /// Tags attached to an article, resolved through the join table
    async fn tags_for_article(&self, article_id: i64) -> Result<Vec<Tag>>;

    /// Insert a batch of fully specified rows in one statement,
    /// returning the number inserted
    async fn bulk_insert(&self, rows: &[BulkArticleRow]) -> Result<u64>;

    /// Delete every article, returning the number deleted
    async fn delete_all(&self) -> Result<u64>;
}

/// SQLx-based article repository supporting SQLite and MySQL.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, input: &CreateArticleInput, slug: &str) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_article_sqlite(self.pool.as_sqlite().unwrap(), input, slug).await
            }
            DatabaseDriver::Mysql => {
                create_article_mysql(self.pool.as_mysql().unwrap(), input, slug).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_article_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_article_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_article_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_article_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_articles_sqlite(self.pool.as_sqlite().unwrap(), offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_articles_mysql(self.pool.as_mysql().unwrap(), offset, limit).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_articles_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_articles_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_article_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_article_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_article_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_article_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_published(
        &self,
        category_slug: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_published_sqlite(self.pool.as_sqlite().unwrap(), category_slug, offset, limit)
                    .await
            }
            DatabaseDriver::Mysql => {
                list_published_mysql(self.pool.as_mysql().unwrap(), category_slug, offset, limit)
                    .await
            }
        }
    }

    async fn count_published(&self, category_slug: Option<&str>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_published_sqlite(self.pool.as_sqlite().unwrap(), category_slug).await
            }
            DatabaseDriver::Mysql => {
                count_published_mysql(self.pool.as_mysql().unwrap(), category_slug).await
            }
        }
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                category_counts_sqlite(self.pool.as_sqlite().unwrap()).await
            }
            DatabaseDriver::Mysql => category_counts_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                exists_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_slug_excluding_sqlite(self.pool.as_sqlite().unwrap(), slug, exclude_id)
                    .await
            }
            DatabaseDriver::Mysql => {
                exists_by_slug_excluding_mysql(self.pool.as_mysql().unwrap(), slug, exclude_id)
                    .await
            }
        }
    }

    async fn tags_for_article(&self, article_id: i64) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                tags_for_article_sqlite(self.pool.as_sqlite().unwrap(), article_id).await
            }
            DatabaseDriver::Mysql => {
                tags_for_article_mysql(self.pool.as_mysql().unwrap(), article_id).await
            }
        }
    }

    async fn bulk_insert(&self, rows: &[BulkArticleRow]) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                bulk_insert_sqlite(self.pool.as_sqlite().unwrap(), rows).await
            }
            DatabaseDriver::Mysql => bulk_insert_mysql(self.pool.as_mysql().unwrap(), rows).await,
        }
    }

    async fn delete_all(&self) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_all_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => delete_all_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

const ARTICLE_COLUMNS: &str = "id, slug, title, content, meta_description, meta_keywords, category_id, is_published, published_at, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(
    pool: &SqlitePool,
    input: &CreateArticleInput,
    slug: &str,
) -> Result<Article> {
    let now = Utc::now();
    let published_at = if input.is_published { Some(now) } else { None };

    let result = sqlx::query(
        r#"
        INSERT INTO articles (slug, title, content, meta_description, meta_keywords, category_id, is_published, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(slug)
    .bind(&input.title)
    .bind(&input.content)
    .bind(&input.meta_description)
    .bind(&input.meta_keywords)
    .bind(input.category_id)
    .bind(input.is_published)
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    let id = result.last_insert_rowid();

    Ok(Article {
        id,
        slug: slug.to_string(),
        title: input.title.clone(),
        content: input.content.clone(),
        meta_description: input.meta_description.clone(),
        meta_keywords: input.meta_keywords.clone(),
        category_id: input.category_id,
        is_published: input.is_published,
        published_at,
        created_at: now,
        updated_at: now,
    })
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE id = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_article_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE slug = ?",
        ARTICLE_COLUMNS
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_article_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_articles_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM articles ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        ARTICLE_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list articles")?;

    rows.iter().map(row_to_article_sqlite).collect()
}

async fn count_articles_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM articles")
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?;

    Ok(row.get("count"))
}

async fn update_article_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateArticleInput,
) -> Result<Article> {
    let existing = get_article_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found: {}", id))?;

    let now = Utc::now();
    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_content = input.content.as_ref().unwrap_or(&existing.content);
    let new_meta_description = input
        .meta_description
        .clone()
        .or(existing.meta_description.clone());
    let new_meta_keywords = input.meta_keywords.clone().or(existing.meta_keywords.clone());
    let new_category_id = match input.category_id {
        Some(value) => value,
        None => existing.category_id,
    };
    let new_is_published = input.is_published.unwrap_or(existing.is_published);

    // published_at is set on the unpublished->published transition and
    // cleared on unpublish; an already published article keeps its
    // original timestamp.
    let new_published_at = if new_is_published && !existing.is_published {
        Some(now)
    } else if !new_is_published {
        None
    } else {
        existing.published_at
    };

    sqlx::query(
        r#"
        UPDATE articles
        SET slug = ?, title = ?, content = ?, meta_description = ?, meta_keywords = ?, category_id = ?, is_published = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_slug)
    .bind(new_title)
    .bind(new_content)
    .bind(&new_meta_description)
    .bind(&new_meta_keywords)
    .bind(new_category_id)
    .bind(new_is_published)
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update: {}", id))
}

async fn delete_article_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    // article_tags rows go with it via ON DELETE CASCADE
    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(())
}

async fn list_published_sqlite(
    pool: &SqlitePool,
    category_slug: Option<&str>,
    offset: i64,
    limit: i64,
) -> Result<Vec<Article>> {
    let rows = match category_slug {
        Some(slug) => {
            sqlx::query(&format!(
                r#"
                SELECT {} FROM articles a
                INNER JOIN categories c ON a.category_id = c.id
                WHERE a.is_published = 1 AND c.slug = ?
                ORDER BY a.created_at DESC, a.id DESC
                LIMIT ? OFFSET ?
                "#,
                prefixed_columns("a")
            ))
            .bind(slug)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                r#"
                SELECT {} FROM articles
                WHERE is_published = 1
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#,
                ARTICLE_COLUMNS
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list published articles")?;

    rows.iter().map(row_to_article_sqlite).collect()
}

async fn count_published_sqlite(pool: &SqlitePool, category_slug: Option<&str>) -> Result<i64> {
    let row = match category_slug {
        Some(slug) => {
            sqlx::query(
                r#"
                SELECT COUNT(*) as count FROM articles a
                INNER JOIN categories c ON a.category_id = c.id
                WHERE a.is_published = 1 AND c.slug = ?
                "#,
            )
            .bind(slug)
            .fetch_one(pool)
            .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM articles WHERE is_published = 1")
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to count published articles")?;

    Ok(row.get("count"))
}

async fn category_counts_sqlite(pool: &SqlitePool) -> Result<Vec<CategoryCount>> {
    let rows = sqlx::query(
        r#"
        SELECT c.name, c.slug, COUNT(a.id) as article_count
        FROM categories c
        INNER JOIN articles a ON a.category_id = c.id AND a.is_published = 1
        GROUP BY c.id, c.name, c.slug
        ORDER BY article_count DESC, c.name ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to aggregate category counts")?;

    Ok(rows
        .iter()
        .map(|row| CategoryCount {
            name: row.get("name"),
            slug: row.get("slug"),
            count: row.get("article_count"),
        })
        .collect())
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM articles WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check article slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn exists_by_slug_excluding_sqlite(
    pool: &SqlitePool,
    slug: &str,
    exclude_id: i64,
) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM articles WHERE slug = ? AND id != ?")
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check article slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn tags_for_article_sqlite(pool: &SqlitePool, article_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.name, t.description, t.created_at
        FROM tags t
        INNER JOIN article_tags at ON t.id = at.tag_id
        WHERE at.article_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to list article tags")?;

    Ok(rows
        .iter()
        .map(|row| Tag {
            id: row.get("id"),
            slug: row.get("slug"),
            name: row.get("name"),
            description: row.get("description"),
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn bulk_insert_sqlite(pool: &SqlitePool, rows: &[BulkArticleRow]) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
        "INSERT INTO articles (slug, title, content, meta_description, meta_keywords, category_id, is_published, published_at, created_at, updated_at) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(&row.slug)
            .push_bind(&row.title)
            .push_bind(&row.content)
            .push_bind(&row.meta_description)
            .push_bind(&row.meta_keywords)
            .push_bind(row.category_id)
            .push_bind(row.is_published)
            .push_bind(row.published_at)
            .push_bind(row.created_at)
            .push_bind(row.updated_at);
    });

    let result = builder
        .build()
        .execute(pool)
        .await
        .context("Failed to bulk insert articles")?;

    Ok(result.rows_affected())
}

async fn delete_all_sqlite(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM articles")
        .execute(pool)
        .await
        .context("Failed to delete articles")?;
    Ok(result.rows_affected())
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    Ok(Article {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        meta_description: row.get("meta_description"),
        meta_keywords: row.get("meta_keywords"),
        category_id: row.get("category_id"),
        is_published: row.get("is_published"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Column list with a table alias prefix, for joined queries.
fn prefixed_columns(alias: &str) -> String {
    ARTICLE_COLUMNS
        .split(", ")
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(
    pool: &MySqlPool,
    input: &CreateArticleInput,
    slug: &str,
) -> Result<Article> {
    let now = Utc::now();
    let published_at = if input.is_published { Some(now) } else { None };

    let result = sqlx::query(
        r#"
        INSERT INTO articles (slug, title, content, meta_description, meta_keywords, category_id, is_published, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(slug)
    .bind(&input.title)
    .bind(&input.content)
    .bind(&input.meta_description)
    .bind(&input.meta_keywords)
    .bind(input.category_id)
    .bind(input.is_published)
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    let id = result.last_insert_id() as i64;

    Ok(Article {
        id,
        slug: slug.to_string(),
        title: input.title.clone(),
        content: input.content.clone(),
        meta_description: input.meta_description.clone(),
        meta_keywords: input.meta_keywords.clone(),
        category_id: input.category_id,
        is_published: input.is_published,
        published_at,
        created_at: now,
        updated_at: now,
    })
}

async fn get_article_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE id = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_article_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE slug = ?",
        ARTICLE_COLUMNS
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_article_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_articles_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM articles ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        ARTICLE_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list articles")?;

    rows.iter().map(row_to_article_mysql).collect()
}

async fn count_articles_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM articles")
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?;

    Ok(row.get("count"))
}

async fn update_article_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateArticleInput,
) -> Result<Article> {
    let existing = get_article_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found: {}", id))?;

    let now = Utc::now();
    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_content = input.content.as_ref().unwrap_or(&existing.content);
    let new_meta_description = input
        .meta_description
        .clone()
        .or(existing.meta_description.clone());
    let new_meta_keywords = input.meta_keywords.clone().or(existing.meta_keywords.clone());
    let new_category_id = match input.category_id {
        Some(value) => value,
        None => existing.category_id,
    };
    let new_is_published = input.is_published.unwrap_or(existing.is_published);

    let new_published_at = if new_is_published && !existing.is_published {
        Some(now)
    } else if !new_is_published {
        None
    } else {
        existing.published_at
    };

    sqlx::query(
        r#"
        UPDATE articles
        SET slug = ?, title = ?, content = ?, meta_description = ?, meta_keywords = ?, category_id = ?, is_published = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_slug)
    .bind(new_title)
    .bind(new_content)
    .bind(&new_meta_description)
    .bind(&new_meta_keywords)
    .bind(new_category_id)
    .bind(new_is_published)
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update: {}", id))
}

async fn delete_article_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(())
}

async fn list_published_mysql(
    pool: &MySqlPool,
    category_slug: Option<&str>,
    offset: i64,
    limit: i64,
) -> Result<Vec<Article>> {
    let rows = match category_slug {
        Some(slug) => {
            sqlx::query(&format!(
                r#"
                SELECT {} FROM articles a
                INNER JOIN categories c ON a.category_id = c.id
                WHERE a.is_published = 1 AND c.slug = ?
                ORDER BY a.created_at DESC, a.id DESC
                LIMIT ? OFFSET ?
                "#,
                prefixed_columns("a")
            ))
            .bind(slug)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                r#"
                SELECT {} FROM articles
                WHERE is_published = 1
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#,
                ARTICLE_COLUMNS
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list published articles")?;

    rows.iter().map(row_to_article_mysql).collect()
}

async fn count_published_mysql(pool: &MySqlPool, category_slug: Option<&str>) -> Result<i64> {
    let row = match category_slug {
        Some(slug) => {
            sqlx::query(
                r#"
                SELECT COUNT(*) as count FROM articles a
                INNER JOIN categories c ON a.category_id = c.id
                WHERE a.is_published = 1 AND c.slug = ?
                "#,
            )
            .bind(slug)
            .fetch_one(pool)
            .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM articles WHERE is_published = 1")
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to count published articles")?;

    Ok(row.get("count"))
}

async fn category_counts_mysql(pool: &MySqlPool) -> Result<Vec<CategoryCount>> {
    let rows = sqlx::query(
        r#"
        SELECT c.name, c.slug, COUNT(a.id) as article_count
        FROM categories c
        INNER JOIN articles a ON a.category_id = c.id AND a.is_published = 1
        GROUP BY c.id, c.name, c.slug
        ORDER BY article_count DESC, c.name ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to aggregate category counts")?;

    Ok(rows
        .iter()
        .map(|row| CategoryCount {
            name: row.get("name"),
            slug: row.get("slug"),
            count: row.get("article_count"),
        })
        .collect())
}

async fn exists_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM articles WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check article slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn exists_by_slug_excluding_mysql(
    pool: &MySqlPool,
    slug: &str,
    exclude_id: i64,
) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM articles WHERE slug = ? AND id != ?")
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check article slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn tags_for_article_mysql(pool: &MySqlPool, article_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.name, t.description, t.created_at
        FROM tags t
        INNER JOIN article_tags at ON t.id = at.tag_id
        WHERE at.article_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to list article tags")?;

    Ok(rows
        .iter()
        .map(|row| Tag {
            id: row.get("id"),
            slug: row.get("slug"),
            name: row.get("name"),
            description: row.get("description"),
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn bulk_insert_mysql(pool: &MySqlPool, rows: &[BulkArticleRow]) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut builder = sqlx::QueryBuilder::<sqlx::MySql>::new(
        "INSERT INTO articles (slug, title, content, meta_description, meta_keywords, category_id, is_published, published_at, created_at, updated_at) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(&row.slug)
            .push_bind(&row.title)
            .push_bind(&row.content)
            .push_bind(&row.meta_description)
            .push_bind(&row.meta_keywords)
            .push_bind(row.category_id)
            .push_bind(row.is_published)
            .push_bind(row.published_at)
            .push_bind(row.created_at)
            .push_bind(row.updated_at);
    });

    let result = builder
        .build()
        .execute(pool)
        .await
        .context("Failed to bulk insert articles")?;

    Ok(result.rows_affected())
}

async fn delete_all_mysql(pool: &MySqlPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM articles")
        .execute(pool)
        .await
        .context("Failed to delete articles")?;
    Ok(result.rows_affected())
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    Ok(Article {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        meta_description: row.get("meta_description"),
        meta_keywords: row.get("meta_keywords"),
        category_id: row.get("category_id"),
        is_published: row.get("is_published"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxArticleRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxArticleRepository::new(pool.clone());
        (pool, repo)
    }

    async fn create_test_category(pool: &SqlitePool, slug: &str) -> i64 {
        let result = sqlx::query("INSERT INTO categories (slug, name) VALUES (?, ?)")
            .bind(slug)
            .bind(format!("Category {}", slug))
            .execute(pool)
            .await
            .expect("Failed to create test category");
        result.last_insert_rowid()
    }

    fn test_input(title: &str, category_id: Option<i64>, published: bool) -> CreateArticleInput {
        CreateArticleInput {
            title: title.to_string(),
            slug: None,
            content: format!("<p>Content for {}</p>", title),
            meta_description: None,
            meta_keywords: None,
            category_id,
            is_published: published,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_article() {
        let (_pool, repo) = setup_test_repo().await;

        let input = test_input("First Post", None, false);
        let created = repo
            .create(&input, "first-post")
            .await
            .expect("Failed to create article");

        assert!(created.id > 0);
        assert_eq!(created.slug, "first-post");
        assert!(!created.is_published);
        assert!(created.published_at.is_none());

        let by_slug = repo
            .get_by_slug("first-post")
            .await
            .expect("Failed to get article")
            .expect("Article not found");
        assert_eq!(by_slug.id, created.id);

        let by_id = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get article")
            .expect("Article not found");
        assert_eq!(by_id.title, "First Post");
    }

    #[tokio::test]
    async fn test_create_published_sets_published_at() {
        let (_pool, repo) = setup_test_repo().await;

        let input = test_input("Live Post", None, true);
        let created = repo
            .create(&input, "live-post")
            .await
            .expect("Failed to create article");

        assert!(created.is_published);
        assert!(created.published_at.is_some());
    }

    #[tokio::test]
    async fn test_get_by_slug_not_found() {
        let (_pool, repo) = setup_test_repo().await;
        let found = repo
            .get_by_slug("missing")
            .await
            .expect("Failed to get article");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_publish_transition() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&test_input("Draft", None, false), "draft")
            .await
            .expect("Failed to create article");
        assert!(created.published_at.is_none());

        let published = repo
            .update(created.id, &UpdateArticleInput::new().with_published(true))
            .await
            .expect("Failed to publish");
        assert!(published.is_published);
        assert!(published.published_at.is_some());
        let first_published_at = published.published_at;

        // Publishing again keeps the original timestamp
        let republished = repo
            .update(
                created.id,
                &UpdateArticleInput::new().with_title("Renamed".to_string()),
            )
            .await
            .expect("Failed to update");
        assert_eq!(republished.published_at, first_published_at);

        // Unpublishing clears it
        let unpublished = repo
            .update(created.id, &UpdateArticleInput::new().with_published(false))
            .await
            .expect("Failed to unpublish");
        assert!(unpublished.published_at.is_none());
    }

    #[tokio::test]
    async fn test_update_never_rederives_slug() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&test_input("Original Title", None, false), "original-title")
            .await
            .expect("Failed to create article");

        let updated = repo
            .update(
                created.id,
                &UpdateArticleInput::new().with_title("Completely New Title".to_string()),
            )
            .await
            .expect("Failed to update");

        assert_eq!(updated.title, "Completely New Title");
        assert_eq!(updated.slug, "original-title");
    }

    #[tokio::test]
    async fn test_delete_article() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&test_input("Doomed", None, false), "doomed")
            .await
            .expect("Failed to create article");
        repo.delete(created.id).await.expect("Failed to delete");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get article");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_published_filters_and_orders() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite = pool.as_sqlite().unwrap();
        let cat = create_test_category(sqlite, "rust").await;

        // Two drafts, three published with distinct created_at
        for i in 1..=2 {
            repo.create(
                &test_input(&format!("Draft {}", i), Some(cat), false),
                &format!("draft-{}", i),
            )
            .await
            .expect("create failed");
        }
        let base = Utc::now() - Duration::days(10);
        for i in 1..=3i64 {
            let ts = base + Duration::days(i);
            sqlx::query(
                "INSERT INTO articles (slug, title, content, category_id, is_published, published_at, created_at, updated_at) VALUES (?, ?, 'x', ?, 1, ?, ?, ?)",
            )
            .bind(format!("published-{}", i))
            .bind(format!("Published {}", i))
            .bind(cat)
            .bind(ts)
            .bind(ts)
            .bind(ts)
            .execute(sqlite)
            .await
            .expect("insert failed");
        }

        let published = repo
            .list_published(None, 0, 10)
            .await
            .expect("Failed to list published");
        assert_eq!(published.len(), 3);
        // Newest first
        assert_eq!(published[0].slug, "published-3");
        assert_eq!(published[2].slug, "published-1");

        let count = repo
            .count_published(None)
            .await
            .expect("Failed to count published");
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_list_published_by_category_slug() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite = pool.as_sqlite().unwrap();
        let rust_cat = create_test_category(sqlite, "rust").await;
        let go_cat = create_test_category(sqlite, "go").await;

        for i in 1..=3 {
            repo.create(
                &test_input(&format!("Rust {}", i), Some(rust_cat), true),
                &format!("rust-{}", i),
            )
            .await
            .expect("create failed");
        }
        for i in 1..=2 {
            repo.create(
                &test_input(&format!("Go {}", i), Some(go_cat), true),
                &format!("go-{}", i),
            )
            .await
            .expect("create failed");
        }
        // Uncategorized published article is excluded from category filters
        repo.create(&test_input("Loose", None, true), "loose")
            .await
            .expect("create failed");

        let rust_articles = repo
            .list_published(Some("rust"), 0, 10)
            .await
            .expect("Failed to list");
        assert_eq!(rust_articles.len(), 3);

        let rust_count = repo
            .count_published(Some("rust"))
            .await
            .expect("Failed to count");
        assert_eq!(rust_count, 3);

        let all_count = repo
            .count_published(None)
            .await
            .expect("Failed to count");
        assert_eq!(all_count, 6);
    }

    #[tokio::test]
    async fn test_category_counts_excludes_empty_and_orders() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite = pool.as_sqlite().unwrap();
        let alpha = create_test_category(sqlite, "alpha").await;
        let beta = create_test_category(sqlite, "beta").await;
        let _empty = create_test_category(sqlite, "empty").await;

        for i in 1..=2 {
            repo.create(
                &test_input(&format!("Alpha {}", i), Some(alpha), true),
                &format!("alpha-{}", i),
            )
            .await
            .expect("create failed");
        }
        for i in 1..=3 {
            repo.create(
                &test_input(&format!("Beta {}", i), Some(beta), true),
                &format!("beta-{}", i),
            )
            .await
            .expect("create failed");
        }
        // Draft in the empty category keeps its published count at zero
        repo.create(&test_input("Hidden", Some(_empty), false), "hidden")
            .await
            .expect("create failed");

        let counts = repo
            .category_counts()
            .await
            .expect("Failed to aggregate counts");

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].slug, "beta");
        assert_eq!(counts[0].count, 3);
        assert_eq!(counts[1].slug, "alpha");
        assert_eq!(counts[1].count, 2);
    }

    #[tokio::test]
    async fn test_category_counts_tie_broken_by_name() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite = pool.as_sqlite().unwrap();
        // Insert in reverse alphabetical order to prove ordering is not incidental
        let zulu = create_test_category(sqlite, "zulu").await;
        let alpha = create_test_category(sqlite, "alpha").await;

        repo.create(&test_input("Z", Some(zulu), true), "z-post")
            .await
            .expect("create failed");
        repo.create(&test_input("A", Some(alpha), true), "a-post")
            .await
            .expect("create failed");

        let counts = repo.category_counts().await.expect("Failed to aggregate");
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].name, "Category alpha");
        assert_eq!(counts[1].name, "Category zulu");
    }

    #[tokio::test]
    async fn test_exists_by_slug() {
        let (_pool, repo) = setup_test_repo().await;

        assert!(!repo.exists_by_slug("hello").await.expect("check failed"));
        repo.create(&test_input("Hello", None, false), "hello")
            .await
            .expect("create failed");
        assert!(repo.exists_by_slug("hello").await.expect("check failed"));
    }

    #[tokio::test]
    async fn test_exists_by_slug_excluding() {
        let (_pool, repo) = setup_test_repo().await;

        let first = repo
            .create(&test_input("One", None, false), "one")
            .await
            .expect("create failed");
        let second = repo
            .create(&test_input("Two", None, false), "two")
            .await
            .expect("create failed");

        assert!(repo
            .exists_by_slug_excluding("one", second.id)
            .await
            .expect("check failed"));
        assert!(!repo
            .exists_by_slug_excluding("one", first.id)
            .await
            .expect("check failed"));
    }

    #[tokio::test]
    async fn test_tags_for_article() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite = pool.as_sqlite().unwrap();

        let article = repo
            .create(&test_input("Tagged", None, true), "tagged")
            .await
            .expect("create failed");

        sqlx::query("INSERT INTO tags (slug, name) VALUES ('rust', 'Rust'), ('web', 'Web')")
            .execute(sqlite)
            .await
            .expect("tag insert failed");
        sqlx::query(
            "INSERT INTO article_tags (article_id, tag_id) SELECT ?, id FROM tags",
        )
        .bind(article.id)
        .execute(sqlite)
        .await
        .expect("join insert failed");

        let tags = repo
            .tags_for_article(article.id)
            .await
            .expect("Failed to list tags");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "Rust");
        assert_eq!(tags[1].name, "Web");

        let none = repo.tags_for_article(9999).await.expect("Failed to list");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_insert() {
        let (_pool, repo) = setup_test_repo().await;

        let now = Utc::now();
        let rows: Vec<BulkArticleRow> = (1..=50)
            .map(|i| BulkArticleRow {
                title: format!("Generated {}", i),
                slug: format!("generated-{}", i),
                content: "<p>body</p>".to_string(),
                meta_description: None,
                meta_keywords: None,
                category_id: None,
                is_published: i % 2 == 0,
                created_at: now,
                updated_at: now,
                published_at: if i % 2 == 0 { Some(now) } else { None },
            })
            .collect();

        let inserted = repo.bulk_insert(&rows).await.expect("bulk insert failed");
        assert_eq!(inserted, 50);
        assert_eq!(repo.count().await.expect("count failed"), 50);

        let empty = repo.bulk_insert(&[]).await.expect("empty insert failed");
        assert_eq!(empty, 0);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let (_pool, repo) = setup_test_repo().await;

        for i in 1..=4 {
            repo.create(&test_input(&format!("P{}", i), None, false), &format!("p-{}", i))
                .await
                .expect("create failed");
        }

        let deleted = repo.delete_all().await.expect("delete_all failed");
        assert_eq!(deleted, 4);
        assert_eq!(repo.count().await.expect("count failed"), 0);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let (_pool, repo) = setup_test_repo().await;

        for i in 1..=5 {
            repo.create(&test_input(&format!("A{}", i), None, false), &format!("a-{}", i))
                .await
                .expect("create failed");
        }

        let page1 = repo.list(0, 2).await.expect("list failed");
        assert_eq!(page1.len(), 2);
        let page3 = repo.list(4, 2).await.expect("list failed");
        assert_eq!(page3.len(), 1);
    }
}
