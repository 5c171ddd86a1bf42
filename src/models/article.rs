//! Article model
//!
//! This module provides:
//! - `Article` entity representing a blog article
//! - Input types for creating and updating articles
//! - Pagination types shared by list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Article title
    pub title: String,
    /// HTML body
    pub content: String,
    /// Short summary used in meta tags and list views
    pub meta_description: Option<String>,
    /// Comma-separated keywords used in meta tags
    pub meta_keywords: Option<String>,
    /// Category ID (None means uncategorized)
    pub category_id: Option<i64>,
    /// Whether the article is visible on public listings
    pub is_published: bool,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArticleInput {
    /// Article title
    pub title: String,
    /// Explicit slug override; derived from the title when None
    #[serde(default)]
    pub slug: Option<String>,
    /// HTML body
    pub content: String,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub meta_keywords: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Publish immediately (defaults to false)
    #[serde(default)]
    pub is_published: bool,
}

/// Input for updating an existing article
///
/// Every field is optional; only the fields that are set are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    /// Some(None) clears the category, Some(Some(id)) reassigns it
    pub category_id: Option<Option<i64>>,
    pub is_published: Option<bool>,
}

impl UpdateArticleInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn with_slug(mut self, slug: String) -> Self {
        self.slug = Some(slug);
        self
    }

    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.is_published = Some(published);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.slug.is_some()
            || self.content.is_some()
            || self.meta_description.is_some()
            || self.meta_keywords.is_some()
            || self.category_id.is_some()
            || self.is_published.is_some()
    }
}

/// Fully specified article row for bulk insertion.
///
/// Unlike `CreateArticleInput`, the caller provides every timestamp:
/// the test-data generator backdates `created_at` and mirrors it into
/// `published_at` for published rows.
#[derive(Debug, Clone)]
pub struct BulkArticleRow {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub category_id: Option<i64>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 12,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters.
    ///
    /// Page values below 1 are coerced to 1; the page size is clamped
    /// to 1..=100.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Total number of pages; 0 when the result set is empty.
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 12,
        }
    }
}
