//! Article service
//!
//! Business logic for articles:
//! - Create/update/delete with validation and slug handling
//! - The public listing path: bounded pages of published articles,
//!   optionally filtered by category, plus per-category counts
//! - Cache of hot reads, invalidated on writes
//!
//! Slug policy: a slug derived from the title is disambiguated with
//! numeric suffixes until free; an explicitly chosen slug that collides
//! is surfaced as a duplicate error instead, since overriding the
//! author's choice silently would be worse than rejecting it. Slugs are
//! never re-derived when a title changes.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::ArticleRepository;
use crate::models::{
    Article, CategoryCount, CreateArticleInput, ListParams, PagedResult, Tag, UpdateArticleInput,
};
use crate::services::slug::{self, SlugStyle};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for single articles (1 hour)
const ARTICLE_CACHE_TTL_SECS: u64 = 3600;

/// Cache TTL for category counts (5 minutes; the sidebar may lag a
/// little behind new publications)
const COUNTS_CACHE_TTL_SECS: u64 = 300;

const CACHE_KEY_ARTICLE_BY_SLUG: &str = "article:slug:";
const CACHE_KEY_CATEGORY_COUNTS: &str = "articles:category-counts";

/// Fallback slug label when a title slugifies to nothing
const FALLBACK_SLUG: &str = "untitled";

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article not found
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("An article with slug '{0}' already exists")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Article service
pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl ArticleService {
    pub fn new(repo: Arc<dyn ArticleRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(ARTICLE_CACHE_TTL_SECS),
        }
    }

    /// Create a new article.
    ///
    /// The slug comes from the explicit override when given (normalized,
    /// collisions rejected) or is derived from the title (collisions
    /// disambiguated with numeric suffixes).
    pub async fn create(
        &self,
        input: CreateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        self.validate_create_input(&input)?;

        let resolved_slug = match input.slug.as_deref() {
            Some(explicit) => {
                let normalized = slug::generate(explicit);
                if normalized.is_empty() {
                    return Err(ArticleServiceError::ValidationError(format!(
                        "Slug '{}' contains no usable characters",
                        explicit
                    )));
                }
                if self
                    .repo
                    .exists_by_slug(&normalized)
                    .await
                    .context("Failed to check slug uniqueness")?
                {
                    return Err(ArticleServiceError::DuplicateSlug(normalized));
                }
                normalized
            }
            None => {
                let derived = slug::generate_with(&input.title, SlugStyle::Plain);
                let base = if derived.is_empty() {
                    FALLBACK_SLUG.to_string()
                } else {
                    derived
                };
                let repo = self.repo.clone();
                slug::resolve_unique(&base, move |candidate| {
                    let repo = repo.clone();
                    async move { repo.exists_by_slug(&candidate).await }
                })
                .await
                .context("Failed to resolve unique slug")?
            }
        };

        let article = match self.repo.create(&input, &resolved_slug).await {
            Ok(article) => article,
            Err(e) => {
                // The unique index is authoritative; losing a race with a
                // concurrent write surfaces as a typed conflict.
                if self.repo.exists_by_slug(&resolved_slug).await.unwrap_or(false) {
                    return Err(ArticleServiceError::DuplicateSlug(resolved_slug));
                }
                return Err(ArticleServiceError::InternalError(e));
            }
        };

        tracing::info!(
            article_id = article.id,
            slug = %article.slug,
            "Created article"
        );

        self.invalidate_cache().await;
        Ok(article)
    }

    /// Get an article by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>, ArticleServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article by ID")?)
    }

    /// Get an article by slug, any status (authoring views)
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>, ArticleServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_ARTICLE_BY_SLUG, slug);
        if let Some(article) = self.cache.get::<Article>(&cache_key).await.ok().flatten() {
            return Ok(Some(article));
        }

        let article = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get article by slug")?;

        if let Some(ref found) = article {
            let _ = self.cache.set(&cache_key, found, self.cache_ttl).await;
        }

        Ok(article)
    }

    /// Get a published article by slug (public views).
    ///
    /// A draft behaves exactly like a missing article here.
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Article>, ArticleServiceError> {
        Ok(self.get_by_slug(slug).await?.filter(|a| a.is_published))
    }

    /// List all articles with pagination (authoring views)
    pub async fn list(&self, params: ListParams) -> Result<PagedResult<Article>, ArticleServiceError> {
        let total = self.repo.count().await.context("Failed to count articles")?;
        let items = self
            .repo
            .list(params.offset(), params.limit())
            .await
            .context("Failed to list articles")?;
        Ok(PagedResult::new(items, total, &params))
    }

    /// One bounded page of the public article listing.
    ///
    /// Pages below 1 are clamped to 1. Only published articles are
    /// returned, newest first, optionally restricted to a category slug.
    /// The count and the page fetch are separate queries; a write landing
    /// between them can leave `total` slightly stale relative to the
    /// returned items. That is accepted, not a bug.
    pub async fn list_published_page(
        &self,
        page: u32,
        page_size: u32,
        category_slug: Option<&str>,
    ) -> Result<PagedResult<Article>, ArticleServiceError> {
        let params = ListParams::new(page, page_size);

        let total = self
            .repo
            .count_published(category_slug)
            .await
            .context("Failed to count published articles")?;

        let items = self
            .repo
            .list_published(category_slug, params.offset(), params.limit())
            .await
            .context("Failed to list published articles")?;

        Ok(PagedResult::new(items, total, &params))
    }

    /// Per-category published-article counts for the listing sidebar.
    ///
    /// Categories with no published articles are excluded; the result is
    /// ordered by count descending, then name ascending.
    pub async fn category_counts(&self) -> Result<Vec<CategoryCount>, ArticleServiceError> {
        if let Some(counts) = self
            .cache
            .get::<Vec<CategoryCount>>(CACHE_KEY_CATEGORY_COUNTS)
            .await
            .ok()
            .flatten()
        {
            return Ok(counts);
        }

        let counts = self
            .repo
            .category_counts()
            .await
            .context("Failed to aggregate category counts")?;

        let _ = self
            .cache
            .set(
                CACHE_KEY_CATEGORY_COUNTS,
                &counts,
                Duration::from_secs(COUNTS_CACHE_TTL_SECS),
            )
            .await;

        Ok(counts)
    }

    /// Update an article.
    ///
    /// An explicit slug edit is validated and checked for collisions; a
    /// changed title alone never touches the slug.
    pub async fn update(
        &self,
        id: i64,
        mut input: UpdateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        if !input.has_changes() {
            return Err(ArticleServiceError::ValidationError(
                "No changes provided".to_string(),
            ));
        }

        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(ArticleServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
        }
        if let Some(content) = &input.content {
            if content.trim().is_empty() {
                return Err(ArticleServiceError::ValidationError(
                    "Content cannot be empty".to_string(),
                ));
            }
        }

        if let Some(new_slug) = input.slug.take() {
            let normalized = slug::generate(&new_slug);
            if normalized.is_empty() {
                return Err(ArticleServiceError::ValidationError(format!(
                    "Slug '{}' contains no usable characters",
                    new_slug
                )));
            }
            if self
                .repo
                .exists_by_slug_excluding(&normalized, id)
                .await
                .context("Failed to check slug uniqueness")?
            {
                return Err(ArticleServiceError::DuplicateSlug(normalized));
            }
            input.slug = Some(normalized);
        }

        let updated = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update article")?;

        tracing::info!(article_id = id, "Updated article");
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Delete an article
    pub async fn delete(&self, id: i64) -> Result<(), ArticleServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article")?
            .ok_or_else(|| ArticleServiceError::NotFound(id.to_string()))?;

        self.repo
            .delete(id)
            .await
            .context("Failed to delete article")?;

        tracing::info!(article_id = id, slug = %existing.slug, "Deleted article");
        self.invalidate_cache().await;
        Ok(())
    }

    /// Tags attached to an article, fetched through the join table
    pub async fn tags_for(&self, article_id: i64) -> Result<Vec<Tag>, ArticleServiceError> {
        Ok(self
            .repo
            .tags_for_article(article_id)
            .await
            .context("Failed to list article tags")?)
    }

    fn validate_create_input(&self, input: &CreateArticleInput) -> Result<(), ArticleServiceError> {
        if input.title.trim().is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    async fn invalidate_cache(&self) {
        // Covers article:slug:* and articles:category-counts
        let _ = self.cache.delete_prefix("article").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxArticleRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup() -> (DynDatabasePool, ArticleService) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxArticleRepository::boxed(pool.clone());
        let cache = Arc::new(Cache::new());
        (pool, ArticleService::new(repo, cache))
    }

    fn input(title: &str, published: bool) -> CreateArticleInput {
        CreateArticleInput {
            title: title.to_string(),
            slug: None,
            content: "<p>body</p>".to_string(),
            meta_description: None,
            meta_keywords: None,
            category_id: None,
            is_published: published,
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug_from_title() {
        let (_pool, service) = setup().await;

        let article = service
            .create(input("Hello World!", false))
            .await
            .expect("create failed");
        assert_eq!(article.slug, "hello-world");
    }

    #[tokio::test]
    async fn test_create_disambiguates_derived_slug() {
        let (_pool, service) = setup().await;

        let first = service
            .create(input("Same Title", false))
            .await
            .expect("create failed");
        let second = service
            .create(input("Same Title", false))
            .await
            .expect("create failed");
        let third = service
            .create(input("Same Title", false))
            .await
            .expect("create failed");

        assert_eq!(first.slug, "same-title");
        assert_eq!(second.slug, "same-title-2");
        assert_eq!(third.slug, "same-title-3");
    }

    #[tokio::test]
    async fn test_create_unsluggable_title_falls_back() {
        let (_pool, service) = setup().await;

        let article = service
            .create(input("!!!", false))
            .await
            .expect("create failed");
        assert_eq!(article.slug, "untitled");

        let next = service
            .create(input("???", false))
            .await
            .expect("create failed");
        assert_eq!(next.slug, "untitled-2");
    }

    #[tokio::test]
    async fn test_create_explicit_slug_conflict_is_error() {
        let (_pool, service) = setup().await;

        service
            .create(input("Original", false))
            .await
            .expect("create failed");

        let mut dup = input("Different Title", false);
        dup.slug = Some("original".to_string());
        let result = service.create(dup).await;
        assert!(matches!(result, Err(ArticleServiceError::DuplicateSlug(s)) if s == "original"));
    }

    #[tokio::test]
    async fn test_create_explicit_slug_is_normalized() {
        let (_pool, service) = setup().await;

        let mut custom = input("Whatever", false);
        custom.slug = Some("My Custom Slug!".to_string());
        let article = service.create(custom).await.expect("create failed");
        assert_eq!(article.slug, "my-custom-slug");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_fields() {
        let (_pool, service) = setup().await;

        let result = service.create(input("   ", false)).await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));

        let mut empty_content = input("Title", false);
        empty_content.content = "  ".to_string();
        let result = service.create(empty_content).await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_list_published_page_counts() {
        let (_pool, service) = setup().await;

        for i in 1..=20 {
            service
                .create(input(&format!("Post {}", i), true))
                .await
                .expect("create failed");
        }
        // Drafts don't count
        for i in 1..=3 {
            service
                .create(input(&format!("Draft {}", i), false))
                .await
                .expect("create failed");
        }

        let page = service
            .list_published_page(1, 12, None)
            .await
            .expect("list failed");
        assert_eq!(page.len(), 12);
        assert_eq!(page.total, 20);
        assert_eq!(page.total_pages(), 2);

        let last = service
            .list_published_page(2, 12, None)
            .await
            .expect("list failed");
        assert_eq!(last.len(), 8);
    }

    #[tokio::test]
    async fn test_list_published_page_clamps_page_zero() {
        let (_pool, service) = setup().await;

        for i in 1..=5 {
            service
                .create(input(&format!("Post {}", i), true))
                .await
                .expect("create failed");
        }

        let clamped = service
            .list_published_page(0, 3, None)
            .await
            .expect("list failed");
        let first = service
            .list_published_page(1, 3, None)
            .await
            .expect("list failed");

        assert_eq!(clamped.page, 1);
        let clamped_ids: Vec<i64> = clamped.items.iter().map(|a| a.id).collect();
        let first_ids: Vec<i64> = first.items.iter().map(|a| a.id).collect();
        assert_eq!(clamped_ids, first_ids);
    }

    #[tokio::test]
    async fn test_list_published_page_past_end_keeps_totals() {
        let (_pool, service) = setup().await;

        for i in 1..=20 {
            service
                .create(input(&format!("Post {}", i), true))
                .await
                .expect("create failed");
        }

        let page = service
            .list_published_page(3, 12, None)
            .await
            .expect("list failed");
        assert!(page.is_empty());
        assert_eq!(page.total, 20);
        assert_eq!(page.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_update_explicit_slug_conflict() {
        let (_pool, service) = setup().await;

        service.create(input("First", false)).await.expect("create failed");
        let second = service
            .create(input("Second", false))
            .await
            .expect("create failed");

        let result = service
            .update(
                second.id,
                UpdateArticleInput::new().with_slug("first".to_string()),
            )
            .await;
        assert!(matches!(result, Err(ArticleServiceError::DuplicateSlug(_))));

        // Updating to its own slug is fine
        let ok = service
            .update(
                second.id,
                UpdateArticleInput::new().with_slug("second".to_string()),
            )
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_update_title_keeps_slug() {
        let (_pool, service) = setup().await;

        let created = service
            .create(input("Stable Slug", false))
            .await
            .expect("create failed");

        let updated = service
            .update(
                created.id,
                UpdateArticleInput::new().with_title("Renamed Entirely".to_string()),
            )
            .await
            .expect("update failed");

        assert_eq!(updated.title, "Renamed Entirely");
        assert_eq!(updated.slug, "stable-slug");
    }

    #[tokio::test]
    async fn test_update_no_changes_rejected() {
        let (_pool, service) = setup().await;

        let created = service
            .create(input("Post", false))
            .await
            .expect("create failed");
        let result = service.update(created.id, UpdateArticleInput::new()).await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_get_by_slug_reflects_updates() {
        let (_pool, service) = setup().await;

        let created = service
            .create(input("Cached Post", true))
            .await
            .expect("create failed");

        // Warm the cache
        let cached = service
            .get_by_slug("cached-post")
            .await
            .expect("get failed")
            .expect("not found");
        assert_eq!(cached.title, "Cached Post");

        service
            .update(
                created.id,
                UpdateArticleInput::new().with_title("Fresh Title".to_string()),
            )
            .await
            .expect("update failed");

        let fresh = service
            .get_by_slug("cached-post")
            .await
            .expect("get failed")
            .expect("not found");
        assert_eq!(fresh.title, "Fresh Title");
    }

    #[tokio::test]
    async fn test_published_filter_on_public_detail() {
        let (_pool, service) = setup().await;

        service.create(input("Draft Post", false)).await.expect("create failed");

        let public = service
            .get_published_by_slug("draft-post")
            .await
            .expect("get failed");
        assert!(public.is_none());

        let authoring = service
            .get_by_slug("draft-post")
            .await
            .expect("get failed");
        assert!(authoring.is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (_pool, service) = setup().await;
        let result = service.delete(12345).await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_category_counts_through_service() {
        let (pool, service) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();

        let result = sqlx::query("INSERT INTO categories (slug, name) VALUES ('rust', 'Rust')")
            .execute(sqlite)
            .await
            .expect("category insert failed");
        let cat_id = result.last_insert_rowid();

        for i in 1..=2 {
            let mut article = input(&format!("Rust Post {}", i), true);
            article.category_id = Some(cat_id);
            service.create(article).await.expect("create failed");
        }

        let counts = service.category_counts().await.expect("counts failed");
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].slug, "rust");
        assert_eq!(counts[0].count, 2);
    }
}
