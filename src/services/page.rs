//! Page service
//!
//! Business logic for standalone pages. Slug handling mirrors articles:
//! derived slugs are disambiguated, explicit slug edits are validated
//! and rejected on collision, and a title change alone never re-derives
//! the slug.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::PageRepository;
use crate::models::{CreatePageInput, Page, UpdatePageInput};
use crate::services::slug;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for pages (1 hour)
const PAGE_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_PAGE_BY_SLUG: &str = "page:slug:";
const CACHE_KEY_NAV_PAGES: &str = "page:nav";

/// Fallback slug label when a title slugifies to nothing
const FALLBACK_SLUG: &str = "page";

/// Error types for page service operations
#[derive(Debug, thiserror::Error)]
pub enum PageServiceError {
    /// Page not found
    #[error("Page not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("A page with slug '{0}' already exists")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Page service
pub struct PageService {
    repo: Arc<dyn PageRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl PageService {
    pub fn new(repo: Arc<dyn PageRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(PAGE_CACHE_TTL_SECS),
        }
    }

    /// Create a new page
    pub async fn create(&self, input: CreatePageInput) -> Result<Page, PageServiceError> {
        if input.title.trim().is_empty() {
            return Err(PageServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(PageServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }

        let resolved_slug = match input.slug.as_deref() {
            Some(explicit) => {
                let normalized = slug::generate(explicit);
                if normalized.is_empty() {
                    return Err(PageServiceError::ValidationError(format!(
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
                    return Err(PageServiceError::DuplicateSlug(normalized));
                }
                normalized
            }
            None => {
                let derived = slug::generate(&input.title);
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

        let page = match self.repo.create(&input, &resolved_slug).await {
            Ok(page) => page,
            Err(e) => {
                if self.repo.exists_by_slug(&resolved_slug).await.unwrap_or(false) {
                    return Err(PageServiceError::DuplicateSlug(resolved_slug));
                }
                return Err(PageServiceError::InternalError(e));
            }
        };

        tracing::info!(page_id = page.id, slug = %page.slug, "Created page");
        self.invalidate_cache().await;
        Ok(page)
    }

    /// Get page by ID (authoring views)
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Page>, PageServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get page by ID")?)
    }

    /// Get a published page by slug (public views)
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Page>, PageServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_PAGE_BY_SLUG, slug);
        if let Some(page) = self.cache.get::<Page>(&cache_key).await.ok().flatten() {
            return Ok(Some(page).filter(|p| p.is_published));
        }

        let page = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get page by slug")?;

        if let Some(ref found) = page {
            let _ = self.cache.set(&cache_key, found, self.cache_ttl).await;
        }

        Ok(page.filter(|p| p.is_published))
    }

    /// List all pages (authoring views)
    pub async fn list(&self) -> Result<Vec<Page>, PageServiceError> {
        Ok(self.repo.list().await.context("Failed to list pages")?)
    }

    /// List published pages
    pub async fn list_published(&self) -> Result<Vec<Page>, PageServiceError> {
        Ok(self
            .repo
            .list_published()
            .await
            .context("Failed to list published pages")?)
    }

    /// Published pages flagged for the navigation menu, in menu order
    pub async fn nav_pages(&self) -> Result<Vec<Page>, PageServiceError> {
        if let Some(pages) = self
            .cache
            .get::<Vec<Page>>(CACHE_KEY_NAV_PAGES)
            .await
            .ok()
            .flatten()
        {
            return Ok(pages);
        }

        let pages = self
            .repo
            .list_nav()
            .await
            .context("Failed to list navigation pages")?;
        let _ = self.cache.set(CACHE_KEY_NAV_PAGES, &pages, self.cache_ttl).await;
        Ok(pages)
    }

    /// Update a page. Explicit slug edits are checked for collisions.
    pub async fn update(
        &self,
        id: i64,
        mut input: UpdatePageInput,
    ) -> Result<Page, PageServiceError> {
        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(PageServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
        }

        if let Some(new_slug) = input.slug.take() {
            let normalized = slug::generate(&new_slug);
            if normalized.is_empty() {
                return Err(PageServiceError::ValidationError(format!(
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
                return Err(PageServiceError::DuplicateSlug(normalized));
            }
            input.slug = Some(normalized);
        }

        let updated = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update page")?;

        tracing::info!(page_id = id, "Updated page");
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Delete a page
    pub async fn delete(&self, id: i64) -> Result<(), PageServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get page")?
            .ok_or_else(|| PageServiceError::NotFound(id.to_string()))?;

        self.repo.delete(id).await.context("Failed to delete page")?;

        tracing::info!(page_id = id, slug = %existing.slug, "Deleted page");
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_prefix("page:").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxPageRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> PageService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxPageRepository::boxed(pool);
        PageService::new(repo, Arc::new(Cache::new()))
    }

    fn input(title: &str, published: bool) -> CreatePageInput {
        CreatePageInput {
            title: title.to_string(),
            slug: None,
            content: format!("<p>{}</p>", title),
            meta_description: None,
            meta_keywords: None,
            is_published: published,
            show_in_nav: false,
            nav_order: 0,
            nav_text: None,
            nav_icon: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_and_disambiguates_slug() {
        let service = setup().await;

        let first = service.create(input("About Us", true)).await.expect("failed");
        let second = service.create(input("About Us", true)).await.expect("failed");

        assert_eq!(first.slug, "about-us");
        assert_eq!(second.slug, "about-us-2");
    }

    #[tokio::test]
    async fn test_create_explicit_slug_conflict() {
        let service = setup().await;

        service.create(input("Contact", true)).await.expect("failed");

        let mut dup = input("Reach Out", true);
        dup.slug = Some("contact".to_string());
        let result = service.create(dup).await;
        assert!(matches!(result, Err(PageServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_public_detail_hides_drafts() {
        let service = setup().await;

        service.create(input("Hidden", false)).await.expect("failed");

        let public = service
            .get_published_by_slug("hidden")
            .await
            .expect("get failed");
        assert!(public.is_none());
    }

    #[tokio::test]
    async fn test_nav_pages_reflect_updates() {
        let service = setup().await;

        let mut about = input("About", true);
        about.show_in_nav = true;
        about.nav_order = 1;
        let created = service.create(about).await.expect("failed");

        let nav = service.nav_pages().await.expect("nav failed");
        assert_eq!(nav.len(), 1);

        // Unpublishing removes it from the menu, through the cache
        service
            .update(
                created.id,
                UpdatePageInput {
                    is_published: Some(false),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed");

        let nav = service.nav_pages().await.expect("nav failed");
        assert!(nav.is_empty());
    }

    #[tokio::test]
    async fn test_update_slug_collision_rejected() {
        let service = setup().await;

        service.create(input("First", true)).await.expect("failed");
        let second = service.create(input("Second", true)).await.expect("failed");

        let result = service
            .update(
                second.id,
                UpdatePageInput {
                    slug: Some("first".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(PageServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = setup().await;
        let result = service.delete(404).await;
        assert!(matches!(result, Err(PageServiceError::NotFound(_))));
    }
}
