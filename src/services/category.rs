//! Category service
//!
//! Business logic for the flat category taxonomy:
//! - Name uniqueness and slug derivation on create
//! - Get-or-create by name (used by the test-data generator)
//! - Protection of the reserved default category

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::CategoryRepository;
use crate::models::{Category, CreateCategoryInput, DEFAULT_CATEGORY_SLUG};
use crate::services::slug;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for the category list (1 hour)
const CATEGORY_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_CATEGORY_LIST: &str = "category:list";
const CACHE_KEY_CATEGORY_BY_SLUG: &str = "category:slug:";

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category name already exists
    #[error("A category named '{0}' already exists")]
    DuplicateName(String),

    /// Category slug already exists
    #[error("A category with slug '{0}' already exists")]
    DuplicateSlug(String),

    /// Category not found
    #[error("Category not found: {0}")]
    NotFound(String),

    /// Cannot delete default category
    #[error("The default category cannot be deleted")]
    CannotDeleteDefault,

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(CATEGORY_CACHE_TTL_SECS),
        }
    }

    /// Create a new category. The slug is derived from the name and
    /// disambiguated with numeric suffixes if a distinct name happens to
    /// slugify to a taken slug.
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_name(&name)
            .await
            .context("Failed to check name uniqueness")?
        {
            return Err(CategoryServiceError::DuplicateName(name));
        }

        let derived = slug::generate(&name);
        if derived.is_empty() {
            return Err(CategoryServiceError::ValidationError(format!(
                "Category name '{}' yields no usable slug",
                name
            )));
        }

        let repo = self.repo.clone();
        let resolved_slug = slug::resolve_unique(&derived, move |candidate| {
            let repo = repo.clone();
            async move { repo.exists_by_slug(&candidate).await }
        })
        .await
        .context("Failed to resolve unique slug")?;

        let category = Category::new(resolved_slug, name, input.description);
        let created = match self.repo.create(&category).await {
            Ok(created) => created,
            Err(e) => {
                if self
                    .repo
                    .exists_by_name(&category.name)
                    .await
                    .unwrap_or(false)
                {
                    return Err(CategoryServiceError::DuplicateName(category.name));
                }
                if self.repo.exists_by_slug(&category.slug).await.unwrap_or(false) {
                    return Err(CategoryServiceError::DuplicateSlug(category.slug));
                }
                return Err(CategoryServiceError::InternalError(e));
            }
        };

        tracing::info!(category_id = created.id, name = %created.name, "Created category");
        self.invalidate_cache().await;
        Ok(created)
    }

    /// Get an existing category by name or create it.
    pub async fn get_or_create(&self, name: &str) -> Result<Category, CategoryServiceError> {
        if let Some(existing) = self
            .repo
            .get_by_name(name)
            .await
            .context("Failed to get category by name")?
        {
            return Ok(existing);
        }

        self.create(CreateCategoryInput {
            name: name.to_string(),
            description: None,
        })
        .await
    }

    /// Get category by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Category>, CategoryServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category by ID")?)
    }

    /// Get category by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, CategoryServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_CATEGORY_BY_SLUG, slug);
        if let Some(category) = self.cache.get::<Category>(&cache_key).await.ok().flatten() {
            return Ok(Some(category));
        }

        let category = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get category by slug")?;

        if let Some(ref found) = category {
            let _ = self.cache.set(&cache_key, found, self.cache_ttl).await;
        }

        Ok(category)
    }

    /// List all categories ordered by name
    pub async fn list(&self) -> Result<Vec<Category>, CategoryServiceError> {
        if let Some(list) = self
            .cache
            .get::<Vec<Category>>(CACHE_KEY_CATEGORY_LIST)
            .await
            .ok()
            .flatten()
        {
            return Ok(list);
        }

        let list = self.repo.list().await.context("Failed to list categories")?;
        let _ = self
            .cache
            .set(CACHE_KEY_CATEGORY_LIST, &list, self.cache_ttl)
            .await;
        Ok(list)
    }

    /// Rename a category or edit its description.
    ///
    /// The slug is left alone: it is a public routing key and a rename
    /// is not a re-slugging decision.
    pub async fn update(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Category, CategoryServiceError> {
        let mut existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))?;

        if let Some(new_name) = name {
            let new_name = new_name.trim().to_string();
            if new_name.is_empty() {
                return Err(CategoryServiceError::ValidationError(
                    "Category name cannot be empty".to_string(),
                ));
            }
            if new_name != existing.name
                && self
                    .repo
                    .exists_by_name(&new_name)
                    .await
                    .context("Failed to check name uniqueness")?
            {
                return Err(CategoryServiceError::DuplicateName(new_name));
            }
            existing.name = new_name;
        }
        if let Some(new_description) = description {
            existing.description = Some(new_description);
        }

        let updated = self
            .repo
            .update(&existing)
            .await
            .context("Failed to update category")?;

        tracing::info!(category_id = id, name = %updated.name, "Updated category");
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Delete a category. Articles in it fall back to uncategorized.
    ///
    /// The reserved default category is refused.
    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))?;

        if existing.slug == DEFAULT_CATEGORY_SLUG {
            return Err(CategoryServiceError::CannotDeleteDefault);
        }

        self.repo
            .delete(id)
            .await
            .context("Failed to delete category")?;

        tracing::info!(category_id = id, name = %existing.name, "Deleted category");
        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_prefix("category:").await;
        // Category counts shown on the article listing are stale too
        let _ = self.cache.delete("articles:category-counts").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxCategoryRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> CategoryService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxCategoryRepository::boxed(pool);
        CategoryService::new(repo, Arc::new(Cache::new()))
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let service = setup().await;

        let created = service
            .create(CreateCategoryInput {
                name: "Web Development".to_string(),
                description: None,
            })
            .await
            .expect("create failed");

        assert_eq!(created.slug, "web-development");
        assert_eq!(created.name, "Web Development");
    }

    #[tokio::test]
    async fn test_create_duplicate_name_rejected() {
        let service = setup().await;

        service
            .create(CreateCategoryInput {
                name: "DevOps".to_string(),
                description: None,
            })
            .await
            .expect("create failed");

        let result = service
            .create(CreateCategoryInput {
                name: "DevOps".to_string(),
                description: None,
            })
            .await;
        assert!(matches!(
            result,
            Err(CategoryServiceError::DuplicateName(name)) if name == "DevOps"
        ));
    }

    #[tokio::test]
    async fn test_create_distinct_names_same_slug_disambiguated() {
        let service = setup().await;

        let first = service
            .create(CreateCategoryInput {
                name: "C++".to_string(),
                description: None,
            })
            .await
            .expect("create failed");
        // "C--" slugifies to "c" as well
        let second = service
            .create(CreateCategoryInput {
                name: "C--".to_string(),
                description: None,
            })
            .await
            .expect("create failed");

        assert_eq!(first.slug, "c");
        assert_eq!(second.slug, "c-2");
    }

    #[tokio::test]
    async fn test_create_empty_name_rejected() {
        let service = setup().await;

        let result = service
            .create(CreateCategoryInput {
                name: "   ".to_string(),
                description: None,
            })
            .await;
        assert!(matches!(result, Err(CategoryServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_existing() {
        let service = setup().await;

        let first = service.get_or_create("Databases").await.expect("failed");
        let second = service.get_or_create("Databases").await.expect("failed");
        assert_eq!(first.id, second.id);

        let all = service.list().await.expect("list failed");
        // Seeded default + Databases
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update_rename_keeps_slug() {
        let service = setup().await;

        let created = service.get_or_create("Frontend").await.expect("failed");
        let updated = service
            .update(created.id, Some("Front-end".to_string()), None)
            .await
            .expect("update failed");

        assert_eq!(updated.name, "Front-end");
        assert_eq!(updated.slug, "frontend");
    }

    #[tokio::test]
    async fn test_update_duplicate_name_rejected() {
        let service = setup().await;

        service.get_or_create("Backend").await.expect("failed");
        let other = service.get_or_create("Ops").await.expect("failed");

        let result = service
            .update(other.id, Some("Backend".to_string()), None)
            .await;
        assert!(matches!(result, Err(CategoryServiceError::DuplicateName(_))));
    }

    #[tokio::test]
    async fn test_delete_default_refused() {
        let service = setup().await;

        let default = service
            .get_by_slug(DEFAULT_CATEGORY_SLUG)
            .await
            .expect("get failed")
            .expect("default missing");

        let result = service.delete(default.id).await;
        assert!(matches!(result, Err(CategoryServiceError::CannotDeleteDefault)));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = setup().await;
        let result = service.delete(999).await;
        assert!(matches!(result, Err(CategoryServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_reflects_deletes() {
        let service = setup().await;

        let created = service.get_or_create("Ephemeral").await.expect("failed");
        assert_eq!(service.list().await.expect("list failed").len(), 2);

        service.delete(created.id).await.expect("delete failed");
        assert_eq!(service.list().await.expect("list failed").len(), 1);
    }
}
