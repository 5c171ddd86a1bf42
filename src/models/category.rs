//! Category model
//!
//! Categories are a flat taxonomy: every article may belong to at most
//! one category. Name and slug are each globally unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slug of the reserved default category seeded by migration.
///
/// It is never deleted, not even by the test-data clear operation.
pub const DEFAULT_CATEGORY_SLUG: &str = "general";

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug, derived from the name
    pub slug: String,
    /// Category name (unique)
    pub name: String,
    /// Category description
    pub description: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new Category. The ID is assigned by the database.
    pub fn new(slug: String, name: String, description: Option<String>) -> Self {
        Self {
            id: 0,
            slug,
            name,
            description,
            created_at: Utc::now(),
        }
    }

    /// Check if this category is the reserved default category
    pub fn is_default(&self) -> bool {
        self.slug == DEFAULT_CATEGORY_SLUG
    }
}

/// Input for creating a new category
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    /// Category name
    pub name: String,
    /// Category description
    #[serde(default)]
    pub description: Option<String>,
}

/// Per-category published-article count, as shown on the public
/// article listing sidebar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryCount {
    pub name: String,
    pub slug: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_new() {
        let category = Category::new(
            "web-development".to_string(),
            "Web Development".to_string(),
            Some("Articles about web development".to_string()),
        );

        assert_eq!(category.id, 0);
        assert_eq!(category.slug, "web-development");
        assert_eq!(category.name, "Web Development");
        assert!(!category.is_default());
    }

    #[test]
    fn test_category_is_default() {
        let default = Category::new("general".to_string(), "General".to_string(), None);
        assert!(default.is_default());
    }
}
