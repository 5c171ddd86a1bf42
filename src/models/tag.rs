//! Tag model
//!
//! Tags form a many-to-many relation with articles through the
//! `article_tags` join table. An article's tag list is always fetched
//! through an explicit repository query, never materialized on the
//! entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(slug: String, name: String) -> Self {
        Self {
            id: 0,
            slug,
            name,
            description: None,
            created_at: Utc::now(),
        }
    }
}
