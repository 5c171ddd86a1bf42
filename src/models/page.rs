//! Page model for standalone pages (about, contact, and so on)
//!
//! Pages carry navigation metadata so published pages can be surfaced
//! in the site menu without a separate navigation table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standalone page entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// HTML body
    pub content: String,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    /// Whether the page is publicly visible
    pub is_published: bool,
    /// Whether the page appears in the site navigation
    pub show_in_nav: bool,
    /// Sort position within the navigation menu
    pub nav_order: i32,
    /// Menu label; falls back to the title when empty
    pub nav_text: Option<String>,
    /// Menu icon name
    pub nav_icon: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a page
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePageInput {
    pub title: String,
    /// Explicit slug override; derived from the title when None
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub meta_keywords: Option<String>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub show_in_nav: bool,
    #[serde(default)]
    pub nav_order: i32,
    #[serde(default)]
    pub nav_text: Option<String>,
    #[serde(default)]
    pub nav_icon: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Input for updating a page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePageInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_published: Option<bool>,
    pub show_in_nav: Option<bool>,
    pub nav_order: Option<i32>,
    pub nav_text: Option<String>,
    pub nav_icon: Option<String>,
}

impl Page {
    /// Label shown in the navigation menu
    pub fn nav_label(&self) -> &str {
        match self.nav_text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => &self.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> Page {
        let now = Utc::now();
        Page {
            id: 1,
            slug: "about".to_string(),
            title: "About".to_string(),
            content: "<p>Hello</p>".to_string(),
            meta_description: None,
            meta_keywords: None,
            is_published: true,
            show_in_nav: true,
            nav_order: 0,
            nav_text: None,
            nav_icon: None,
            published_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_nav_label_falls_back_to_title() {
        let mut page = sample_page();
        assert_eq!(page.nav_label(), "About");

        page.nav_text = Some("".to_string());
        assert_eq!(page.nav_label(), "About");

        page.nav_text = Some("Who we are".to_string());
        assert_eq!(page.nav_label(), "Who we are");
    }
}
