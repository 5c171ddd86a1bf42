//! Data models
//!
//! Entity structs shared between the repository, service, and API
//! layers, plus the create/update input types and pagination helpers.

pub mod article;
pub mod category;
pub mod image;
pub mod page;
pub mod tag;

pub use article::{
    Article, BulkArticleRow, CreateArticleInput, ListParams, PagedResult, UpdateArticleInput,
};
pub use category::{Category, CategoryCount, CreateCategoryInput, DEFAULT_CATEGORY_SLUG};
pub use image::{CreateImageInput, ImageAsset};
pub use page::{CreatePageInput, Page, UpdatePageInput};
pub use tag::Tag;
