//! Repository layer
//!
//! Trait-per-entity data access. Each repository exposes a trait the
//! services depend on, plus a SQLx implementation that dispatches on the
//! configured driver.

pub mod article;
pub mod category;
pub mod image;
pub mod page;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use image::{ImageRepository, SqlxImageRepository};
pub use page::{PageRepository, SqlxPageRepository};
