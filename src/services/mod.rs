//! Services layer - business logic
//!
//! Services coordinate repositories, the cache, and the file store,
//! and own validation and slug/uniqueness policy.

pub mod article;
pub mod category;
pub mod image;
pub mod page;
pub mod slug;
pub mod testdata;

pub use article::{ArticleService, ArticleServiceError};
pub use category::{CategoryService, CategoryServiceError};
pub use image::{FileStore, ImageService, ImageServiceError, LocalFileStore};
pub use page::{PageService, PageServiceError};
pub use slug::SlugStyle;
pub use testdata::{TestDataService, TestDataServiceError};
