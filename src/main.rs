//! inkpost - a small personal blog and content site

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkpost::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxArticleRepository, SqlxCategoryRepository, SqlxImageRepository,
            SqlxPageRepository,
        },
    },
    services::{
        ArticleService, CategoryService, ImageService, LocalFileStore, PageService,
        TestDataService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting inkpost...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Create repositories
    let article_repo = SqlxArticleRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());
    let page_repo = SqlxPageRepository::boxed(pool.clone());
    let image_repo = SqlxImageRepository::boxed(pool.clone());

    // Initialize services
    let upload_config = Arc::new(config.upload.clone());
    let file_store = Arc::new(LocalFileStore::new(config.upload.path.clone()));

    let article_service = Arc::new(ArticleService::new(article_repo.clone(), cache.clone()));
    let category_service = Arc::new(CategoryService::new(category_repo.clone(), cache.clone()));
    let page_service = Arc::new(PageService::new(page_repo, cache.clone()));
    let image_service = Arc::new(ImageService::new(
        image_repo,
        file_store,
        upload_config.clone(),
    ));
    let testdata_service = Arc::new(TestDataService::new(
        article_repo,
        category_repo,
        category_service.clone(),
        cache.clone(),
    ));

    // Build application state
    let state = AppState {
        article_service,
        category_service,
        page_service,
        image_service,
        testdata_service,
        testdata_config: Arc::new(config.testdata.clone()),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin, &config.upload.path);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
