//! Article API endpoints
//!
//! On storage failure the public listing degrades to an empty result
//! set with the error logged, rather than surfacing a failure page.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{ApiError, AppState};
use crate::models::{
    Article, CategoryCount, CreateArticleInput, ListParams, UpdateArticleInput,
};

/// Default page size of the public article listing
const DEFAULT_PAGE_SIZE: u32 = 12;

/// Build the articles router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_articles_handler).post(create_article_handler))
        .route("/all", get(list_all_articles_handler))
        .route(
            "/{slug}",
            get(get_article_handler)
                .put(update_article_handler)
                .delete(delete_article_handler),
        )
}

/// Query parameters for the public listing
#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub category: Option<String>,
}

/// Article fields exposed on list views
#[derive(Debug, Serialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub meta_description: Option<String>,
    pub category_id: Option<i64>,
    pub is_published: bool,
    pub published_at: Option<String>,
    pub created_at: String,
}

impl From<Article> for ArticleSummary {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            slug: article.slug,
            title: article.title,
            meta_description: article.meta_description,
            category_id: article.category_id,
            is_published: article.is_published,
            published_at: article.published_at.map(|dt| dt.to_rfc3339()),
            created_at: article.created_at.to_rfc3339(),
        }
    }
}

/// Full article response for detail views
#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryInfo>,
    pub tags: Vec<TagInfo>,
    pub is_published: bool,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryInfo {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TagInfo {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

/// Paginated public listing response, with the category sidebar counts
#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleSummary>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub categories: Vec<CategoryCount>,
}

impl ArticleListResponse {
    fn empty(page: u32, page_size: u32) -> Self {
        Self {
            articles: Vec::new(),
            total: 0,
            page,
            page_size,
            total_pages: 0,
            categories: Vec::new(),
        }
    }
}

/// GET /api/v1/articles - public paginated listing
///
/// Supports `page`, `page_size`, and `category` query parameters. Page
/// values below 1 are clamped to 1. On storage failure the handler
/// returns an empty listing and logs the error.
pub async fn list_articles_handler(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> Json<ArticleListResponse> {
    let page = query.page.unwrap_or(1).max(1) as u32;
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE as i64)
        .clamp(1, 100) as u32;
    let category = query.category.as_deref().filter(|c| !c.is_empty());

    let result = async {
        let page_result = state
            .article_service
            .list_published_page(page, page_size, category)
            .await?;
        let categories = state.article_service.category_counts().await?;
        Ok::<_, crate::services::ArticleServiceError>((page_result, categories))
    }
    .await;

    match result {
        Ok((page_result, categories)) => {
            let total_pages = page_result.total_pages();
            Json(ArticleListResponse {
                total: page_result.total,
                page: page_result.page,
                page_size: page_result.per_page,
                total_pages,
                articles: page_result
                    .items
                    .into_iter()
                    .map(ArticleSummary::from)
                    .collect(),
                categories,
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load article listing");
            Json(ArticleListResponse::empty(page, page_size))
        }
    }
}

/// GET /api/v1/articles/all - full listing for authoring views
pub async fn list_all_articles_handler(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1) as u32;
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE as i64)
        .clamp(1, 100) as u32;

    let result = state
        .article_service
        .list(ListParams::new(page, page_size))
        .await?;

    Ok(Json(
        result.items.into_iter().map(ArticleSummary::from).collect(),
    ))
}

/// GET /api/v1/articles/{slug} - published article detail
pub async fn get_article_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state
        .article_service
        .get_published_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Article not found: {}", slug)))?;

    build_article_response(&state, article).await
}

/// POST /api/v1/articles - create an article
pub async fn create_article_handler(
    State(state): State<AppState>,
    Json(input): Json<CreateArticleInput>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state.article_service.create(input).await?;
    build_article_response(&state, article).await
}

/// PUT /api/v1/articles/{id} - update an article
pub async fn update_article_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateArticleInput>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state.article_service.update(id, input).await?;
    build_article_response(&state, article).await
}

/// DELETE /api/v1/articles/{id} - delete an article
pub async fn delete_article_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.article_service.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn build_article_response(
    state: &AppState,
    article: Article,
) -> Result<Json<ArticleResponse>, ApiError> {
    let category = match article.category_id {
        Some(category_id) => state.category_service.get_by_id(category_id).await?,
        None => None,
    };
    let tags = state.article_service.tags_for(article.id).await?;

    Ok(Json(ArticleResponse {
        id: article.id,
        slug: article.slug,
        title: article.title,
        content: article.content,
        meta_description: article.meta_description,
        meta_keywords: article.meta_keywords,
        category_id: article.category_id,
        category: category.map(|c| CategoryInfo {
            id: c.id,
            slug: c.slug,
            name: c.name,
        }),
        tags: tags
            .into_iter()
            .map(|t| TagInfo {
                id: t.id,
                slug: t.slug,
                name: t.name,
            })
            .collect(),
        is_published: article.is_published,
        published_at: article.published_at.map(|dt| dt.to_rfc3339()),
        created_at: article.created_at.to_rfc3339(),
        updated_at: article.updated_at.to_rfc3339(),
    }))
}
