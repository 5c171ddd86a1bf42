//! Synthetic test-data generation
//!
//! Fills the database with volumes of plausible-looking articles for
//! load testing: a fixed catalog of categories, synthesized titles and
//! HTML bodies, backdated creation timestamps, and a 90% published
//! ratio. Articles are persisted in fixed-size batches, one bulk insert
//! per batch, sequentially.
//!
//! The random source is an injected seedable generator, so tests can
//! pin a seed and assert exact output sequences.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{ArticleRepository, CategoryRepository};
use crate::models::{BulkArticleRow, Category, CreateCategoryInput, DEFAULT_CATEGORY_SLUG};
use crate::services::category::{CategoryService, CategoryServiceError};
use crate::services::slug::{self, SlugStyle};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// Articles persisted per storage round-trip
const BATCH_SIZE: u32 = 1000;

/// Probability that a generated article is published
const PUBLISHED_RATIO: f64 = 0.9;

/// Meta descriptions are capped at this many characters
const META_DESCRIPTION_MAX: usize = 160;

/// Fixed catalog of category names the generator works against
const CATEGORY_NAMES: &[&str] = &[
    "Technology",
    "Programming",
    "Web Development",
    "Mobile Development",
    "DevOps",
    "Artificial Intelligence",
    "Machine Learning",
    "Data Science",
    "Cybersecurity",
    "Cloud Computing",
    "Software Engineering",
    "Frontend",
    "Backend",
    "Full Stack",
    "Database",
    "UI/UX Design",
    "Project Management",
    "Career",
    "Tutorials",
    "News",
];

const SAMPLE_PARAGRAPHS: &[&str] = &[
    "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. Duis aute irure dolor in reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur.",
    "Sed ut perspiciatis unde omnis iste natus error sit voluptatem accusantium doloremque laudantium, totam rem aperiam, eaque ipsa quae ab illo inventore veritatis et quasi architecto beatae vitae dicta sunt explicabo. Nemo enim ipsam voluptatem quia voluptas sit aspernatur aut odit aut fugit.",
    "At vero eos et accusamus et iusto odio dignissimos ducimus qui blanditiis praesentium voluptatum deleniti atque corrupti quos dolores et quas molestias excepturi sint occaecati cupiditate non provident, similique sunt in culpa qui officia deserunt mollitia animi.",
    "Et harum quidem rerum facilis est et expedita distinctio. Nam libero tempore, cum soluta nobis est eligendi optio cumque nihil impedit quo minus id quod maxime placeat facere possimus, omnis voluptas assumenda est, omnis dolor repellendus.",
    "Itaque earum rerum hic tenetur a sapiente delectus, ut aut reiciendis voluptatibus maiores alias consequatur aut perferendis doloribus asperiores repellat. The quick brown fox jumps over the lazy dog.",
    "In a rapidly evolving technological landscape, developers must continuously adapt to new frameworks, languages, and methodologies. The importance of staying current with industry trends cannot be overstated, as it directly impacts career growth and project success.",
    "Modern web development encompasses a vast array of technologies and best practices. From responsive design principles to progressive web applications, developers must balance user experience with performance optimization.",
    "Database design and optimization play a crucial role in application performance. Understanding indexing strategies, query optimization, and normalization principles can significantly impact system scalability.",
    "Cloud computing has revolutionized how we deploy and manage applications. Services like AWS, Azure, and Google Cloud Platform provide scalable infrastructure solutions that enable rapid development and deployment.",
    "Cybersecurity considerations should be integrated into every phase of the development lifecycle. From secure coding practices to regular security audits, protecting user data and system integrity is paramount.",
];

const TITLE_WORDS: &[&str] = &[
    "Advanced",
    "Complete",
    "Essential",
    "Modern",
    "Ultimate",
    "Comprehensive",
    "Professional",
    "Practical",
    "Introduction",
    "Guide",
    "Tutorial",
    "Mastering",
    "Understanding",
    "Building",
    "Creating",
    "Developing",
    "Optimizing",
    "Implementing",
    "Designing",
    "Testing",
    "Deploying",
    "Scaling",
    "Managing",
    "Learning",
];

const COMMON_KEYWORDS: &[&str] = &[
    "development",
    "programming",
    "software",
    "technology",
    "guide",
    "tutorial",
    "tips",
    "best practices",
];

/// Error types for test-data operations
#[derive(Debug, thiserror::Error)]
pub enum TestDataServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<CategoryServiceError> for TestDataServiceError {
    fn from(e: CategoryServiceError) -> Self {
        TestDataServiceError::InternalError(anyhow::anyhow!(e))
    }
}

/// Test-data generator service
pub struct TestDataService {
    article_repo: Arc<dyn ArticleRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    category_service: Arc<CategoryService>,
    cache: Arc<Cache>,
    rng: Mutex<StdRng>,
}

impl TestDataService {
    /// Create a generator with an OS-seeded random source
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        category_service: Arc<CategoryService>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            article_repo,
            category_repo,
            category_service,
            cache,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a generator with a fixed seed for reproducible output
    pub fn with_seed(
        article_repo: Arc<dyn ArticleRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        category_service: Arc<CategoryService>,
        cache: Arc<Cache>,
        seed: u64,
    ) -> Self {
        Self {
            article_repo,
            category_repo,
            category_service,
            cache,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Ensure the fixed category catalog exists, creating any missing
    /// entries by name. Returns the full category list.
    pub async fn ensure_categories(&self) -> Result<Vec<Category>, TestDataServiceError> {
        for name in CATEGORY_NAMES {
            if !self
                .category_repo
                .exists_by_name(name)
                .await
                .context("Failed to check category existence")?
            {
                self.category_service
                    .create(CreateCategoryInput {
                        name: name.to_string(),
                        description: Some(format!("Articles about {}", name.to_lowercase())),
                    })
                    .await?;
            }
        }

        Ok(self
            .category_repo
            .list()
            .await
            .context("Failed to list categories")?)
    }

    /// Generate `count` synthetic articles in sequential batches of
    /// [`BATCH_SIZE`], returning how many were created.
    ///
    /// Callers are responsible for bounding `count`; the generator
    /// itself enforces no upper limit.
    pub async fn generate(&self, count: u32) -> Result<u64, TestDataServiceError> {
        tracing::info!(count, "Generating test articles");

        let categories = self.ensure_categories().await?;

        // Sequence numbers continue from the current article count so a
        // second run does not collide with slugs from the first.
        let seq_base = self
            .article_repo
            .count()
            .await
            .context("Failed to count articles")? as u64;

        let mut total_created: u64 = 0;
        let mut batch_index = 0;

        while (total_created as u32) < count {
            let current_batch = BATCH_SIZE.min(count - total_created as u32);
            let now = Utc::now();

            let rows: Vec<BulkArticleRow> = {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                (0..current_batch)
                    .map(|i| {
                        let seq = seq_base + total_created + i as u64 + 1;
                        synthesize_row(&mut rng, &categories, seq, now)
                    })
                    .collect()
            };

            let inserted = self
                .article_repo
                .bulk_insert(&rows)
                .await
                .context("Failed to insert article batch")?;

            total_created += inserted;
            batch_index += 1;
            tracing::info!(
                batch = batch_index,
                created = total_created,
                total = count,
                "Inserted article batch"
            );
        }

        // Mass inserts leave cached listings and counts behind
        let _ = self.cache.clear().await;

        tracing::info!(created = total_created, "Test article generation finished");
        Ok(total_created)
    }

    /// Delete all articles and every category except the reserved
    /// default one, returning the total number of rows removed.
    pub async fn clear(&self) -> Result<u64, TestDataServiceError> {
        tracing::info!("Clearing test data");

        let articles_deleted = self
            .article_repo
            .delete_all()
            .await
            .context("Failed to delete articles")?;
        let categories_deleted = self
            .category_repo
            .delete_all_except(DEFAULT_CATEGORY_SLUG)
            .await
            .context("Failed to delete categories")?;

        let _ = self.cache.clear().await;

        tracing::info!(
            articles = articles_deleted,
            categories = categories_deleted,
            "Cleared test data"
        );
        Ok(articles_deleted + categories_deleted)
    }
}

/// Build one synthetic article row.
fn synthesize_row(
    rng: &mut StdRng,
    categories: &[Category],
    seq: u64,
    now: DateTime<Utc>,
) -> BulkArticleRow {
    let category = &categories[rng.gen_range(0..categories.len())];
    let base_title = random_title(rng);
    let title = format!("{} #{}", base_title, seq);
    let slug = slug::generate_with(
        &format!("{}-{}", base_title, seq),
        SlugStyle::Substituting,
    );
    let content = random_content(rng);
    let meta_description = meta_description_from(&content);
    let meta_keywords = random_keywords(rng, &category.name);

    let created_at = now
        - Duration::days(rng.gen_range(0..365))
        - Duration::hours(rng.gen_range(0..24));

    // One draw decides both the flag and the timestamp
    let is_published = rng.gen_bool(PUBLISHED_RATIO);
    let published_at = is_published.then_some(created_at);

    BulkArticleRow {
        title,
        slug,
        content,
        meta_description: Some(meta_description),
        meta_keywords: Some(meta_keywords),
        category_id: Some(category.id),
        is_published,
        created_at,
        updated_at: created_at,
        published_at,
    }
}

fn random_title(rng: &mut StdRng) -> String {
    let word1 = TITLE_WORDS[rng.gen_range(0..TITLE_WORDS.len())];
    let word2 = TITLE_WORDS[rng.gen_range(0..TITLE_WORDS.len())];
    let category = CATEGORY_NAMES[rng.gen_range(0..CATEGORY_NAMES.len())];

    match rng.gen_range(0..8) {
        0 => format!("{} {} for Developers", word1, category),
        1 => format!("{} Guide to {}", word1, category),
        2 => format!("How to {} {} Applications", word2, category),
        3 => format!("{} {} with {}", word1, word2, category),
        4 => format!("Best Practices for {} Development", category),
        5 => format!("{} {}: Tips and Tricks", word1, category),
        6 => format!("Getting Started with {}", category),
        _ => format!("{} Modern {} Solutions", word2, category),
    }
}

fn random_paragraph(rng: &mut StdRng) -> &'static str {
    SAMPLE_PARAGRAPHS[rng.gen_range(0..SAMPLE_PARAGRAPHS.len())]
}

/// Synthesize an HTML body from the fixed template set: intro,
/// paragraphs with interleaved section headers, code blocks, and
/// lists, then a conclusion.
fn random_content(rng: &mut StdRng) -> String {
    let mut content = String::new();
    let paragraph_count = rng.gen_range(10..40);

    content.push_str("<h2>Introduction</h2>\n");
    content.push_str(&format!("<p>{}</p>\n", random_paragraph(rng)));

    for i in 0..paragraph_count {
        if i % 20 == 0 && i > 0 {
            content.push_str(&format!("<h3>Section {}</h3>\n", (i / 20) + 1));
        }

        if i % 15 == 10 {
            content.push_str("<pre><code>\nfn example() {\n    println!(\"sample code block\");\n}\n</code></pre>\n");
        } else if i % 25 == 15 {
            content.push_str("<ul>\n");
            for j in 0..rng.gen_range(3..6) {
                let snippet: String = random_paragraph(rng).chars().take(50).collect();
                content.push_str(&format!("<li>List item {}: {}...</li>\n", j + 1, snippet));
            }
            content.push_str("</ul>\n");
        } else {
            let mut paragraph = random_paragraph(rng).to_string();
            if rng.gen_bool(0.3) {
                paragraph.push(' ');
                paragraph.push_str(random_paragraph(rng));
            }
            content.push_str(&format!("<p>{}</p>\n", paragraph));
        }
    }

    content.push_str("<h2>Conclusion</h2>\n");
    content.push_str(&format!("<p>{}</p>\n", random_paragraph(rng)));

    content
}

/// Derive a meta description: first paragraph, HTML stripped, truncated
/// to 160 characters with an ellipsis marker when cut.
fn meta_description_from(content: &str) -> String {
    static TAG_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| regex::Regex::new("<[^>]*>").expect("static regex"));

    let first_paragraph = content.split("</p>").next().unwrap_or("");
    let plain = tag_re.replace_all(first_paragraph, "");
    let plain = plain.trim();

    if plain.chars().count() > META_DESCRIPTION_MAX {
        let truncated: String = plain.chars().take(META_DESCRIPTION_MAX - 3).collect();
        format!("{}...", truncated)
    } else {
        plain.to_string()
    }
}

fn random_keywords(rng: &mut StdRng, category_name: &str) -> String {
    let mut keywords = vec![category_name.to_lowercase()];
    for _ in 0..rng.gen_range(3..6) {
        keywords.push(COMMON_KEYWORDS[rng.gen_range(0..COMMON_KEYWORDS.len())].to_string());
    }
    let mut seen = std::collections::HashSet::new();
    keywords.retain(|k| seen.insert(k.clone()));
    keywords.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxArticleRepository, SqlxCategoryRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{
        Article, CategoryCount, CreateArticleInput, Tag, UpdateArticleInput,
    };
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    async fn setup() -> TestDataService {
        setup_with_seed(12345).await
    }

    async fn setup_with_seed(seed: u64) -> TestDataService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let article_repo = SqlxArticleRepository::boxed(pool.clone());
        let category_repo = SqlxCategoryRepository::boxed(pool);
        let cache = Arc::new(Cache::new());
        let category_service = Arc::new(CategoryService::new(category_repo.clone(), cache.clone()));
        TestDataService::with_seed(article_repo, category_repo, category_service, cache, seed)
    }

    #[tokio::test]
    async fn test_ensure_categories_creates_catalog() {
        let service = setup().await;

        let categories = service.ensure_categories().await.expect("ensure failed");
        // 20 catalog entries + the seeded default
        assert_eq!(categories.len(), CATEGORY_NAMES.len() + 1);

        // Idempotent
        let again = service.ensure_categories().await.expect("ensure failed");
        assert_eq!(again.len(), categories.len());
    }

    #[tokio::test]
    async fn test_generate_small_batch() {
        let service = setup().await;

        let created = service.generate(25).await.expect("generate failed");
        assert_eq!(created, 25);
    }

    #[tokio::test]
    async fn test_generate_rows_have_valid_slugs_and_metadata() {
        let service = setup().await;
        service.generate(40).await.expect("generate failed");

        let articles = service
            .article_repo
            .list(0, 100)
            .await
            .expect("list failed");
        assert_eq!(articles.len(), 40);

        for article in &articles {
            assert!(
                article
                    .slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "invalid slug: {}",
                article.slug
            );
            assert!(article.title.contains('#'));
            let description = article.meta_description.as_deref().expect("no description");
            assert!(description.chars().count() <= 160);
            assert!(!description.contains('<'));
            assert!(article.category_id.is_some());
            assert_eq!(article.is_published, article.published_at.is_some());
            if let Some(published_at) = article.published_at {
                assert_eq!(published_at, article.created_at);
            }
        }
    }

    #[tokio::test]
    async fn test_generate_twice_does_not_collide() {
        let service = setup().await;

        service.generate(15).await.expect("first run failed");
        service.generate(15).await.expect("second run failed");

        let count = service.article_repo.count().await.expect("count failed");
        assert_eq!(count, 30);
    }

    #[tokio::test]
    async fn test_clear_keeps_default_category() {
        let service = setup().await;

        service.generate(10).await.expect("generate failed");
        let deleted = service.clear().await.expect("clear failed");
        // 10 articles + 20 catalog categories
        assert_eq!(deleted, 10 + CATEGORY_NAMES.len() as u64);

        assert_eq!(service.article_repo.count().await.expect("count failed"), 0);
        let remaining = service.category_repo.list().await.expect("list failed");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].slug, DEFAULT_CATEGORY_SLUG);
    }

    #[tokio::test]
    async fn test_same_seed_same_output() {
        let first = setup_with_seed(7).await;
        let second = setup_with_seed(7).await;

        first.generate(10).await.expect("generate failed");
        second.generate(10).await.expect("generate failed");

        let a = first.article_repo.list(0, 20).await.expect("list failed");
        let b = second.article_repo.list(0, 20).await.expect("list failed");

        let slugs_a: Vec<&str> = a.iter().map(|x| x.slug.as_str()).collect();
        let slugs_b: Vec<&str> = b.iter().map(|x| x.slug.as_str()).collect();
        assert_eq!(slugs_a, slugs_b);
    }

    #[test]
    fn test_published_ratio_over_large_sample() {
        let mut rng = StdRng::seed_from_u64(99);
        let categories = vec![Category::new("general".into(), "General".into(), None)];
        let now = Utc::now();

        let sample = 10_000;
        let published = (0..sample)
            .filter(|i| synthesize_row(&mut rng, &categories, *i as u64, now).is_published)
            .count();

        let ratio = published as f64 / sample as f64;
        assert!(
            (0.88..=0.92).contains(&ratio),
            "published ratio {} outside tolerance",
            ratio
        );
    }

    #[test]
    fn test_backdating_within_past_year() {
        let mut rng = StdRng::seed_from_u64(5);
        let categories = vec![Category::new("general".into(), "General".into(), None)];
        let now = Utc::now();

        for i in 0..500 {
            let row = synthesize_row(&mut rng, &categories, i, now);
            assert!(row.created_at <= now);
            assert!(row.created_at >= now - Duration::days(366));
            assert_eq!(row.updated_at, row.created_at);
        }
    }

    #[test]
    fn test_meta_description_truncation() {
        let short = "<h2>Introduction</h2>\n<p>Short intro.</p>\n<p>More.</p>";
        assert_eq!(meta_description_from(short), "Introduction\nShort intro.");

        let long_body = "x".repeat(300);
        let long = format!("<p>{}</p>", long_body);
        let description = meta_description_from(&long);
        assert_eq!(description.chars().count(), 160);
        assert!(description.ends_with("..."));
    }

    /// Article repository double that records batch sizes and fails
    /// everything the generator should not touch.
    struct RecordingArticleRepo {
        batches: StdMutex<Vec<usize>>,
    }

    #[async_trait]
    impl ArticleRepository for RecordingArticleRepo {
        async fn create(&self, _: &CreateArticleInput, _: &str) -> Result<Article> {
            unimplemented!()
        }
        async fn get_by_id(&self, _: i64) -> Result<Option<Article>> {
            unimplemented!()
        }
        async fn get_by_slug(&self, _: &str) -> Result<Option<Article>> {
            unimplemented!()
        }
        async fn list(&self, _: i64, _: i64) -> Result<Vec<Article>> {
            unimplemented!()
        }
        async fn count(&self) -> Result<i64> {
            Ok(0)
        }
        async fn update(&self, _: i64, _: &UpdateArticleInput) -> Result<Article> {
            unimplemented!()
        }
        async fn delete(&self, _: i64) -> Result<()> {
            unimplemented!()
        }
        async fn list_published(
            &self,
            _: Option<&str>,
            _: i64,
            _: i64,
        ) -> Result<Vec<Article>> {
            unimplemented!()
        }
        async fn count_published(&self, _: Option<&str>) -> Result<i64> {
            unimplemented!()
        }
        async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
            unimplemented!()
        }
        async fn exists_by_slug(&self, _: &str) -> Result<bool> {
            unimplemented!()
        }
        async fn exists_by_slug_excluding(&self, _: &str, _: i64) -> Result<bool> {
            unimplemented!()
        }
        async fn tags_for_article(&self, _: i64) -> Result<Vec<Tag>> {
            unimplemented!()
        }
        async fn bulk_insert(&self, rows: &[BulkArticleRow]) -> Result<u64> {
            self.batches
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(rows.len());
            Ok(rows.len() as u64)
        }
        async fn delete_all(&self) -> Result<u64> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_generate_2500_runs_three_batches() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let recording = Arc::new(RecordingArticleRepo {
            batches: StdMutex::new(Vec::new()),
        });
        let category_repo = SqlxCategoryRepository::boxed(pool);
        let cache = Arc::new(Cache::new());
        let category_service = Arc::new(CategoryService::new(category_repo.clone(), cache.clone()));
        let service = TestDataService::with_seed(
            recording.clone(),
            category_repo,
            category_service,
            cache,
            1,
        );

        let created = service.generate(2500).await.expect("generate failed");
        assert_eq!(created, 2500);

        let batches = recording.batches.lock().unwrap().clone();
        assert_eq!(batches, vec![1000, 1000, 500]);
    }
}
