//! Slug generation and identifier uniqueness
//!
//! Two historically divergent slug flavors are consolidated here behind
//! an explicit style parameter:
//! - `Plain` strips punctuation outright; used for authored articles,
//!   categories, and pages.
//! - `Substituting` first maps a handful of punctuation marks to words
//!   (`&` becomes `and`, `#` becomes `sharp`, ...) and then applies the
//!   plain pipeline; used by the test-data generator. Stored slugs
//!   depend on which flavor created them, so call sites must not drift.
//!
//! The uniqueness helpers never write; they probe storage through a
//! caller-supplied `exists` closure. The storage unique index remains
//! the authoritative guard under concurrent creation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::future::Future;
use uuid::Uuid;

/// Slug generation flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugStyle {
    /// Strip punctuation; whitespace runs become single hyphens.
    Plain,
    /// Map selected punctuation to words before the plain pipeline.
    Substituting,
}

/// Punctuation-to-word substitutions applied by `SlugStyle::Substituting`.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("&", "and"),
    ("#", "sharp"),
    ("%", "percent"),
    ("@", "at"),
    ("=", "equals"),
];

/// Generate a URL-safe slug with the plain flavor.
///
/// Lowercases the input, strips every character that is not a lowercase
/// ASCII letter, digit, space, or hyphen, collapses whitespace runs into
/// single hyphens, collapses hyphen runs, and trims hyphens from both
/// ends. Total and idempotent; empty or all-invalid input yields an
/// empty string, which callers must treat as invalid and replace with a
/// default label.
pub fn generate(text: &str) -> String {
    generate_with(text, SlugStyle::Plain)
}

/// Generate a URL-safe slug with an explicit flavor.
///
/// The output always matches `^[a-z0-9-]*$` regardless of flavor.
pub fn generate_with(text: &str, style: SlugStyle) -> String {
    let lowered = text.to_lowercase();
    let prepared = match style {
        SlugStyle::Plain => lowered,
        SlugStyle::Substituting => {
            let mut s = lowered;
            for (from, to) in SUBSTITUTIONS {
                s = s.replace(from, to);
            }
            s
        }
    };

    let mut slug = String::with_capacity(prepared.len());
    let mut prev_hyphen = true; // leading hyphens are dropped
    for c in prepared.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            prev_hyphen = false;
        } else if c.is_whitespace() || c == '-' {
            if !prev_hyphen {
                slug.push('-');
                prev_hyphen = true;
            }
        }
        // Everything else is stripped
    }

    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Cap on numeric-suffix probes before falling back to a random suffix.
const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

/// Resolve a candidate identifier to one that does not exist yet.
///
/// Returns the candidate unchanged when it is free. On collision, a
/// numeric suffix (`-2`, `-3`, ...) is appended and re-probed until a
/// free identifier is found; after `MAX_SUFFIX_ATTEMPTS` collisions a
/// random suffix breaks the pathological case. The `exists` probe may
/// read from storage; resolution itself never writes, so two concurrent
/// resolutions can still race and the unique index decides the winner.
pub async fn resolve_unique<F, Fut>(candidate: &str, exists: F) -> Result<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    if !exists(candidate.to_string()).await? {
        return Ok(candidate.to_string());
    }

    for n in 2..=MAX_SUFFIX_ATTEMPTS {
        let attempt = format!("{}-{}", candidate, n);
        if !exists(attempt.clone()).await? {
            return Ok(attempt);
        }
    }

    Ok(format!("{}-{}", candidate, Uuid::new_v4().simple()))
}

/// Build a generated filename candidate for an upload.
///
/// Shape: `{stem}_{yyyymmdd_hhmmss}_{8-hex-token}.{ext}` where the stem
/// is the plain-slugified original name (or `upload` when nothing
/// survives slugification) and the extension is carried over lowercased.
pub fn candidate_file_name(original: &str) -> String {
    build_file_name(original, Utc::now(), &random_token(8))
}

/// Resolve a generated filename that is not recorded yet.
///
/// The candidate is probed once; on the astronomically unlikely hit the
/// token is regenerated at full length and used without re-probing.
pub async fn resolve_unique_file_name<F, Fut>(original: &str, exists: F) -> Result<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let now = Utc::now();
    let candidate = build_file_name(original, now, &random_token(8));
    if !exists(candidate.clone()).await? {
        return Ok(candidate);
    }
    Ok(build_file_name(original, now, &random_token(32)))
}

fn build_file_name(original: &str, timestamp: DateTime<Utc>, token: &str) -> String {
    let (stem, ext) = split_file_name(original);
    let stem = {
        let slugified = generate(stem);
        if slugified.is_empty() {
            "upload".to_string()
        } else {
            slugified
        }
    };
    let stamp = timestamp.format("%Y%m%d_%H%M%S");
    match ext {
        Some(ext) => format!("{}_{}_{}.{}", stem, stamp, token, ext),
        None => format!("{}_{}_{}", stem, stamp, token),
    }
}

/// Split an original filename into stem and a usable lowercase extension.
fn split_file_name(original: &str) -> (&str, Option<String>) {
    match original.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() < 10
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, Some(ext.to_lowercase()))
        }
        _ => (original, None),
    }
}

fn random_token(len: usize) -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(len);
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_generate_basic_cases() {
        assert_eq!(generate("Hello World!"), "hello-world");
        assert_eq!(generate("   "), "");
        assert_eq!(generate(""), "");
        assert_eq!(generate("C++ & Go"), "c-go");
        assert_eq!(generate("Rust 2024 Edition"), "rust-2024-edition");
        assert_eq!(generate("--already--slugged--"), "already-slugged");
    }

    #[test]
    fn test_generate_strips_unicode() {
        assert_eq!(generate("Café résumé"), "caf-rsum");
        assert_eq!(generate("日本語"), "");
    }

    #[test]
    fn test_generate_substituting_cases() {
        assert_eq!(
            generate_with("C++ & Go", SlugStyle::Substituting),
            "c-and-go"
        );
        assert_eq!(generate_with("C#", SlugStyle::Substituting), "csharp");
        assert_eq!(
            generate_with("100% coverage", SlugStyle::Substituting),
            "100percent-coverage"
        );
        assert_eq!(
            generate_with("me @ home", SlugStyle::Substituting),
            "me-at-home"
        );
        assert_eq!(generate_with("a = b", SlugStyle::Substituting), "a-equals-b");
    }

    #[test]
    fn test_generate_is_idempotent() {
        for input in ["Hello World!", "C++ & Go", "a--b--c", "  spaced  out  "] {
            let once = generate(input);
            assert_eq!(generate(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_both_styles_match_slug_pattern() {
        let inputs = [
            "Advanced C# for Developers #42",
            "50% & rising = trouble?",
            "---",
            "ONE two\tthree\nfour",
        ];
        for input in inputs {
            for style in [SlugStyle::Plain, SlugStyle::Substituting] {
                let slug = generate_with(input, style);
                assert!(
                    slug.chars().all(|c| c.is_ascii_lowercase()
                        || c.is_ascii_digit()
                        || c == '-'),
                    "invalid slug {:?} for {:?}",
                    slug,
                    input
                );
                assert!(!slug.starts_with('-') && !slug.ends_with('-'));
                assert!(!slug.contains("--"));
            }
        }
    }

    #[tokio::test]
    async fn test_resolve_unique_returns_free_candidate_unchanged() {
        let taken: Arc<HashSet<String>> = Arc::new(HashSet::new());
        let resolved = resolve_unique("fresh-slug", |s| {
            let taken = taken.clone();
            async move { Ok(taken.contains(&s)) }
        })
        .await
        .expect("resolve failed");
        assert_eq!(resolved, "fresh-slug");
    }

    #[tokio::test]
    async fn test_resolve_unique_appends_numeric_suffix() {
        let taken: Arc<HashSet<String>> = Arc::new(
            ["post", "post-2", "post-3"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let resolved = resolve_unique("post", |s| {
            let taken = taken.clone();
            async move { Ok(taken.contains(&s)) }
        })
        .await
        .expect("resolve failed");
        assert_eq!(resolved, "post-4");
    }

    #[tokio::test]
    async fn test_resolve_unique_probes_until_free() {
        let taken: Arc<HashSet<String>> =
            Arc::new(["busy".to_string(), "busy-2".to_string()].into_iter().collect());
        let probes = Arc::new(AtomicUsize::new(0));

        let probes_clone = probes.clone();
        let resolved = resolve_unique("busy", move |s| {
            let taken = taken.clone();
            let probes = probes_clone.clone();
            async move {
                probes.fetch_add(1, Ordering::SeqCst);
                Ok(taken.contains(&s))
            }
        })
        .await
        .expect("resolve failed");

        assert_eq!(resolved, "busy-3");
        // candidate, -2, -3
        assert_eq!(probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_resolve_unique_propagates_probe_errors() {
        let result = resolve_unique("any", |_| async { anyhow::bail!("storage down") }).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_candidate_file_name_shape() {
        let name = candidate_file_name("My Photo.PNG");
        let re = regex::Regex::new(r"^my-photo_\d{8}_\d{6}_[0-9a-f]{8}\.png$").unwrap();
        assert!(re.is_match(&name), "unexpected filename: {}", name);
    }

    #[test]
    fn test_candidate_file_name_no_extension() {
        let name = candidate_file_name("README");
        let re = regex::Regex::new(r"^readme_\d{8}_\d{6}_[0-9a-f]{8}$").unwrap();
        assert!(re.is_match(&name), "unexpected filename: {}", name);
    }

    #[test]
    fn test_candidate_file_name_unusable_stem_falls_back() {
        let name = candidate_file_name("###.jpg");
        assert!(name.starts_with("upload_"), "unexpected filename: {}", name);
        assert!(name.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_resolve_unique_file_name_widens_token_on_hit() {
        // An exists probe that claims everything is taken forces the
        // full-length token path.
        let name = resolve_unique_file_name("photo.png", |_| async { Ok(true) })
            .await
            .expect("resolve failed");
        let re = regex::Regex::new(r"^photo_\d{8}_\d{6}_[0-9a-f]{32}\.png$").unwrap();
        assert!(re.is_match(&name), "unexpected filename: {}", name);
    }

    #[tokio::test]
    async fn test_resolve_unique_file_name_free_candidate() {
        let name = resolve_unique_file_name("photo.png", |_| async { Ok(false) })
            .await
            .expect("resolve failed");
        let re = regex::Regex::new(r"^photo_\d{8}_\d{6}_[0-9a-f]{8}\.png$").unwrap();
        assert!(re.is_match(&name), "unexpected filename: {}", name);
    }
}
