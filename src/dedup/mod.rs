// src/dedup/mod.rs
//! Two-pass article deduplication.
//!
//! 1) Canonical URL: first article per canonical URL is kept.
//! 2) Content similarity: TF-IDF cosine over title + leading content; for each
//!    pair at or above the threshold one article is kept by [`should_keep_first`].
//!
//! The deduplicator only filters. Surviving articles are moved through untouched.

pub mod canonical;
pub mod stopwords;
pub mod tfidf;

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::article::Article;
pub use canonical::canonicalize_url;
use tfidf::{cosine_matrix, TfidfVectorizer};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Leading content characters that go into the similarity text.
pub const SIMILARITY_CONTENT_CHARS: usize = 1000;

/// Sources preferred when two near-duplicates are otherwise tied.
pub const PREFERRED_SOURCES: &[&str] = &["github.com", "stackoverflow.com", "dev.to"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub url_removed: usize,
    pub content_removed: usize,
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f64,
    vectorizer: TfidfVectorizer,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl Deduplicator {
    /// `threshold` is clamped to [0,1]; NaN falls back to the default.
    pub fn new(threshold: f64) -> Self {
        let t = if threshold.is_nan() {
            warn!(target: "dedup", "similarity threshold is NaN; using default");
            DEFAULT_SIMILARITY_THRESHOLD
        } else if !(0.0..=1.0).contains(&threshold) {
            warn!(target: "dedup", threshold, "similarity threshold out of range; clamping");
            threshold.clamp(0.0, 1.0)
        } else {
            threshold
        };
        Self {
            threshold: t,
            vectorizer: TfidfVectorizer::default(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn deduplicate(&self, articles: Vec<Article>) -> Vec<Article> {
        self.deduplicate_with_stats(articles).0
    }

    /// Same as [`Deduplicator::deduplicate`], also reporting removals per pass.
    pub fn deduplicate_with_stats(&self, articles: Vec<Article>) -> (Vec<Article>, DedupStats) {
        if articles.is_empty() {
            return (articles, DedupStats::default());
        }
        let input = articles.len();
        info!(target: "dedup", input, "deduplicating articles");

        let (by_url, url_removed) = self.remove_url_duplicates(articles);
        info!(target: "dedup", kept = by_url.len(), removed = url_removed, "after url pass");

        let (by_content, content_removed) = self.remove_content_duplicates(by_url);
        info!(target: "dedup", kept = by_content.len(), removed = content_removed, "after content pass");

        (
            by_content,
            DedupStats {
                url_removed,
                content_removed,
            },
        )
    }

    /// Pass 1. Returns survivors and the number removed.
    pub fn remove_url_duplicates(&self, articles: Vec<Article>) -> (Vec<Article>, usize) {
        let mut seen: HashSet<String> = HashSet::with_capacity(articles.len());
        let mut keep = Vec::with_capacity(articles.len());
        let mut removed = 0usize;

        for a in articles {
            let key = canonicalize_url(&a.url);
            if seen.insert(key.clone()) {
                keep.push(a);
            } else {
                debug!(target: "dedup", url = %key, "removed duplicate url");
                removed += 1;
            }
        }
        (keep, removed)
    }

    /// Pass 2. Falls back to the unchanged input when the corpus is too sparse
    /// or vectorization fails.
    pub fn remove_content_duplicates(&self, articles: Vec<Article>) -> (Vec<Article>, usize) {
        if articles.len() <= 1 {
            return (articles, 0);
        }

        let blobs: Vec<String> = articles.iter().map(similarity_text).collect();
        let comparable = blobs
            .iter()
            .filter(|b| b.split_whitespace().count() > 3)
            .count();
        if comparable < 2 {
            debug!(target: "dedup", comparable, "corpus too sparse; skipping content pass");
            return (articles, 0);
        }

        let rows = match self.vectorizer.fit_transform(&blobs) {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "dedup", error = %e, "content dedup failed; keeping url-pass result");
                return (articles, 0);
            }
        };
        let sim = cosine_matrix(&rows);

        let n = articles.len();
        let mut removed = vec![false; n];
        for i in 0..n {
            if removed[i] {
                continue;
            }
            for j in (i + 1)..n {
                if removed[j] || sim[i][j] < self.threshold {
                    continue;
                }
                if should_keep_first(&articles[i], &articles[j]) {
                    removed[j] = true;
                    debug!(target: "dedup", similarity = sim[i][j], title = %articles[j].short_title(), "removed similar article");
                } else {
                    removed[i] = true;
                    debug!(target: "dedup", similarity = sim[i][j], title = %articles[i].short_title(), "removed similar article");
                    break;
                }
            }
        }

        let dropped = removed.iter().filter(|r| **r).count();
        let keep = articles
            .into_iter()
            .zip(removed)
            .filter_map(|(a, r)| (!r).then_some(a))
            .collect();
        (keep, dropped)
    }
}

/// Deduplicate with an optional threshold (default 0.8).
pub fn deduplicate(articles: Vec<Article>, similarity_threshold: Option<f64>) -> Vec<Article> {
    Deduplicator::new(similarity_threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD))
        .deduplicate(articles)
}

/// Title plus the first [`SIMILARITY_CONTENT_CHARS`] characters of content.
pub fn similarity_text(a: &Article) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(2);
    if !a.title.is_empty() {
        parts.push(a.title.clone());
    }
    if let Some(c) = a.content.as_deref().filter(|c| !c.is_empty()) {
        parts.push(c.chars().take(SIMILARITY_CONTENT_CHARS).collect());
    }
    parts.join(" ")
}

/// Keep rule for a near-duplicate pair; first decisive rule wins:
/// longer content, has a date, newer date, preferred source, else the first.
pub fn should_keep_first(first: &Article, second: &Article) -> bool {
    let (len1, len2) = (first.content_chars(), second.content_chars());
    if len1 != len2 {
        return len1 > len2;
    }

    match (first.published_date, second.published_date) {
        (Some(_), None) => return true,
        (None, Some(_)) => return false,
        (Some(d1), Some(d2)) => return d1 > d2,
        (None, None) => {}
    }

    let pref1 = is_preferred_source(&first.source);
    let pref2 = is_preferred_source(&second.source);
    if pref1 != pref2 {
        return pref1;
    }

    true
}

fn is_preferred_source(source: &str) -> bool {
    let s = source.to_lowercase();
    PREFERRED_SOURCES.iter().any(|p| s.contains(p))
}
