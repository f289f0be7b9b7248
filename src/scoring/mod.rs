// src/scoring/mod.rs
//! Relevance and overall scoring against a user profile.
//!
//! relevance = min(1, 0.4*interests + 0.3*keywords + 0.2*source + 0.1*recency)
//! quality   = 0.3*title + 0.2*content_length + 0.1*[author] + 0.1*[date]
//! overall   = min(1, 0.7*relevance + 0.3*quality)
//!
//! The scorer only writes `relevance_score` / `score` and reorders; it never
//! adds or drops articles.

pub mod source_quality;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::article::Article;
use crate::config::Profile;

pub const W_INTERESTS: f64 = 0.4;
pub const W_KEYWORDS: f64 = 0.3;
pub const W_SOURCE: f64 = 0.2;
pub const W_RECENCY: f64 = 0.1;

pub const W_RELEVANCE: f64 = 0.7;
pub const W_QUALITY: f64 = 0.3;

pub const HIGH_PRIORITY_BOOST: f64 = 0.3;
pub const MEDIUM_PRIORITY_BOOST: f64 = 0.1;
pub const EXCLUDE_PENALTY: f64 = 0.2;

/// Neutral sub-score for "no interests configured" and "no publish date".
pub const NEUTRAL: f64 = 0.5;

static CLICKBAIT: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d+\s+(things|ways|reasons|tips)",
        r"you won't believe",
        r"shocking",
        r"amazing",
        r"incredible",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("clickbait regex"))
    .collect()
});

/// Per-component relevance inputs, mainly for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceBreakdown {
    pub interests: f64,
    pub keywords: f64,
    pub source: f64,
    pub recency: f64,
}

impl RelevanceBreakdown {
    pub fn combined(&self) -> f64 {
        (W_INTERESTS * self.interests
            + W_KEYWORDS * self.keywords
            + W_SOURCE * self.source
            + W_RECENCY * self.recency)
            .min(1.0)
    }
}

/// Profile terms, lower-cased once at construction.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    interests: Vec<String>,
    high_priority: Vec<String>,
    medium_priority: Vec<String>,
    exclude: Vec<String>,
}

impl Scorer {
    pub fn new(profile: &Profile) -> Self {
        Self {
            interests: lowered(&profile.interests),
            high_priority: lowered(&profile.keywords.high_priority),
            medium_priority: lowered(&profile.keywords.medium_priority),
            exclude: lowered(&profile.keywords.exclude),
        }
    }

    /// Score every article and sort by `score`, highest first (stable).
    pub fn score_and_rank(&self, articles: &mut [Article]) {
        self.score_and_rank_at(articles, Utc::now());
    }

    /// As [`Scorer::score_and_rank`] with an explicit clock for the recency bands.
    pub fn score_and_rank_at(&self, articles: &mut [Article], now: DateTime<Utc>) {
        for a in articles.iter_mut() {
            let b = self.breakdown(a, now);
            let relevance = b.combined();
            let overall = overall_score(relevance, a);
            a.relevance_score = Some(relevance);
            a.score = Some(overall);
            debug!(
                target: "scoring",
                title = %a.short_title(),
                interests = b.interests,
                keywords = b.keywords,
                source = b.source,
                recency = b.recency,
                relevance,
                score = overall,
                "scored article"
            );
        }

        articles.sort_by(|x, y| {
            let sx = x.score.unwrap_or(0.0);
            let sy = y.score.unwrap_or(0.0);
            sy.total_cmp(&sx)
        });

        if let Some(top) = articles.first() {
            info!(
                target: "scoring",
                count = articles.len(),
                top_score = top.score.unwrap_or(0.0),
                "ranked articles"
            );
        }
    }

    pub fn breakdown(&self, article: &Article, now: DateTime<Utc>) -> RelevanceBreakdown {
        let text = article.searchable_text().to_lowercase();
        RelevanceBreakdown {
            interests: self.interest_score(&text),
            keywords: self.keyword_score(&text),
            source: source_quality::weight_for(&article.source),
            recency: recency_score(article.published_date, now),
        }
    }

    /// Fraction of interests present in `text` (already lower-cased).
    pub fn interest_score(&self, text: &str) -> f64 {
        if self.interests.is_empty() {
            return NEUTRAL;
        }
        let hits = self.interests.iter().filter(|i| text.contains(i.as_str())).count();
        hits as f64 / self.interests.len() as f64
    }

    /// Keyword boosts minus penalties, floored at 0. Not capped at 1.
    pub fn keyword_score(&self, text: &str) -> f64 {
        let count = |terms: &[String]| terms.iter().filter(|k| text.contains(k.as_str())).count() as f64;
        let raw = HIGH_PRIORITY_BOOST * count(&self.high_priority)
            + MEDIUM_PRIORITY_BOOST * count(&self.medium_priority)
            - EXCLUDE_PENALTY * count(&self.exclude);
        raw.max(0.0)
    }
}

/// Free-function form: score, rank and hand the articles back.
pub fn score_and_rank(mut articles: Vec<Article>, profile: &Profile) -> Vec<Article> {
    Scorer::new(profile).score_and_rank(&mut articles);
    articles
}

pub fn recency_score(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(ts) = published else {
        return NEUTRAL;
    };
    let age = now - ts;
    if age <= Duration::days(1) {
        1.0
    } else if age <= Duration::days(3) {
        0.8
    } else if age <= Duration::days(7) {
        0.6
    } else if age <= Duration::days(14) {
        0.4
    } else {
        0.2
    }
}

pub fn overall_score(relevance: f64, article: &Article) -> f64 {
    let author = article
        .author
        .as_deref()
        .is_some_and(|s| !s.is_empty());
    let quality = 0.3 * title_quality(&article.title)
        + 0.2 * content_length_score(article.content.as_deref())
        + if author { 0.1 } else { 0.0 }
        + if article.published_date.is_some() { 0.1 } else { 0.0 };
    (W_RELEVANCE * relevance + W_QUALITY * quality).min(1.0)
}

pub fn title_quality(title: &str) -> f64 {
    if title.is_empty() {
        return 0.0;
    }
    let len = title.chars().count();
    let length_score = match len {
        30..=100 => 1.0,
        20..=120 => 0.8,
        10..=150 => 0.6,
        _ => 0.3,
    };
    let lower = title.to_lowercase();
    let hits = CLICKBAIT.iter().filter(|re| re.is_match(&lower)).count();
    (length_score - 0.2 * hits as f64).max(0.0)
}

pub fn content_length_score(content: Option<&str>) -> f64 {
    let len = content.map_or(0, |c| c.chars().count());
    match len {
        0 => 0.0,
        l if l >= 1000 => 1.0,
        l if l >= 500 => 0.8,
        l if l >= 200 => 0.6,
        l if l >= 100 => 0.4,
        _ => 0.2,
    }
}

/// Lower-cased only; padding is part of the term ("ai " must not match "maintaining").
fn lowered(terms: &[String]) -> Vec<String> {
    terms.iter().map(|t| t.to_lowercase()).collect()
}
