// src/collect/mod.rs
//! Article collectors (RSS/Atom feeds, Tavily web search) and their shared helpers.

pub mod rss;
pub mod types;
pub mod web_search;

pub use rss::RssCollector;
pub use types::{CollectParams, Collector};
pub use web_search::WebSearchCollector;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;
use tokio::sync::Semaphore;

use crate::article::Article;

pub const USER_AGENT: &str = "TechTrendNotifier/1.0";

/// Articles older than this are dropped by collectors; undated ones are kept.
pub const RECENT_DAYS: i64 = 7;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_BLOCK_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("block tag regex")
});

/// Caps concurrent requests at `rate` and pauses `1/rate` s after each one.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    pause: Duration,
}

impl RateLimiter {
    /// `rate` is requests per second; 0 is treated as 1.
    pub fn new(rate: u32) -> Self {
        let rate = rate.max(1);
        Self {
            permits: Arc::new(Semaphore::new(rate as usize)),
            pause: Duration::from_secs_f64(1.0 / f64::from(rate)),
        }
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    pub async fn run<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, so a failed acquire only means "no limit".
        let _permit = self.permits.acquire().await.ok();
        let out = fut.await;
        tokio::time::sleep(self.pause).await;
        out
    }
}

/// Collapse runs of whitespace and trim.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain text from an HTML fragment: entities decoded, tags stripped, whitespace collapsed.
pub fn html_to_text(s: &str) -> String {
    let no_blocks = RE_BLOCK_TAGS.replace_all(s, " ");
    // Tags become spaces so adjacent block elements don't glue words together.
    let stripped = RE_TAGS.replace_all(&no_blocks, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    let out = decoded
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace('\u{00A0}', " ");
    clean_text(&out)
}

/// True when undated or published within [`RECENT_DAYS`] of `now`.
pub fn is_recent(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match published {
        None => true,
        Some(ts) => ts >= now - chrono::Duration::days(RECENT_DAYS),
    }
}

/// Interests (as written in the profile) that occur in `text`, case-insensitively.
pub fn extract_tags(text: &str, interests: &[String]) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lower = text.to_lowercase();
    interests
        .iter()
        .filter(|i| {
            let needle = i.trim().to_lowercase();
            !needle.is_empty() && lower.contains(&needle)
        })
        .cloned()
        .collect()
}

/// Keep the first article per exact URL, preserving order.
pub fn dedup_by_url(articles: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::with_capacity(articles.len());
    articles
        .into_iter()
        .filter(|a| seen.insert(a.url.clone()))
        .collect()
}

/// Parse feed / API timestamps: RFC 3339, RFC 2822, then bare ISO date-times and dates (as UTC).
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return offset_to_chrono(dt);
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return offset_to_chrono(dt);
    }
    // Named zones like "GMT"/"EST".
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

fn offset_to_chrono(dt: OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}
