// src/collect/rss.rs
//! RSS 2.0 / Atom feed collector.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::types::{CollectParams, Collector};
use super::{clean_text, dedup_by_url, extract_tags, html_to_text, is_recent, parse_feed_date};
use super::{RateLimiter, USER_AGENT};
use crate::article::{Article, SourceType};

pub const FEED_TIMEOUT: Duration = Duration::from_secs(30);
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
pub const HEALTH_FEED: &str = "https://feeds.feedburner.com/oreilly/radar";

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded", alias = "encoded")]
    content_encoded: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    author: Option<String>,
    #[serde(rename = "dc:creator", alias = "creator")]
    creator: Option<String>,
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
    author: Option<AtomAuthor>,
}

/// Text construct; `type="html"` bodies are decoded later.
#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: Option<String>,
}

/// Feed entry before validation, common to both formats.
#[derive(Debug, Default)]
struct RawEntry {
    title: String,
    link: String,
    body_html: String,
    published: Option<String>,
    author: Option<String>,
}

impl From<RssItem> for RawEntry {
    fn from(it: RssItem) -> Self {
        let body = it
            .content_encoded
            .filter(|s| !s.trim().is_empty())
            .or(it.description)
            .unwrap_or_default();
        Self {
            title: it.title.unwrap_or_default(),
            link: it.link.unwrap_or_default(),
            body_html: body,
            published: it.pub_date,
            author: it.creator.or(it.author),
        }
    }
}

impl From<AtomEntry> for RawEntry {
    fn from(e: AtomEntry) -> Self {
        let link = e
            .links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
            .or_else(|| e.links.first())
            .and_then(|l| l.href.clone())
            .unwrap_or_default();
        let body = e
            .content
            .map(|t| t.value)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| e.summary.map(|t| t.value))
            .unwrap_or_default();
        Self {
            title: e.title.map(|t| t.value).unwrap_or_default(),
            link,
            body_html: body,
            published: e.published.or(e.updated),
            author: e.author.and_then(|a| a.name),
        }
    }
}

/// Replace HTML-only entities that would make the XML parser fail.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Host of the feed URL, used as the article source label.
pub fn feed_source_name(feed_url: &str) -> String {
    url::Url::parse(feed_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| feed_url.to_string())
}

/// Parse one feed body into articles.
///
/// Takes at most `max_entries` entries in document order, skips invalid ones,
/// drops entries older than the recency window and tags by `interests`.
pub fn parse_feed(
    xml: &str,
    feed_url: &str,
    interests: &[String],
    max_entries: usize,
    now: DateTime<Utc>,
) -> Result<Vec<Article>> {
    let clean = scrub_html_entities_for_xml(xml);
    let head: String = clean.chars().take(1024).collect::<String>().to_lowercase();

    let entries: Vec<RawEntry> = if head.contains("<rss") {
        let rss: Rss = from_str(&clean).context("parsing rss xml")?;
        rss.channel.items.into_iter().map(RawEntry::from).collect()
    } else if head.contains("<feed") {
        let feed: AtomFeed = from_str(&clean).context("parsing atom xml")?;
        feed.entries.into_iter().map(RawEntry::from).collect()
    } else {
        bail!("unrecognized feed format at {feed_url}");
    };

    let source = feed_source_name(feed_url);
    let mut out = Vec::new();
    for raw in entries.into_iter().take(max_entries) {
        let title = html_to_text(&raw.title);
        let link = raw.link.trim().to_string();
        if title.is_empty() || link.is_empty() {
            continue;
        }
        let mut article = match Article::try_new(title, link, source.clone(), SourceType::Rss) {
            Ok(a) => a,
            Err(e) => {
                warn!(target: "collect", feed = feed_url, error = %e, "skipping feed entry");
                continue;
            }
        };

        let content = html_to_text(&raw.body_html);
        if !content.is_empty() {
            article.content = Some(content);
        }
        article.author = raw.author.map(|a| clean_text(&a)).filter(|a| !a.is_empty());
        article.published_date = raw.published.as_deref().and_then(parse_feed_date);

        if !is_recent(article.published_date, now) {
            continue;
        }
        let tag_text = format!("{} {}", article.title, article.content_str());
        article.tags = extract_tags(&tag_text, interests);
        out.push(article);
    }
    Ok(out)
}

pub struct RssCollector {
    client: reqwest::Client,
    feeds: Vec<String>,
    interests: Arc<Vec<String>>,
    max_articles: usize,
    limiter: RateLimiter,
}

impl RssCollector {
    pub fn new(
        feeds: Vec<String>,
        interests: Vec<String>,
        max_articles: usize,
        rate_limit: u32,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("building rss http client")?;
        Ok(Self {
            client,
            feeds,
            interests: Arc::new(interests),
            max_articles,
            limiter: RateLimiter::new(rate_limit),
        })
    }

    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<Option<String>> {
        let resp = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        if resp.status() != reqwest::StatusCode::OK {
            warn!(target: "collect", feed = url, status = %resp.status(), "feed fetch failed");
            return Ok(None);
        }
        let body = resp.text().await.with_context(|| format!("reading body of {url}"))?;
        Ok(Some(body))
    }
}

#[async_trait]
impl Collector for RssCollector {
    fn name(&self) -> &'static str {
        "rss_feeds"
    }

    async fn collect_articles(&self, params: &CollectParams) -> Result<Vec<Article>> {
        let cap = params.max_results.unwrap_or(self.max_articles);
        if self.feeds.is_empty() || cap == 0 {
            return Ok(Vec::new());
        }

        let mut set = JoinSet::new();
        for (idx, feed) in self.feeds.iter().cloned().enumerate() {
            let client = self.client.clone();
            let limiter = self.limiter.clone();
            let interests = Arc::clone(&self.interests);
            let max_entries = self.max_articles;
            set.spawn(async move {
                let fetched = limiter.run(Self::fetch_feed(&client, &feed)).await;
                let articles = match fetched {
                    Ok(Some(body)) => {
                        match parse_feed(&body, &feed, &interests, max_entries, Utc::now()) {
                            Ok(v) => v,
                            Err(e) => {
                                warn!(target: "collect", feed = %feed, error = ?e, "feed parse failed");
                                Vec::new()
                            }
                        }
                    }
                    Ok(None) => Vec::new(),
                    Err(e) => {
                        warn!(target: "collect", feed = %feed, error = ?e, "feed fetch failed");
                        Vec::new()
                    }
                };
                debug!(target: "collect", feed = %feed, count = articles.len(), "feed processed");
                (idx, articles)
            });
        }

        let mut per_feed: Vec<(usize, Vec<Article>)> = Vec::with_capacity(self.feeds.len());
        while let Some(res) = set.join_next().await {
            match res {
                Ok(pair) => per_feed.push(pair),
                Err(e) => warn!(target: "collect", error = ?e, "feed task panicked"),
            }
        }
        per_feed.sort_by_key(|(idx, _)| *idx);

        let mut all = dedup_by_url(per_feed.into_iter().flat_map(|(_, v)| v).collect());
        all.truncate(cap);
        info!(target: "collect", collector = self.name(), count = all.len(), "collected");
        Ok(all)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(HEALTH_FEED)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(e) => {
                warn!(target: "collect", error = ?e, "rss health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, 12, 0, 0).unwrap()
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel>
  <title>Example Blog</title>
  <link>https://blog.example.com</link>
  <item>
    <title>Rust 1.89 released</title>
    <link>https://blog.example.com/rust-1-89</link>
    <description>&lt;p&gt;Short&nbsp;teaser&lt;/p&gt;</description>
    <content:encoded><![CDATA[<p>Full <b>body</b> about Rust and cargo.</p>]]></content:encoded>
    <pubDate>Mon, 18 Aug 2025 09:30:00 +0000</pubDate>
    <dc:creator>Ferris</dc:creator>
  </item>
  <item>
    <title>Old news</title>
    <link>https://blog.example.com/old</link>
    <pubDate>Mon, 02 Jun 2025 09:30:00 +0000</pubDate>
  </item>
  <item>
    <title>Undated post</title>
    <link>https://blog.example.com/undated</link>
    <description>kubernetes operators</description>
  </item>
  <item>
    <title></title>
    <link>https://blog.example.com/untitled</link>
  </item>
</channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <entry>
    <title type="html">Zig &amp; WebAssembly</title>
    <link rel="alternate" href="https://atom.example.org/zig-wasm"/>
    <link rel="edit" href="https://atom.example.org/edit/1"/>
    <updated>2025-08-19T08:00:00Z</updated>
    <summary>Compiling zig to wasm</summary>
    <author><name>Andrew</name></author>
  </entry>
  <entry>
    <title>Second</title>
    <link href="https://atom.example.org/second"/>
    <published>2025-08-17T08:00:00Z</published>
    <content type="html">&lt;p&gt;Body text&lt;/p&gt;</content>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items() {
        let interests = vec!["Rust".to_string(), "Kubernetes".to_string()];
        let out = parse_feed(RSS, "https://blog.example.com/feed.xml", &interests, 10, now()).unwrap();
        let urls: Vec<&str> = out.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://blog.example.com/rust-1-89", "https://blog.example.com/undated"]
        );

        let first = &out[0];
        assert_eq!(first.source, "blog.example.com");
        assert_eq!(first.source_type, SourceType::Rss);
        assert_eq!(first.content.as_deref(), Some("Full body about Rust and cargo."));
        assert_eq!(first.author.as_deref(), Some("Ferris"));
        assert!(first.published_date.is_some());
        assert_eq!(first.tags, vec!["Rust".to_string()]);

        assert!(out[1].published_date.is_none());
        assert_eq!(out[1].tags, vec!["Kubernetes".to_string()]);
    }

    #[test]
    fn entry_cap_applies_before_filtering() {
        let out = parse_feed(RSS, "https://blog.example.com/feed.xml", &[], 2, now()).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn parses_atom_entries() {
        let out = parse_feed(ATOM, "https://atom.example.org/atom.xml", &[], 10, now()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Zig & WebAssembly");
        assert_eq!(out[0].url, "https://atom.example.org/zig-wasm");
        assert_eq!(out[0].content.as_deref(), Some("Compiling zig to wasm"));
        assert_eq!(out[0].author.as_deref(), Some("Andrew"));
        assert!(out[0].published_date.is_some());
        assert_eq!(out[1].content.as_deref(), Some("Body text"));
        assert_eq!(out[1].source, "atom.example.org");
    }

    #[test]
    fn unknown_format_is_an_error() {
        assert!(parse_feed("<html></html>", "https://x.dev", &[], 10, now()).is_err());
    }

    #[test]
    fn source_name_falls_back_to_raw() {
        assert_eq!(feed_source_name("https://Dev.TO/feed"), "dev.to");
        assert_eq!(feed_source_name("not a url"), "not a url");
    }
}
