// src/article.rs
//! Article record shared by collectors, the dedup/scoring core, and the notifier.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_CHARS: usize = 500;

/// Where an article came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    WebSearch,
    Rss,
    Twitter,
    Reddit,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::WebSearch => "web_search",
            SourceType::Rss => "rss",
            SourceType::Twitter => "twitter",
            SourceType::Reddit => "reddit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Filled by the summarizer after ranking; scoring never reads it.
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    pub source: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub relevance_score: Option<f64>,

    #[serde(default = "Utc::now")]
    pub collected_at: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
}

impl Article {
    /// Unchecked constructor; callers that ingest external data should prefer [`Article::try_new`].
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        source_type: SourceType,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: None,
            summary: None,
            author: None,
            published_date: None,
            source: source.into(),
            source_type,
            tags: Vec::new(),
            score: None,
            relevance_score: None,
            collected_at: Utc::now(),
            processed: false,
        }
    }

    /// Checked constructor: non-empty bounded title, absolute http(s) URL, non-empty source.
    pub fn try_new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        source_type: SourceType,
    ) -> Result<Self> {
        let a = Self::new(title, url, source, source_type);
        a.validate()?;
        Ok(a)
    }

    pub fn validate(&self) -> Result<()> {
        let title_len = self.title.chars().count();
        if self.title.trim().is_empty() {
            bail!("article title is empty");
        }
        if title_len > MAX_TITLE_CHARS {
            bail!("article title too long ({title_len} chars)");
        }
        if self.source.trim().is_empty() {
            bail!("article source is empty");
        }
        match url::Url::parse(&self.url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") && u.has_host() => Ok(()),
            Ok(u) => bail!("unsupported url scheme `{}`", u.scheme()),
            Err(e) => bail!("invalid url `{}`: {e}", self.url),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_published(mut self, ts: DateTime<Utc>) -> Self {
        self.published_date = Some(ts);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Character count of the body; 0 when absent.
    pub fn content_chars(&self) -> usize {
        self.content.as_deref().map_or(0, |c| c.chars().count())
    }

    /// Title + content + tags, the text interests and keywords are matched against.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(2 + self.tags.len());
        if !self.title.is_empty() {
            parts.push(&self.title);
        }
        if let Some(c) = self.content.as_deref().filter(|c| !c.is_empty()) {
            parts.push(c);
        }
        parts.extend(self.tags.iter().map(String::as_str));
        parts.join(" ")
    }

    /// Short title for log lines.
    pub fn short_title(&self) -> String {
        self.title.chars().take(50).collect()
    }
}

/// Ranked output of one collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleCollection {
    pub articles: Vec<Article>,
    pub total_collected: usize,
    pub total_processed: usize,
    pub collection_date: DateTime<Utc>,
    pub sources_used: Vec<String>,
}

impl ArticleCollection {
    pub fn new(articles: Vec<Article>, total_collected: usize) -> Self {
        let mut sources_used: Vec<String> = Vec::new();
        for a in &articles {
            if !sources_used.iter().any(|s| s == &a.source) {
                sources_used.push(a.source.clone());
            }
        }
        Self {
            total_processed: articles.len(),
            articles,
            total_collected,
            collection_date: Utc::now(),
            sources_used,
        }
    }
}
