// src/collect/web_search.rs
//! Tavily web search collector.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::types::{CollectParams, Collector};
use super::{clean_text, dedup_by_url, is_recent, parse_feed_date, RateLimiter, USER_AGENT};
use crate::article::{Article, SourceType};

pub const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
pub const SOURCE_NAME: &str = "Tavily Web Search";
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const QUERY_PAUSE: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_RESULTS: usize = 15;

pub const INCLUDE_DOMAINS: &[&str] = &[
    "github.com",
    "stackoverflow.com",
    "dev.to",
    "medium.com",
    "techcrunch.com",
];
pub const EXCLUDE_DOMAINS: &[&str] = &["facebook.com", "twitter.com", "instagram.com"];

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "is_empty")]
    include_domains: &'a [&'a str],
    #[serde(skip_serializing_if = "is_empty")]
    exclude_domains: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published_date: Option<String>,
}

fn is_empty(domains: &&[&str]) -> bool {
    domains.is_empty()
}

/// Results per query: an even split of `max_results`, at least 1.
pub fn per_query_results(max_results: usize, n_queries: usize) -> usize {
    if n_queries == 0 {
        return max_results.max(1);
    }
    (max_results / n_queries).max(1)
}

/// Turn one search response into recent, valid articles tagged with `query`.
pub fn articles_from_response(
    resp: SearchResponse,
    query: &str,
    now: DateTime<Utc>,
) -> Vec<Article> {
    let mut out = Vec::with_capacity(resp.results.len());
    for r in resp.results {
        let mut a = match Article::try_new(
            clean_text(&r.title),
            r.url.trim(),
            SOURCE_NAME,
            SourceType::WebSearch,
        ) {
            Ok(a) => a,
            Err(e) => {
                warn!(target: "collect", query, error = %e, "skipping search result");
                continue;
            }
        };
        let content = clean_text(&r.content);
        if !content.is_empty() {
            a.content = Some(content);
        }
        a.published_date = r.published_date.as_deref().and_then(parse_feed_date);
        if !is_recent(a.published_date, now) {
            continue;
        }
        a.tags = vec![query.to_string()];
        out.push(a);
    }
    out
}

pub struct WebSearchCollector {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    max_results: usize,
    limiter: RateLimiter,
}

impl WebSearchCollector {
    pub fn new(api_key: impl Into<String>, max_results: usize, rate_limit: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("building search http client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: TAVILY_SEARCH_URL.to_string(),
            max_results,
            limiter: RateLimiter::new(rate_limit),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        include: &[&str],
        exclude: &[&str],
    ) -> Result<SearchResponse> {
        let body = SearchRequest {
            query,
            search_depth: "advanced",
            max_results,
            include_domains: include,
            exclude_domains: exclude,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("tavily send")?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("tavily http {status}: {}", text.chars().take(200).collect::<String>());
        }
        resp.json::<SearchResponse>().await.context("tavily json")
    }
}

#[async_trait]
impl Collector for WebSearchCollector {
    fn name(&self) -> &'static str {
        "web_search"
    }

    async fn collect_articles(&self, params: &CollectParams) -> Result<Vec<Article>> {
        let max = params.max_results.unwrap_or(self.max_results);
        if params.queries.is_empty() || max == 0 {
            return Ok(Vec::new());
        }
        let per_query = per_query_results(max, params.queries.len());

        let mut all = Vec::new();
        for (i, query) in params.queries.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(QUERY_PAUSE).await;
            }
            let res = self
                .limiter
                .run(self.search(query, per_query, INCLUDE_DOMAINS, EXCLUDE_DOMAINS))
                .await;
            match res {
                Ok(resp) => {
                    let found = articles_from_response(resp, query, Utc::now());
                    debug!(target: "collect", query = %query, count = found.len(), "search done");
                    all.extend(found);
                }
                Err(e) => warn!(target: "collect", query = %query, error = ?e, "search failed"),
            }
        }

        let mut all = dedup_by_url(all);
        all.truncate(max);
        info!(target: "collect", collector = self.name(), count = all.len(), "collected");
        Ok(all)
    }

    async fn health_check(&self) -> bool {
        match self.search("test", 1, &[], &[]).await {
            Ok(_) => true,
            Err(e) => {
                warn!(target: "collect", error = ?e, "search health check failed");
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

    #[test]
    fn per_query_split() {
        assert_eq!(per_query_results(15, 5), 3);
        assert_eq!(per_query_results(15, 20), 1);
        assert_eq!(per_query_results(15, 0), 15);
    }

    #[test]
    fn response_maps_to_articles() {
        let raw = r#"{"results": [
            {"title": "  Tokio  1.47 ", "url": "https://github.com/tokio-rs/tokio/releases",
             "content": "New  runtime\nfeatures", "published_date": "2025-08-18"},
            {"title": "Stale", "url": "https://dev.to/stale", "content": "x",
             "published_date": "2024-01-01T00:00:00Z"},
            {"title": "No url", "url": "", "content": "x"},
            {"title": "Undated", "url": "https://dev.to/undated"}
        ]}"#;
        let resp: SearchResponse = serde_json::from_str(raw).unwrap();
        let out = articles_from_response(resp, "rust async", now());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Tokio 1.47");
        assert_eq!(out[0].content.as_deref(), Some("New runtime features"));
        assert_eq!(out[0].source, SOURCE_NAME);
        assert_eq!(out[0].source_type, SourceType::WebSearch);
        assert_eq!(out[0].tags, vec!["rust async".to_string()]);
        assert!(out[1].content.is_none());
    }

    #[test]
    fn request_body_shape() {
        let body = SearchRequest {
            query: "q",
            search_depth: "advanced",
            max_results: 3,
            include_domains: INCLUDE_DOMAINS,
            exclude_domains: &[],
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["search_depth"], "advanced");
        assert_eq!(v["include_domains"][0], "github.com");
        assert!(v.get("exclude_domains").is_none());
    }

    #[tokio::test]
    async fn no_queries_means_no_requests() {
        let c = WebSearchCollector::new("key", 15, 10).unwrap();
        let out = c.collect_articles(&CollectParams::default()).await.unwrap();
        assert!(out.is_empty());
    }
}
