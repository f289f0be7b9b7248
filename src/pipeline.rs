// src/pipeline.rs
//! One collection run: queries → collect → dedup → score → summarize → notify.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use metrics::{counter, gauge, histogram};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::ai::queries::DEFAULT_MAX_QUERIES;
use crate::ai::{build_chat_client, DynChat, QueryGenerator, Summarizer};
use crate::article::{Article, ArticleCollection};
use crate::collect::{CollectParams, Collector, RssCollector, WebSearchCollector};
use crate::config::{Profile, Settings};
use crate::dedup::Deduplicator;
use crate::metrics as m;
use crate::notify::{DigestNotifier, SlackNotifier};
use crate::scoring::Scorer;

/// Articles that get a model summary.
pub const SUMMARIZE_TOP: usize = 20;
pub const TEST_RUN_QUERIES: usize = 2;
pub const TEST_RUN_RESULTS: usize = 5;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub collected: usize,
    pub unique: usize,
    pub notified: bool,
    pub duration_ms: f64,
}

impl RunReport {
    /// A run succeeds when the digest went out, or when there was nothing to collect.
    pub fn succeeded(&self) -> bool {
        self.notified || self.collected == 0
    }
}

pub struct Pipeline {
    profile: Profile,
    collectors: Vec<Arc<dyn Collector>>,
    deduplicator: Deduplicator,
    scorer: Scorer,
    query_generator: QueryGenerator,
    summarizer: Summarizer,
    notifier: Arc<dyn DigestNotifier>,
}

impl Pipeline {
    pub fn new(
        settings: &Settings,
        profile: Profile,
        collectors: Vec<Arc<dyn Collector>>,
        chat: DynChat,
        notifier: Arc<dyn DigestNotifier>,
    ) -> Self {
        Self {
            deduplicator: Deduplicator::new(settings.similarity_threshold),
            scorer: Scorer::new(&profile),
            query_generator: QueryGenerator::new(Arc::clone(&chat), settings.language),
            summarizer: Summarizer::new(chat, settings.language),
            profile,
            collectors,
            notifier,
        }
    }

    /// Real collaborators from settings and profile.
    pub fn from_config(settings: &Settings, profile: Profile) -> Result<Self> {
        let collectors = build_collectors(settings, &profile)?;
        let notifier = SlackNotifier::from_settings(settings, &profile.notification.slack)?;
        let chat = build_chat_client(settings);
        Ok(Self::new(settings, profile, collectors, chat, Arc::new(notifier)))
    }

    /// Replace the summarizer (e.g. to drop the inter-batch pause).
    pub fn with_summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Full weekly run. On failure an error notification is attempted before returning the error.
    pub async fn run_collection(&self) -> Result<RunReport> {
        m::ensure_described();
        info!(target: "pipeline", "starting tech trend collection");
        let started = Instant::now();

        let res = self.run_inner(started).await;
        let outcome = match &res {
            Ok(r) if r.succeeded() => "success",
            Ok(_) => "not_notified",
            Err(_) => "failure",
        };
        counter!(m::PIPELINE_RUNS_TOTAL, "outcome" => outcome).increment(1);
        gauge!(m::PIPELINE_LAST_RUN_TS).set(chrono::Utc::now().timestamp() as f64);

        if let Err(e) = &res {
            error!(target: "pipeline", error = ?e, "collection failed");
            match self.notifier.send_error(&format!("{e:#}")).await {
                Ok(_) => {}
                Err(ne) => error!(target: "pipeline", error = ?ne, "error notification failed"),
            }
        }
        res
    }

    async fn run_inner(&self, started: Instant) -> Result<RunReport> {
        let queries = self
            .query_generator
            .generate(&self.profile, DEFAULT_MAX_QUERIES)
            .await;

        let raw = self.collect_all(&CollectParams::new(queries)).await;
        let collected = raw.len();
        info!(target: "pipeline", collected, "collected articles total");

        if raw.is_empty() {
            warn!(target: "pipeline", "no articles collected; sending empty digest");
            let msg = self.summarizer.collection_overview(&[]).await;
            let notified = self
                .notifier
                .send_digest(&[], &msg)
                .await
                .context("sending empty digest")?;
            return Ok(self.finish(started, 0, 0, notified));
        }

        let (unique, stats) = self.deduplicator.deduplicate_with_stats(raw);
        counter!(m::DEDUP_REMOVED_TOTAL, "pass" => "url").increment(stats.url_removed as u64);
        counter!(m::DEDUP_REMOVED_TOTAL, "pass" => "content").increment(stats.content_removed as u64);

        let mut ranked = unique;
        self.scorer.score_and_rank(&mut ranked);

        let top = ranked.len().min(SUMMARIZE_TOP);
        self.summarizer.summarize_articles(&mut ranked[..top]).await;
        let overview = self.summarizer.collection_overview(&ranked).await;

        let collection = ArticleCollection::new(ranked, collected);
        let notified = self
            .notifier
            .send_digest(&collection.articles, &overview)
            .await
            .context("sending digest")?;

        info!(
            target: "pipeline",
            articles = collection.total_processed,
            sources = ?collection.sources_used,
            notified,
            "final stats"
        );
        Ok(self.finish(started, collected, collection.total_processed, notified))
    }

    fn finish(&self, started: Instant, collected: usize, unique: usize, notified: bool) -> RunReport {
        let duration_ms = started.elapsed().as_secs_f64() * 1_000.0;
        histogram!(m::PIPELINE_DURATION_MS).record(duration_ms);
        info!(target: "pipeline", duration_ms, "collection completed");
        RunReport {
            collected,
            unique,
            notified,
            duration_ms,
        }
    }

    /// Run every collector concurrently; failures are logged and contribute nothing.
    /// Results keep collector order.
    pub async fn collect_all(&self, params: &CollectParams) -> Vec<Article> {
        let mut set = JoinSet::new();
        for (idx, c) in self.collectors.iter().enumerate() {
            let c = Arc::clone(c);
            let params = params.clone();
            set.spawn(async move {
                let name = c.name();
                (idx, name, c.collect_articles(&params).await)
            });
        }

        let mut per: Vec<(usize, Vec<Article>)> = Vec::with_capacity(self.collectors.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, name, Ok(v))) => {
                    info!(target: "collect", collector = name, count = v.len(), "collector finished");
                    counter!(m::COLLECT_ARTICLES_TOTAL, "collector" => name).increment(v.len() as u64);
                    per.push((idx, v));
                }
                Ok((_, name, Err(e))) => {
                    warn!(target: "collect", collector = name, error = ?e, "collector failed");
                    counter!(m::COLLECT_PROVIDER_ERRORS_TOTAL, "collector" => name).increment(1);
                }
                Err(e) => warn!(target: "collect", error = ?e, "collector task panicked"),
            }
        }
        per.sort_by_key(|(i, _)| *i);
        per.into_iter().flat_map(|(_, v)| v).collect()
    }

    /// Notifier plus every collector; true only when all pass.
    pub async fn health_check(&self) -> bool {
        let mut all_ok = true;
        let slack = self.notifier.test_connection().await;
        info!(target: "pipeline", component = "slack", ok = slack, "health");
        all_ok &= slack;
        for c in &self.collectors {
            let ok = c.health_check().await;
            info!(target: "pipeline", component = c.name(), ok, "health");
            all_ok &= ok;
        }
        info!(target: "pipeline", healthy = all_ok, "overall health");
        all_ok
    }

    /// Small smoke run: two queries, five web results, scoring only. Nothing is sent.
    pub async fn test_run(&self) -> Result<bool> {
        let Some(web) = self.collectors.iter().find(|c| c.name() == "web_search") else {
            warn!(target: "pipeline", "web search collector not enabled; test run skipped");
            return Ok(false);
        };
        let queries = self
            .query_generator
            .generate(&self.profile, TEST_RUN_QUERIES)
            .await;
        let params = CollectParams::new(queries).with_max_results(TEST_RUN_RESULTS);
        let mut articles = web.collect_articles(&params).await.context("test collection")?;
        info!(target: "pipeline", count = articles.len(), "test collected articles");
        if articles.is_empty() {
            return Ok(false);
        }
        self.scorer.score_and_rank(&mut articles);
        info!(target: "pipeline", "test processing completed");
        Ok(true)
    }
}

/// Collectors enabled by the profile. Web search needs a Tavily key; twitter/reddit
/// sections are accepted in the profile but have no collector.
pub fn build_collectors(settings: &Settings, profile: &Profile) -> Result<Vec<Arc<dyn Collector>>> {
    let mut out: Vec<Arc<dyn Collector>> = Vec::new();
    let src = &profile.sources;

    if src.web_search.enabled {
        match settings.tavily_api_key.as_deref() {
            Some(key) => out.push(Arc::new(WebSearchCollector::new(
                key,
                src.web_search.max_results,
                settings.api_rate_limit,
            )?)),
            None => warn!(target: "pipeline", "web search enabled but TAVILY_API_KEY not set"),
        }
    }
    if src.rss_feeds.enabled {
        out.push(Arc::new(RssCollector::new(
            src.rss_feeds.feeds.clone(),
            profile.interests.clone(),
            settings.max_articles_per_source,
            settings.api_rate_limit,
        )?));
    }
    if src.x_twitter.enabled && !src.x_twitter.accounts.is_empty() {
        info!(target: "pipeline", "x/twitter source configured but not collected");
    }
    if src.reddit.enabled && !src.reddit.subreddits.is_empty() {
        info!(target: "pipeline", "reddit source configured but not collected");
    }
    Ok(out)
}
