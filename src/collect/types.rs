// src/collect/types.rs
use anyhow::Result;

use crate::article::Article;

/// Per-run inputs handed to every collector.
#[derive(Debug, Clone, Default)]
pub struct CollectParams {
    /// Search queries (ignored by feed collectors).
    pub queries: Vec<String>,
    /// Overrides the collector's configured cap when set.
    pub max_results: Option<usize>,
}

impl CollectParams {
    pub fn new(queries: Vec<String>) -> Self {
        Self {
            queries,
            max_results: None,
        }
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = Some(n);
        self
    }
}

#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &'static str;
    async fn collect_articles(&self, params: &CollectParams) -> Result<Vec<Article>>;
    async fn health_check(&self) -> bool;
}
