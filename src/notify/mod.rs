// src/notify/mod.rs
pub mod slack;

pub use slack::SlackNotifier;

use anyhow::Result;

use crate::article::Article;

/// Delivers the ranked digest. `Ok(false)` means the channel is disabled or
/// unconfigured and nothing was sent.
#[async_trait::async_trait]
pub trait DigestNotifier: Send + Sync {
    async fn send_digest(&self, articles: &[Article], overview: &str) -> Result<bool>;
    async fn send_error(&self, message: &str) -> Result<bool>;
    async fn test_connection(&self) -> bool;
}
