// src/notify/slack.rs
//! Slack Web API notifier (bot token + channel) posting Block Kit messages.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::DigestNotifier;
use crate::article::Article;
use crate::config::profile::SlackNotification;
use crate::config::{Language, Messages, Settings};

pub const SLACK_API_BASE: &str = "https://slack.com/api";
pub const SLACK_TIMEOUT: Duration = Duration::from_secs(10);
/// Articles rendered in full; the rest are only counted.
pub const SHOWN_ARTICLES: usize = 10;

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

pub struct SlackNotifier {
    client: Client,
    token: Option<String>,
    channel: Option<String>,
    options: SlackNotification,
    language: Language,
    api_base: String,
}

impl SlackNotifier {
    pub fn new(
        token: Option<String>,
        channel: Option<String>,
        options: SlackNotification,
        language: Language,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(SLACK_TIMEOUT)
            .build()
            .context("building slack http client")?;
        Ok(Self {
            client,
            token,
            channel,
            options,
            language,
            api_base: SLACK_API_BASE.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings, options: &SlackNotification) -> Result<Self> {
        Self::new(
            settings.slack_bot_token.clone(),
            settings.slack_channel.clone(),
            options.clone(),
            settings.language,
        )
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        if !self.options.enabled {
            return None;
        }
        match (self.token.as_deref(), self.channel.as_deref()) {
            (Some(t), Some(c)) => Some((t, c)),
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials().is_some()
    }

    async fn post_message(&self, token: &str, channel: &str, blocks: Vec<Value>, text: &str) -> Result<()> {
        let body = json!({ "channel": channel, "blocks": blocks, "text": text });
        let resp: SlackResponse = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?
            .json()
            .await
            .context("slack response json")?;
        if !resp.ok {
            bail!("slack api error: {}", resp.error.unwrap_or_else(|| "unknown".into()));
        }
        Ok(())
    }

    async fn call_ok(&self, method: &str, token: &str, form: &[(&str, &str)]) -> Result<()> {
        let resp: SlackResponse = self
            .client
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(token)
            .form(form)
            .send()
            .await
            .with_context(|| format!("slack {method}"))?
            .json()
            .await
            .with_context(|| format!("slack {method} json"))?;
        if !resp.ok {
            bail!("slack {method}: {}", resp.error.unwrap_or_else(|| "unknown".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DigestNotifier for SlackNotifier {
    async fn send_digest(&self, articles: &[Article], overview: &str) -> Result<bool> {
        let Some((token, channel)) = self.credentials() else {
            debug!(target: "notify", "slack disabled (token/channel missing or notifications off)");
            return Ok(false);
        };
        let top = &articles[..articles.len().min(self.options.max_articles)];
        let msgs = self.language.messages();
        let blocks = digest_blocks(top, overview, &self.options, msgs, Utc::now());
        let text = format!("{} - {} {}", msgs.weekly_trends_title, top.len(), msgs.articles_collected);
        self.post_message(token, channel, blocks, &text).await?;
        info!(target: "notify", articles = top.len(), "weekly digest sent to slack");
        Ok(true)
    }

    async fn send_error(&self, message: &str) -> Result<bool> {
        let Some((token, channel)) = self.credentials() else {
            debug!(target: "notify", "slack disabled; error notification skipped");
            return Ok(false);
        };
        let msgs = self.language.messages();
        let blocks = error_blocks(message, msgs, Utc::now());
        self.post_message(token, channel, blocks, msgs.error_title).await?;
        Ok(true)
    }

    async fn test_connection(&self) -> bool {
        let Some((token, channel)) = self.credentials() else {
            warn!(target: "notify", "slack not configured");
            return false;
        };
        if let Err(e) = self.call_ok("auth.test", token, &[]).await {
            warn!(target: "notify", error = ?e, "slack auth test failed");
            return false;
        }
        if let Err(e) = self.call_ok("conversations.info", token, &[("channel", channel)]).await {
            warn!(target: "notify", error = ?e, channel, "cannot access slack channel");
            return false;
        }
        info!(target: "notify", "slack connection test successful");
        true
    }
}

pub fn score_emoji(score: f64) -> &'static str {
    if score >= 0.8 {
        "🔥"
    } else if score >= 0.6 {
        "⭐"
    } else if score >= 0.4 {
        "👍"
    } else {
        "📄"
    }
}

fn mrkdwn_section(text: String) -> Value {
    json!({ "type": "section", "text": { "type": "mrkdwn", "text": text } })
}

fn context(text: String) -> Value {
    json!({ "type": "context", "elements": [ { "type": "mrkdwn", "text": text } ] })
}

fn divider() -> Value {
    json!({ "type": "divider" })
}

/// Block Kit payload for the weekly digest. `articles` is already capped to the profile limit.
pub fn digest_blocks(
    articles: &[Article],
    overview: &str,
    opts: &SlackNotification,
    msgs: &Messages,
    now: DateTime<Utc>,
) -> Vec<Value> {
    let mut blocks = vec![json!({
        "type": "header",
        "text": { "type": "plain_text", "text": msgs.weekly_trends_title }
    })];

    if !overview.trim().is_empty() {
        blocks.push(mrkdwn_section(format!("*{}*\n{}", msgs.weekly_overview, overview)));
        blocks.push(divider());
    }

    blocks.push(mrkdwn_section(format!(
        "📊 *{} {}*",
        articles.len(),
        msgs.articles_collected
    )));

    if !articles.is_empty() {
        blocks.push(mrkdwn_section(format!("*🔥 {}*", msgs.top_articles)));
        for (i, a) in articles.iter().take(SHOWN_ARTICLES).enumerate() {
            blocks.extend(article_blocks(a, i + 1, opts));
        }
    }

    if articles.len() > SHOWN_ARTICLES {
        blocks.push(context(format!(
            "_{}_",
            msgs.showing_top_of(SHOWN_ARTICLES, articles.len())
        )));
    }

    blocks.push(context(format!(
        "_{}_",
        msgs.generated_on(&now.format("%Y-%m-%d %H:%M UTC").to_string())
    )));
    blocks
}

fn article_blocks(a: &Article, index: usize, opts: &SlackNotification) -> Vec<Value> {
    let mut out = Vec::with_capacity(4);

    let mut title = format!("*{index}. <{}|{}>*", a.url, a.title);
    if opts.include_score {
        if let Some(score) = a.score.filter(|s| *s > 0.0) {
            title.push_str(&format!(" {} _{score:.2}_", score_emoji(score)));
        }
    }
    out.push(mrkdwn_section(title));

    let mut details: Vec<String> = Vec::new();
    if !a.source.is_empty() {
        details.push(format!("📰 {}", a.source));
    }
    if let Some(d) = a.published_date {
        details.push(format!("📅 {}", d.format("%b %d")));
    }
    if !a.tags.is_empty() {
        let tags: Vec<String> = a.tags.iter().take(3).map(|t| format!("`{t}`")).collect();
        details.push(format!("🏷️ {}", tags.join(" ")));
    }
    if !details.is_empty() {
        out.push(context(details.join(" • ")));
    }

    if opts.include_summary {
        if let Some(s) = a.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push(mrkdwn_section(format!("_{s}_")));
        }
    }

    out.push(divider());
    out
}

pub fn error_blocks(message: &str, msgs: &Messages, now: DateTime<Utc>) -> Vec<Value> {
    vec![
        json!({
            "type": "header",
            "text": { "type": "plain_text", "text": format!("⚠️ {}", msgs.error_title) }
        }),
        mrkdwn_section(format!("*{}*\n```{message}```", msgs.error_occurred)),
        context(format!(
            "_{} {}_",
            msgs.time,
            now.format("%Y-%m-%d %H:%M UTC")
        )),
    ]
}
