// src/ai/mod.rs
//! Language-model helpers: chat client abstraction, query generation, summaries.

pub mod queries;
pub mod summarizer;

pub use queries::QueryGenerator;
pub use summarizer::Summarizer;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Settings;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// One chat completion request: a system prompt plus a single user turn.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Trimmed assistant reply.
    async fn complete(&self, req: ChatRequest<'_>) -> Result<String>;
    fn provider_name(&self) -> &'static str;
}

pub type DynChat = Arc<dyn ChatClient>;

/// OpenAI when a key is configured, otherwise a client that always errors
/// (callers then take their fallback paths).
pub fn build_chat_client(settings: &Settings) -> DynChat {
    match settings.openai_api_key.as_deref() {
        Some(key) => match OpenAiChat::new(key, &settings.openai_model) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::warn!(error = ?e, "openai client init failed; ai disabled");
                Arc::new(DisabledChat)
            }
        },
        None => {
            tracing::info!("OPENAI_API_KEY not set; ai helpers use fallbacks");
            Arc::new(DisabledChat)
        }
    }
}

/// Chat Completions over HTTPS.
pub struct OpenAiChat {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiChat {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::collect::USER_AGENT)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building openai http client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: OPENAI_CHAT_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatClient for OpenAiChat {
    async fn complete(&self, req: ChatRequest<'_>) -> Result<String> {
        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: req.system,
                },
                Msg {
                    role: "user",
                    content: req.user,
                },
            ],
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("openai send")?;
        let status = resp.status();
        if !status.is_success() {
            bail!("openai http {status}");
        }
        let parsed: Resp = resp.json().await.context("openai json")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("openai returned no choices"))?;
        Ok(content.trim().to_string())
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Used when no API key is configured.
pub struct DisabledChat;

#[async_trait]
impl ChatClient for DisabledChat {
    async fn complete(&self, _req: ChatRequest<'_>) -> Result<String> {
        bail!("ai disabled")
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_chat_errors() {
        let c = DisabledChat;
        let r = c
            .complete(ChatRequest {
                system: "s",
                user: "u",
                max_tokens: 10,
                temperature: 0.0,
            })
            .await;
        assert!(r.is_err());
        assert_eq!(c.provider_name(), "disabled");
    }

    #[test]
    fn build_without_key_is_disabled() {
        let s = Settings::default();
        assert_eq!(build_chat_client(&s).provider_name(), "disabled");
    }

    #[test]
    fn request_serializes_in_chat_shape() {
        let r = Req {
            model: "gpt-4o-mini",
            messages: vec![Msg {
                role: "system",
                content: "x",
            }],
            temperature: 0.5,
            max_tokens: 150,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["max_tokens"], 150);
    }
}
