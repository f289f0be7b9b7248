// src/config/settings.rs
//! Process settings from environment variables (`.env` honored via `dotenvy`).

use std::str::FromStr;

use crate::dedup::DEFAULT_SIMILARITY_THRESHOLD;

use super::messages::Language;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub tavily_api_key: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_channel: Option<String>,
    pub log_level: String,
    pub log_format: String,
    pub max_articles_per_source: usize,
    pub similarity_threshold: f64,
    /// Requests per second per collector.
    pub api_rate_limit: u32,
    pub language: Language,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            tavily_api_key: None,
            slack_bot_token: None,
            slack_channel: None,
            log_level: "info".to_string(),
            log_format: "compact".to_string(),
            max_articles_per_source: 10,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            api_rate_limit: 10,
            language: Language::En,
        }
    }
}

impl Settings {
    /// Read settings from the process environment. Call `dotenvy::dotenv()` first
    /// if a `.env` file should be honored.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`Settings::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let secret = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            openai_api_key: secret("OPENAI_API_KEY"),
            openai_model: secret("OPENAI_MODEL").unwrap_or(d.openai_model),
            tavily_api_key: secret("TAVILY_API_KEY"),
            slack_bot_token: secret("SLACK_BOT_TOKEN"),
            slack_channel: secret("SLACK_CHANNEL"),
            log_level: secret("LOG_LEVEL")
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or(d.log_level),
            log_format: secret("LOG_FORMAT")
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or(d.log_format),
            max_articles_per_source: parse_or(
                &get,
                "MAX_ARTICLES_PER_SOURCE",
                d.max_articles_per_source,
            ),
            similarity_threshold: {
                let t: f64 = parse_or(&get, "SIMILARITY_THRESHOLD", d.similarity_threshold);
                if t.is_finite() {
                    t.clamp(0.0, 1.0)
                } else {
                    d.similarity_threshold
                }
            },
            api_rate_limit: parse_or(&get, "API_RATE_LIMIT", d.api_rate_limit).max(1),
            language: secret("LANGUAGE")
                .map(|s| Language::parse(&s))
                .unwrap_or(d.language),
        }
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> T
where
    T: FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "unparseable setting; using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn defaults_when_env_empty() {
        let s = Settings::from_lookup(lookup(&[]));
        assert!(s.openai_api_key.is_none());
        assert_eq!(s.max_articles_per_source, 10);
        assert_eq!(s.api_rate_limit, 10);
        assert!((s.similarity_threshold - 0.8).abs() < 1e-12);
        assert_eq!(s.language, Language::En);
    }

    #[test]
    fn parses_and_sanitizes_values() {
        let s = Settings::from_lookup(lookup(&[
            ("TAVILY_API_KEY", " tvly-123 "),
            ("SLACK_CHANNEL", ""),
            ("SIMILARITY_THRESHOLD", "1.5"),
            ("API_RATE_LIMIT", "0"),
            ("MAX_ARTICLES_PER_SOURCE", "abc"),
            ("LANGUAGE", "JA"),
            ("LOG_LEVEL", "DEBUG"),
        ]));
        assert_eq!(s.tavily_api_key.as_deref(), Some("tvly-123"));
        assert!(s.slack_channel.is_none());
        assert_eq!(s.similarity_threshold, 1.0);
        assert_eq!(s.api_rate_limit, 1);
        assert_eq!(s.max_articles_per_source, 10);
        assert_eq!(s.language, Language::Ja);
        assert_eq!(s.log_level, "debug");
    }
}
