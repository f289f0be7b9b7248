// src/config/profile.rs
//! User profile: interests, keyword tiers, enabled sources, notification options.
//!
//! File shape (TOML; JSON with the same structure is also accepted):
//! ```toml
//! [user_profile]
//! name = "Tech Team"
//! interests = ["rust", "kubernetes"]
//!
//! [user_profile.keywords]
//! high_priority = ["security", "release"]
//! medium_priority = ["performance"]
//! exclude = ["sponsored"]
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_PROFILE_PATH: &str = "PROFILE_PATH";
pub const DEFAULT_PROFILE_TOML: &str = "config/profile.toml";
pub const DEFAULT_PROFILE_JSON: &str = "config/profile.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keywords {
    pub high_priority: Vec<String>,
    pub medium_priority: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchSource {
    pub enabled: bool,
    pub max_results: usize,
}

impl Default for WebSearchSource {
    fn default() -> Self {
        Self {
            enabled: true,
            max_results: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RssSource {
    pub enabled: bool,
    pub feeds: Vec<String>,
}

impl Default for RssSource {
    fn default() -> Self {
        Self {
            enabled: true,
            feeds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterSource {
    pub enabled: bool,
    pub accounts: Vec<String>,
}

impl Default for TwitterSource {
    fn default() -> Self {
        Self {
            enabled: true,
            accounts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSource {
    pub enabled: bool,
    pub subreddits: Vec<String>,
}

impl Default for RedditSource {
    fn default() -> Self {
        Self {
            enabled: true,
            subreddits: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    pub web_search: WebSearchSource,
    pub rss_feeds: RssSource,
    pub x_twitter: TwitterSource,
    pub reddit: RedditSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackNotification {
    pub enabled: bool,
    pub max_articles: usize,
    pub include_summary: bool,
    pub include_score: bool,
}

impl Default for SlackNotification {
    fn default() -> Self {
        Self {
            enabled: true,
            max_articles: 20,
            include_summary: true,
            include_score: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub slack: SlackNotification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub interests: Vec<String>,
    pub keywords: Keywords,
    pub sources: Sources,
    pub notification: Notification,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Tech Team".to_string(),
            interests: Vec::new(),
            keywords: Keywords::default(),
            sources: Sources::default(),
            notification: Notification::default(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    user_profile: Profile,
}

impl Profile {
    /// Load from an explicit path. Supports TOML or JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading profile from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_profile(&content, &ext)
    }

    /// Load using env var + fallbacks:
    /// 1) $PROFILE_PATH (must exist)
    /// 2) config/profile.toml
    /// 3) config/profile.json
    /// 4) default profile, written to config/profile.toml (best effort)
    ///
    /// A file that exists but cannot be read or parsed is logged and the
    /// default profile is used instead (the file is left untouched).
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PROFILE_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Ok(Self::load_or_default(&pb));
            }
            return Err(anyhow!("{ENV_PROFILE_PATH} points to non-existent path"));
        }
        let toml_p = PathBuf::from(DEFAULT_PROFILE_TOML);
        if toml_p.exists() {
            return Ok(Self::load_or_default(&toml_p));
        }
        let json_p = PathBuf::from(DEFAULT_PROFILE_JSON);
        if json_p.exists() {
            return Ok(Self::load_or_default(&json_p));
        }

        let profile = Self::default();
        if let Err(e) = profile.save_to(&toml_p) {
            tracing::warn!(error = ?e, "could not write default profile");
        } else {
            tracing::info!(path = %toml_p.display(), "wrote default profile");
        }
        Ok(profile)
    }

    fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(path = %path.display(), error = ?e, "failed to load profile; using default");
                Self::default()
            }
        }
    }

    /// Write as TOML under a `[user_profile]` table, creating parent dirs.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let file = ProfileFile {
            user_profile: self.clone(),
        };
        let body = toml::to_string_pretty(&file).context("serializing profile")?;
        fs::write(path, body).with_context(|| format!("writing profile to {}", path.display()))
    }

    /// Feed URLs are trimmed and blanks dropped. Interests and keywords are
    /// matched as raw substrings, so they are kept exactly as written.
    fn cleaned(mut self) -> Self {
        self.sources.rss_feeds.feeds = clean_terms(self.sources.rss_feeds.feeds);
        self
    }
}

fn parse_profile(s: &str, hint_ext: &str) -> Result<Profile> {
    let try_toml = hint_ext == "toml" || s.contains("[user_profile");
    if try_toml {
        if let Ok(p) = parse_toml(s) {
            return Ok(p);
        }
    }
    if let Ok(p) = parse_json(s) {
        return Ok(p);
    }
    if !try_toml {
        if let Ok(p) = parse_toml(s) {
            return Ok(p);
        }
    }
    // Surface the error of the hinted format.
    if hint_ext == "json" {
        parse_json(s).context("parsing profile json")
    } else {
        parse_toml(s).context("parsing profile toml")
    }
}

fn parse_toml(s: &str) -> Result<Profile> {
    let f: ProfileFile = toml::from_str(s)?;
    Ok(f.user_profile.cleaned())
}

fn parse_json(s: &str) -> Result<Profile> {
    let f: ProfileFile = serde_json::from_str(s)?;
    Ok(f.user_profile.cleaned())
}

/// Trim entries and drop empties; order is preserved.
fn clean_terms(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_defaults_and_cleaning() {
        let s = r#"
[user_profile]
interests = ["ai ", "WebAssembly"]

[user_profile.keywords]
high_priority = ["security"]

[user_profile.sources.rss_feeds]
feeds = [" https://a.dev/rss ", ""]
"#;
        let p = parse_toml(s).unwrap();
        assert_eq!(p.name, "Tech Team");
        assert_eq!(p.interests, vec!["ai ".to_string(), "WebAssembly".to_string()]);
        assert_eq!(p.sources.rss_feeds.feeds, vec!["https://a.dev/rss".to_string()]);
        assert_eq!(p.keywords.high_priority, vec!["security".to_string()]);
        assert!(p.keywords.exclude.is_empty());
        assert_eq!(p.sources.web_search.max_results, 15);
        assert_eq!(p.notification.slack.max_articles, 20);
    }

    #[test]
    fn json_format_is_accepted() {
        let s = r#"{"user_profile": {"name": "Infra", "interests": ["k8s"],
            "sources": {"rss_feeds": {"enabled": false, "feeds": ["https://a.dev/rss"]}}}}"#;
        let p = parse_profile(s, "json").unwrap();
        assert_eq!(p.name, "Infra");
        assert!(!p.sources.rss_feeds.enabled);
        assert_eq!(p.sources.rss_feeds.feeds.len(), 1);
        assert!(p.sources.web_search.enabled);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profile.toml");
        let mut p = Profile::default();
        p.interests = vec!["rust".into(), "go".into()];
        p.keywords.exclude = vec!["crypto".into()];
        p.save_to(&path).unwrap();
        assert_eq!(Profile::load_from(&path).unwrap(), p);
    }

    #[test]
    fn broken_file_is_an_error() {
        assert!(parse_profile("[user_profile\ninterests = ", "toml").is_err());
    }
}
