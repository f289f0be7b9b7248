// src/ai/queries.rs
//! Search-query generation from the user profile.

use chrono::{DateTime, Datelike, Utc};
use tracing::{info, warn};

use super::{ChatRequest, DynChat};
use crate::config::{Language, Profile};

pub const DEFAULT_MAX_QUERIES: usize = 5;

pub struct QueryGenerator {
    chat: DynChat,
    language: Language,
}

impl QueryGenerator {
    pub fn new(chat: DynChat, language: Language) -> Self {
        Self { chat, language }
    }

    /// One query per non-empty reply line, at most `max_queries`.
    /// Any model failure or an empty reply falls back to [`default_queries`].
    pub async fn generate(&self, profile: &Profile, max_queries: usize) -> Vec<String> {
        let now = Utc::now();
        let (system, user) = self.prompt(profile, max_queries, now);
        let reply = self
            .chat
            .complete(ChatRequest {
                system,
                user: &user,
                max_tokens: 200,
                temperature: 0.7,
            })
            .await;

        let mut queries = match reply {
            Ok(text) => {
                let parsed = parse_query_lines(&text);
                if parsed.is_empty() {
                    warn!(target: "pipeline", "empty query reply; using defaults");
                    default_queries(&profile.interests, self.language, now)
                } else {
                    parsed
                }
            }
            Err(e) => {
                warn!(target: "pipeline", error = %e, "query generation failed; using defaults");
                default_queries(&profile.interests, self.language, now)
            }
        };
        queries.truncate(max_queries);
        info!(target: "pipeline", count = queries.len(), "search queries ready");
        queries
    }

    fn prompt(&self, profile: &Profile, n: usize, now: DateTime<Utc>) -> (&'static str, String) {
        let interests = profile.interests.join(", ");
        let high = profile.keywords.high_priority.join(", ");
        let month = month_label(self.language, now);
        match self.language {
            Language::En => (
                "You are a tech trend analyst. Generate precise search queries for finding the latest technology news and developments.",
                format!(
                    "Generate {n} specific search queries for finding the most recent technology articles and trends from the past week only.\n\n\
                     User interests: {interests}\n\
                     High priority keywords: {high}\n\n\
                     IMPORTANT: Focus exclusively on content from the last 7 days:\n\
                     - This week's tech news\n\
                     - Latest releases and updates ({month})\n\
                     - Recent security vulnerabilities and fixes\n\
                     - Latest performance improvements\n\
                     - New features and tools announced this week\n\n\
                     Include time-specific keywords like \"latest\", \"this week\", \"{month}\", \"recent\" in each query.\n\
                     Return only the search queries, one per line, without numbering or additional text."
                ),
            ),
            Language::Ja => (
                "あなたは技術トレンドアナリストです。最新の技術ニュースや開発動向を見つけるための正確な検索クエリを生成してください。",
                format!(
                    "過去1週間以内の最新技術記事やトレンドを見つけるための具体的な検索クエリを{n}個生成してください。\n\n\
                     ユーザーの関心分野: {interests}\n\
                     優先度の高いキーワード: {high}\n\n\
                     重要: 必ず過去7日間以内の最新情報に焦点を当ててください:\n\
                     - 今週の技術ニュース\n\
                     - 最新のリリース・アップデート（{month}）\n\
                     - 直近のセキュリティ脆弱性と修正\n\
                     - 最新のパフォーマンス改善\n\
                     - 今週発表された新機能・ツール\n\n\
                     各クエリに「最新」「今週」「{month}」「最近」などの時間を示すキーワードを含めてください。\n\
                     検索クエリのみを1行に1つずつ、番号付けや追加テキストなしで返してください。"
                ),
            ),
        }
    }
}

/// Trimmed, non-empty reply lines.
pub fn parse_query_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Five generic queries plus two for each of the first three interests.
pub fn default_queries(interests: &[String], language: Language, now: DateTime<Utc>) -> Vec<String> {
    let month = month_label(language, now);
    let mut out: Vec<String> = match language {
        Language::En => vec![
            format!("latest technology news this week {month}"),
            format!("new software releases {month}"),
            "recent tech security vulnerabilities".to_string(),
            "programming language updates this week".to_string(),
            format!("cloud computing trends {month}"),
        ],
        Language::Ja => vec![
            "今週の最新技術ニュース".to_string(),
            format!("{month} 新しいソフトウェアリリース"),
            "最新のセキュリティ脆弱性".to_string(),
            "プログラミング言語 最新アップデート".to_string(),
            "クラウドコンピューティング 最新トレンド".to_string(),
        ],
    };
    for interest in interests.iter().take(3) {
        match language {
            Language::En => {
                out.push(format!("{interest} latest news this week"));
                out.push(format!("{interest} new features {month}"));
            }
            Language::Ja => {
                out.push(format!("{interest} 最新ニュース 今週"));
                out.push(format!("{interest} 新機能 {month}"));
            }
        }
    }
    out
}

fn month_label(language: Language, now: DateTime<Utc>) -> String {
    match language {
        Language::En => now.format("%B %Y").to_string(),
        Language::Ja => format!("{}年{}月", now.year(), now.month()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ChatClient;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Arc;

    struct Fixed(anyhow::Result<String>);

    #[async_trait]
    impl ChatClient for Fixed {
        async fn complete(&self, _req: ChatRequest<'_>) -> anyhow::Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn profile() -> Profile {
        let mut p = Profile::default();
        p.interests = vec!["Rust".into(), "Go".into(), "Zig".into(), "Nim".into()];
        p
    }

    #[test]
    fn defaults_cover_top_three_interests() {
        let now = Utc.with_ymd_and_hms(2025, 8, 20, 0, 0, 0).unwrap();
        let q = default_queries(&profile().interests, Language::En, now);
        assert_eq!(q.len(), 5 + 6);
        assert_eq!(q[0], "latest technology news this week August 2025");
        assert_eq!(q[5], "Rust latest news this week");
        assert!(!q.iter().any(|s| s.starts_with("Nim")));
        let ja = default_queries(&[], Language::Ja, now);
        assert_eq!(ja[1], "2025年8月 新しいソフトウェアリリース");
    }

    #[tokio::test]
    async fn reply_lines_are_trimmed_and_capped() {
        let chat = Arc::new(Fixed(Ok("  rust 2024 edition \n\n wasm components\nebpf tooling\n".into())));
        let g = QueryGenerator::new(chat, Language::En);
        let q = g.generate(&profile(), 2).await;
        assert_eq!(q, vec!["rust 2024 edition".to_string(), "wasm components".to_string()]);
    }

    #[tokio::test]
    async fn failure_and_blank_reply_fall_back() {
        let g = QueryGenerator::new(Arc::new(Fixed(Err(anyhow::anyhow!("boom")))), Language::En);
        let q = g.generate(&profile(), DEFAULT_MAX_QUERIES).await;
        assert_eq!(q.len(), DEFAULT_MAX_QUERIES);

        let g = QueryGenerator::new(Arc::new(Fixed(Ok(" \n ".into()))), Language::En);
        let q = g.generate(&profile(), 20).await;
        assert_eq!(q.len(), 11);
    }
}
