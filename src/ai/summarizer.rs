// src/ai/summarizer.rs
//! Per-article summaries and the weekly collection overview.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{ChatRequest, DynChat};
use crate::article::Article;
use crate::config::Language;

pub const MAX_CONCURRENT: usize = 5;
pub const BATCH_SIZE: usize = 10;
pub const BATCH_PAUSE: Duration = Duration::from_secs(1);
/// Content characters sent to the model.
pub const PROMPT_CONTENT_CHARS: usize = 2000;
pub const MIN_SUMMARY_CHARS: usize = 20;
pub const FALLBACK_MAX_CHARS: usize = 200;

const GENERIC_PHRASES: &[&str] = &[
    "this article discusses",
    "the article talks about",
    "this post covers",
    "the author explains",
];

pub struct Summarizer {
    chat: DynChat,
    language: Language,
    permits: Arc<Semaphore>,
    batch_pause: Duration,
}

impl Summarizer {
    pub fn new(chat: DynChat, language: Language) -> Self {
        Self {
            chat,
            language,
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT)),
            batch_pause: BATCH_PAUSE,
        }
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    /// Fill `summary` for every article that has content but no summary yet.
    /// Failed or rejected model output is replaced by an extractive summary.
    pub async fn summarize_articles(&self, articles: &mut [Article]) {
        let todo: Vec<usize> = articles
            .iter()
            .enumerate()
            .filter(|(_, a)| a.summary.is_none() && !a.content_str().is_empty())
            .map(|(i, _)| i)
            .collect();
        if todo.is_empty() {
            return;
        }
        info!(target: "pipeline", count = todo.len(), "summarizing articles");

        let batches: Vec<&[usize]> = todo.chunks(BATCH_SIZE).collect();
        let n_batches = batches.len();
        for (b, batch) in batches.into_iter().enumerate() {
            let mut set = JoinSet::new();
            for &idx in batch {
                let a = &articles[idx];
                let title = a.title.clone();
                let content: String = a.content_str().chars().take(PROMPT_CONTENT_CHARS).collect();
                let chat = Arc::clone(&self.chat);
                let permits = Arc::clone(&self.permits);
                let language = self.language;
                set.spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    let summary = summarize_one(chat, language, &title, &content).await;
                    (idx, summary)
                });
            }
            while let Some(res) = set.join_next().await {
                match res {
                    Ok((idx, summary)) => articles[idx].summary = Some(summary),
                    Err(e) => warn!(target: "pipeline", error = ?e, "summary task panicked"),
                }
            }
            if b + 1 < n_batches && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }
    }

    /// Two or three sentences on the week's themes. Never fails.
    pub async fn collection_overview(&self, articles: &[Article]) -> String {
        let msgs = self.language.messages();
        if articles.is_empty() {
            return msgs.no_articles.to_string();
        }

        let topics = top_tags(articles, 5);
        let mut ranked: Vec<&Article> = articles.iter().collect();
        ranked.sort_by(|a, b| b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)));
        let titles: Vec<String> = ranked.iter().take(3).map(|a| format!("- {}", a.title)).collect();
        let n = articles.len();
        let topics_joined = topics.join(", ");
        let titles_joined = titles.join("\n");

        let (system, user) = match self.language {
            Language::En => (
                "You are a tech trend analyst. Create concise overviews of weekly technology developments.",
                format!(
                    "Create a brief overview of this week's tech trends based on {n} collected articles.\n\n\
                     Top topics: {topics_joined}\n\n\
                     Top articles:\n{titles_joined}\n\n\
                     Write 2-3 sentences highlighting the main themes and important developments."
                ),
            ),
            Language::Ja => (
                "あなたは技術トレンドアナリストです。週間の技術開発動向の簡潔な概要を作成してください。",
                format!(
                    "収集した{n}記事に基づいて、今週の技術トレンドの簡潔な概要を作成してください。\n\n\
                     主要トピック: {topics_joined}\n\n\
                     注目記事:\n{titles_joined}\n\n\
                     主要なテーマと重要な開発動向を強調した2-3文を書いてください。"
                ),
            ),
        };

        let reply = self
            .chat
            .complete(ChatRequest {
                system,
                user: &user,
                max_tokens: 200,
                temperature: 0.5,
            })
            .await;
        match reply {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => overview_fallback(self.language, n, &topics),
            Err(e) => {
                warn!(target: "pipeline", error = %e, "overview generation failed; using template");
                overview_fallback(self.language, n, &topics)
            }
        }
    }
}

async fn summarize_one(chat: DynChat, language: Language, title: &str, content: &str) -> String {
    let (system, user) = match language {
        Language::En => (
            "You are a technical writer who creates concise, informative summaries of technology articles. Focus on practical information that developers would find useful.",
            format!(
                "Summarize this technical article in 2-3 sentences. Focus on:\n\
                 - Key technical points and innovations\n\
                 - Practical implications for developers\n\
                 - Important updates or changes mentioned\n\n\
                 Title: {title}\nContent: {content}\n\nSummary:"
            ),
        ),
        Language::Ja => (
            "あなたは技術記事の簡潔で有益な要約を作成するテクニカルライターです。開発者にとって有用な実用的な情報に焦点を当ててください。",
            format!(
                "この技術記事を2-3文で要約してください。以下に焦点を当ててください:\n\
                 - 主要な技術的ポイントと革新\n\
                 - 開発者への実用的な影響\n\
                 - 言及されている重要なアップデートや変更\n\n\
                 タイトル: {title}\n内容: {content}\n\n要約:"
            ),
        ),
    };

    let short: String = title.chars().take(50).collect();
    match chat
        .complete(ChatRequest {
            system,
            user: &user,
            max_tokens: 150,
            temperature: 0.3,
        })
        .await
    {
        Ok(summary) if is_valid_summary(&summary, title) => {
            debug!(target: "pipeline", title = %short, "summarized");
            summary
        }
        Ok(_) => {
            warn!(target: "pipeline", title = %short, "summary failed validation");
            fallback_summary(content, language)
        }
        Err(e) => {
            warn!(target: "pipeline", title = %short, error = %e, "summary request failed");
            fallback_summary(content, language)
        }
    }
}

/// Long enough, not boilerplate, and related to the title when the title says something.
pub fn is_valid_summary(summary: &str, title: &str) -> bool {
    let trimmed = summary.trim();
    if trimmed.chars().count() < MIN_SUMMARY_CHARS {
        return false;
    }
    let lower = trimmed.to_lowercase();
    if GENERIC_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }
    let title_lower = title.to_lowercase();
    let title_words: std::collections::HashSet<&str> = title_lower.split_whitespace().collect();
    let summary_words: std::collections::HashSet<&str> = lower.split_whitespace().collect();
    let overlap = title_words.intersection(&summary_words).count();
    !(overlap == 0 && title_words.len() > 2)
}

/// First three sentences of `content`, capped at [`FALLBACK_MAX_CHARS`] plus an ellipsis.
pub fn fallback_summary(content: &str, language: Language) -> String {
    let msgs = language.messages();
    if content.trim().is_empty() {
        return msgs.no_summary.to_string();
    }
    let summary = content
        .split('.')
        .take(3)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(". ");
    if summary.is_empty() {
        return msgs.summary_failed.to_string();
    }
    if summary.chars().count() > FALLBACK_MAX_CHARS {
        let head: String = summary.chars().take(FALLBACK_MAX_CHARS).collect();
        return format!("{head}…");
    }
    summary
}

/// Most frequent tags, ties in first-seen order.
pub fn top_tags(articles: &[Article], n: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for tag in articles.iter().flat_map(|a| a.tags.iter()) {
        match counts.iter_mut().find(|(t, _)| *t == tag.as_str()) {
            Some((_, c)) => *c += 1,
            None => counts.push((tag.as_str(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(t, _)| t.to_string()).collect()
}

fn overview_fallback(language: Language, n: usize, topics: &[String]) -> String {
    let top3 = topics.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    match language {
        Language::En => format!("Collected {n} articles covering topics like {top3}."),
        Language::Ja => format!("{n}記事を収集しました。主なトピック: {top3}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ChatClient;
    use crate::article::SourceType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatClient for Echo {
        async fn complete(&self, _req: ChatRequest<'_>) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("offline"))
        }
        fn provider_name(&self) -> &'static str {
            "echo"
        }
    }

    fn art(title: &str, content: Option<&str>) -> Article {
        let a = Article::new(title, format!("https://a.dev/{title}"), "a.dev", SourceType::Rss);
        match content {
            Some(c) => a.with_content(c),
            None => a,
        }
    }

    #[test]
    fn validation_rules() {
        assert!(!is_valid_summary("too short", "Rust"));
        assert!(!is_valid_summary(
            "This article discusses the new Rust release in depth.",
            "Rust release"
        ));
        assert!(!is_valid_summary(
            "Completely unrelated words about gardening and tomatoes.",
            "Kubernetes operator patterns explained"
        ));
        assert!(is_valid_summary(
            "Kubernetes operators now reconcile faster with the new controller runtime.",
            "Kubernetes operator patterns explained"
        ));
        // Two-word titles skip the overlap check.
        assert!(is_valid_summary("Completely unrelated words about gardening.", "Rust 2.0"));
    }

    #[test]
    fn fallback_takes_three_sentences_and_caps_length() {
        let s = fallback_summary("One. Two. Three. Four.", Language::En);
        assert_eq!(s, "One. Two. Three");
        let long = "x".repeat(500);
        let s = fallback_summary(&long, Language::En);
        assert_eq!(s.chars().count(), FALLBACK_MAX_CHARS + 1);
        assert!(s.ends_with('…'));
        assert_eq!(fallback_summary("", Language::En), "No summary available.");
        assert_eq!(fallback_summary("...", Language::En), EN_FAILED);
    }

    const EN_FAILED: &str = "Content available - summary generation failed.";

    #[test]
    fn tag_ranking_is_stable() {
        let arts = vec![
            art("a", None).with_tags(["go", "rust"]),
            art("b", None).with_tags(["rust", "zig"]),
        ];
        assert_eq!(top_tags(&arts, 5), vec!["rust", "go", "zig"]);
    }

    #[tokio::test]
    async fn only_articles_without_summary_and_with_content_are_touched() {
        let chat = Arc::new(Echo {
            reply: Some("Rust gains a faster borrow checker in this release."),
            calls: AtomicUsize::new(0),
        });
        let s = Summarizer::new(chat.clone(), Language::En).with_batch_pause(Duration::ZERO);
        let mut arts = vec![
            art("Rust release notes", Some("Body. More.")),
            art("No content", None),
            {
                let mut a = art("Already", Some("Body"));
                a.summary = Some("kept".into());
                a
            },
        ];
        s.summarize_articles(&mut arts).await;
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            arts[0].summary.as_deref(),
            Some("Rust gains a faster borrow checker in this release.")
        );
        assert!(arts[1].summary.is_none());
        assert_eq!(arts[2].summary.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn offline_model_uses_extractive_fallback() {
        let chat = Arc::new(Echo {
            reply: None,
            calls: AtomicUsize::new(0),
        });
        let s = Summarizer::new(chat.clone(), Language::En).with_batch_pause(Duration::ZERO);
        let mut arts: Vec<Article> = (0..12)
            .map(|i| art(&format!("t{i}"), Some("First. Second. Third. Fourth.")))
            .collect();
        s.summarize_articles(&mut arts).await;
        assert_eq!(chat.calls.load(Ordering::SeqCst), 12);
        assert!(arts.iter().all(|a| a.summary.as_deref() == Some("First. Second. Third")));

        let overview = s.collection_overview(&arts).await;
        assert_eq!(overview, "Collected 12 articles covering topics like .");
        assert_eq!(s.collection_overview(&[]).await, "No articles were collected this week.");
    }
}
