// src/config/messages.rs
//! User-visible strings in English and Japanese.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ja,
}

impl Language {
    /// Unknown codes fall back to English.
    pub fn parse(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "ja" | "jp" | "ja-jp" => Language::Ja,
            _ => Language::En,
        }
    }

    pub fn messages(self) -> &'static Messages {
        match self {
            Language::En => &EN,
            Language::Ja => &JA,
        }
    }
}

#[derive(Debug)]
pub struct Messages {
    pub weekly_trends_title: &'static str,
    pub weekly_overview: &'static str,
    pub articles_collected: &'static str,
    pub top_articles: &'static str,
    /// `{shown}` and `{total}` placeholders.
    pub showing_top_of: &'static str,
    /// `{datetime}` placeholder.
    pub generated_on: &'static str,
    pub error_title: &'static str,
    pub error_occurred: &'static str,
    pub time: &'static str,
    pub source: &'static str,
    pub published: &'static str,
    pub tags: &'static str,
    pub no_articles: &'static str,
    pub score_high: &'static str,
    pub score_medium: &'static str,
    pub score_low: &'static str,
    pub score_default: &'static str,
    pub no_summary: &'static str,
    pub summary_failed: &'static str,
}

impl Messages {
    pub fn showing_top_of(&self, shown: usize, total: usize) -> String {
        self.showing_top_of
            .replace("{shown}", &shown.to_string())
            .replace("{total}", &total.to_string())
    }

    pub fn generated_on(&self, datetime: &str) -> String {
        self.generated_on.replace("{datetime}", datetime)
    }
}

pub static EN: Messages = Messages {
    weekly_trends_title: "Weekly Tech Trends",
    weekly_overview: "This Week's Overview:",
    articles_collected: "articles collected",
    top_articles: "Top Articles:",
    showing_top_of: "Showing top {shown} of {total} articles.",
    generated_on: "Generated on {datetime}",
    error_title: "Tech Trends Collection Error",
    error_occurred: "Error occurred during weekly collection:",
    time: "Time:",
    source: "Source",
    published: "Published",
    tags: "Tags",
    no_articles: "No articles were collected this week.",
    score_high: "🔥 High",
    score_medium: "⭐ Medium",
    score_low: "👍 Low",
    score_default: "📄",
    no_summary: "No summary available.",
    summary_failed: "Content available - summary generation failed.",
};

pub static JA: Messages = Messages {
    weekly_trends_title: "週間技術トレンド",
    weekly_overview: "今週の概要:",
    articles_collected: "記事を収集しました",
    top_articles: "注目記事:",
    showing_top_of: "全{total}記事中、上位{shown}記事を表示しています。",
    generated_on: "生成日時: {datetime}",
    error_title: "技術トレンド収集エラー",
    error_occurred: "週間収集中にエラーが発生しました:",
    time: "時刻:",
    source: "情報源",
    published: "公開日",
    tags: "タグ",
    no_articles: "今週は記事が収集されませんでした。",
    score_high: "🔥 高評価",
    score_medium: "⭐ 中評価",
    score_low: "👍 低評価",
    score_default: "📄",
    no_summary: "要約がありません。",
    summary_failed: "コンテンツあり - 要約生成に失敗しました。",
};
