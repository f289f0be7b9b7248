// tests/scoring_properties.rs
use chrono::{Duration, TimeZone, Utc};
use tech_trend_notifier::article::{Article, SourceType};
use tech_trend_notifier::config::Profile;
use tech_trend_notifier::scoring::{recency_score, score_and_rank, Scorer};

fn profile() -> Profile {
    let mut p = Profile::default();
    p.interests = vec!["rust".into(), "kubernetes".into(), "webassembly".into()];
    p.keywords.high_priority = vec!["security".into(), "release".into()];
    p.keywords.medium_priority = vec!["performance".into()];
    p.keywords.exclude = vec!["crypto".into()];
    p
}

fn batch() -> Vec<Article> {
    let now = Utc::now();
    vec![
        Article::new("Crypto coin pump", "https://x.example.com/1", "Random Blog", SourceType::WebSearch),
        Article::new(
            "Rust security release fixes a Kubernetes operator bug",
            "https://github.com/blog/rust",
            "GitHub",
            SourceType::Rss,
        )
        .with_content("Rust and WebAssembly tooling gets a security release with performance fixes.")
        .with_author("Jane")
        .with_published(now - Duration::hours(5)),
        Article::new("Weekly notes", "https://y.example.com/2", "medium.com", SourceType::Rss)
            .with_published(now - Duration::days(20)),
        Article::new("Weekly notes", "https://y.example.com/3", "medium.com", SourceType::Rss)
            .with_published(now - Duration::days(20)),
    ]
}

#[test]
fn scores_are_bounded_and_sorted() {
    let ranked = score_and_rank(batch(), &profile());
    assert_eq!(ranked.len(), 4);
    for a in &ranked {
        let s = a.score.unwrap();
        let r = a.relevance_score.unwrap();
        assert!((0.0..=1.0).contains(&s), "score {s}");
        assert!((0.0..=1.0).contains(&r), "relevance {r}");
    }
    for w in ranked.windows(2) {
        assert!(w[0].score >= w[1].score);
    }
    assert_eq!(ranked[0].url, "https://github.com/blog/rust");
}

#[test]
fn equal_scores_keep_input_order() {
    let ranked = score_and_rank(batch(), &profile());
    let pos = |u: &str| ranked.iter().position(|a| a.url == u).unwrap();
    assert_eq!(ranked[pos("https://y.example.com/2")].score, ranked[pos("https://y.example.com/3")].score);
    assert!(pos("https://y.example.com/2") < pos("https://y.example.com/3"));
}

#[test]
fn scoring_only_writes_scores() {
    let input = batch();
    let ranked = score_and_rank(input.clone(), &profile());
    for a in &ranked {
        let orig = input.iter().find(|o| o.url == a.url).unwrap();
        assert_eq!(orig.title, a.title);
        assert_eq!(orig.content, a.content);
        assert_eq!(orig.tags, a.tags);
        assert!(a.summary.is_none());
    }
}

#[test]
fn neutral_defaults() {
    let scorer = Scorer::new(&Profile::default());
    assert_eq!(scorer.interest_score("anything at all"), 0.5);

    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(recency_score(None, now), 0.5);
}

#[test]
fn excluded_keyword_floors_at_zero() {
    let mut p = Profile::default();
    p.keywords.exclude = vec!["crypto".into()];
    let scorer = Scorer::new(&p);
    assert_eq!(scorer.keyword_score("crypto news"), 0.0);
}

#[test]
fn relevance_is_capped_when_keywords_overflow() {
    let mut p = profile();
    p.keywords.high_priority = vec!["security".into(), "release".into(), "tokio".into(), "cargo".into()];
    let scorer = Scorer::new(&p);
    let text = "rust kubernetes webassembly security release tokio cargo";
    assert!(scorer.keyword_score(text) > 1.0);

    let article = Article::new(
        "Rust security release for tokio and cargo on Kubernetes",
        "https://github.com/blog/rust-security",
        "github.com",
        SourceType::Rss,
    )
    .with_content("WebAssembly targets get the same security release.")
    .with_published(Utc::now());

    let b = scorer.breakdown(&article, Utc::now());
    assert_eq!(b.interests, 1.0);
    assert_eq!(b.source, 1.0);
    assert_eq!(b.recency, 1.0);
    assert_eq!(b.combined(), 1.0);

    let ranked = score_and_rank(vec![article], &p);
    assert_eq!(ranked[0].relevance_score, Some(1.0));
    assert!(ranked[0].score.unwrap() <= 1.0);
}

#[test]
fn empty_batch_is_fine() {
    assert!(score_and_rank(Vec::new(), &profile()).is_empty());
}
