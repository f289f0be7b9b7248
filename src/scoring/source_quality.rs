// src/scoring/source_quality.rs
//! Source reputation tiers.
//!
//! Lookup is a case-insensitive substring match against the source label
//! (a feed host, "Tavily Web Search", ...). High tier wins over medium;
//! anything else gets the default.

pub const HIGH_QUALITY_SOURCES: &[&str] = &[
    "github.com",
    "stackoverflow.com",
    "dev.to",
    "medium.com",
    "techcrunch.com",
    "oreilly.com",
    "hacker news",
    "reddit.com/r/programming",
];

pub const MEDIUM_QUALITY_SOURCES: &[&str] = &["blog", "news", "official", "documentation", "docs"];

pub const HIGH_WEIGHT: f64 = 1.0;
pub const MEDIUM_WEIGHT: f64 = 0.7;
pub const DEFAULT_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    High,
    Medium,
    Unknown,
}

impl SourceTier {
    pub fn weight(self) -> f64 {
        match self {
            SourceTier::High => HIGH_WEIGHT,
            SourceTier::Medium => MEDIUM_WEIGHT,
            SourceTier::Unknown => DEFAULT_WEIGHT,
        }
    }
}

pub fn tier_for(source: &str) -> SourceTier {
    let s = source.to_lowercase();
    if HIGH_QUALITY_SOURCES.iter().any(|k| s.contains(k)) {
        SourceTier::High
    } else if MEDIUM_QUALITY_SOURCES.iter().any(|k| s.contains(k)) {
        SourceTier::Medium
    } else {
        SourceTier::Unknown
    }
}

/// Weight in [0,1] for a source label.
pub fn weight_for(source: &str) -> f64 {
    tier_for(source).weight()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_by_substring() {
        assert_eq!(weight_for("GitHub.com"), 1.0);
        assert_eq!(weight_for("Hacker News"), 1.0);
        assert_eq!(weight_for("www.reddit.com/r/programming"), 1.0);
        assert_eq!(weight_for("engineering.blog.example"), 0.7);
        assert_eq!(weight_for("docs.rs"), 0.7);
        assert_eq!(weight_for("example.com"), 0.5);
        assert_eq!(weight_for(""), 0.5);
    }

    #[test]
    fn high_tier_wins_over_medium() {
        // "dev.to" and "blog" both match.
        assert_eq!(tier_for("dev.to/blog"), SourceTier::High);
    }
}
