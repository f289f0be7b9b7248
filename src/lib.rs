// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod ai;
pub mod article;
pub mod collect;
pub mod config;
pub mod dedup;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod scoring;

// ---- Re-exports for stable public API ----
pub use article::{Article, ArticleCollection, SourceType};
pub use config::{Language, Profile, Settings};
pub use dedup::{deduplicate, Deduplicator};
pub use pipeline::{Pipeline, RunReport};
pub use scoring::{score_and_rank, Scorer};
