// src/dedup/tfidf.rs
//! TF-IDF vectors and cosine similarity for near-duplicate detection.
//!
//! - Tokens: lower-cased runs of 2+ word characters, English stop-words removed.
//! - Terms: unigrams and bigrams of the remaining tokens.
//! - Vocabulary: terms with document frequency >= `min_df`, capped to the
//!   `max_features` terms with the highest corpus frequency (ties by term).
//! - Weights: raw term count * smoothed idf `ln((1+n)/(1+df)) + 1`, rows L2-normalized.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::stopwords::is_stop_word;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token regex"));

/// Sparse row: `(term index, weight)` sorted by index.
pub type SparseRow = Vec<(usize, f64)>;

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    pub max_features: usize,
    pub min_df: usize,
    pub max_ngram: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            max_features: 1000,
            min_df: 1,
            max_ngram: 2,
        }
    }
}

impl TfidfVectorizer {
    /// Terms of one document, in order of appearance (with repeats).
    pub fn analyze(&self, doc: &str) -> Vec<String> {
        let lower = doc.to_lowercase();
        let tokens: Vec<&str> = RE_TOKEN
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| !is_stop_word(t))
            .collect();

        let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        for n in 2..=self.max_ngram.max(1) {
            for w in tokens.windows(n) {
                terms.push(w.join(" "));
            }
        }
        terms
    }

    /// Fit on `docs` and return one L2-normalized sparse row per document.
    ///
    /// Fails when no term survives (e.g. every document is stop-words only).
    pub fn fit_transform(&self, docs: &[String]) -> Result<Vec<SparseRow>> {
        let analyzed: Vec<Vec<String>> = docs.iter().map(|d| self.analyze(d)).collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        for terms in &analyzed {
            let mut seen: HashSet<&str> = HashSet::new();
            for t in terms {
                *corpus_freq.entry(t.as_str()).or_insert(0) += 1;
                if seen.insert(t.as_str()) {
                    *doc_freq.entry(t.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut candidates: Vec<(&str, usize)> = corpus_freq
            .into_iter()
            .filter(|(t, _)| doc_freq.get(t).copied().unwrap_or(0) >= self.min_df)
            .collect();
        if candidates.is_empty() {
            bail!("empty vocabulary; documents may contain only stop words");
        }
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        candidates.truncate(self.max_features.max(1));

        // Column order is alphabetical, as in a sorted vocabulary.
        let vocab: BTreeMap<&str, usize> = {
            let mut names: Vec<&str> = candidates.iter().map(|(t, _)| *t).collect();
            names.sort_unstable();
            names.into_iter().enumerate().map(|(i, t)| (t, i)).collect()
        };

        let n_docs = docs.len() as f64;
        let idf: HashMap<usize, f64> = vocab
            .iter()
            .map(|(t, &idx)| {
                let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
                (idx, ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0)
            })
            .collect();

        let rows = analyzed
            .iter()
            .map(|terms| {
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for t in terms {
                    if let Some(&idx) = vocab.get(t.as_str()) {
                        *counts.entry(idx).or_insert(0.0) += 1.0;
                    }
                }
                let mut row: SparseRow = counts
                    .into_iter()
                    .map(|(idx, tf)| (idx, tf * idf[&idx]))
                    .collect();
                l2_normalize(&mut row);
                row
            })
            .collect();
        Ok(rows)
    }
}

fn l2_normalize(row: &mut SparseRow) {
    let norm: f64 = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in row.iter_mut() {
            *w /= norm;
        }
    }
}

/// Dot product of two index-sorted rows (cosine, when both are normalized).
pub fn sparse_dot(a: &SparseRow, b: &SparseRow) -> f64 {
    let (mut i, mut j, mut acc) = (0usize, 0usize, 0.0f64);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                acc += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    acc
}

/// Full symmetric cosine matrix over normalized rows. Zero rows are similar to nothing.
pub fn cosine_matrix(rows: &[SparseRow]) -> Vec<Vec<f64>> {
    let n = rows.len();
    let mut m = vec![vec![0.0; n]; n];
    for i in 0..n {
        if !rows[i].is_empty() {
            m[i][i] = 1.0;
        }
        for j in (i + 1)..n {
            let s = sparse_dot(&rows[i], &rows[j]).clamp(0.0, 1.0);
            m[i][j] = s;
            m[j][i] = s;
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_drops_stop_words_and_short_tokens_then_builds_bigrams() {
        let v = TfidfVectorizer::default();
        let terms = v.analyze("The Rust compiler is a fast compiler");
        assert_eq!(
            terms,
            vec![
                "rust",
                "compiler",
                "fast",
                "compiler",
                "rust compiler",
                "compiler fast",
                "fast compiler"
            ]
        );
    }

    #[test]
    fn identical_documents_have_similarity_one() {
        let v = TfidfVectorizer::default();
        let docs = vec![
            "kubernetes operators reconcile state".to_string(),
            "kubernetes operators reconcile state".to_string(),
            "python packaging tools overview".to_string(),
        ];
        let rows = v.fit_transform(&docs).unwrap();
        let m = cosine_matrix(&rows);
        assert!((m[0][1] - 1.0).abs() < 1e-9);
        assert!(m[0][2].abs() < 1e-9);
        assert_eq!(m[1][0], m[0][1]);
    }

    #[test]
    fn stop_word_only_corpus_is_an_error() {
        let v = TfidfVectorizer::default();
        let docs = vec!["the and of".to_string(), "it is a".to_string()];
        assert!(v.fit_transform(&docs).is_err());
    }

    #[test]
    fn vocabulary_is_capped() {
        let v = TfidfVectorizer {
            max_features: 2,
            ..TfidfVectorizer::default()
        };
        let docs = vec![
            "rust rust rust go".to_string(),
            "rust go zig".to_string(),
        ];
        let rows = v.fit_transform(&docs).unwrap();
        let max_idx = rows.iter().flatten().map(|(i, _)| *i).max().unwrap();
        assert!(max_idx < 2);
    }

    #[test]
    fn rows_are_unit_length() {
        let v = TfidfVectorizer::default();
        let docs = vec![
            "async runtime scheduling".to_string(),
            "async io uring runtime".to_string(),
        ];
        for row in v.fit_transform(&docs).unwrap() {
            let norm: f64 = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }
}
