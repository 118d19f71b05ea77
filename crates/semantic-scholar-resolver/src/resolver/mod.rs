//! Free-text title to Semantic Scholar paper ID.
//!
//! The query and every candidate title are normalized the same way, scored
//! with ROUGE-L, and the first candidate (in the API's relevance order) whose
//! score is strictly above the threshold wins. Scanning stops at that point,
//! so the result is the first acceptable match, not the global best.

pub mod similarity;

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::config::Config;
use crate::error::Result;
use crate::models::Candidate;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[[:punct:]]").expect("valid regex"));

/// Lowercase, replace each ASCII punctuation character with a space, and
/// collapse whitespace runs to a single space.
///
/// Normalizing an already-normalized title returns it unchanged.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let spaced = PUNCTUATION.replace_all(&lowered, " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Anything that can list title candidates for a query.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Candidates in relevance order. `query` is already normalized.
    async fn search_candidates(&self, query: &str) -> Result<Vec<Candidate>>;
}

/// Scores titles and picks the first confident match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleResolver {
    threshold: f64,
    ignore_stopwords: bool,
}

impl TitleResolver {
    /// Resolver accepting scores strictly above `threshold`.
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ignore_stopwords: true,
        }
    }

    /// Resolver using `threshold` and `ignore_stopwords` from `config`.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            threshold: config.threshold,
            ignore_stopwords: config.ignore_stopwords,
        }
    }

    /// Keep or drop stopwords when scoring.
    #[must_use]
    pub const fn with_stopwords_ignored(mut self, ignore: bool) -> Self {
        self.ignore_stopwords = ignore;
        self
    }

    /// Acceptance threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Similarity of two raw titles in [0, 1].
    #[must_use]
    pub fn score(&self, title: &str, ref_title: &str) -> f64 {
        self.score_normalized(&normalize_title(title), &normalize_title(ref_title))
    }

    /// True when `title` is a confident match for `ref_title`.
    #[must_use]
    pub fn is_match(&self, title: &str, ref_title: &str) -> bool {
        self.accepts(&normalize_title(title), &normalize_title(ref_title))
    }

    fn score_normalized(&self, query: &str, candidate: &str) -> f64 {
        if !query.is_empty() && query == candidate {
            return 1.0;
        }
        similarity::rouge_l(query, candidate, self.ignore_stopwords)
    }

    // Identical normalized text is accepted even at threshold 1.0.
    fn accepts(&self, query: &str, candidate: &str) -> bool {
        (!query.is_empty() && query == candidate)
            || self.score_normalized(query, candidate) > self.threshold
    }

    /// First candidate accepted for `title`, in the given order.
    #[must_use]
    pub fn first_match<'c>(
        &self,
        title: &str,
        candidates: &'c [Candidate],
    ) -> Option<&'c Candidate> {
        let query = normalize_title(title);
        candidates
            .iter()
            .find(|candidate| self.accepts(&query, &normalize_title(&candidate.title)))
    }

    /// Resolve `title` to a paper ID using `source` for candidates.
    ///
    /// Returns `Ok(None)` when no candidate clears the threshold, or when the
    /// title normalizes to nothing.
    pub async fn resolve<S>(&self, source: &S, title: &str) -> Result<Option<String>>
    where
        S: CandidateSource + ?Sized,
    {
        let query = normalize_title(title);
        if query.is_empty() {
            tracing::debug!(title, "Title has no searchable text");
            return Ok(None);
        }

        let candidates = source.search_candidates(&query).await?;
        match self.first_match(&query, &candidates) {
            Some(candidate) => {
                tracing::debug!(title, paper_id = %candidate.paper_id, "Resolved title");
                Ok(Some(candidate.paper_id.clone()))
            }
            None => {
                let scanned = candidates.len();
                tracing::debug!(title, scanned, "No confident title match");
                Ok(None)
            }
        }
    }
}

impl Default for TitleResolver {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
