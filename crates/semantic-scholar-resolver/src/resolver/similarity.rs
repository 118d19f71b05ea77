//! ROUGE-L similarity between two normalized titles.

use std::collections::HashSet;
use std::sync::LazyLock;

/// English function words dropped before scoring.
const STOPWORD_LIST: &str =
    "a about above after again against all am an and any are as at be because \
     been before being below between both but by can did do does doing down \
     during each few for from further had has have having he her here hers \
     herself him himself his how i if in into is it its itself just me more \
     most my myself no nor not now of off on once only or other our ours \
     ourselves out over own same she should so some such than that the their \
     theirs them themselves then there these they this those through to too \
     under until up very was we were what when where which while who whom why \
     will with you your yours yourself yourselves";

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORD_LIST.split_whitespace().collect());

/// Whitespace tokens, optionally without stopwords.
#[must_use]
pub fn tokens(text: &str, ignore_stopwords: bool) -> Vec<&str> {
    text.split_whitespace()
        .filter(|t| !(ignore_stopwords && STOPWORDS.contains(*t)))
        .collect()
}

/// Length of the longest common subsequence of two token lists.
#[must_use]
pub fn lcs_len(a: &[&str], b: &[&str]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// ROUGE-L F-measure (alpha = 0.5) of `summary` against `reference`.
///
/// Both inputs are expected to be normalized already. Returns a value in
/// [0, 1]; 0 when either side has no tokens.
#[must_use]
pub fn rouge_l(summary: &str, reference: &str, ignore_stopwords: bool) -> f64 {
    let summary = tokens(summary, ignore_stopwords);
    let reference = tokens(reference, ignore_stopwords);

    let lcs = lcs_len(&summary, &reference);
    if lcs == 0 {
        return 0.0;
    }

    let precision = lcs as f64 / summary.len() as f64;
    let recall = lcs as f64 / reference.len() as f64;
    2.0 * precision * recall / (precision + recall)
}
