//! Paper and reference records.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Author;

/// Date used when the API gives no usable publication date or year.
pub const EPOCH_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(date) => date,
    None => panic!("1900-01-01 is a valid date"),
};

/// A research paper from Semantic Scholar.
///
/// `citations` and `references` hold one level of nested papers; those nested
/// entries always have empty `citations` and `references` of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Unique Semantic Scholar paper ID.
    pub paper_id: String,

    /// Paper title.
    pub title: String,

    /// Paper abstract.
    pub r#abstract: String,

    /// Authors in byline order.
    pub authors: Vec<Author>,

    /// Paper page on semanticscholar.org.
    pub url: String,

    /// Publication venue (journal or conference).
    pub venue: String,

    /// Publication date.
    pub publication_date: NaiveDate,

    /// Number of references in this paper.
    pub reference_count: u32,

    /// Number of citations this paper has received.
    pub citation_count: u32,

    /// Influential citation count.
    pub influential_citation_count: u32,

    /// Whether this paper is open access.
    pub is_open_access: bool,

    /// Fields of study (e.g., "Computer Science", "Medicine").
    pub fields_of_study: Vec<String>,

    /// Papers citing this one.
    pub citations: Vec<Paper>,

    /// Papers this one cites.
    pub references: Vec<Paper>,
}

impl Default for Paper {
    fn default() -> Self {
        Self {
            paper_id: String::new(),
            title: String::new(),
            r#abstract: String::new(),
            authors: Vec::new(),
            url: String::new(),
            venue: String::new(),
            publication_date: EPOCH_DATE,
            reference_count: 0,
            citation_count: 0,
            influential_citation_count: 0,
            is_open_access: false,
            fields_of_study: Vec::new(),
            citations: Vec::new(),
            references: Vec::new(),
        }
    }
}

impl Paper {
    /// Publication year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.publication_date.year()
    }

    /// Get the first author's name if available.
    #[must_use]
    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(|a| a.name.as_str())
    }

    /// Get author names as a comma-separated string.
    #[must_use]
    pub fn author_names(&self) -> String {
        let names: Vec<&str> = self.authors.iter().map(|a| a.name.as_str()).collect();
        names.join(", ")
    }

    /// True when neither nested list carries further nesting.
    #[must_use]
    pub fn is_depth_capped(&self) -> bool {
        self.citations
            .iter()
            .chain(&self.references)
            .all(|p| p.citations.is_empty() && p.references.is_empty())
    }

    /// Deep comparison of the record contents.
    ///
    /// Nested authors, citations and references are compared pairwise after
    /// sorting each side by identifier.
    #[must_use]
    pub fn exact_match(&self, other: &Self) -> bool {
        self.paper_id == other.paper_id
            && self.title == other.title
            && self.r#abstract == other.r#abstract
            && self.venue == other.venue
            && self.url == other.url
            && self.publication_date == other.publication_date
            && self.reference_count == other.reference_count
            && self.citation_count == other.citation_count
            && self.influential_citation_count == other.influential_citation_count
            && self.is_open_access == other.is_open_access
            && self.fields_of_study == other.fields_of_study
            && sorted_pairs_match(&self.authors, &other.authors, Author::exact_match)
            && sorted_pairs_match(&self.citations, &other.citations, Self::exact_match)
            && sorted_pairs_match(&self.references, &other.references, Self::exact_match)
    }
}

fn sorted_pairs_match<T: Ord>(left: &[T], right: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut left: Vec<&T> = left.iter().collect();
    let mut right: Vec<&T> = right.iter().collect();
    left.sort();
    right.sort();
    left.into_iter().zip(right).all(|(a, b)| eq(a, b))
}

impl PartialEq for Paper {
    fn eq(&self, other: &Self) -> bool {
        self.paper_id == other.paper_id
    }
}

impl Eq for Paper {}

impl Hash for Paper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.paper_id.hash(state);
    }
}

impl PartialOrd for Paper {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Paper {
    fn cmp(&self, other: &Self) -> Ordering {
        self.paper_id.cmp(&other.paper_id)
    }
}

/// One row of the references endpoint: the cited paper plus citation context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// The cited paper (nested lists always empty).
    pub paper: Paper,

    /// Sentences in which the citation appears.
    pub contexts: Vec<String>,

    /// Citation intents ("methodology", "background", "result").
    pub intents: Vec<String>,

    /// Whether the citation is influential.
    pub is_influential: bool,
}

/// A title search hit, alive only while a title is being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Paper ID.
    pub paper_id: String,

    /// Title exactly as stored by the API.
    pub title: String,
}
