//! Author record.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// An author as returned by the author endpoints or embedded in a paper.
///
/// Equality, hashing and ordering use `author_id` alone. Use
/// [`Author::exact_match`] to compare every field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Semantic Scholar author ID.
    pub author_id: String,

    /// Display name.
    pub name: String,

    /// Profile URL on semanticscholar.org.
    pub url: String,

    /// Affiliation strings, in API order.
    pub affiliations: Vec<String>,

    /// Number of papers.
    pub paper_count: u32,

    /// Total citations.
    pub citation_count: u32,

    /// h-index.
    pub h_index: u32,
}

impl Author {
    /// Deep comparison of the record contents.
    ///
    /// The profile URL is derived from the ID and is not compared.
    #[must_use]
    pub fn exact_match(&self, other: &Self) -> bool {
        self.author_id == other.author_id
            && self.name == other.name
            && self.affiliations == other.affiliations
            && self.paper_count == other.paper_count
            && self.citation_count == other.citation_count
            && self.h_index == other.h_index
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.author_id == other.author_id
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.author_id.hash(state);
    }
}

impl PartialOrd for Author {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Author {
    fn cmp(&self, other: &Self) -> Ordering {
        self.author_id.cmp(&other.author_id)
    }
}
