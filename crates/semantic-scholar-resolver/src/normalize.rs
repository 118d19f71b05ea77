//! Raw JSON to typed records.
//!
//! Every optional field goes through a typed accessor on [`JsonFields`] with a
//! declared default: the source value is copied only when it is present and of
//! the expected JSON kind. Required keys (`paperId` on a detail response,
//! `data` on a search response, ...) are checked explicitly and surface as
//! [`ScholarError`] variants. Rows inside a list that lack their identifier
//! are skipped, so one bad row never sinks the whole response.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::error::{Result, ScholarError};
use crate::models::{Author, Candidate, EPOCH_DATE, Paper, Reference};

/// Layouts tried after the ISO 8601 forms.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Typed view over a JSON object.
#[derive(Debug, Clone, Copy)]
pub struct JsonFields<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> JsonFields<'a> {
    /// Wrap a JSON value, if it is an object.
    #[must_use]
    pub fn new(value: &'a Value) -> Option<Self> {
        value.as_object().map(|object| Self { object })
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    /// True when `key` is present and not null.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Trimmed, non-empty string field. Used for identifiers.
    #[must_use]
    pub fn id(&self, key: &str) -> Option<&'a str> {
        let id = self.get(key)?.as_str()?.trim();
        (!id.is_empty()).then_some(id)
    }

    /// String field, or `default` when absent or not a string.
    #[must_use]
    pub fn string(&self, key: &str, default: &str) -> String {
        let value = self.get(key).and_then(Value::as_str);
        value.unwrap_or(default).to_string()
    }

    /// Non-negative integer field, or `default` when absent, negative,
    /// fractional or out of range.
    #[must_use]
    pub fn count(&self, key: &str, default: u32) -> u32 {
        self.get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(default)
    }

    /// Boolean field, or `default` when absent or not a boolean.
    #[must_use]
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// List of strings; empty when absent or not a list. Non-string entries
    /// are skipped.
    #[must_use]
    pub fn strings(&self, key: &str) -> Vec<String> {
        let Some(items) = self.get(key).and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }

    /// List of objects; empty when absent or not a list. Non-object entries
    /// are skipped.
    #[must_use]
    pub fn objects(&self, key: &str) -> Vec<Self> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Self::new).collect())
            .unwrap_or_default()
    }

    /// Nested object.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<Self> {
        self.get(key).and_then(Self::new)
    }

    /// Date parsed from free text. `None` when absent or unparseable.
    #[must_use]
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        let raw = self.get(key)?.as_str()?;
        let parsed = parse_date(raw);
        if parsed.is_none() {
            tracing::debug!(field = key, value = raw, "Unparseable date");
        }
        parsed
    }
}

/// Parse the date formats the API and its upstream sources emit.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    // Year-month and bare year
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Some(date);
    }
    if raw.len() == 4 {
        let year = raw.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

/// Publication date with the year and epoch fallbacks applied.
fn publication_date(fields: &JsonFields<'_>) -> NaiveDate {
    fields
        .date("publicationDate")
        .or_else(|| {
            let year = fields.get("year").and_then(Value::as_i64)?;
            NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, 1, 1)
        })
        .unwrap_or(EPOCH_DATE)
}

/// Build an author from any author-shaped object.
#[must_use]
pub fn author(fields: &JsonFields<'_>) -> Author {
    Author {
        author_id: fields.string("authorId", ""),
        name: fields.string("name", ""),
        url: fields.string("url", ""),
        affiliations: fields.strings("affiliations"),
        paper_count: fields.count("paperCount", 0),
        citation_count: fields.count("citationCount", 0),
        h_index: fields.count("hIndex", 0),
    }
}

/// Build a paper without nested citations or references.
#[must_use]
pub fn paper_stub(fields: &JsonFields<'_>) -> Paper {
    Paper {
        paper_id: fields.string("paperId", ""),
        title: fields.string("title", ""),
        r#abstract: fields.string("abstract", ""),
        authors: fields.objects("authors").iter().map(author).collect(),
        url: fields.string("url", ""),
        venue: fields.string("venue", ""),
        publication_date: publication_date(fields),
        reference_count: fields.count("referenceCount", 0),
        citation_count: fields.count("citationCount", 0),
        influential_citation_count: fields.count("influentialCitationCount", 0),
        is_open_access: fields.flag("isOpenAccess", false),
        fields_of_study: fields.strings("fieldsOfStudy"),
        citations: Vec::new(),
        references: Vec::new(),
    }
}

fn paper_stubs(fields: &JsonFields<'_>, key: &str) -> Vec<Paper> {
    fields.objects(key).iter().map(paper_stub).collect()
}

/// Build a full paper record from a paper detail response.
///
/// Nested citations and references become stubs, capping the depth at one.
pub fn paper_detail(value: &Value, paper_id: &str) -> Result<Paper> {
    let fields = JsonFields::new(value).ok_or_else(|| {
        ScholarError::malformed(format!("paper {paper_id}: expected a JSON object"))
    })?;
    if !fields.has("paperId") {
        return Err(ScholarError::no_paper(paper_id));
    }

    Ok(Paper {
        citations: paper_stubs(&fields, "citations"),
        references: paper_stubs(&fields, "references"),
        ..paper_stub(&fields)
    })
}

/// Build an author record from an author detail response.
pub fn author_detail(value: &Value, author_id: &str) -> Result<Author> {
    let fields = JsonFields::new(value).ok_or_else(|| {
        ScholarError::malformed(format!("author {author_id}: expected a JSON object"))
    })?;
    if !fields.has("authorId") {
        return Err(ScholarError::no_author(author_id));
    }
    Ok(author(&fields))
}

/// Extract title candidates, in API order, from a paper search response.
///
/// Entries without a usable `paperId` cannot be returned to the caller and
/// are dropped.
pub fn search_candidates(value: &Value, query: &str) -> Result<Vec<Candidate>> {
    let data = value
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ScholarError::no_paper(query))?;

    let mut candidates = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let Some(fields) = JsonFields::new(item) else {
            tracing::debug!(query, position, "Skipping non-object search result");
            continue;
        };
        let Some(paper_id) = fields.id("paperId") else {
            tracing::debug!(query, position, "Skipping search result without paperId");
            continue;
        };
        candidates.push(Candidate {
            paper_id: paper_id.to_string(),
            title: fields.string("title", ""),
        });
    }
    Ok(candidates)
}

/// Build reference rows from a references response.
///
/// Rows without a `citedPaper` object are dropped.
pub fn references(value: &Value, paper_id: &str) -> Result<Vec<Reference>> {
    let data = value
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ScholarError::no_paper(paper_id))?;

    let mut rows = Vec::with_capacity(data.len());
    for (position, row) in data.iter().enumerate() {
        let Some(fields) = JsonFields::new(row) else {
            tracing::debug!(paper_id, position, "Skipping non-object reference row");
            continue;
        };
        let Some(cited) = fields.object("citedPaper") else {
            tracing::debug!(paper_id, position, "Reference row without citedPaper");
            continue;
        };
        rows.push(Reference {
            paper: paper_stub(&cited),
            contexts: fields.strings("contexts"),
            intents: fields.strings("intents"),
            is_influential: fields.flag("isInfluential", false),
        });
    }
    Ok(rows)
}

/// Pick an author from an author search response.
///
/// With `paper_id`, the first author listing that paper wins; otherwise the
/// first result.
pub fn author_from_search(value: &Value, name: &str, paper_id: Option<&str>) -> Result<Author> {
    let data = value
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ScholarError::no_author(name))?;
    let candidates: Vec<JsonFields<'_>> = data.iter().filter_map(JsonFields::new).collect();

    let chosen = match paper_id {
        Some(paper_id) => candidates.iter().find(|candidate| {
            let wanted = Some(paper_id);
            let papers = candidate.objects("papers");
            papers.iter().any(|paper| paper.id("paperId") == wanted)
        }),
        None => candidates.first(),
    };

    chosen
        .map(author)
        .ok_or_else(|| ScholarError::no_author(name))
}
