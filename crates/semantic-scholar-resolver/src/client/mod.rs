//! Semantic Scholar API client.
//!
//! Provides an async HTTP client with:
//! - Failure-aware retries with per-kind backoff (see [`retry`])
//! - A fixed pause after every successful request
//! - Fuzzy title resolution
//! - An optional record cache for paper and author lookups

pub mod retry;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::cache::RecordCache;
use crate::config::{ApiEndpoints, Config, api, fields};
use crate::error::{ClientError, Result, ScholarError};
use crate::models::{Author, Candidate, Paper, Reference};
use crate::normalize;
use crate::resolver::{CandidateSource, TitleResolver};

pub use retry::{
    BackoffTable, FailureKind, RecordingSleeper, RetryController, Sleeper, TokioSleeper, WaitPolicy,
};

/// Semantic Scholar API client.
#[derive(Clone)]
pub struct SemanticScholarClient {
    /// HTTP client.
    client: Client,

    /// Wraps every request.
    controller: RetryController,

    /// Title matching.
    resolver: TitleResolver,

    /// Record cache (optional).
    cache: Option<Arc<dyn RecordCache>>,

    /// API endpoints.
    endpoints: ApiEndpoints,

    /// API key (optional).
    api_key: Option<String>,
}

impl SemanticScholarClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or HTTP client
    /// initialization fails.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(ref key) = config.api_key {
            headers.insert("x-api-key", key.parse()?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            controller: RetryController::new(&config),
            resolver: TitleResolver::from_config(&config),
            cache: None,
            endpoints: config.endpoints,
            api_key: config.api_key,
        })
    }

    /// Consult and fill `cache` on paper and author lookups.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn RecordCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use `sleeper` for backoff waits and the post-success pause.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.controller = self.controller.replace_sleeper(sleeper);
        self
    }

    /// Check if an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Title acceptance threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.resolver.threshold()
    }

    /// Retry budget per request.
    #[must_use]
    pub const fn max_retry_count(&self) -> u32 {
        self.controller.max_retry_count()
    }

    /// The resolver used by [`Self::get_paper_id_from_title`].
    #[must_use]
    pub const fn resolver(&self) -> &TitleResolver {
        &self.resolver
    }

    /// Resolve a free-text title to a paper ID.
    ///
    /// `Ok(None)` means the search worked but no candidate was a confident match.
    pub async fn get_paper_id_from_title(&self, title: &str) -> Result<Option<String>> {
        self.resolver.resolve(self, title).await
    }

    /// Get a paper with authors and one level of citations and references.
    ///
    /// `paper_id` may be any identifier the API accepts. With a cache the
    /// record is stored under `paper_id` and under its canonical ID.
    pub async fn get_paper(&self, paper_id: &str) -> Result<Paper> {
        if let Some(cache) = &self.cache {
            if let Some(paper) = cache.paper(paper_id).await {
                tracing::debug!(paper_id, "Paper served from cache");
                return Ok(paper);
            }
        }

        let url = Url::parse_with_params(
            &self.endpoints.paper(paper_id),
            &[("fields", fields::join(fields::PAPER_DETAIL))],
        )?;
        let value = self
            .fetch_json(paper_id, url)
            .await
            .map_err(|e| not_found_as(e, || ScholarError::no_paper(paper_id)))?;
        let paper = normalize::paper_detail(&value, paper_id)?;

        if let Some(cache) = &self.cache {
            cache.store_paper(paper_id, &paper).await;
            if paper.paper_id != paper_id {
                cache.store_paper(&paper.paper_id, &paper).await;
            }
        }
        Ok(paper)
    }

    /// Get an author by ID.
    pub async fn get_author(&self, author_id: &str) -> Result<Author> {
        if let Some(cache) = &self.cache {
            if let Some(author) = cache.author(author_id).await {
                tracing::debug!(author_id, "Author served from cache");
                return Ok(author);
            }
        }

        let url = Url::parse_with_params(
            &self.endpoints.author(author_id),
            &[("fields", fields::join(fields::AUTHOR))],
        )?;
        let value = self
            .fetch_json(author_id, url)
            .await
            .map_err(|e| not_found_as(e, || ScholarError::no_author(author_id)))?;
        let author = normalize::author_detail(&value, author_id)?;

        if let Some(cache) = &self.cache {
            cache.store_author(author_id, &author).await;
            if author.author_id != author_id {
                cache.store_author(&author.author_id, &author).await;
            }
        }
        Ok(author)
    }

    /// Find an author by name.
    ///
    /// With `paper_id`, only an author listing that paper is accepted, which
    /// disambiguates common names.
    pub async fn get_author_by_name(&self, name: &str, paper_id: Option<&str>) -> Result<Author> {
        let words: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
        let query = words.join(" ");
        if query.is_empty() {
            return Err(ScholarError::no_author(name));
        }

        let url = Url::parse_with_params(
            &self.endpoints.author_search(),
            &[
                ("query", query),
                ("fields", fields::join(fields::AUTHOR_SEARCH)),
            ],
        )?;
        let value = self.fetch_json(name, url).await?;
        normalize::author_from_search(&value, name, paper_id)
    }

    /// Get the references of a paper with citation contexts, intents and
    /// influence flags.
    pub async fn get_references(&self, paper_id: &str) -> Result<Vec<Reference>> {
        let url = Url::parse_with_params(
            &self.endpoints.references(paper_id),
            &[
                ("fields", fields::join(fields::REFERENCES)),
                ("offset", "0".to_string()),
                ("limit", api::REFERENCES_LIMIT.to_string()),
            ],
        )?;
        let value = self
            .fetch_json(paper_id, url)
            .await
            .map_err(|e| not_found_as(e, || ScholarError::no_paper(paper_id)))?;
        normalize::references(&value, paper_id)
    }

    /// GET `url` through the retry controller.
    async fn fetch_json(&self, request: &str, url: Url) -> Result<Value> {
        self.controller.run(request, || self.get(url.clone())).await
    }

    /// One GET attempt.
    async fn get(&self, url: Url) -> std::result::Result<Value, ClientError> {
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        let response = Self::handle_response(response).await?;
        Ok(response.json::<Value>().await?)
    }

    /// Handle API response status codes.
    ///
    /// A 429 carries the `Retry-After` seconds (60 when absent) for error
    /// reports. The wait before the next attempt is always the configured
    /// `rate_limit_delay`.
    async fn handle_response(
        response: reqwest::Response,
    ) -> std::result::Result<reqwest::Response, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Err(ClientError::rate_limited(retry_after));
        }

        let text = response.text().await.unwrap_or_default();
        Err(ClientError::status(status.as_u16(), text))
    }
}

/// Turn a fatal 404 into the lookup's "not found" error.
fn not_found_as(error: ScholarError, not_found: impl FnOnce() -> ScholarError) -> ScholarError {
    match error {
        ScholarError::Client(ClientError::Status { status: 404, .. }) => not_found(),
        other => other,
    }
}

#[async_trait]
impl CandidateSource for SemanticScholarClient {
    async fn search_candidates(&self, query: &str) -> Result<Vec<Candidate>> {
        let url = Url::parse_with_params(
            &self.endpoints.paper_search(),
            &[
                ("query", query.to_string()),
                ("fields", fields::join(fields::SEARCH)),
                ("offset", "0".to_string()),
                ("limit", api::SEARCH_LIMIT.to_string()),
            ],
        )?;
        let value = self.fetch_json(query, url).await?;
        normalize::search_candidates(&value, query)
    }
}

impl std::fmt::Debug for SemanticScholarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticScholarClient")
            .field("has_api_key", &self.has_api_key())
            .field("has_cache", &self.cache.is_some())
            .field("controller", &self.controller)
            .field("resolver", &self.resolver)
            .finish()
    }
}
