//! Configuration for the Semantic Scholar resolver.

use std::time::Duration;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Graph API endpoint.
    pub const GRAPH_API: &str = "https://api.semanticscholar.org/graph/v1";

    /// Per-attempt request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default acceptance threshold for title matching.
    pub const TITLE_THRESHOLD: f64 = 0.95;

    /// Default retry budget per logical call.
    pub const MAX_RETRY_COUNT: u32 = 5;

    /// Number of candidates requested from the title search.
    pub const SEARCH_LIMIT: u32 = 100;

    /// Number of rows requested from the references endpoint.
    pub const REFERENCES_LIMIT: u32 = 1000;

    /// Short wait for connectivity failures, timeouts and unclassified errors.
    pub const SHORT_DELAY: Duration = Duration::from_secs(3);

    /// Wait after a 429 response.
    pub const RATE_LIMIT_DELAY: Duration = Duration::from_secs(30);

    /// Wait after a temporary name-resolution failure.
    pub const NAME_RESOLUTION_DELAY: Duration = Duration::from_secs(30);

    /// Pause after every successful request.
    pub const REQUEST_PAUSE: Duration = Duration::from_secs(3);

    /// Cache TTL (1 hour).
    pub const CACHE_TTL: Duration = Duration::from_secs(3600);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 4;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Field allowlists submitted verbatim with detail requests.
pub mod fields {
    /// Fields requested for candidate titles.
    pub const SEARCH: &[&str] = &["title"];

    /// Fields requested for a full paper record, including one level of
    /// citations and references.
    pub const PAPER_DETAIL: &[&str] = &[
        "paperId",
        "url",
        "title",
        "abstract",
        "venue",
        "year",
        "referenceCount",
        "citationCount",
        "influentialCitationCount",
        "isOpenAccess",
        "fieldsOfStudy",
        "publicationDate",
        "authors.authorId",
        "authors.name",
        "authors.url",
        "authors.affiliations",
        "authors.hIndex",
        "authors.paperCount",
        "authors.citationCount",
        "citations.paperId",
        "citations.title",
        "citations.year",
        "citations.url",
        "citations.abstract",
        "citations.authors",
        "citations.venue",
        "citations.fieldsOfStudy",
        "citations.publicationDate",
        "citations.referenceCount",
        "citations.citationCount",
        "citations.influentialCitationCount",
        "citations.isOpenAccess",
        "references.paperId",
        "references.title",
        "references.year",
        "references.url",
        "references.abstract",
        "references.authors",
        "references.venue",
        "references.fieldsOfStudy",
        "references.publicationDate",
        "references.referenceCount",
        "references.citationCount",
        "references.influentialCitationCount",
        "references.isOpenAccess",
    ];

    /// Author fields for author queries.
    pub const AUTHOR: &[&str] = &[
        "authorId",
        "url",
        "name",
        "affiliations",
        "paperCount",
        "citationCount",
        "hIndex",
    ];

    /// Author fields for name search; `papers.paperId` drives the paper filter.
    pub const AUTHOR_SEARCH: &[&str] = &[
        "authorId",
        "url",
        "name",
        "affiliations",
        "paperCount",
        "citationCount",
        "hIndex",
        "papers.paperId",
    ];

    /// Fields for the references endpoint: citation context plus the cited paper.
    pub const REFERENCES: &[&str] = &[
        "contexts",
        "intents",
        "isInfluential",
        "paperId",
        "url",
        "title",
        "abstract",
        "venue",
        "year",
        "authors",
        "fieldsOfStudy",
        "publicationDate",
        "referenceCount",
        "citationCount",
        "influentialCitationCount",
        "isOpenAccess",
    ];

    /// Join a field list into the comma-separated query value.
    #[must_use]
    pub fn join(fields: &[&str]) -> String {
        fields.join(",")
    }
}

/// Endpoint table, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Graph API base URL (for testing with mock servers).
    pub graph_api_url: String,
}

impl ApiEndpoints {
    /// Endpoints rooted at an arbitrary graph API base URL.
    #[must_use]
    pub fn new(graph_api_url: impl Into<String>) -> Self {
        let graph_api_url = graph_api_url.into();
        Self {
            graph_api_url: graph_api_url.trim_end_matches('/').to_string(),
        }
    }

    /// `GET /paper/search`
    #[must_use]
    pub fn paper_search(&self) -> String {
        format!("{}/paper/search", self.graph_api_url)
    }

    /// `GET /paper/{id}`
    #[must_use]
    pub fn paper(&self, paper_id: &str) -> String {
        format!("{}/paper/{}", self.graph_api_url, paper_id)
    }

    /// `GET /paper/{id}/references`
    #[must_use]
    pub fn references(&self, paper_id: &str) -> String {
        format!("{}/paper/{}/references", self.graph_api_url, paper_id)
    }

    /// `GET /author/{id}`
    #[must_use]
    pub fn author(&self, author_id: &str) -> String {
        format!("{}/author/{}", self.graph_api_url, author_id)
    }

    /// `GET /author/search`
    #[must_use]
    pub fn author_search(&self) -> String {
        format!("{}/author/search", self.graph_api_url)
    }
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self::new(api::GRAPH_API)
    }
}

/// Wait durations used by the retry controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Wait for connectivity failures, timeouts and unclassified errors.
    pub short_delay: Duration,

    /// Wait after the API answers 429.
    pub rate_limit_delay: Duration,

    /// Wait after a temporary name-resolution failure.
    pub name_resolution_delay: Duration,

    /// Pause after each successful request.
    pub request_pause: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            short_delay: api::SHORT_DELAY,
            rate_limit_delay: api::RATE_LIMIT_DELAY,
            name_resolution_delay: api::NAME_RESOLUTION_DELAY,
            request_pause: api::REQUEST_PAUSE,
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Semantic Scholar API key (optional).
    pub api_key: Option<String>,

    /// API endpoints.
    pub endpoints: ApiEndpoints,

    /// Title similarity must be strictly above this value to match.
    pub threshold: f64,

    /// Suppress backoff warnings.
    pub silent: bool,

    /// Retries allowed per logical call.
    pub max_retry_count: u32,

    /// Per-attempt request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Backoff waits and inter-request pause.
    pub retry: RetryConfig,

    /// Drop English stopwords before scoring titles.
    pub ignore_stopwords: bool,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,
}

impl Config {
    /// Create a new configuration with optional API key.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            endpoints: ApiEndpoints::default(),
            threshold: api::TITLE_THRESHOLD,
            silent: false,
            max_retry_count: api::MAX_RETRY_COUNT,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            retry: RetryConfig::default(),
            ignore_stopwords: true,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
        }
    }

    /// Create a test configuration with custom URLs for mock servers.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            endpoints: ApiEndpoints::new(format!("{base_url}/graph/v1")),
            silent: true,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            retry: RetryConfig {
                short_delay: Duration::from_millis(0),
                rate_limit_delay: Duration::from_millis(0),
                name_resolution_delay: Duration::from_millis(0),
                request_pause: Duration::from_millis(0), // No pause in tests
            },
            cache_ttl: Duration::from_secs(0),
            cache_max_size: 0,
            ..Self::new(None)
        }
    }

    /// Set the title acceptance threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub fn with_max_retry_count(mut self, max_retry_count: u32) -> Self {
        self.max_retry_count = max_retry_count;
        self
    }

    /// Enable or disable silent mode.
    #[must_use]
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Reads a `.env` file if present, then `SEMANTIC_SCHOLAR_API_KEY`,
    /// `SS_THRESHOLD`, `SS_MAX_RETRY_COUNT` and `SS_SILENT`.
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::new(std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok());

        if let Ok(raw) = std::env::var("SS_THRESHOLD") {
            config.threshold = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("SS_THRESHOLD must be a number: {e}"))?;
        }
        if let Ok(raw) = std::env::var("SS_MAX_RETRY_COUNT") {
            config.max_retry_count = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("SS_MAX_RETRY_COUNT must be an integer: {e}"))?;
        }
        if let Ok(raw) = std::env::var("SS_SILENT") {
            config.silent = matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that the type system does not.
    ///
    /// # Errors
    ///
    /// Returns error if the threshold is outside (0, 1].
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            anyhow::bail!("threshold must be in (0, 1], got {}", self.threshold);
        }
        Ok(())
    }

    /// Check if an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}
