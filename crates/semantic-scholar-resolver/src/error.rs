//! Error types for the Semantic Scholar resolver.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! [`ClientError`] describes a single failed HTTP attempt; [`ScholarError`] is what
//! library callers see once retries and normalization are done.

use std::time::Duration;

/// Errors from a single HTTP attempt.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, timeout, body read, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by Semantic Scholar API (429 response)
    ///
    /// Backoff uses the configured `rate_limit_delay`; `retry_after` is only
    /// reported.
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Wait time suggested by the `Retry-After` header
        retry_after: Duration,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited {
            retry_after: Duration::from_secs(seconds),
        }
    }

    /// Create an error for an unexpected HTTP status.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code, if the failure came from a response.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Parse(_) => None,
        }
    }
}

/// Errors surfaced to library callers.
#[derive(thiserror::Error, Debug)]
pub enum ScholarError {
    /// A search or detail lookup produced no usable paper.
    #[error("No paper found @ {query}")]
    NoPaperFound {
        /// Title or paper ID that was looked up
        query: String,
    },

    /// An author lookup produced no usable author.
    #[error("No author found @ {query}")]
    NoAuthorFound {
        /// Author name or ID that was looked up
        query: String,
    },

    /// The retry budget ran out before any attempt succeeded.
    #[error("Exceeded max retry count ({retries}) @ {target}")]
    ExceededMaxRetryCount {
        /// Request target (title, paper ID, author ID)
        target: String,
        /// Retries performed before giving up
        retries: u32,
        /// Failure of the last attempt
        #[source]
        source: ClientError,
    },

    /// Non-retryable HTTP failure, propagated as-is.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Response shape the normalizer cannot default around.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// A request URL could not be built from the endpoint and parameters.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ScholarError {
    /// Create a no-paper-found error.
    #[must_use]
    pub fn no_paper(query: impl Into<String>) -> Self {
        Self::NoPaperFound {
            query: query.into(),
        }
    }

    /// Create a no-author-found error.
    #[must_use]
    pub fn no_author(query: impl Into<String>) -> Self {
        Self::NoAuthorFound {
            query: query.into(),
        }
    }

    /// Create a malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Returns true for confirmed "not found" conditions.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NoPaperFound { .. } | Self::NoAuthorFound { .. })
    }

    /// Returns true if the retry budget was exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::ExceededMaxRetryCount { .. })
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, ScholarError>;
