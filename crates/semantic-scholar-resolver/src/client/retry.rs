//! Failure classification and backoff.
//!
//! Every outbound request runs through [`RetryController::run`]. A failed
//! attempt is tagged with a [`FailureKind`], the kind is looked up in a
//! [`BackoffTable`], and the resulting [`WaitPolicy`] decides between waiting
//! and giving up. Successful requests are followed by a fixed pause.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, RetryConfig};
use crate::error::{ClientError, Result, ScholarError};

/// `EAI_AGAIN` as returned by glibc's `getaddrinfo`.
pub const EAI_AGAIN: i32 = -3;

/// `gai_strerror(EAI_AGAIN)`, the only trace of the code once the resolver
/// has turned it into an `io::Error`.
const EAI_AGAIN_MESSAGE: &str = "temporary failure in name resolution";

/// Closed set of failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection refused or reset, request could not be sent.
    Connectivity,
    /// The API answered 429.
    RateLimited,
    /// Temporary name-resolution failure (`EAI_AGAIN`).
    NameResolution,
    /// The attempt hit the per-request timeout.
    Timeout,
    /// Any other non-success HTTP status.
    HttpStatus,
    /// Anything not covered above (body read, decode, ...).
    Unexpected,
}

impl FailureKind {
    /// Classify a failed attempt.
    #[must_use]
    pub fn classify(error: &ClientError) -> Self {
        match error {
            ClientError::RateLimited { .. } => Self::RateLimited,
            ClientError::Status { .. } => Self::HttpStatus,
            ClientError::Parse(_) => Self::Unexpected,
            ClientError::Http(e) => Self::classify_transport(e),
        }
    }

    fn classify_transport(error: &reqwest::Error) -> Self {
        // Resolver failures also report is_connect(), so check them first.
        if is_temporary_name_resolution(error) {
            return Self::NameResolution;
        }
        if error.is_timeout() {
            return Self::Timeout;
        }
        if error.is_connect() || error.is_request() {
            return Self::Connectivity;
        }
        match error.status() {
            Some(status) if status.as_u16() == 429 => Self::RateLimited,
            Some(_) => Self::HttpStatus,
            None => Self::Unexpected,
        }
    }
}

/// Walk an error's source chain looking for `EAI_AGAIN`.
#[must_use]
pub fn is_temporary_name_resolution(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.raw_os_error() == Some(EAI_AGAIN) {
                return true;
            }
        }
        if err.to_string().to_lowercase().contains(EAI_AGAIN_MESSAGE) {
            return true;
        }
        current = err.source();
    }
    false
}

/// What to do after a failure of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Wait this long, then try again.
    Retry(Duration),
    /// Give up immediately and surface the error.
    Fatal,
}

/// Failure kind to wait policy.
#[derive(Debug, Clone)]
pub struct BackoffTable {
    policies: HashMap<FailureKind, WaitPolicy>,
}

impl BackoffTable {
    /// Build the table from configured delays.
    #[must_use]
    pub fn new(retry: &RetryConfig) -> Self {
        let policies = HashMap::from([
            (FailureKind::Connectivity, WaitPolicy::Retry(retry.short_delay)),
            (FailureKind::RateLimited, WaitPolicy::Retry(retry.rate_limit_delay)),
            (FailureKind::NameResolution, WaitPolicy::Retry(retry.name_resolution_delay)),
            (FailureKind::Timeout, WaitPolicy::Retry(retry.short_delay)),
            (FailureKind::HttpStatus, WaitPolicy::Fatal),
            (FailureKind::Unexpected, WaitPolicy::Retry(retry.short_delay)),
        ]);
        Self { policies }
    }

    /// Policy for a failure kind. Kinds missing from the table are fatal.
    #[must_use]
    pub fn policy(&self, kind: FailureKind) -> WaitPolicy {
        self.policies.get(&kind).copied().unwrap_or(WaitPolicy::Fatal)
    }
}

impl Default for BackoffTable {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

/// Blocking wait used between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer, logging a countdown for waits over a second.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper {
    progress: bool,
}

impl TokioSleeper {
    /// A sleeper that optionally reports remaining seconds at `debug` level.
    #[must_use]
    pub const fn new(progress: bool) -> Self {
        Self { progress }
    }
}

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !self.progress || duration <= Duration::from_secs(1) {
            tokio::time::sleep(duration).await;
            return;
        }

        let mut remaining = duration;
        while !remaining.is_zero() {
            let remaining_secs = remaining.as_secs_f32();
            tracing::debug!(remaining_secs, "Waiting before retry");
            let step = remaining.min(Duration::from_secs(1));
            tokio::time::sleep(step).await;
            remaining -= step;
        }
    }
}

/// Records requested waits without sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits requested so far, in order.
    #[must_use]
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

/// Runs requests with the retry budget, backoff table and post-success pause.
#[derive(Clone)]
pub struct RetryController {
    table: BackoffTable,
    max_retry_count: u32,
    request_pause: Duration,
    silent: bool,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryController {
    /// Controller sleeping on the tokio timer.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_sleeper(config, Arc::new(TokioSleeper::new(!config.silent)))
    }

    /// Controller with a custom sleeper.
    #[must_use]
    pub fn with_sleeper(config: &Config, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            table: BackoffTable::new(&config.retry),
            max_retry_count: config.max_retry_count,
            request_pause: config.retry.request_pause,
            silent: config.silent,
            sleeper,
        }
    }

    /// Replace the sleeper, keeping everything else.
    #[must_use]
    pub fn replace_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Configured retry budget.
    #[must_use]
    pub const fn max_retry_count(&self) -> u32 {
        self.max_retry_count
    }

    /// Run `attempt` until it succeeds, fails fatally, or the budget is spent.
    ///
    /// At most `max_retry_count` retries follow the first attempt. `request`
    /// names the call in logs and in [`ScholarError::ExceededMaxRetryCount`].
    pub async fn run<T, F, Fut>(&self, request: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ClientError>>,
    {
        let mut retry = 0;

        loop {
            let error = match attempt().await {
                Ok(value) => {
                    if !self.request_pause.is_zero() {
                        self.sleeper.sleep(self.request_pause).await;
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let kind = FailureKind::classify(&error);
            let delay = match self.table.policy(kind) {
                WaitPolicy::Retry(delay) => delay,
                WaitPolicy::Fatal => return Err(ScholarError::Client(error)),
            };

            if retry >= self.max_retry_count {
                if !self.silent {
                    tracing::warn!(
                        request,
                        kind = ?kind,
                        retries = retry,
                        error = %error,
                        "Exceeded max retry count"
                    );
                }
                return Err(ScholarError::ExceededMaxRetryCount {
                    target: request.to_string(),
                    retries: retry,
                    source: error,
                });
            }

            retry += 1;
            if !self.silent {
                tracing::warn!(
                    request,
                    kind = ?kind,
                    retry,
                    max_retry_count = self.max_retry_count,
                    delay = ?delay,
                    error = %error,
                    "Request failed, backing off"
                );
            }
            self.sleeper.sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("max_retry_count", &self.max_retry_count)
            .field("request_pause", &self.request_pause)
            .field("silent", &self.silent)
            .finish()
    }
}
