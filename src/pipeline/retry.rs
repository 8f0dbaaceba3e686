//! Retry/backoff policy: a pure decision function over attempt outcomes.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from generative APIs are transient and frequent.
//! Each failure class gets its own wait schedule: quota errors back off in
//! multiples of a long base (2 s → 4 s), overload errors in multiples of a
//! short base (1 s → 2 s), everything else a single standard wait. A model
//! that the API reports as not-found is never retried — the fallback list
//! advances immediately. [`RetryPolicy::decide`] has no hidden state: the
//! same `(attempt, failure)` pair always yields the same decision, which is
//! what makes the policy unit-testable in isolation.

use crate::client::ApiError;
use std::time::Duration;

/// Classification of one failed attempt against the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 404 / "not found" — the model identifier does not exist on this endpoint.
    ModelNotFound,
    /// 429 / quota exhausted.
    RateLimited,
    /// 503 / transient server overload.
    Overloaded,
    /// Safety or recitation finish reason — retrying cannot help.
    ContentBlocked,
    /// The reply carried no usable text.
    EmptyResponse,
    /// Anything else.
    Other,
}

/// One failed attempt: classification plus the diagnostic detail that
/// produced it. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    pub kind: FailureKind,
    /// HTTP status, when the failure came from the transport layer.
    pub status: Option<u16>,
    /// Flat human-readable message (JSON envelopes already unwrapped).
    pub message: String,
    /// Model the attempt ran against; stamped by the sequencer.
    pub model: Option<String>,
}

impl AttemptFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            model: None,
        }
    }

    /// Classify a transport-level error by status code and message keywords.
    ///
    /// The keyword fallbacks matter: some proxies strip status codes and
    /// leave only a message like "Resource has been exhausted (e.g. check
    /// quota)", which still must be treated as a rate limit.
    pub fn from_api_error(err: &ApiError) -> Self {
        let lower = err.message.to_lowercase();
        let kind = match err.status {
            Some(404) => FailureKind::ModelNotFound,
            Some(429) => FailureKind::RateLimited,
            Some(503) => FailureKind::Overloaded,
            _ if lower.contains("not found") => FailureKind::ModelNotFound,
            _ if lower.contains("429") || lower.contains("quota") || lower.contains("rate limit") => {
                FailureKind::RateLimited
            }
            _ if lower.contains("503")
                || lower.contains("overloaded")
                || lower.contains("unavailable") =>
            {
                FailureKind::Overloaded
            }
            _ => FailureKind::Other,
        };

        Self {
            kind,
            status: err.status,
            message: err.message.clone(),
            model: None,
        }
    }

    /// Record which model the attempt ran against.
    pub fn for_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try the same model again.
    Retry(Duration),
    /// Give up on this model immediately, without spending attempts on it.
    Advance,
    /// Give up on this model after its attempts are spent or retrying cannot
    /// help. The sequencer moves to the next candidate either way; the
    /// distinction exists so the decision log reads honestly.
    Abort,
}

/// Deterministic per-model retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempt ceiling per model (attempts are 1-indexed).
    pub max_attempts: u32,
    /// Base wait for quota errors; scales linearly with the attempt number.
    pub rate_limit_backoff: Duration,
    /// Base wait for overload errors; scales linearly with the attempt number.
    pub overload_backoff: Duration,
    /// Fixed wait for every other retryable failure.
    pub standard_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            rate_limit_backoff: Duration::from_secs(2),
            overload_backoff: Duration::from_secs(1),
            standard_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Decide the next step after attempt `attempt` (1-indexed) failed.
    pub fn decide(&self, attempt: u32, failure: &AttemptFailure) -> RetryDecision {
        match failure.kind {
            // Not-found never resolves by retrying the same identifier.
            FailureKind::ModelNotFound => RetryDecision::Advance,
            // A policy block on the same document will repeat verbatim.
            FailureKind::ContentBlocked => RetryDecision::Abort,
            FailureKind::RateLimited if attempt < self.max_attempts => {
                RetryDecision::Retry(self.rate_limit_backoff * attempt)
            }
            FailureKind::Overloaded if attempt < self.max_attempts => {
                RetryDecision::Retry(self.overload_backoff * attempt)
            }
            FailureKind::EmptyResponse | FailureKind::Other
                if attempt < self.max_attempts =>
            {
                RetryDecision::Retry(self.standard_backoff)
            }
            // Attempt ceiling reached.
            _ => RetryDecision::Abort,
        }
    }
}
