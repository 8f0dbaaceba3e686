//! Error types for the pdf2doc library.
//!
//! One enum, one variant per user-facing failure category. The orchestrator
//! guarantees that transient failures (a single rate-limited attempt, one
//! overloaded reply) never surface here — they are retried internally and
//! only the final, post-exhaustion classification crosses the library
//! boundary. Every message is written for the end user: no raw JSON
//! envelopes, no transport jargon, and a recovery hint where one exists.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2doc library.
#[derive(Debug, Error)]
pub enum Pdf2DocError {
    // ── Validation errors (fail fast, zero network activity) ──────────────
    /// Input file exceeds the configured size ceiling.
    #[error(
        "File is too large: {actual} bytes (limit {limit}).\n\
         Split the PDF or raise `max_file_bytes` if your API tier allows it."
    )]
    FileTooLarge { actual: u64, limit: u64 },

    /// No API key was supplied and none was found in the environment.
    #[error(
        "No API key found.\n\
         Set GEMINI_API_KEY (or GOOGLE_API_KEY), or supply a key in the configuration."
    )]
    MissingApiKey,

    /// A key was supplied but its shape is obviously wrong.
    ///
    /// Checked before the first network call so a typo fails here rather
    /// than as a remote 401 after the payload has been uploaded.
    #[error("The supplied API key is malformed: {reason}")]
    InvalidApiKey { reason: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The local file could not be read. Non-retryable.
    #[error("Failed to read input file '{path}': {source}")]
    PayloadRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Terminal remote failures (after fallback + retries) ───────────────
    /// Every candidate model reported not-found.
    #[error(
        "Model '{model}' is not available (404): {detail}\n\
         Check the API key or switch the model list to a newer release."
    )]
    ModelUnavailable { model: String, detail: String },

    /// Quota/429 on all attempts across all models.
    #[error(
        "Rate limit exceeded: {detail}\n\
         Wait a moment and try again, or supply a private API key."
    )]
    RateLimited { detail: String },

    /// Transient 5xx/503 persisted through every retry.
    #[error("The service is overloaded right now: {detail}\nTry again in a few minutes.")]
    ServiceOverloaded { detail: String },

    /// The model refused the document (safety or recitation finish reason).
    #[error("The document was blocked by the content policy ({reason}). Try a different file.")]
    ContentBlocked { reason: String },

    /// The model returned no usable text after all attempts and models.
    #[error(
        "The model returned no usable text.\n\
         Make sure the PDF contains selectable or legible content, not blank pages."
    )]
    EmptyResponse,

    /// Anything else, with a best-effort flat message.
    #[error("Conversion failed: {0}")]
    Unknown(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the exported document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2DocError {
    /// True for failures rejected before any network activity.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Pdf2DocError::FileTooLarge { .. }
                | Pdf2DocError::MissingApiKey
                | Pdf2DocError::InvalidApiKey { .. }
                | Pdf2DocError::InvalidConfig(_)
        )
    }
}
