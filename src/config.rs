//! Configuration types for PDF-to-HTML conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across calls and to diff two runs to
//! understand why their outcomes differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::client::GenerativeClient;
use crate::error::Pdf2DocError;
use crate::pipeline::retry::RetryPolicy;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default fallback chain: strongest model first, faster model as backup.
pub const DEFAULT_MODELS: [&str; 2] = ["gemini-3-pro-preview", "gemini-3-flash-preview"];

/// Default file-size ceiling: 20 MiB, the inline-payload limit of the
/// supported API tier.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;

/// Configuration for one conversion.
///
/// Built via [`ConversionConfig::builder()`] or [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2doc::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .models(["gemini-3-flash-preview"])
///     .max_attempts(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Ordered, non-empty model fallback list. The order encodes priority;
    /// one model is fully exhausted before the next is attempted.
    pub models: Vec<String>,

    /// File-size ceiling in bytes. Default: 20 MiB.
    ///
    /// Requests over the ceiling are rejected before any network activity.
    pub max_file_bytes: u64,

    /// Per-model attempt ceiling. Default: 2.
    ///
    /// Not-found and content-policy failures ignore this and end the model's
    /// attempts immediately.
    pub max_attempts: u32,

    /// Base wait in milliseconds for quota (429) retries; scales with the
    /// attempt number. Default: 2000.
    pub rate_limit_backoff_ms: u64,

    /// Base wait in milliseconds for overload (503) retries; scales with the
    /// attempt number. Default: 1000.
    pub overload_backoff_ms: u64,

    /// Fixed wait in milliseconds for all other retryable failures.
    /// Default: 1000.
    pub standard_backoff_ms: u64,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is on the page,
    /// which is exactly what transcription needs.
    pub temperature: f32,

    /// Optional output-token ceiling per request. Default: None.
    pub max_output_tokens: Option<u32>,

    /// API key override. Takes precedence over `GEMINI_API_KEY` /
    /// `GOOGLE_API_KEY` from the environment.
    pub api_key: Option<String>,

    /// Pre-constructed client. Takes precedence over everything else;
    /// when set, no credential resolution happens. Useful in tests or when
    /// the caller needs custom middleware.
    pub client: Option<Arc<dyn GenerativeClient>>,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Relax content-safety thresholds to BLOCK_NONE. Default: true.
    ///
    /// Exam papers and legal documents trip false positives on the default
    /// thresholds; the original deployment always disabled them.
    pub disable_safety_filters: bool,

    /// Per-attempt HTTP timeout in seconds. Default: 120.
    ///
    /// Whole-document transcription is slow; a full exam paper routinely
    /// takes over a minute on the pro-tier model.
    pub api_timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_attempts: 2,
            rate_limit_backoff_ms: 2000,
            overload_backoff_ms: 1000,
            standard_backoff_ms: 1000,
            temperature: 0.1,
            max_output_tokens: None,
            api_key: None,
            client: None,
            system_prompt: None,
            disable_safety_filters: true,
            api_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("models", &self.models)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("max_attempts", &self.max_attempts)
            .field("rate_limit_backoff_ms", &self.rate_limit_backoff_ms)
            .field("overload_backoff_ms", &self.overload_backoff_ms)
            .field("standard_backoff_ms", &self.standard_backoff_ms)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("client", &self.client.as_ref().map(|_| "<dyn GenerativeClient>"))
            .field("disable_safety_filters", &self.disable_safety_filters)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Derive the pure retry policy from the configured knobs.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            rate_limit_backoff: Duration::from_millis(self.rate_limit_backoff_ms),
            overload_backoff: Duration::from_millis(self.overload_backoff_ms),
            standard_backoff: Duration::from_millis(self.standard_backoff_ms),
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn rate_limit_backoff_ms(mut self, ms: u64) -> Self {
        self.config.rate_limit_backoff_ms = ms;
        self
    }

    pub fn overload_backoff_ms(mut self, ms: u64) -> Self {
        self.config.overload_backoff_ms = ms;
        self
    }

    pub fn standard_backoff_ms(mut self, ms: u64) -> Self {
        self.config.standard_backoff_ms = ms;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = Some(n);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn GenerativeClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn disable_safety_filters(mut self, v: bool) -> Self {
        self.config.disable_safety_filters = v;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2DocError> {
        let c = &self.config;
        if c.models.is_empty() {
            return Err(Pdf2DocError::InvalidConfig(
                "Model list must contain at least one candidate".into(),
            ));
        }
        if c.models.iter().any(|m| m.trim().is_empty()) {
            return Err(Pdf2DocError::InvalidConfig(
                "Model identifiers must not be empty".into(),
            ));
        }
        if c.max_file_bytes == 0 {
            return Err(Pdf2DocError::InvalidConfig(
                "File-size ceiling must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}
