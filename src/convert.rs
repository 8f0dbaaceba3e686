//! Conversion entry points: validate, encode, run the fallback chain, map
//! terminal failures into the user-facing taxonomy.
//!
//! The orchestrator is stateless across calls — every invocation is an
//! independent, reentrant function of its inputs. It performs no caching and
//! no persistence; the only side effect is the network call itself. There is
//! no cancellation token: a caller that loses interest simply drops the
//! future (last-result-wins).

use crate::client::{flatten_error_message, GeminiClient, GenerateRequest, GenerativeClient};
use crate::config::ConversionConfig;
use crate::error::Pdf2DocError;
use crate::pipeline::retry::{AttemptFailure, FailureKind};
use crate::pipeline::{encode, postprocess, sequencer};
use crate::prompts::{DEFAULT_SYSTEM_PROMPT, USER_INSTRUCTION};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF payload to cleaned, Word-ready HTML markup.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `bytes` — Raw PDF content
/// * `declared_media_type` — Caller-reported media type; unreliable values
///   (generic binary types from some client environments) are overridden
///   with `application/pdf`
/// * `config` — Conversion configuration
///
/// # Errors
/// Exactly one [`Pdf2DocError`] variant per the failure taxonomy. Requests
/// violating the size ceiling or lacking a credential fail before any
/// network activity; transient remote failures are retried internally and
/// surface only after the whole fallback chain is exhausted.
pub async fn convert(
    bytes: &[u8],
    declared_media_type: &str,
    config: &ConversionConfig,
) -> Result<String, Pdf2DocError> {
    let start = Instant::now();

    // ── Step 1: Validate before touching the network ─────────────────────
    if bytes.len() as u64 > config.max_file_bytes {
        return Err(Pdf2DocError::FileTooLarge {
            actual: bytes.len() as u64,
            limit: config.max_file_bytes,
        });
    }

    let client = resolve_client(config)?;

    // ── Step 2: Encode the payload ───────────────────────────────────────
    let payload = encode::encode_payload(bytes, declared_media_type);
    let request = GenerateRequest {
        payload,
        system_prompt: config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        instruction: USER_INSTRUCTION.to_string(),
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
        disable_safety_filters: config.disable_safety_filters,
    };

    info!(
        "Starting conversion: {} bytes, {} model candidate(s)",
        bytes.len(),
        config.models.len()
    );

    // ── Step 3: Run the fallback chain ───────────────────────────────────
    let outcome =
        sequencer::run_fallback(client.as_ref(), &config.models, &request, &config.retry_policy())
            .await;

    match outcome {
        Ok(raw) => {
            let markup = postprocess::clean_markup(&raw);
            info!(
                "Conversion complete: {} chars in {}ms",
                markup.len(),
                start.elapsed().as_millis()
            );
            Ok(markup)
        }
        Err(failure) => Err(into_error(failure)),
    }
}

/// Convert a PDF file on disk.
///
/// Reads the file into memory and delegates to [`convert`]. An unreadable
/// file fails with [`Pdf2DocError::PayloadRead`] — non-retryable, no network
/// activity.
pub async fn convert_file(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<String, Pdf2DocError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Pdf2DocError::PayloadRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    convert(&bytes, encode::PDF_MEDIA_TYPE, config).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    bytes: &[u8],
    declared_media_type: &str,
    config: &ConversionConfig,
) -> Result<String, Pdf2DocError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2DocError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(bytes, declared_media_type, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the client, from most-specific to least-specific:
///
/// 1. **Pre-built client** (`config.client`) — the caller constructed and
///    configured it entirely; credential resolution is skipped.
/// 2. **Explicit key** (`config.api_key`) — validated, then used.
/// 3. **Environment** — `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
///
/// A missing credential fails here, before any payload is encoded or sent.
fn resolve_client(config: &ConversionConfig) -> Result<Arc<dyn GenerativeClient>, Pdf2DocError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let key = match config.api_key {
        Some(ref key) => key.clone(),
        None => ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .ok_or(Pdf2DocError::MissingApiKey)?,
    };

    validate_api_key(&key)?;

    let client = GeminiClient::new(key, config.api_timeout_secs)?;
    Ok(Arc::new(client))
}

/// Reject obviously malformed keys before the first network call.
///
/// A typo'd or truncated key would otherwise surface as a confusing remote
/// 401 after the whole payload has been uploaded.
pub(crate) fn validate_api_key(key: &str) -> Result<(), Pdf2DocError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(Pdf2DocError::InvalidApiKey {
            reason: "key is empty".into(),
        });
    }
    if trimmed.len() != key.len() {
        return Err(Pdf2DocError::InvalidApiKey {
            reason: "key has leading or trailing whitespace".into(),
        });
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Pdf2DocError::InvalidApiKey {
            reason: "key contains whitespace or control characters".into(),
        });
    }
    Ok(())
}

/// Map the terminal failure of an exhausted fallback chain to exactly one
/// user-facing error category, with any structured error body flattened.
fn into_error(failure: AttemptFailure) -> Pdf2DocError {
    let detail = flatten_error_message(&failure.message);
    match failure.kind {
        FailureKind::ModelNotFound => Pdf2DocError::ModelUnavailable {
            model: failure.model.unwrap_or_else(|| "unknown".into()),
            detail,
        },
        FailureKind::RateLimited => Pdf2DocError::RateLimited { detail },
        FailureKind::Overloaded => Pdf2DocError::ServiceOverloaded { detail },
        FailureKind::ContentBlocked => Pdf2DocError::ContentBlocked {
            reason: if detail.contains("recitation") {
                "recitation".into()
            } else {
                "safety".into()
            },
        },
        FailureKind::EmptyResponse => Pdf2DocError::EmptyResponse,
        FailureKind::Other => Pdf2DocError::Unknown(detail),
    }
}
