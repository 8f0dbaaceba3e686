//! Remote model interaction: the [`GenerativeClient`] trait and its HTTP
//! implementation.
//!
//! The trait is the seam between the orchestration logic and the wire: the
//! sequencer only ever sees `generate(model, request) → reply | error`, so
//! tests drive it with a scripted stub and never open a socket. The concrete
//! [`GeminiClient`] speaks the `generateContent` REST shape — one logical RPC
//! per attempt, carrying the encoded payload, the instruction text, and the
//! generation parameters.

use crate::error::Pdf2DocError;
use crate::pipeline::encode::EncodedPayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default endpoint for the Gemini REST API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Everything one attempt sends to the remote model, minus the model
/// identifier (which the fallback sequencer owns).
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// The encoded document payload.
    pub payload: EncodedPayload,
    /// System instruction (conversion rules).
    pub system_prompt: String,
    /// Short user-turn instruction accompanying the payload.
    pub instruction: String,
    /// Sampling temperature; fixed low for faithful transcription.
    pub temperature: f32,
    /// Optional output-token ceiling.
    pub max_output_tokens: Option<u32>,
    /// Relax the content-safety thresholds to BLOCK_NONE.
    ///
    /// Exam papers trip false positives on the default thresholds, so the
    /// orchestrator turns the filters off by default.
    pub disable_safety_filters: bool,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Normal completion.
    Stop,
    /// Blocked by a safety filter.
    Safety,
    /// Blocked because the output reproduced copyrighted training data.
    Recitation,
    /// Truncated at the output-token ceiling.
    MaxTokens,
    /// Anything else the API may add.
    Other(String),
}

impl FinishReason {
    fn parse(raw: &str) -> Self {
        match raw {
            "STOP" => FinishReason::Stop,
            "SAFETY" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// One reply from the remote model.
#[derive(Debug, Clone)]
pub struct GenerateReply {
    /// Candidate text, if the reply carried any.
    pub text: Option<String>,
    pub finish_reason: FinishReason,
}

/// A transport- or API-level failure for a single attempt.
///
/// `message` is always flat human-readable text: JSON error envelopes are
/// unwrapped before this type is constructed.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

/// Abstract remote generative-model service.
///
/// Implemented by [`GeminiClient`] for production and by scripted stubs in
/// tests. One call corresponds to exactly one network attempt — retries and
/// model fallback live above this trait.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateReply, ApiError>;
}

/// Unwrap a structured API error body into a flat human-readable message.
///
/// The API wraps diagnostics as `{"error": {"code", "message", "status"}}`;
/// forwarding that raw JSON to a user is never acceptable. Falls back to the
/// input unchanged when it is not such an envelope.
pub fn flatten_error_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(trimmed) {
            if !envelope.error.message.is_empty() {
                return envelope.error.message;
            }
        }
    }
    trimmed.to_string()
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    system_instruction: ContentBody<'a>,
    contents: Vec<ContentBody<'a>>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct ContentBody<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData<'a>>,
}

impl<'a> Part<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    fn inline(payload: &'a EncodedPayload) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: payload.media_type,
                data: &payload.data,
            }),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

/// All four harm categories relaxed, mirroring what the request asks for
/// when `disable_safety_filters` is set.
fn block_none_settings() -> Vec<SafetySetting> {
    const CATEGORIES: [&str; 4] = [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ];
    CATEGORIES
        .iter()
        .map(|c| SafetySetting {
            category: c,
            threshold: "BLOCK_NONE",
        })
        .collect()
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

// ── HTTP client ──────────────────────────────────────────────────────────

/// Production [`GenerativeClient`] over the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client with the given key and per-call timeout.
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, Pdf2DocError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Pdf2DocError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (staging, local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateReply, ApiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model
        );

        let body = GenerateContentBody {
            system_instruction: ContentBody {
                parts: vec![Part::text(&request.system_prompt)],
            },
            contents: vec![ContentBody {
                parts: vec![
                    Part::inline(&request.payload),
                    Part::text(&request.instruction),
                ],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
            safety_settings: if request.disable_safety_filters {
                block_none_settings()
            } else {
                Vec::new()
            },
        };

        debug!("POST {} ({} bytes payload)", url, request.payload.data.len());

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError {
                status: e.status().map(|s| s.as_u16()),
                message: if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(ApiError {
                status: Some(status.as_u16()),
                message: flatten_error_message(&raw),
            });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| ApiError {
            status: None,
            message: format!("malformed API response: {e}"),
        })?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            // No candidates at all; the sequencer treats this as an empty
            // response and retries.
            return Ok(GenerateReply {
                text: None,
                finish_reason: FinishReason::Other("NO_CANDIDATES".to_string()),
            });
        };

        let finish_reason = candidate
            .finish_reason
            .as_deref()
            .map(FinishReason::parse)
            .unwrap_or(FinishReason::Stop);

        let text = candidate.content.map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        });
        let text = text.filter(|t| !t.is_empty());

        Ok(GenerateReply { text, finish_reason })
    }
}
