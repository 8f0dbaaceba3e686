//! End-to-end orchestration tests driven by a scripted client stub.
//!
//! No network, no API key: the stub replays a fixed sequence of outcomes and
//! records which model each call targeted, so every fallback/retry path is
//! observable from the outside.

use pdf2doc::{
    convert, ApiError, ConversionConfig, FinishReason, GenerateReply, GenerateRequest,
    GenerativeClient, Pdf2DocError,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays scripted outcomes in order and records the model of every call.
struct ScriptedClient {
    script: Mutex<VecDeque<Result<GenerateReply, ApiError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(script: Vec<Result<GenerateReply, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeClient for ScriptedClient {
    async fn generate(
        &self,
        model: &str,
        _request: &GenerateRequest,
    ) -> Result<GenerateReply, ApiError> {
        self.calls.lock().unwrap().push(model.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("scripted client ran out of outcomes"))
    }
}

fn ok_reply(text: &str) -> Result<GenerateReply, ApiError> {
    Ok(GenerateReply {
        text: Some(text.to_string()),
        finish_reason: FinishReason::Stop,
    })
}

fn blocked_reply() -> Result<GenerateReply, ApiError> {
    Ok(GenerateReply {
        text: None,
        finish_reason: FinishReason::Safety,
    })
}

fn empty_reply() -> Result<GenerateReply, ApiError> {
    Ok(GenerateReply {
        text: None,
        finish_reason: FinishReason::Stop,
    })
}

fn api_error(status: u16, message: &str) -> Result<GenerateReply, ApiError> {
    Err(ApiError {
        status: Some(status),
        message: message.to_string(),
    })
}

/// Test config: injected stub, millisecond backoffs so retries are instant.
fn config_with(client: Arc<ScriptedClient>, models: &[&str]) -> ConversionConfig {
    ConversionConfig::builder()
        .client(client)
        .models(models.iter().copied())
        .rate_limit_backoff_ms(1)
        .overload_backoff_ms(1)
        .standard_backoff_ms(1)
        .build()
        .unwrap()
}

const PDF: &[u8] = b"%PDF-1.7 fake document body";

#[tokio::test]
async fn happy_path_returns_cleaned_markup() {
    let client = ScriptedClient::new(vec![ok_reply("```html\n<p>converted</p>\n```")]);
    let config = config_with(Arc::clone(&client), &["model-a"]);

    let markup = convert(PDF, "application/pdf", &config).await.unwrap();

    assert_eq!(markup, "<p>converted</p>");
    assert_eq!(client.calls(), vec!["model-a"]);
}

#[tokio::test]
async fn oversized_payload_fails_before_any_call() {
    let client = ScriptedClient::new(vec![]);
    let config = ConversionConfig::builder()
        .client(client.clone())
        .max_file_bytes(16)
        .build()
        .unwrap();

    let err = convert(&[0u8; 64], "application/pdf", &config)
        .await
        .unwrap_err();

    match err {
        Pdf2DocError::FileTooLarge { actual, limit } => {
            assert_eq!(actual, 64);
            assert_eq!(limit, 16);
        }
        other => panic!("expected FileTooLarge, got {other:?}"),
    }
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn unknown_model_advances_without_retrying() {
    // First model 404s once, second model succeeds: exactly one call each.
    let client = ScriptedClient::new(vec![
        api_error(404, "models/model-a is not found for API version v1beta"),
        ok_reply("<p>fallback</p>"),
    ]);
    let config = config_with(Arc::clone(&client), &["model-a", "model-b"]);

    let markup = convert(PDF, "application/pdf", &config).await.unwrap();

    assert_eq!(markup, "<p>fallback</p>");
    assert_eq!(client.calls(), vec!["model-a", "model-b"]);
}

#[tokio::test]
async fn all_models_unknown_surfaces_model_unavailable() {
    let client = ScriptedClient::new(vec![
        api_error(404, "no such model"),
        api_error(404, "no such model"),
        api_error(404, "no such model"),
    ]);
    let config = config_with(Arc::clone(&client), &["a", "b", "c"]);

    let err = convert(PDF, "application/pdf", &config).await.unwrap_err();

    match err {
        Pdf2DocError::ModelUnavailable { model, .. } => assert_eq!(model, "c"),
        other => panic!("expected ModelUnavailable, got {other:?}"),
    }
    // One call per candidate, never a second attempt against a missing model.
    assert_eq!(client.calls(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn rate_limit_retries_up_to_the_attempt_ceiling() {
    let client = ScriptedClient::new(vec![
        api_error(429, "quota exceeded"),
        api_error(429, "quota exceeded"),
        api_error(429, "quota exceeded"),
    ]);
    let config = ConversionConfig::builder()
        .client(client.clone())
        .models(["only-model"])
        .max_attempts(3)
        .rate_limit_backoff_ms(1)
        .build()
        .unwrap();

    let err = convert(PDF, "application/pdf", &config).await.unwrap_err();

    assert!(matches!(err, Pdf2DocError::RateLimited { .. }));
    assert_eq!(client.calls().len(), 3);
}

#[tokio::test]
async fn rate_limited_model_recovers_on_second_attempt() {
    let client = ScriptedClient::new(vec![
        api_error(429, "quota exceeded"),
        ok_reply("<p>second try</p>"),
    ]);
    let config = config_with(Arc::clone(&client), &["only-model"]);

    let markup = convert(PDF, "application/pdf", &config).await.unwrap();

    assert_eq!(markup, "<p>second try</p>");
    assert_eq!(client.calls(), vec!["only-model", "only-model"]);
}

#[tokio::test]
async fn safety_block_spends_one_attempt_then_advances() {
    // Retrying a blocked document against the same model cannot help, but a
    // different model tier may still accept it.
    let client = ScriptedClient::new(vec![blocked_reply(), ok_reply("<p>rescued</p>")]);
    let config = config_with(Arc::clone(&client), &["model-a", "model-b"]);

    let markup = convert(PDF, "application/pdf", &config).await.unwrap();

    assert_eq!(markup, "<p>rescued</p>");
    assert_eq!(client.calls(), vec!["model-a", "model-b"]);
}

#[tokio::test]
async fn block_on_every_model_surfaces_content_blocked() {
    let client = ScriptedClient::new(vec![blocked_reply(), blocked_reply()]);
    let config = config_with(Arc::clone(&client), &["model-a", "model-b"]);

    let err = convert(PDF, "application/pdf", &config).await.unwrap_err();

    match err {
        Pdf2DocError::ContentBlocked { reason } => assert_eq!(reason, "safety"),
        other => panic!("expected ContentBlocked, got {other:?}"),
    }
    // One attempt per model, never a retry against a blocking model.
    assert_eq!(client.calls(), vec!["model-a", "model-b"]);
}

#[tokio::test]
async fn recitation_block_reports_recitation_reason() {
    let client = ScriptedClient::new(vec![Ok(GenerateReply {
        text: Some("<p>partial</p>".to_string()),
        finish_reason: FinishReason::Recitation,
    })]);
    let config = config_with(Arc::clone(&client), &["model-a"]);

    let err = convert(PDF, "application/pdf", &config).await.unwrap_err();

    match err {
        Pdf2DocError::ContentBlocked { reason } => assert_eq!(reason, "recitation"),
        other => panic!("expected ContentBlocked, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_replies_exhaust_every_candidate() {
    // Two models, two attempts each: four empty replies, then EmptyResponse.
    let client = ScriptedClient::new(vec![
        empty_reply(),
        empty_reply(),
        empty_reply(),
        empty_reply(),
    ]);
    let config = config_with(Arc::clone(&client), &["a", "b"]);

    let err = convert(PDF, "application/pdf", &config).await.unwrap_err();

    assert!(matches!(err, Pdf2DocError::EmptyResponse));
    assert_eq!(client.calls(), vec!["a", "a", "b", "b"]);
}

#[tokio::test]
async fn overload_failures_fall_through_to_the_backup_model() {
    let client = ScriptedClient::new(vec![
        api_error(503, "The model is overloaded. Please try again later."),
        api_error(503, "The model is overloaded. Please try again later."),
        ok_reply("<p>backup</p>"),
    ]);
    let config = config_with(Arc::clone(&client), &["primary", "backup"]);

    let markup = convert(PDF, "application/pdf", &config).await.unwrap();

    assert_eq!(markup, "<p>backup</p>");
    assert_eq!(client.calls(), vec!["primary", "primary", "backup"]);
}

#[tokio::test]
async fn structured_error_bodies_are_flattened_for_the_user() {
    let envelope =
        r#"{"error": {"code": 400, "message": "Request payload is malformed", "status": "INVALID_ARGUMENT"}}"#;
    let client = ScriptedClient::new(vec![Err(ApiError {
        status: Some(400),
        message: envelope.to_string(),
    })]);
    let config = ConversionConfig::builder()
        .client(client.clone())
        .models(["only-model"])
        .max_attempts(1)
        .build()
        .unwrap();

    let err = convert(PDF, "application/pdf", &config).await.unwrap_err();

    match err {
        Pdf2DocError::Unknown(msg) => {
            assert_eq!(msg, "Request payload is malformed");
            assert!(!msg.contains('{'));
        }
        other => panic!("expected Unknown, got {other:?}"),
    }
}

#[tokio::test]
async fn conversion_is_repeatable_with_identical_input() {
    // Same bytes, same scripted outcome: byte-identical markup both times.
    for _ in 0..2 {
        let client = ScriptedClient::new(vec![ok_reply("  <p>stable</p>\r\n")]);
        let config = config_with(Arc::clone(&client), &["model-a"]);
        let markup = convert(PDF, "application/pdf", &config).await.unwrap();
        assert_eq!(markup, "<p>stable</p>");
    }
}

#[tokio::test]
async fn missing_input_file_maps_to_payload_read() {
    let config = ConversionConfig::builder()
        .client(ScriptedClient::new(vec![]))
        .build()
        .unwrap();

    let err = pdf2doc::convert_file("/nonexistent/input.pdf", &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2DocError::PayloadRead { .. }));
}
