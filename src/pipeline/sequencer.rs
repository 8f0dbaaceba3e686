//! Model-fallback sequencer: exhaust one candidate before trying the next.
//!
//! State machine over the caller-supplied ordered model list:
//!
//! ```text
//! TryingModel(i) ──success──▶ Succeeded
//!       │
//!       ├─ Retry   (sleep, same model, attempt+1)
//!       └─ Advance/Abort ──▶ ExhaustedModel(i) ──▶ TryingModel(i+1) | AllExhausted
//! ```
//!
//! All calls are strictly sequential — no concurrent fan-out across models or
//! attempts, so outcomes are observed in the order they were issued. Only the
//! most recent failure is carried into `AllExhausted`: in a fallback chain
//! the last failure is the most diagnostic one. Earlier per-model failures
//! are logged at `warn!` rather than aggregated.

use crate::client::{FinishReason, GenerateReply, GenerateRequest, GenerativeClient};
use crate::pipeline::retry::{AttemptFailure, FailureKind, RetryDecision, RetryPolicy};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Run the fallback chain and return the raw (uncleaned) candidate text.
///
/// On failure, returns the last failure observed, stamped with the model it
/// came from.
pub async fn run_fallback(
    client: &dyn GenerativeClient,
    models: &[String],
    request: &GenerateRequest,
    policy: &RetryPolicy,
) -> Result<String, AttemptFailure> {
    let mut last_failure: Option<AttemptFailure> = None;

    for model in models {
        debug!("Attempting conversion using model: {}", model);

        'attempts: for attempt in 1..=policy.max_attempts {
            let outcome = match client.generate(model, request).await {
                Ok(reply) => evaluate_reply(reply),
                Err(e) => Err(AttemptFailure::from_api_error(&e)),
            };

            let failure = match outcome {
                Ok(text) => return Ok(text),
                Err(f) => f.for_model(model),
            };

            warn!(
                "Attempt {}/{} failed on {}: {}",
                attempt, policy.max_attempts, model, failure.message
            );

            let decision = policy.decide(attempt, &failure);
            last_failure = Some(failure);

            match decision {
                RetryDecision::Retry(wait) => {
                    debug!("Retrying {} after {:?}", model, wait);
                    sleep(wait).await;
                }
                RetryDecision::Advance | RetryDecision::Abort => {
                    warn!("Model {} exhausted, switching to next candidate", model);
                    break 'attempts;
                }
            }
        }
    }

    Err(last_failure
        .unwrap_or_else(|| AttemptFailure::new(FailureKind::Other, "no model candidates supplied")))
}

/// Turn one reply into a success or a classified failure.
///
/// A usable reply needs a non-empty body and a finish reason that is not a
/// policy block. MAX_TOKENS is accepted: a truncated transcription is still
/// better than none, and the caller controls the ceiling.
fn evaluate_reply(reply: GenerateReply) -> Result<String, AttemptFailure> {
    match reply.finish_reason {
        FinishReason::Safety => {
            return Err(AttemptFailure::new(
                FailureKind::ContentBlocked,
                "blocked by safety filter",
            ))
        }
        FinishReason::Recitation => {
            return Err(AttemptFailure::new(
                FailureKind::ContentBlocked,
                "blocked by recitation filter",
            ))
        }
        _ => {}
    }

    match reply.text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AttemptFailure::new(
            FailureKind::EmptyResponse,
            "empty response text",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &str, finish: FinishReason) -> GenerateReply {
        GenerateReply {
            text: Some(text.to_string()),
            finish_reason: finish,
        }
    }

    #[test]
    fn evaluate_accepts_normal_stop() {
        let out = evaluate_reply(reply("<p>ok</p>", FinishReason::Stop));
        assert_eq!(out.unwrap(), "<p>ok</p>");
    }

    #[test]
    fn evaluate_accepts_truncated_output() {
        let out = evaluate_reply(reply("<p>partial", FinishReason::MaxTokens));
        assert!(out.is_ok());
    }

    #[test]
    fn evaluate_rejects_safety_block_even_with_text() {
        let err = evaluate_reply(reply("<p>x</p>", FinishReason::Safety)).unwrap_err();
        assert_eq!(err.kind, FailureKind::ContentBlocked);
    }

    #[test]
    fn evaluate_rejects_recitation() {
        let err = evaluate_reply(reply("x", FinishReason::Recitation)).unwrap_err();
        assert_eq!(err.kind, FailureKind::ContentBlocked);
        assert!(err.message.contains("recitation"));
    }

    #[test]
    fn evaluate_rejects_missing_and_blank_text() {
        let err = evaluate_reply(GenerateReply {
            text: None,
            finish_reason: FinishReason::Stop,
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::EmptyResponse);

        let err = evaluate_reply(reply("   \n", FinishReason::Stop)).unwrap_err();
        assert_eq!(err.kind, FailureKind::EmptyResponse);
    }
}
