//! # pdf2doc
//!
//! Convert PDF documents to Word-ready HTML using a generative vision model.
//!
//! ## Why this crate?
//!
//! Classic PDF extractors (pdftotext, pdf-extract) destroy exactly what
//! document digitisation needs to keep: tables, multi-column layouts,
//! right-to-left text, and mathematical notation. Instead this crate sends
//! the whole PDF inline to a multimodal model and asks for a faithful HTML
//! transcription, then wraps it in a Word-compatible document shell.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Validate   size ceiling + credential, before any network I/O
//!  ├─ 2. Encode     bytes → base64 inline payload (application/pdf)
//!  ├─ 3. Sequence   ordered model fallback with per-model retry/backoff
//!  ├─ 4. Clean      strip code fences, normalise line endings, trim
//!  └─ 5. Export     optional Word (.doc) HTML shell, RTL, A4, 2cm margins
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2doc::{convert_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from GEMINI_API_KEY / GOOGLE_API_KEY
//!     let config = ConversionConfig::default();
//!     let markup = convert_file("exam.pdf", &config).await?;
//!     let doc = pdf2doc::wrap_word_document("exam", &markup);
//!     std::fs::write("exam.doc", doc)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2doc` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2doc = { version = "0.3", default-features = false }
//! ```
//!
//! ## Model Fallback
//!
//! The default chain tries `gemini-3-pro-preview` first and falls back to
//! `gemini-3-flash-preview`. Each model gets up to two attempts; quota and
//! overload failures back off linearly, while a missing model or a
//! content-policy block ends that model's attempts immediately and moves to
//! the next candidate.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{
    ApiError, FinishReason, GeminiClient, GenerateReply, GenerateRequest, GenerativeClient,
};
pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_MAX_FILE_BYTES, DEFAULT_MODELS};
pub use convert::{convert, convert_file, convert_sync};
pub use error::Pdf2DocError;
pub use export::{export_to_file, wrap_word_document};
