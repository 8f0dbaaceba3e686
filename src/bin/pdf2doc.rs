//! CLI binary for pdf2doc.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, runs the conversion, and writes either raw HTML or a
//! Word-compatible `.doc` document.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2doc::{convert_file, export, ConversionConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a PDF and write a Word-compatible document
  pdf2doc exam.pdf -o exam.doc

  # Print the cleaned HTML body to stdout instead
  pdf2doc exam.pdf --raw-html

  # Use only the flash model, allow three attempts per model
  pdf2doc --model gemini-3-flash-preview --max-attempts 3 exam.pdf -o exam.doc

  # Custom fallback chain (order is priority)
  pdf2doc --model gemini-3-pro-preview --model gemini-3-flash-preview exam.pdf

MODEL FALLBACK:
  Models are tried strictly in order; each gets up to --max-attempts tries.
  Quota (429) and overload (503) failures retry with a linear backoff, while
  an unknown model or a content policy block ends that model's attempts
  immediately and moves to the next candidate.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY    API key (preferred)
  GOOGLE_API_KEY    API key (fallback)

SETUP:
  1. Set API key:   export GEMINI_API_KEY=...
  2. Convert:       pdf2doc exam.pdf -o exam.doc
"#;

/// Convert PDF documents to Word-ready HTML using a generative vision model.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2doc",
    version,
    about = "Convert PDF documents to Word-ready HTML using a generative vision model",
    long_about = "Convert a PDF document to a Word-compatible HTML document by sending the \
whole file inline to a multimodal model. Layout, tables, and right-to-left text are \
preserved; the output opens directly in Microsoft Word.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write a Word-compatible document to this file instead of stdout.
    #[arg(short, long, env = "PDF2DOC_OUTPUT")]
    output: Option<PathBuf>,

    /// Model ID; repeat the flag to define a fallback chain (order is priority).
    #[arg(
        long,
        env = "PDF2DOC_MODEL",
        long_help = "Model to use. Repeat to build a fallback chain, e.g.\n\
          --model gemini-3-pro-preview --model gemini-3-flash-preview\n\
          Default chain: gemini-3-pro-preview, then gemini-3-flash-preview."
    )]
    model: Vec<String>,

    /// API key override (otherwise GEMINI_API_KEY / GOOGLE_API_KEY).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Attempts per model before advancing to the next candidate.
    #[arg(long, env = "PDF2DOC_MAX_ATTEMPTS", default_value_t = 2,
          value_parser = clap::value_parser!(u32).range(1..=10))]
    max_attempts: u32,

    /// Sampling temperature (0.0-2.0).
    #[arg(long, env = "PDF2DOC_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max model output tokens per request.
    #[arg(long, env = "PDF2DOC_MAX_TOKENS")]
    max_tokens: Option<u32>,

    /// Per-attempt API timeout in seconds.
    #[arg(long, env = "PDF2DOC_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2DOC_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Keep the model's content-safety filters enabled.
    #[arg(long, env = "PDF2DOC_KEEP_SAFETY_FILTERS")]
    keep_safety_filters: bool,

    /// Print the cleaned HTML body without the Word document shell.
    #[arg(long, env = "PDF2DOC_RAW_HTML")]
    raw_html: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DOC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2DOC_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).await?;

    // ── Run conversion ───────────────────────────────────────────────────
    let start = std::time::Instant::now();
    let markup = convert_file(&cli.input, &config)
        .await
        .context("Conversion failed")?;

    let title = cli
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    if let Some(ref output_path) = cli.output {
        if cli.raw_html {
            tokio::fs::write(output_path, &markup)
                .await
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
        } else {
            export::export_to_file(output_path, &title, &markup)
                .await
                .context("Failed to write Word document")?;
        }

        if !cli.quiet {
            eprintln!(
                "{}  {} chars  {}ms  →  {}",
                green("✔"),
                markup.len(),
                start.elapsed().as_millis(),
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let body = if cli.raw_html {
            markup.clone()
        } else {
            export::wrap_word_document(&title, &markup)
        };

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(body.as_bytes())
            .context("Failed to write to stdout")?;
        if !body.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }

        if !cli.quiet {
            eprintln!(
                "   {}",
                dim(&format!(
                    "{} chars in {}ms",
                    markup.len(),
                    start.elapsed().as_millis()
                ))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ConversionConfig::builder()
        .max_attempts(cli.max_attempts)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .disable_safety_filters(!cli.keep_safety_filters);

    if !cli.model.is_empty() {
        builder = builder.models(cli.model.clone());
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(tokens) = cli.max_tokens {
        builder = builder.max_output_tokens(tokens);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
