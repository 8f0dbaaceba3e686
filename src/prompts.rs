//! System prompts for PDF-to-HTML transcription.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the conversion behaviour (layout
//!    rules, Word-compatibility constraints) requires editing exactly one
//!    place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without
//!    calling a real model.
//!
//! Callers can override the default via
//! [`crate::config::ConversionConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

/// Default system prompt for transcribing a PDF into Word-ready HTML.
///
/// Used when `ConversionConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert Educational Document Digitizer.
Target: Convert the provided PDF exam paper into a high-fidelity HTML document optimized for MS Word.

**CRITICAL INSTRUCTION: PROCESS THE FULL DOCUMENT**
- You MUST convert **EVERY SINGLE PAGE** from the first page to the very last page.
- If the PDF has 20 pages, output the HTML for all 20 pages.
- Do not summarize. Do not skip questions.

**LAYOUT & WORD COMPATIBILITY RULES:**
- **NO Page Borders**: Do not add a border around the <body> or the main container.
- **Question Boxes**: If a question has a box around it, use <table width="100%" border="1" cellspacing="0" cellpadding="5">.
- **Images/Diagrams**: Draw them as inline SVGs. You MUST specify explicit width="X" and height="Y" (e.g., width="300" height="150") for every SVG.
- **Direction**: dir="rtl" for Arabic.

**OUTPUT FORMAT:**
- Return ONLY the raw HTML code inside the <body> tag.
- Do not include ```html markdown blocks.
- Just the content."#;

/// Fixed per-request user instruction sent alongside the document payload.
///
/// The instruction is deliberately short: the system prompt carries all the
/// rules, and the document itself carries all the content.
pub const USER_INSTRUCTION: &str =
    "Digitize this entire PDF to HTML perfectly. Follow system instructions.";
