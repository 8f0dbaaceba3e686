//! Post-processing: deterministic cleanup of model-generated markup.
//!
//! Even well-prompted models occasionally wrap their output in
//! ` ```html ... ``` ` fences despite the prompt saying not to, or leave
//! stray whitespace around the document. These rules are cheap string
//! passes that fix model quirks without touching content; keeping them here
//! means the prompt stays focused on what to extract.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a fence marker with an optional language tag, e.g. "```html".
static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z]*").unwrap());

/// Clean the raw model output into the final markup string.
///
/// Rules (applied in order):
/// 1. Remove every fenced code-block marker, wherever it appears
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim leading/trailing whitespace
pub fn clean_markup(raw: &str) -> String {
    let s = RE_FENCE.replace_all(raw, "");
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    s.trim().to_string()
}
