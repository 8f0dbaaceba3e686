//! Conversion pipeline stages, leaves first:
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. encode       bytes → base64 payload, canonical media type
//!  ├─ 2. retry        pure (attempt, failure) → Retry | Advance | Abort
//!  ├─ 3. sequencer    ordered model fallback, strictly sequential
//!  └─ 4. postprocess  strip fences, trim → final markup
//! ```
//!
//! The orchestration that wires these together lives in [`crate::convert`].

pub mod encode;
pub mod postprocess;
pub mod retry;
pub mod sequencer;
