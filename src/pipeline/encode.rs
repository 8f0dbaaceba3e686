//! Payload encoding: raw PDF bytes → base64 inline data.
//!
//! The remote API accepts documents as base64 inline data tagged with an
//! explicit media type. The declared type coming from callers is unreliable —
//! some client environments report a generic `application/octet-stream` for
//! PDFs, which the API rejects — so the type is forced to the canonical
//! `application/pdf` regardless of what was declared. This is a deliberate
//! override, not a bug.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Canonical media type for the only document format this crate transports.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A transport-safe encoded payload: base64 content plus its media-type tag.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    /// Base64 (standard alphabet, padded) document content.
    pub data: String,
    /// Always [`PDF_MEDIA_TYPE`]; kept as a field so the wire layer never
    /// needs to know where the value came from.
    pub media_type: &'static str,
}

/// Encode raw bytes into the representation the remote API accepts.
///
/// `declared` is the caller-reported media type; it is logged when it
/// disagrees with the canonical one, then ignored.
pub fn encode_payload(bytes: &[u8], declared: &str) -> EncodedPayload {
    let declared = declared.trim();
    if !declared.eq_ignore_ascii_case(PDF_MEDIA_TYPE) {
        debug!(
            "Declared media type {:?} overridden with {:?}",
            declared, PDF_MEDIA_TYPE
        );
    }

    EncodedPayload {
        data: STANDARD.encode(bytes),
        media_type: PDF_MEDIA_TYPE,
    }
}
