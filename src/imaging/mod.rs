//! Image plumbing: data-URL handling and MIME sniffing.
//!
//! The browser client moves images around as `data:` URLs; the vendor wants
//! raw base64. This module converts between the two and sanity-checks what
//! visitors upload.

// Author: kelexine (https://github.com/kelexine)

pub mod canvas;

pub use canvas::{blank_canvas, prepare_reference_jpeg};

use base64::Engine;

/// Post-encode size cap the vendor enforces on uploads.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Split a `data:<mime>;base64,<payload>` URL into its MIME type and raw
/// bytes. The MIME type falls back to magic-byte sniffing when the header
/// does not carry one.
pub fn parse_data_url(data_url: &str) -> Result<(String, Vec<u8>), String> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| "missing data URL separator".to_string())?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 payload: {}", e))?;

    let mime = header
        .strip_prefix("data:")
        .and_then(|h| h.strip_suffix(";base64"))
        .filter(|m| !m.is_empty())
        .map(|m| m.to_string())
        .or_else(|| detect_mime_type(&bytes))
        .ok_or_else(|| "could not determine image format".to_string())?;

    Ok((mime, bytes))
}

/// Format raw bytes as a `data:` URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Detect MIME type from magic bytes at the start of image data
pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() < 12 {
        return None;
    }

    if data.starts_with(b"\xFF\xD8\xFF") {
        Some("image/jpeg".to_string())
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png".to_string())
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif".to_string())
    } else if data.starts_with(b"RIFF") && data[8..12] == *b"WEBP" {
        Some("image/webp".to_string())
    } else {
        None
    }
}
