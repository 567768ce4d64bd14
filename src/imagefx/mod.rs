//! Upstream ImageFX client module.
//!
//! The vendor API is undocumented; endpoints are kept base64-obfuscated in
//! configuration and only decoded here. Requests carry a browser bearer
//! session plus a tool/project routing context that depends on the model.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod client;
pub mod reasons;

pub use client::ImageFxClient;

use crate::models::mapping::{AspectRatio, ModelKind};
use base64::Engine;

/// Project id used for plain text-to-image generation.
const STOCK_PROJECT_ID: &str = "3bbf5eba-be3f-4022-b9a0-158b93131757";

/// Project id used whenever reference images are in play.
const PINHOLE_PROJECT_ID: &str = "cc8e7fa2-9e2b-4742-ad19-41d3732460db";

/// Wire name for the reference image role.
pub const REFERENCE_IMAGE_TYPE: &str = "REFERENCE_IMAGE_TYPE_CONTEXT";

/// Everything a single generation run needs.
#[derive(Debug, Clone)]
pub struct GenerationSpec {
    /// Prompt, already translated to English.
    pub prompt: String,
    pub num_images: u32,
    /// `-1` resolves to a random seed.
    pub seed: i64,
    pub aspect_ratio: AspectRatio,
    pub model: ModelKind,
    /// Reference images as `data:` URLs.
    pub reference_images: Vec<String>,
}

/// Decode one of the obfuscated endpoint strings into a usable URL.
pub fn decode_endpoint(obfuscated: &str) -> Result<String, String> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(obfuscated.trim())
        .map_err(|e| format!("endpoint is not valid base64: {}", e))?;
    let url = String::from_utf8(decoded).map_err(|_| "endpoint is not UTF-8".to_string())?;
    if !url.starts_with("http") {
        return Err("endpoint does not look like an HTTP(S) URL".to_string());
    }
    Ok(url)
}

/// Pick the tool/project routing context for a generation call. Imagen
/// text-to-image runs under the stock tool; anything touching reference
/// images goes through PINHOLE.
pub fn tool_context(model: ModelKind, has_references: bool) -> (&'static str, &'static str) {
    match model {
        ModelKind::Imagen31 | ModelKind::Imagen35 if !has_references => {
            ("VIDEO_FX", STOCK_PROJECT_ID)
        }
        _ => ("PINHOLE", PINHOLE_PROJECT_ID),
    }
}
