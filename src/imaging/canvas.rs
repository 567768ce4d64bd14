// Canvas synthesis and reference re-encoding
// Author: kelexine (https://github.com/kelexine)

use crate::models::mapping::AspectRatio;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Longest edge a reference image is allowed to keep before upload.
pub const MAX_REFERENCE_EDGE: u32 = 2048;

/// JPEG quality used when re-encoding references.
pub const JPEG_QUALITY: u8 = 85;

/// Synthesize a blank white PNG canvas for the given aspect ratio.
///
/// Reference-driven models refuse to run without an input image, so a blank
/// canvas stands in when the visitor supplied none.
pub fn blank_canvas(ratio: AspectRatio) -> Result<Vec<u8>, String> {
    let (width, height) = ratio.canvas_size();
    let canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| format!("failed to encode canvas: {}", e))?;

    Ok(buffer.into_inner())
}

/// Normalize a visitor-supplied reference for upload: decode whatever format
/// the browser sent, drop alpha, bound the longest edge to 2048 px and
/// re-encode as JPEG.
pub fn prepare_reference_jpeg(raw: &[u8]) -> Result<Vec<u8>, String> {
    let decoded =
        image::load_from_memory(raw).map_err(|e| format!("failed to decode image: {}", e))?;

    let bounded = if decoded.width() > MAX_REFERENCE_EDGE || decoded.height() > MAX_REFERENCE_EDGE {
        decoded.thumbnail(MAX_REFERENCE_EDGE, MAX_REFERENCE_EDGE)
    } else {
        decoded
    };

    let rgb = bounded.to_rgb8();
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| format!("failed to encode JPEG: {}", e))?;

    Ok(buffer)
}
