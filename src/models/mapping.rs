// Model catalog and aspect-ratio mapping (display names → vendor wire names)
// Author: kelexine (https://github.com/kelexine)

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// The generation models the vendor exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Text-to-image, Imagen 3.1.
    Imagen31,
    /// Text-to-image "Ultra", Imagen 3.5.
    Imagen35,
    /// Reference-to-image: reworks one or more uploaded images.
    ReferenceToImage,
    /// "Magic edit" pixel model; synthesizes a blank canvas when invoked
    /// without references.
    GemPix,
}

impl ModelKind {
    /// Vendor wire name for `modelInput.modelNameType`.
    pub fn api_name(&self) -> &'static str {
        match self {
            ModelKind::Imagen31 => "IMAGEN_3_1",
            ModelKind::Imagen35 => "IMAGEN_3_5",
            ModelKind::ReferenceToImage => "R2I",
            ModelKind::GemPix => "GEM_PIX",
        }
    }

    /// Whether the model is driven by reference images.
    pub fn requires_reference(&self) -> bool {
        matches!(self, ModelKind::ReferenceToImage | ModelKind::GemPix)
    }
}

/// Display-name catalog in tab order. The names are what the browser client
/// shows and sends back in `model_name_display`.
pub const MODEL_CATALOG: [(&str, ModelKind); 4] = [
    ("Texto a Imagen (v3.1)", ModelKind::Imagen31),
    ("Texto a Imagen Ultra (v3.5)", ModelKind::Imagen35),
    ("Imagen desde Referencia (V3.5)", ModelKind::ReferenceToImage),
    ("Edición Mágica (Nano)", ModelKind::GemPix),
];

/// Lazily initialized display-name lookup (zero-cost, panic-free)
static MODEL_MAP: OnceLock<HashMap<&'static str, ModelKind>> = OnceLock::new();

fn get_model_map() -> &'static HashMap<&'static str, ModelKind> {
    MODEL_MAP.get_or_init(|| MODEL_CATALOG.iter().copied().collect())
}

/// Map a display name from the client to its model kind.
pub fn map_model(display_name: &str) -> Result<ModelKind> {
    get_model_map().get(display_name).copied().ok_or_else(|| {
        StudioError::InvalidRequest(format!("Modelo desconocido: '{}'.", display_name))
    })
}

/// The default tab a fresh visitor session starts on.
pub fn default_tab() -> &'static str {
    MODEL_CATALOG[0].0
}

/// Aspect ratios the vendor supports, with their client strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    LandscapeFourThree,
    #[serde(rename = "3:4")]
    PortraitThreeFour,
}

impl AspectRatio {
    /// Stable order backing the session's `aspect_ratio_index`.
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::LandscapeFourThree,
        AspectRatio::PortraitThreeFour,
    ];

    /// Vendor wire name for the `aspectRatio` field.
    pub fn api_name(&self) -> &'static str {
        match self {
            AspectRatio::Square => "IMAGE_ASPECT_RATIO_SQUARE",
            AspectRatio::Landscape => "IMAGE_ASPECT_RATIO_LANDSCAPE",
            AspectRatio::Portrait => "IMAGE_ASPECT_RATIO_PORTRAIT",
            AspectRatio::LandscapeFourThree => "IMAGE_ASPECT_RATIO_LANDSCAPE_FOUR_THREE",
            AspectRatio::PortraitThreeFour => "IMAGE_ASPECT_RATIO_PORTRAIT_THREE_FOUR",
        }
    }

    /// Client string (`1:1`, `16:9`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::LandscapeFourThree => "4:3",
            AspectRatio::PortraitThreeFour => "3:4",
        }
    }

    /// Pixel dimensions used when synthesizing a blank canvas.
    pub fn canvas_size(&self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (512, 512),
            AspectRatio::Landscape => (1024, 576),
            AspectRatio::Portrait => (576, 1024),
            AspectRatio::LandscapeFourThree => (768, 576),
            AspectRatio::PortraitThreeFour => (576, 768),
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Square
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_mapping() {
        assert_eq!(map_model("Texto a Imagen (v3.1)").unwrap(), ModelKind::Imagen31);
        assert_eq!(
            map_model("Imagen desde Referencia (V3.5)").unwrap(),
            ModelKind::ReferenceToImage
        );
        assert_eq!(map_model("Edición Mágica (Nano)").unwrap(), ModelKind::GemPix);
        assert!(map_model("unknown tab").is_err());
    }

    #[test]
    fn test_reference_driven_models() {
        assert!(!ModelKind::Imagen31.requires_reference());
        assert!(!ModelKind::Imagen35.requires_reference());
        assert!(ModelKind::ReferenceToImage.requires_reference());
        assert!(ModelKind::GemPix.requires_reference());
    }

    #[test]
    fn test_default_tab_is_first_catalog_entry() {
        assert_eq!(default_tab(), "Texto a Imagen (v3.1)");
    }

    #[test]
    fn test_aspect_ratio_wire_names() {
        assert_eq!(AspectRatio::Square.api_name(), "IMAGE_ASPECT_RATIO_SQUARE");
        assert_eq!(
            AspectRatio::PortraitThreeFour.api_name(),
            "IMAGE_ASPECT_RATIO_PORTRAIT_THREE_FOUR"
        );
    }

    #[test]
    fn test_aspect_ratio_serde_round_trip() {
        for ratio in AspectRatio::ALL {
            let json = serde_json::to_string(&ratio).unwrap();
            assert_eq!(json, format!("\"{}\"", ratio.as_str()));
            let back: AspectRatio = serde_json::from_str(&json).unwrap();
            assert_eq!(back, ratio);
        }
    }

    #[test]
    fn test_canvas_sizes_match_orientation() {
        let (w, h) = AspectRatio::Landscape.canvas_size();
        assert!(w > h);
        let (w, h) = AspectRatio::Portrait.canvas_size();
        assert!(w < h);
        assert_eq!(AspectRatio::Square.canvas_size(), (512, 512));
    }
}
