//! Upstream ImageFX wire types.
//!
//! These payload shapes are reverse-engineered from browser traffic rather
//! than documented, so every inbound struct tolerates missing fields.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};

/// `clientContext` envelope sent on every vendor call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Body of the `uploadUserImage` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    pub image_input: ImageInput,
    pub client_context: ClientContext,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    /// Base64 of the JPEG bytes, without a data-URL prefix.
    pub raw_image_bytes: String,
    pub mime_type: String,
    pub is_user_uploaded: bool,
}

/// Successful `uploadUserImage` response. The id is nested one level deeper
/// than one would expect; that is how the wire actually looks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub media_generation_id: MediaGenerationId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaGenerationId {
    pub media_generation_id: String,
}

/// Body of the `runImageFx` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagesRequest {
    pub client_context: ClientContext,
    pub user_input: UserInput,
    pub aspect_ratio: String,
    pub model_input: ModelInput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub candidates_count: u32,
    pub prompts: Vec<String>,
    pub seed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image_input: Option<ReferenceImageInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImageInput {
    pub reference_images: Vec<ReferenceImage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub media_id: String,
    pub image_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInput {
    pub model_name_type: String,
}

/// Successful `runImageFx` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateImagesResponse {
    pub image_panels: Vec<ImagePanel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePanel {
    pub generated_images: Vec<GeneratedImage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedImage {
    /// Base64 PNG bytes; occasionally absent for individual candidates.
    pub encoded_image: Option<String>,
}

/// Vendor error envelope; the moderation reason hides in `details[0].reason`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub details: Vec<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_request_wire_format() {
        let request = UploadImageRequest {
            image_input: ImageInput {
                raw_image_bytes: "QUJD".to_string(),
                mime_type: "image/jpeg".to_string(),
                is_user_uploaded: true,
            },
            client_context: ClientContext {
                tool: "ASSET_MANAGER".to_string(),
                project_id: None,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["imageInput"]["rawImageBytes"], "QUJD");
        assert_eq!(json["imageInput"]["mimeType"], "image/jpeg");
        assert_eq!(json["imageInput"]["isUserUploaded"], true);
        assert_eq!(json["clientContext"]["tool"], "ASSET_MANAGER");
        assert!(json["clientContext"].get("projectId").is_none());
    }

    #[test]
    fn test_generate_request_wire_format() {
        let request = GenerateImagesRequest {
            client_context: ClientContext {
                tool: "PINHOLE".to_string(),
                project_id: Some("cc8e7fa2".to_string()),
            },
            user_input: UserInput {
                candidates_count: 4,
                prompts: vec!["a cat".to_string()],
                seed: 77,
                reference_image_input: Some(ReferenceImageInput {
                    reference_images: vec![ReferenceImage {
                        media_id: "media-1".to_string(),
                        image_type: "REFERENCE_IMAGE_TYPE_CONTEXT".to_string(),
                    }],
                }),
            },
            aspect_ratio: "IMAGE_ASPECT_RATIO_SQUARE".to_string(),
            model_input: ModelInput {
                model_name_type: "GEM_PIX".to_string(),
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userInput"]["candidatesCount"], 4);
        assert_eq!(json["userInput"]["seed"], 77);
        assert_eq!(
            json["userInput"]["referenceImageInput"]["referenceImages"][0]["mediaId"],
            "media-1"
        );
        assert_eq!(json["aspectRatio"], "IMAGE_ASPECT_RATIO_SQUARE");
        assert_eq!(json["modelInput"]["modelNameType"], "GEM_PIX");
    }

    #[test]
    fn test_upload_response_nested_id() {
        let response: UploadImageResponse = serde_json::from_str(
            r#"{"mediaGenerationId": {"mediaGenerationId": "CAMa-abc123"}}"#,
        )
        .unwrap();
        assert_eq!(response.media_generation_id.media_generation_id, "CAMa-abc123");
    }

    #[test]
    fn test_generate_response_tolerates_missing_fields() {
        let response: GenerateImagesResponse = serde_json::from_str("{}").unwrap();
        assert!(response.image_panels.is_empty());

        let response: GenerateImagesResponse = serde_json::from_str(
            r#"{"imagePanels": [{"generatedImages": [{}, {"encodedImage": "QUJD"}]}]}"#,
        )
        .unwrap();
        let images = &response.image_panels[0].generated_images;
        assert!(images[0].encoded_image.is_none());
        assert_eq!(images[1].encoded_image.as_deref(), Some("QUJD"));
    }

    #[test]
    fn test_error_envelope_reason() {
        let envelope: ErrorEnvelope = serde_json::from_str(
            r#"{"error": {"code": 400, "details": [{"reason": "PUBLIC_ERROR_MINORS"}]}}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.error.details[0].reason.as_deref(),
            Some("PUBLIC_ERROR_MINORS")
        );
    }
}
