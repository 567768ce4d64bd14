// ImageFX API client: reference upload and image generation
// Author: kelexine (https://github.com/kelexine)

use super::reasons::{from_generation_reason, from_upload_reason, ApiFailure};
use super::{decode_endpoint, tool_context, GenerationSpec, REFERENCE_IMAGE_TYPE};
use crate::auth::{BearerSession, TokenManager};
use crate::config::ImageFxConfig;
use crate::error::{Result, StudioError};
use crate::imaging::{self, blank_canvas, prepare_reference_jpeg, to_data_url, MAX_UPLOAD_BYTES};
use crate::models::imagefx::{
    ClientContext, ErrorEnvelope, GenerateImagesRequest, GenerateImagesResponse, ImageInput,
    ModelInput, ReferenceImage, ReferenceImageInput, UploadImageRequest, UploadImageResponse,
    UserInput,
};
use base64::Engine;
use rand::Rng;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Client for the upstream ImageFX API.
///
/// Holds the decoded endpoints and a pooled HTTP client. Uploads are retried
/// on transient statuses; generation calls surface errors immediately so the
/// browser client can decide what to do.
pub struct ImageFxClient {
    http: Client,
    config: ImageFxConfig,
    generate_url: String,
    upload_url: String,
    tokens: TokenManager,
}

impl ImageFxClient {
    /// Create a new client, decoding the obfuscated endpoints.
    pub fn new(config: &ImageFxConfig, tokens: TokenManager) -> Result<Self> {
        let generate_url = decode_endpoint(&config.generate_url_obfuscated)
            .map_err(|e| StudioError::Config(format!("generate endpoint: {}", e)))?;
        let upload_url = decode_endpoint(&config.upload_url_obfuscated)
            .map_err(|e| StudioError::Config(format!("upload endpoint: {}", e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.generate_timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| StudioError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client with connection pooling and keep-alive");

        Ok(Self {
            http,
            config: config.clone(),
            generate_url,
            upload_url,
            tokens,
        })
    }

    /// Build a POST carrying the bearer-session headers the vendor expects.
    fn vendor_post(&self, url: &str, session: &BearerSession) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .header("Authorization", format!("Bearer {}", session.bearer_token))
            .header("X-Client-Data", session.client_data.clone())
            .header("X-Browser-Year", self.config.browser_year.clone())
            .header("User-Agent", self.config.user_agent.clone())
    }

    fn resolve_seed(seed: i64) -> u32 {
        if seed < 0 {
            rand::thread_rng().gen_range(0..=99_999)
        } else {
            seed.min(u32::MAX as i64) as u32
        }
    }

    /// Pull the moderation reason out of an error body. `None` means the body
    /// was not JSON at all; a JSON body without a reason yields the vendor's
    /// `UNKNOWN_ERROR` placeholder.
    fn extract_reason(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorEnvelope>(body).ok().map(|envelope| {
            envelope
                .error
                .details
                .into_iter()
                .next()
                .and_then(|detail| detail.reason)
                .unwrap_or_else(|| "UNKNOWN_ERROR".to_string())
        })
    }

    /// Upload one re-encoded reference JPEG, returning its media id.
    pub async fn upload_reference(
        &self,
        session: &BearerSession,
        jpeg: Vec<u8>,
    ) -> std::result::Result<String, ApiFailure> {
        if jpeg.is_empty() {
            return Err(ApiFailure::NoImageProvided);
        }
        if jpeg.len() > MAX_UPLOAD_BYTES {
            return Err(ApiFailure::ImageTooLarge);
        }

        let payload = UploadImageRequest {
            image_input: ImageInput {
                raw_image_bytes: base64::engine::general_purpose::STANDARD.encode(&jpeg),
                mime_type: "image/jpeg".to_string(),
                is_user_uploaded: true,
            },
            client_context: ClientContext {
                tool: "ASSET_MANAGER".to_string(),
                project_id: None,
            },
        };

        let timeout = Duration::from_secs(self.config.upload_timeout_seconds);
        let started = Instant::now();

        let outcome = crate::utils::retry::retry_request("Reference Upload", || async {
            let response = self
                .vendor_post(&self.upload_url, session)
                .json(&payload)
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| (500u16, format!("HTTP error: {}", e)))?;

            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err((status.as_u16(), body));
            }

            serde_json::from_str::<UploadImageResponse>(&body)
                .map(|parsed| parsed.media_generation_id.media_generation_id)
                .map_err(|e| (0u16, format!("unexpected upload response: {}", e)))
        })
        .await;

        let status_label = match &outcome {
            Ok(_) => 200,
            Err((status, _)) => *status,
        };
        crate::metrics::record_imagefx_call("upload", status_label, started.elapsed().as_secs_f64());

        outcome.map_err(|(status, body)| {
            if status == 0 {
                error!("Upload returned 200 with an unusable body: {}", body);
                return ApiFailure::GenericUpload;
            }
            if let Some(reason) = Self::extract_reason(&body) {
                debug!("Upload rejected: {}", reason);
                return from_upload_reason(&reason);
            }
            if body.starts_with("HTTP error:") {
                return ApiFailure::Connection(body);
            }
            error!(
                "Upload response not JSON: {}",
                body.chars().take(200).collect::<String>()
            );
            ApiFailure::GenericUpload
        })
    }

    /// Run a full generation: upload references (or a synthesized canvas for
    /// reference-driven models), call the vendor, decode candidates into
    /// `data:` URLs.
    pub async fn run(&self, spec: GenerationSpec) -> std::result::Result<Vec<String>, ApiFailure> {
        let session = self.tokens.session().map_err(ApiFailure::Auth)?;

        let mut references = spec.reference_images.clone();
        if spec.model.requires_reference() && references.is_empty() {
            info!(
                "{} selected without reference images; synthesizing blank canvas",
                spec.model.api_name()
            );
            let canvas = blank_canvas(spec.aspect_ratio).map_err(|e| {
                error!("Canvas synthesis failed: {}", e);
                ApiFailure::InternalConfig
            })?;
            references.push(to_data_url("image/png", &canvas));
        }

        let (tool, project_id) = tool_context(spec.model, !references.is_empty());
        let seed = Self::resolve_seed(spec.seed);

        debug!(
            model = spec.model.api_name(),
            tool,
            aspect_ratio = spec.aspect_ratio.api_name(),
            num_images = spec.num_images,
            seed,
            references = references.len(),
            "Dispatching generation request"
        );

        let mut user_input = UserInput {
            candidates_count: spec.num_images,
            prompts: vec![spec.prompt.trim().to_string()],
            seed,
            reference_image_input: None,
        };

        if !references.is_empty() {
            let mut media_ids = Vec::with_capacity(references.len());
            for (index, data_url) in references.iter().enumerate() {
                let (_, raw) = imaging::parse_data_url(data_url).map_err(|e| {
                    warn!("Reference {} is not a usable data URL: {}", index, e);
                    ApiFailure::GenericUpload
                })?;
                let jpeg = prepare_reference_jpeg(&raw).map_err(|e| {
                    warn!("Reference {} could not be re-encoded: {}", index, e);
                    ApiFailure::GenericUpload
                })?;
                let media_id = self.upload_reference(&session, jpeg).await?;
                media_ids.push(media_id);
            }
            if media_ids.is_empty() {
                return Err(ApiFailure::NoMediaIds);
            }
            user_input.reference_image_input = Some(ReferenceImageInput {
                reference_images: media_ids
                    .into_iter()
                    .map(|media_id| ReferenceImage {
                        media_id,
                        image_type: REFERENCE_IMAGE_TYPE.to_string(),
                    })
                    .collect(),
            });
        }

        let payload = GenerateImagesRequest {
            client_context: ClientContext {
                tool: tool.to_string(),
                project_id: Some(project_id.to_string()),
            },
            user_input,
            aspect_ratio: spec.aspect_ratio.api_name().to_string(),
            model_input: ModelInput {
                model_name_type: spec.model.api_name().to_string(),
            },
        };

        // Errors surface immediately here; only uploads get retried.
        let started = Instant::now();
        let response = self
            .vendor_post(&self.generate_url, &session)
            .json(&payload)
            .timeout(Duration::from_secs(self.config.generate_timeout_seconds))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiFailure::Timeout
                } else {
                    ApiFailure::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiFailure::Connection(e.to_string()))?;
        crate::metrics::record_imagefx_call(
            "generate",
            status.as_u16(),
            started.elapsed().as_secs_f64(),
        );

        debug!("Generation response: HTTP {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return match Self::extract_reason(&body) {
                Some(reason) => {
                    debug!("Generation rejected: {}", reason);
                    Err(from_generation_reason(&reason))
                }
                None => {
                    error!(
                        "Could not decode generation error response: {}",
                        body.chars().take(500).collect::<String>()
                    );
                    Err(ApiFailure::NonJsonError)
                }
            };
        }

        let parsed: GenerateImagesResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Generation returned 200 but body is not valid JSON: {}", e);
            ApiFailure::InvalidJson
        })?;

        let generated = parsed
            .image_panels
            .into_iter()
            .next()
            .map(|panel| panel.generated_images)
            .unwrap_or_default();
        if generated.is_empty() {
            return Err(ApiFailure::NoImagesReturned);
        }

        let mut images = Vec::with_capacity(generated.len());
        for (index, candidate) in generated.iter().enumerate() {
            match candidate.encoded_image.as_deref() {
                Some(encoded) => match base64::engine::general_purpose::STANDARD.decode(encoded) {
                    Ok(bytes) => images.push(to_data_url("image/png", &bytes)),
                    Err(e) => warn!("Skipping candidate {} with undecodable image data: {}", index, e),
                },
                None => debug!("Candidate {} carried no encodedImage", index),
            }
        }

        if images.is_empty() {
            return Err(ApiFailure::NoImagesReturned);
        }

        crate::metrics::record_images_generated(images.len());
        info!("Generated {} image(s)", images.len());
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::models::mapping::{AspectRatio, ModelKind};

    fn encode(raw: impl AsRef<[u8]>) -> String {
        base64::engine::general_purpose::STANDARD.encode(raw)
    }

    fn test_tokens() -> TokenManager {
        TokenManager::new(&AuthConfig {
            session_token: Some(encode("ya29.test-bearer:client-data")),
        })
    }

    fn test_client(server_url: &str, tokens: TokenManager) -> ImageFxClient {
        let config = ImageFxConfig {
            generate_url_obfuscated: encode(format!("{}/v1:runImageFx", server_url)),
            upload_url_obfuscated: encode(format!("{}/v1:uploadUserImage", server_url)),
            ..Default::default()
        };
        ImageFxClient::new(&config, tokens).unwrap()
    }

    fn spec(model: ModelKind, references: Vec<String>) -> GenerationSpec {
        GenerationSpec {
            prompt: "a cat wearing a hat".to_string(),
            num_images: 2,
            seed: 7,
            aspect_ratio: AspectRatio::Square,
            model,
            reference_images: references,
        }
    }

    #[test]
    fn test_resolve_seed() {
        assert_eq!(ImageFxClient::resolve_seed(42), 42);
        let random = ImageFxClient::resolve_seed(-1);
        assert!(random <= 99_999);
    }

    #[test]
    fn test_extract_reason() {
        let body = r#"{"error": {"details": [{"reason": "PUBLIC_ERROR_SEXUAL"}]}}"#;
        assert_eq!(
            ImageFxClient::extract_reason(body).as_deref(),
            Some("PUBLIC_ERROR_SEXUAL")
        );

        let no_reason = r#"{"error": {"message": "bad"}}"#;
        assert_eq!(
            ImageFxClient::extract_reason(no_reason).as_deref(),
            Some("UNKNOWN_ERROR")
        );

        assert!(ImageFxClient::extract_reason("<html>nope</html>").is_none());
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1:runImageFx")
            .match_header("authorization", "Bearer ya29.test-bearer")
            .match_header("x-client-data", "client-data")
            .with_status(200)
            .with_body(format!(
                r#"{{"imagePanels": [{{"generatedImages": [{{"encodedImage": "{}"}}]}}]}}"#,
                encode(b"fake png bytes")
            ))
            .create_async()
            .await;

        let client = test_client(&server.url(), test_tokens());
        let images = client.run(spec(ModelKind::Imagen31, vec![])).await.unwrap();

        assert_eq!(images.len(), 1);
        assert!(images[0].starts_with("data:image/png;base64,"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_moderation_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1:runImageFx")
            .with_status(400)
            .with_body(r#"{"error": {"details": [{"reason": "PUBLIC_ERROR_MINORS"}]}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), test_tokens());
        let failure = client
            .run(spec(ModelKind::Imagen31, vec![]))
            .await
            .unwrap_err();
        assert_eq!(failure, ApiFailure::Minors);
    }

    #[tokio::test]
    async fn test_generate_empty_panels_is_no_images() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1:runImageFx")
            .with_status(200)
            .with_body(r#"{"imagePanels": []}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), test_tokens());
        let failure = client
            .run(spec(ModelKind::Imagen31, vec![]))
            .await
            .unwrap_err();
        assert_eq!(failure, ApiFailure::NoImagesReturned);
    }

    #[tokio::test]
    async fn test_generate_non_json_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1:runImageFx")
            .with_status(400)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let client = test_client(&server.url(), test_tokens());
        let failure = client
            .run(spec(ModelKind::Imagen31, vec![]))
            .await
            .unwrap_err();
        assert_eq!(failure, ApiFailure::NonJsonError);
    }

    #[tokio::test]
    async fn test_gem_pix_without_references_uploads_canvas() {
        let mut server = mockito::Server::new_async().await;
        let upload_mock = server
            .mock("POST", "/v1:uploadUserImage")
            .with_status(200)
            .with_body(r#"{"mediaGenerationId": {"mediaGenerationId": "media-42"}}"#)
            .create_async()
            .await;
        let generate_mock = server
            .mock("POST", "/v1:runImageFx")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"userInput": {"referenceImageInput": {"referenceImages": [{"mediaId": "media-42"}]}}}"#.to_string(),
            ))
            .with_status(200)
            .with_body(format!(
                r#"{{"imagePanels": [{{"generatedImages": [{{"encodedImage": "{}"}}]}}]}}"#,
                encode(b"edited bytes")
            ))
            .create_async()
            .await;

        let client = test_client(&server.url(), test_tokens());
        let images = client.run(spec(ModelKind::GemPix, vec![])).await.unwrap();

        assert_eq!(images.len(), 1);
        upload_mock.assert_async().await;
        generate_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_moderation_aborts_generation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1:uploadUserImage")
            .with_status(403)
            .with_body(r#"{"error": {"details": [{"reason": "PUBLIC_ERROR_MINOR_UPLOAD"}]}}"#)
            .create_async()
            .await;
        // No generation mock: the run must never get that far.

        let client = test_client(&server.url(), test_tokens());
        let reference = to_data_url(
            "image/png",
            &crate::imaging::blank_canvas(AspectRatio::Square).unwrap(),
        );
        let failure = client
            .run(spec(ModelKind::GemPix, vec![reference]))
            .await
            .unwrap_err();
        assert_eq!(failure, ApiFailure::MinorUpload);
    }

    #[tokio::test]
    async fn test_missing_token_is_auth_failure() {
        let tokens = TokenManager::new(&AuthConfig {
            session_token: None,
        });
        let server = mockito::Server::new_async().await;
        let client = test_client(&server.url(), tokens);

        let failure = client
            .run(spec(ModelKind::Imagen31, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(failure, ApiFailure::Auth(_)));
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_payload() {
        let server = mockito::Server::new_async().await;
        let client = test_client(&server.url(), test_tokens());
        let session = client.tokens.session().unwrap();

        let oversized = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let failure = client.upload_reference(&session, oversized).await.unwrap_err();
        assert_eq!(failure, ApiFailure::ImageTooLarge);
    }
}
