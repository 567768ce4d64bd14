//! Prompt-helper client for the Gemini Generative Language API.
//!
//! Three helpers ride on one `generateContent` wrapper:
//! - improve + translate (errors propagate; the endpoint reports them)
//! - translate to English (silent fallback to the original prompt)
//! - "magic prompt" invention (errors propagate)
//!
//! Author: kelexine (<https://github.com/kelexine>)

use super::{TextRequest, TextResponse};
use crate::config::GeminiConfig;
use crate::error::{Result, StudioError};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct PromptClient {
    http: Client,
    config: GeminiConfig,
}

impl PromptClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .use_rustls_tls()
            .build()
            .map_err(|e| StudioError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Whether an API key is configured at all; without one the helpers
    /// degrade (translation falls back, the explicit helpers report errors).
    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }

    /// One `generateContent` round trip. The error value is a detail string;
    /// callers decide whether it propagates or falls back.
    async fn generate_text(
        &self,
        instruction: String,
        temperature: Option<f32>,
    ) -> std::result::Result<String, String> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "GEMINI_API_KEY no configurada".to_string())?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url, self.config.model
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .json(&TextRequest::from_instruction(instruction, temperature))
            .send()
            .await
            .map_err(|e| format!("error de red: {}", e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            ));
        }

        let parsed: TextResponse =
            serde_json::from_str(&body).map_err(|e| format!("respuesta no válida: {}", e))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
            .trim()
            .to_string();

        if text.is_empty() {
            return Err("el modelo no devolvió texto".to_string());
        }

        Ok(text)
    }

    /// Refine a prompt and translate it to English in one call.
    pub async fn improve_and_translate(
        &self,
        prompt: &str,
    ) -> std::result::Result<String, String> {
        let instruction = format!(
            "Responde SOLO con el prompt mejorado para generación de imágenes con IA de alta \
             calidad, traducido al inglés. Mantén completamente la idea original sin agregar \
             elementos nuevos o exagerados, solo refina con detalles sutiles, vívidos y \
             optimizaciones mínimas para mejor resultado. NO agregues explicaciones, opciones \
             ni texto adicional. Solo el prompt: {}",
            prompt
        );

        match self.generate_text(instruction, None).await {
            Ok(improved) => {
                crate::metrics::record_prompt_helper("improve", "success");
                info!(
                    "Prompt improved & translated: '{}' → '{}'",
                    prompt.chars().take(50).collect::<String>(),
                    improved.chars().take(50).collect::<String>()
                );
                Ok(improved)
            }
            Err(detail) => {
                crate::metrics::record_prompt_helper("improve", "failure");
                Err(detail)
            }
        }
    }

    /// Translate a prompt to English, falling back to the original on any
    /// problem. Generation must not fail just because the helper did.
    pub async fn translate_to_english(&self, prompt: &str) -> String {
        if !self.is_configured() {
            warn!("GEMINI_API_KEY not set; passing prompt through untranslated");
            crate::metrics::record_prompt_helper("translate", "fallback");
            return prompt.to_string();
        }

        let instruction = format!(
            "Traduce este prompt al inglés manteniendo el significado exacto y el estilo. \
             Responde SOLO con la traducción: {}",
            prompt
        );

        match self.generate_text(instruction, None).await {
            Ok(translated) => {
                crate::metrics::record_prompt_helper("translate", "success");
                debug!(
                    "Translated prompt: '{}' → '{}'",
                    prompt.chars().take(50).collect::<String>(),
                    translated.chars().take(50).collect::<String>()
                );
                translated
            }
            Err(detail) => {
                crate::metrics::record_prompt_helper("translate", "fallback");
                warn!("Translation failed ({}); using original prompt", detail);
                prompt.to_string()
            }
        }
    }

    /// Invent one self-contained creative prompt in English.
    pub async fn magic_prompt(&self) -> std::result::Result<String, String> {
        let instruction = "Inventa un único prompt creativo, detallado y visualmente rico en \
                           inglés para generar una imagen con IA. Responde SOLO con el prompt, \
                           sin explicaciones ni texto adicional."
            .to_string();

        let outcome = self.generate_text(instruction, Some(1.0)).await;
        match &outcome {
            Ok(_) => crate::metrics::record_prompt_helper("magic", "success"),
            Err(_) => crate::metrics::record_prompt_helper("magic", "failure"),
        }
        outcome
    }
}
