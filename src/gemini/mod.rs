// Gemini generative-text client module (prompt helpers)
// Author: kelexine (https://github.com/kelexine)

mod client;

pub use client::PromptClient;

use serde::{Deserialize, Serialize};

/// Request body for `models/<model>:generateContent`.
#[derive(Debug, Clone, Serialize)]
pub struct TextRequest {
    pub contents: Vec<TextContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<TextGenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Response body for `generateContent`; tolerant of missing fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TextResponse {
    pub candidates: Vec<TextCandidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TextCandidate {
    pub content: TextContent,
}

impl TextRequest {
    /// Single-turn request from one instruction string.
    pub fn from_instruction(instruction: String, temperature: Option<f32>) -> Self {
        Self {
            contents: vec![TextContent {
                parts: vec![TextPart { text: instruction }],
            }],
            generation_config: temperature.map(|t| TextGenerationConfig {
                temperature: Some(t),
            }),
        }
    }
}
