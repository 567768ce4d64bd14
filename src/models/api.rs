//! REST request/response bodies for the studio endpoints.
//!
//! Field names match the JSON the browser client already sends; all knobs the
//! client may omit carry serde defaults.

// Author: kelexine (https://github.com/kelexine)

use crate::models::mapping::AspectRatio;
use crate::tasks::TaskState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /generate` and `POST /generate_async`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// The visitor's prompt, in whatever language they wrote it.
    #[serde(default)]
    pub prompt: String,

    /// Number of candidates to request.
    #[serde(default = "default_num_images")]
    pub num_images: u32,

    /// Generation seed; `-1` means "pick one at random".
    #[serde(default = "default_seed")]
    pub seed: i64,

    /// Client aspect-ratio string (`1:1`, `16:9`, ...).
    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    /// Display name of the selected model tab.
    pub model_name_display: String,

    /// Whether the visitor wants the results remembered for download.
    #[serde(default)]
    pub save_images: bool,

    /// Reference images as `data:` URLs, in upload order.
    #[serde(default)]
    pub reference_images: Vec<String>,
}

fn default_num_images() -> u32 {
    4
}

fn default_seed() -> i64 {
    -1
}

/// Body of `POST /improve_prompt`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImprovePromptRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Body of `POST /update_session_settings`. All fields optional; only the
/// present ones are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub active_tab: Option<String>,
    pub aspect_ratio_index: Option<usize>,
    pub save_images: Option<bool>,
}

/// Body of `POST /add_reference_image`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddReferenceRequest {
    /// The image as a `data:` URL.
    pub image: Option<String>,
}

/// One entry of the model catalog as reported by `GET /state`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub display_name: String,
    pub model_type: String,
    pub requires_reference: bool,
}

/// Full visitor-state snapshot returned by `GET /state`.
#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    pub status: String,
    pub active_tab: String,
    pub results: Vec<String>,
    pub reference_images: Vec<String>,
    pub aspect_ratio_index: usize,
    pub save_images: bool,
    pub models: Vec<ModelInfo>,
}

/// Response of `POST /generate_async`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSubmitResponse {
    pub status: String,
    pub task_id: Uuid,
    /// Number of tasks queued ahead of this one.
    pub queue_position: usize,
}

/// Response of `GET /tasks/:task_id`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusResponse {
    pub status: String,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
