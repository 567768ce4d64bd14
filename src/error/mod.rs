// Error types for the imagefx-studio backend
// Author: kelexine (https://github.com/kelexine)

use crate::imagefx::reasons::ApiFailure;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session token error: {0}")]
    Token(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image generation failed: {0}")]
    Generation(ApiFailure),

    #[error("Prompt helper error: {0}")]
    PromptHelper(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convert StudioError into the JSON envelope the browser client expects:
// {"status": "error", "message": <localized text>}
impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            StudioError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            StudioError::TaskNotFound(_) => {
                (StatusCode::NOT_FOUND, "Tarea no encontrada.".to_string())
            }
            StudioError::Generation(failure) => {
                (StatusCode::INTERNAL_SERVER_ERROR, failure.user_message())
            }
            StudioError::Token(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("auth_error: {}", detail),
            ),
            StudioError::PromptHelper(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            StudioError::Config(_) | StudioError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = json!({
            "status": "error",
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_400() {
        let err = StudioError::InvalidRequest("Por favor, escribe una descripción.".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_generation_failure_maps_to_500() {
        let err = StudioError::Generation(ApiFailure::NoImagesReturned);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_task_not_found_maps_to_404() {
        let err = StudioError::TaskNotFound("deadbeef".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
