// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::generation::{
    generate_async_handler, generate_handler, improve_prompt_handler, magic_prompt_handler,
    task_status_handler,
};
use super::handlers::{
    add_reference_handler, clear_session_handler, health_handler, metrics_handler,
    remove_reference_handler, state_handler, update_settings_handler,
};
use super::middleware::{request_id_layers, track_metrics};
use crate::auth::TokenManager;
use crate::config::AppConfig;
use crate::error::Result;
use crate::gemini::PromptClient;
use crate::imagefx::ImageFxClient;
use crate::session::SessionStore;
use crate::tasks::TaskQueue;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub imagefx: Arc<ImageFxClient>,
    pub prompts: Arc<PromptClient>,
    pub sessions: Arc<SessionStore>,
    pub tasks: Arc<TaskQueue>,
    pub tokens: TokenManager,
}

pub fn create_router(
    config: AppConfig,
    imagefx: Arc<ImageFxClient>,
    prompts: Arc<PromptClient>,
    sessions: Arc<SessionStore>,
    tasks: Arc<TaskQueue>,
    tokens: TokenManager,
) -> Result<Router> {
    let state = AppState {
        config,
        imagefx,
        prompts,
        sessions,
        tasks,
        tokens,
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/state", get(state_handler))
        .route("/generate", post(generate_handler))
        .route("/generate_async", post(generate_async_handler))
        .route("/tasks/:task_id", get(task_status_handler))
        .route("/improve_prompt", post(improve_prompt_handler))
        .route("/generate_magic_prompt", post(magic_prompt_handler))
        .route("/update_session_settings", post(update_settings_handler))
        .route("/add_reference_image", post(add_reference_handler))
        .route("/remove_reference_image/:index", post(remove_reference_handler))
        .route("/clear_session_results", post(clear_session_handler))
        // Reference images arrive as base64 data URLs; three 10MB JPEGs plus
        // overhead fit comfortably under 50MB
        .layer(tower_http::limit::RequestBodyLimitLayer::new(50 * 1024 * 1024))
        .layer(axum::middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let mut config = AppConfig::default();
        config.auth.session_token = None;
        config.gemini.api_key = None;

        let tokens = TokenManager::new(&config.auth);
        let imagefx = Arc::new(ImageFxClient::new(&config.imagefx, tokens.clone()).unwrap());
        let prompts = Arc::new(PromptClient::new(&config.gemini).unwrap());
        let sessions = Arc::new(SessionStore::new(config.session.clone()));
        let tasks = Arc::new(TaskQueue::new(config.tasks.retention_minutes));

        create_router(config, imagefx, prompts, sessions, tasks, tokens).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint_responds() {
        let response = test_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_state_sets_session_cookie() {
        let response = test_router()
            .oneshot(Request::builder().uri("/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("state should mint a session cookie");
        assert!(cookie.to_str().unwrap().contains("studio_sid="));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_prompt() {
        let body = r#"{"prompt": "   ", "model_name_display": "Texto a Imagen (v3.1)"}"#;
        let response = test_router()
            .oneshot(post_json("/generate", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_rejects_unknown_model() {
        let body = r#"{"prompt": "un gato", "model_name_display": "No existe"}"#;
        let response = test_router()
            .oneshot(post_json("/generate", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_rejects_r2i_without_references() {
        let body =
            r#"{"prompt": "un gato", "model_name_display": "Imagen desde Referencia (V3.5)"}"#;
        let response = test_router()
            .oneshot(post_json("/generate", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_without_token_is_auth_error() {
        let body = r#"{"prompt": "un gato", "model_name_display": "Texto a Imagen (v3.1)"}"#;
        let response = test_router()
            .oneshot(post_json("/generate", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .starts_with("auth_error: GOOGLE_SESSION_TOKEN"));
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/tasks/00000000-0000-0000-0000-000000000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_settings_rejects_unknown_tab() {
        let response = test_router()
            .oneshot(post_json(
                "/update_session_settings",
                r#"{"active_tab": "No existe"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_responds() {
        let response = test_router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
