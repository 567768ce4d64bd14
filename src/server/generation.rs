// Generation, prompt-helper and task-poll handlers
// Author: kelexine (https://github.com/kelexine)

use super::handlers::resolve_session;
use super::routes::AppState;
use crate::error::{Result, StudioError};
use crate::imagefx::GenerationSpec;
use crate::models::api::{
    GenerateRequest, ImprovePromptRequest, TaskStatusResponse, TaskSubmitResponse,
};
use crate::models::mapping::{map_model, ModelKind};
use crate::tasks::TaskState;
use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Candidate-count bounds forwarded to the vendor.
const MIN_CANDIDATES: u32 = 1;
const MAX_CANDIDATES: u32 = 8;

/// Shared validation for both generation entry points.
fn validate(state: &AppState, request: &GenerateRequest) -> Result<ModelKind> {
    if request.prompt.trim().is_empty() {
        return Err(StudioError::InvalidRequest(
            "Por favor, escribe una descripción.".to_string(),
        ));
    }

    let model = map_model(&request.model_name_display)?;

    // GEM_PIX falls back to a blank canvas; R2I genuinely needs an input.
    if model == ModelKind::ReferenceToImage && request.reference_images.is_empty() {
        return Err(StudioError::InvalidRequest(format!(
            "El modelo '{}' requiere una imagen de referencia.",
            request.model_name_display
        )));
    }

    if !state.tokens.is_configured() {
        return Err(StudioError::Token(
            "GOOGLE_SESSION_TOKEN no configurado en el servidor.".to_string(),
        ));
    }

    Ok(model)
}

fn build_spec(request: &GenerateRequest, model: ModelKind, prompt_en: String) -> GenerationSpec {
    GenerationSpec {
        prompt: prompt_en,
        num_images: request.num_images.clamp(MIN_CANDIDATES, MAX_CANDIDATES),
        seed: request.seed,
        aspect_ratio: request.aspect_ratio,
        model,
        reference_images: request.reference_images.clone(),
    }
}

/// Blocking generation: the request returns once the vendor does.
pub async fn generate_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<GenerateRequest>,
) -> Result<(CookieJar, Json<Value>)> {
    let (jar, sid) = resolve_session(jar);
    let model = validate(&state, &request)?;

    let prompt_en = state.prompts.translate_to_english(request.prompt.trim()).await;
    info!(
        "Prompt original: '{}' → final (EN): '{}'",
        request.prompt.chars().take(100).collect::<String>(),
        prompt_en.chars().take(100).collect::<String>()
    );

    let spec = build_spec(&request, model, prompt_en);
    match state.imagefx.run(spec).await {
        Ok(images) => {
            state
                .sessions
                .set_results(&sid, images.clone(), request.save_images);
            info!(
                "Generated {} images for sid {}. Save images: {}",
                images.len(),
                sid,
                request.save_images
            );
            Ok((jar, Json(json!({"status": "success", "images": images}))))
        }
        Err(failure) => {
            crate::metrics::record_generation_failure(failure.code());
            error!("Error generating images for sid {}: {}", sid, failure);
            Err(StudioError::Generation(failure))
        }
    }
}

/// Fire-and-poll generation: returns a task id immediately.
pub async fn generate_async_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<GenerateRequest>,
) -> Result<(CookieJar, Json<TaskSubmitResponse>)> {
    let (jar, sid) = resolve_session(jar);
    let model = validate(&state, &request)?;

    let prompt_en = state.prompts.translate_to_english(request.prompt.trim()).await;
    let spec = build_spec(&request, model, prompt_en);

    let client = state.imagefx.clone();
    let (task_id, queue_position) = state
        .tasks
        .submit(sid.clone(), request.save_images, async move {
            client.run(spec).await
        })
        .await;

    info!(
        "Queued generation task {} for sid {} at position {}",
        task_id, sid, queue_position
    );

    Ok((
        jar,
        Json(TaskSubmitResponse {
            status: "success".to_string(),
            task_id,
            queue_position,
        }),
    ))
}

/// Poll a task. Success writes the images into the owning session, the same
/// place a blocking generation would have put them.
pub async fn task_status_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(task_id): Path<Uuid>,
) -> Result<(CookieJar, Json<TaskStatusResponse>)> {
    let (jar, sid) = resolve_session(jar);

    let entry = state
        .tasks
        .status(&task_id)
        .await
        .ok_or_else(|| StudioError::TaskNotFound(task_id.to_string()))?;

    // Tasks are single-owner; a foreign sid gets the same 404 as a bogus id.
    if entry.session_id != sid {
        debug!("sid {} polled task {} owned by another session", sid, task_id);
        return Err(StudioError::TaskNotFound(task_id.to_string()));
    }

    let response = match entry.state {
        TaskState::Pending => TaskStatusResponse {
            status: "success".to_string(),
            state: TaskState::Pending,
            queue_position: state.tasks.queue_position(&task_id).await,
            images: None,
            message: None,
        },
        TaskState::Success => {
            let images = entry.images.unwrap_or_default();
            state
                .sessions
                .set_results(&sid, images.clone(), entry.save_images);
            TaskStatusResponse {
                status: "success".to_string(),
                state: TaskState::Success,
                queue_position: None,
                images: Some(images),
                message: None,
            }
        }
        TaskState::Failure => TaskStatusResponse {
            status: "error".to_string(),
            state: TaskState::Failure,
            queue_position: None,
            images: None,
            message: entry.failure.map(|failure| failure.user_message()),
        },
    };

    Ok((jar, Json(response)))
}

pub async fn improve_prompt_handler(
    State(state): State<AppState>,
    Json(request): Json<ImprovePromptRequest>,
) -> Result<Json<Value>> {
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(StudioError::InvalidRequest(
            "Escribe un prompt para mejorar.".to_string(),
        ));
    }

    match state.prompts.improve_and_translate(&prompt).await {
        Ok(improved) => {
            info!(
                "Prompt improved & translated: '{}...'",
                improved.chars().take(100).collect::<String>()
            );
            Ok(Json(
                json!({"status": "success", "improved_prompt": improved}),
            ))
        }
        Err(detail) => {
            error!("Error improving prompt: {}", detail);
            Err(StudioError::PromptHelper(format!(
                "Error al mejorar prompt: {}. Usando el original.",
                detail
            )))
        }
    }
}

pub async fn magic_prompt_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    match state.prompts.magic_prompt().await {
        Ok(magic) => Ok(Json(json!({"status": "success", "magic_prompt": magic}))),
        Err(detail) => {
            error!("Error generating magic prompt: {}", detail);
            Err(StudioError::PromptHelper(format!(
                "Error al generar prompt mágico: {}.",
                detail
            )))
        }
    }
}
