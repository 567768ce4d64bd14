// HTTP request handlers: health, state, settings, references, reset
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::{Result, StudioError};
use crate::imagefx;
use crate::models::api::{AddReferenceRequest, ModelInfo, SettingsUpdate, StateResponse};
use crate::models::mapping::MODEL_CATALOG;
use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

pub(super) const SESSION_COOKIE: &str = "studio_sid";

/// Resolve the visitor's sid from the cookie jar, minting one when absent.
pub(super) fn resolve_session(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let sid = cookie.value().to_string();
        if !sid.is_empty() {
            return (jar, sid);
        }
    }

    let sid = Uuid::new_v4().to_string();
    let mut cookie = Cookie::new(SESSION_COOKIE, sid.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    (jar.add(cookie), sid)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    // Check the vendor session token
    let (configured, decodable) = state.tokens.token_info();
    let token_check = if !configured {
        overall_status = HealthStatus::Unhealthy;
        HealthCheck {
            status: "error".to_string(),
            message: "GOOGLE_SESSION_TOKEN no configurado".to_string(),
        }
    } else if !decodable {
        overall_status = HealthStatus::Unhealthy;
        HealthCheck {
            status: "error".to_string(),
            message: "Session token cannot be decoded".to_string(),
        }
    } else {
        HealthCheck {
            status: "ok".to_string(),
            message: "Session token present and decodable".to_string(),
        }
    };
    checks.insert("session_token".to_string(), token_check);

    // Check that the obfuscated endpoints decode
    let endpoints_ok = imagefx::decode_endpoint(&state.config.imagefx.generate_url_obfuscated)
        .and(imagefx::decode_endpoint(
            &state.config.imagefx.upload_url_obfuscated,
        ))
        .is_ok();
    let endpoint_check = if endpoints_ok {
        HealthCheck {
            status: "ok".to_string(),
            message: "Vendor endpoints decode cleanly".to_string(),
        }
    } else {
        overall_status = HealthStatus::Unhealthy;
        HealthCheck {
            status: "error".to_string(),
            message: "Obfuscated endpoint configuration is corrupt".to_string(),
        }
    };
    checks.insert("endpoints".to_string(), endpoint_check);

    // Check the prompt helper key; the app works without it, degraded
    let helper_check = if state.prompts.is_configured() {
        HealthCheck {
            status: "ok".to_string(),
            message: "Prompt helper key configured".to_string(),
        }
    } else {
        if matches!(overall_status, HealthStatus::Healthy) {
            overall_status = HealthStatus::Degraded;
        }
        HealthCheck {
            status: "warning".to_string(),
            message: "GEMINI_API_KEY not set; translation and prompt helpers degraded".to_string(),
        }
    };
    checks.insert("prompt_helper".to_string(), helper_check);

    // Report tracked sessions
    checks.insert(
        "sessions".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: format!("{} visitor session(s) tracked", state.sessions.len()),
        },
    );

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// JSON replacement for the old server-rendered index page. This is the only
/// endpoint that applies the idle-visit reset.
pub async fn state_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<StateResponse>) {
    let (jar, sid) = resolve_session(jar);
    let session = state.sessions.touch(&sid);

    let models = MODEL_CATALOG
        .iter()
        .map(|(name, kind)| ModelInfo {
            display_name: name.to_string(),
            model_type: kind.api_name().to_string(),
            requires_reference: kind.requires_reference(),
        })
        .collect();

    (
        jar,
        Json(StateResponse {
            status: "success".to_string(),
            active_tab: session.active_tab,
            results: session.results,
            reference_images: session.reference_images,
            aspect_ratio_index: session.aspect_ratio_index,
            save_images: session.save_images,
            models,
        }),
    )
}

pub async fn update_settings_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(update): Json<SettingsUpdate>,
) -> Result<(CookieJar, Json<Value>)> {
    let (jar, sid) = resolve_session(jar);
    state.sessions.update_settings(&sid, &update)?;
    info!(
        "Session settings updated for sid {}: tab={:?} ratio={:?} save={:?}",
        sid, update.active_tab, update.aspect_ratio_index, update.save_images
    );
    Ok((jar, Json(json!({"status": "success"}))))
}

pub async fn add_reference_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<AddReferenceRequest>,
) -> Result<(CookieJar, Json<Value>)> {
    let (jar, sid) = resolve_session(jar);

    let image = request.image.as_deref().unwrap_or_default();
    if image.is_empty() {
        return Err(StudioError::InvalidRequest(
            "Límite de 3 imágenes de referencia alcanzado o imagen inválida.".to_string(),
        ));
    }

    let references = state.sessions.add_reference(&sid, image)?;
    Ok((
        jar,
        Json(json!({"status": "success", "reference_images": references})),
    ))
}

pub async fn remove_reference_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(index): Path<usize>,
) -> Result<(CookieJar, Json<Value>)> {
    let (jar, sid) = resolve_session(jar);
    let references = state.sessions.remove_reference(&sid, index)?;
    Ok((
        jar,
        Json(json!({"status": "success", "reference_images": references})),
    ))
}

pub async fn clear_session_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    let (jar, sid) = resolve_session(jar);
    state.sessions.reset(&sid);
    (jar, Json(json!({"status": "success"})))
}

pub async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_session_mints_sid() {
        let jar = CookieJar::new();
        let (jar, sid) = resolve_session(jar);
        assert!(!sid.is_empty());
        assert_eq!(jar.get(SESSION_COOKIE).unwrap().value(), sid);
    }

    #[test]
    fn test_resolve_session_reuses_existing_sid() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "existing-sid"));
        let (_, sid) = resolve_session(jar);
        assert_eq!(sid, "existing-sid");
    }
}
