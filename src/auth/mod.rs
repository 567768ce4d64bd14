//! Vendor bearer-session management.
//!
//! The upstream ImageFX API authenticates with a session token obtained from
//! the browser: a base64 blob that decodes to `bearer:client_data`, where the
//! bearer part goes into the `Authorization` header and the rest into
//! `X-Client-Data`. The token is static for the lifetime of the process; when
//! it expires the operator has to capture a fresh one.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::AuthConfig;
use base64::Engine;
use zeroize::Zeroize;

/// Decoded bearer-session material for the vendor API.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct BearerSession {
    pub bearer_token: String,
    pub client_data: String,
}

// Custom Debug impl that never logs bearer material
impl std::fmt::Debug for BearerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerSession")
            .field("bearer_token", &"[REDACTED]")
            .field("client_data", &"[REDACTED]")
            .finish()
    }
}

/// Decode a raw session token into its bearer and client-data halves.
///
/// The error value is a human-readable detail string; callers wrap it into
/// whichever failure type fits their layer.
pub fn decode_session_token(raw: &str) -> Result<BearerSession, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("El token está vacío.".to_string());
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|_| "Formato de token inválido.".to_string())?;
    let decoded = String::from_utf8(decoded).map_err(|_| "Formato de token inválido.".to_string())?;

    // Split at the FIRST colon only: the client-data half may itself contain colons.
    let (bearer, client_data) = decoded
        .split_once(':')
        .ok_or_else(|| "Formato de token inválido.".to_string())?;

    Ok(BearerSession {
        bearer_token: bearer.trim().to_string(),
        client_data: client_data.trim().to_string(),
    })
}

/// Resolves the configured session token on demand.
///
/// Unlike an OAuth credential there is nothing to refresh here, so the
/// manager is a thin, cloneable wrapper over the configured value.
#[derive(Clone)]
pub struct TokenManager {
    token: Option<String>,
}

impl TokenManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            token: config.session_token.clone(),
        }
    }

    /// Whether any token value is configured at all.
    pub fn is_configured(&self) -> bool {
        self.token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    /// Decode the configured token into a usable bearer session.
    pub fn session(&self) -> Result<BearerSession, String> {
        match self.token.as_deref() {
            Some(raw) => decode_session_token(raw),
            None => Err("El token está vacío.".to_string()),
        }
    }

    /// (configured, decodable) pair for health reporting.
    pub fn token_info(&self) -> (bool, bool) {
        (self.is_configured(), self.session().is_ok())
    }
}
