//! Configuration data structures for the imagefx-studio backend.
//!
//! This module defines the schema for the application settings, including
//! server parameters, the vendor session token, the obfuscated ImageFX
//! endpoints, the Gemini prompt-helper key and per-visitor session limits.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, workers).
    #[serde(default)]
    pub server: ServerConfig,

    /// Vendor bearer-session authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Upstream ImageFX API settings.
    #[serde(default)]
    pub imagefx: ImageFxConfig,

    /// Gemini prompt-helper settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Per-visitor session settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Async generation task settings.
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8080`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads for the Axum server.
    /// Default: Number of logical CPU cores.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Settings for the vendor bearer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base64 session token in `bearer:client_data` form.
    /// Default: the `GOOGLE_SESSION_TOKEN` environment variable.
    #[serde(default = "default_session_token")]
    pub session_token: Option<String>,
}

/// Settings for the upstream ImageFX API connection.
///
/// The endpoint URLs are stored base64-obfuscated and only decoded when the
/// client is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFxConfig {
    /// Obfuscated generation endpoint (`v1:runImageFx`).
    #[serde(default = "default_generate_url_obfuscated")]
    pub generate_url_obfuscated: String,

    /// Obfuscated upload endpoint (`v1:uploadUserImage`).
    #[serde(default = "default_upload_url_obfuscated")]
    pub upload_url_obfuscated: String,

    /// Timeout for generation requests in seconds.
    /// Default: `90`
    #[serde(default = "default_generate_timeout")]
    pub generate_timeout_seconds: u64,

    /// Timeout for reference upload requests in seconds.
    /// Default: `30`
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_seconds: u64,

    /// User-Agent header sent on every vendor call.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Value of the `X-Browser-Year` header the vendor expects.
    #[serde(default = "default_browser_year")]
    pub browser_year: String,
}

/// Settings for the Gemini generative-text prompt helpers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for the Generative Language API.
    /// Default: the `GEMINI_API_KEY` environment variable.
    #[serde(default = "default_gemini_api_key")]
    pub api_key: Option<String>,

    /// Base URL for the Generative Language API.
    #[serde(default = "default_gemini_base_url")]
    pub api_base_url: String,

    /// Model used for prompt improvement and translation.
    /// Default: `gemini-2.5-flash`
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Request timeout in seconds.
    /// Default: `30`
    #[serde(default = "default_gemini_timeout")]
    pub timeout_seconds: u64,
}

/// Settings for per-visitor session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes of inactivity after which a returning visitor starts fresh.
    /// Default: `30`
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: i64,

    /// Maximum number of pending reference images per visitor.
    /// Default: `3`
    #[serde(default = "default_max_references")]
    pub max_reference_images: usize,

    /// Upper bound on tracked visitor sessions; least recently used entries
    /// are evicted beyond this.
    /// Default: `1024`
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

/// Settings for the in-memory async task tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Minutes a finished task result is kept around for polling.
    /// Default: `10`
    #[serde(default = "default_task_retention")]
    pub retention_minutes: i64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask bearer material in logs.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_tokens: bool,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_token: default_session_token(),
        }
    }
}

impl Default for ImageFxConfig {
    fn default() -> Self {
        Self {
            generate_url_obfuscated: default_generate_url_obfuscated(),
            upload_url_obfuscated: default_upload_url_obfuscated(),
            generate_timeout_seconds: default_generate_timeout(),
            upload_timeout_seconds: default_upload_timeout(),
            user_agent: default_user_agent(),
            browser_year: default_browser_year(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: default_gemini_api_key(),
            api_base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            timeout_seconds: default_gemini_timeout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout(),
            max_reference_images: default_max_references(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            retention_minutes: default_task_retention(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_tokens: true,
        }
    }
}

// Helper functions for serde defaults and shared constants

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_session_token() -> Option<String> {
    std::env::var("GOOGLE_SESSION_TOKEN").ok()
}

fn default_generate_url_obfuscated() -> String {
    "aHR0cHM6Ly9haXNhbmRib3gtcGEuZ29vZ2xlYXBpcy5jb20vdjE6cnVuSW1hZ2VGeA==".to_string()
}

fn default_upload_url_obfuscated() -> String {
    "aHR0cHM6Ly9haXNhbmRib3gtcGEuZ29vZ2xlYXBpcy5jb20vdjE6dXBsb2FkVXNlckltYWdl".to_string()
}

fn default_generate_timeout() -> u64 {
    90
}

fn default_upload_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_browser_year() -> String {
    "2025".to_string()
}

fn default_gemini_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY").ok()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> i64 {
    30
}

fn default_max_references() -> usize {
    3
}

fn default_max_sessions() -> usize {
    1024
}

fn default_task_retention() -> i64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}
