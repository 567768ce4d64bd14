// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{Result, StudioError};
use config::{Config, Environment, File};
use std::path::PathBuf;

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest, prefix: STUDIO_)
    /// 2. Config file (`~/.imagefx-studio/config.toml`)
    /// 3. Defaults (lowest)
    ///
    /// The session token and prompt-helper key additionally default to the
    /// `GOOGLE_SESSION_TOKEN` and `GEMINI_API_KEY` environment variables.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name(&Self::default_config_path()).required(false))
            .add_source(Environment::with_prefix("STUDIO").separator("_"))
            .build()
            .map_err(|e| StudioError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| StudioError::Config(e.to_string()))
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".imagefx-studio")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
