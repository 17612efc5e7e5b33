//! Configuration management for the booking terminal

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Run against the deterministic in-memory backend instead of HTTP.
    pub use_in_memory: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TerminalConfig {
    /// Interaction mode used when nothing is stored: "front-desk" or "self-service".
    pub default_mode: String,
    /// Tag identifier submitted when the demo trigger is used without a scan.
    pub demo_tag_uid: String,
    /// Device-scoped file remembering the last interaction mode.
    pub mode_store_path: String,
    /// Horizon (in days) shown before a resource is selected.
    pub full_day_horizon: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix BOKNING_)
            .add_source(
                Environment::with_prefix("BOKNING")
                    .separator("_")
                    .try_parsing(true),
            )
            // Override backend URL from BACKEND_URL env var if present
            .set_override_option("backend.base_url", env::var("BACKEND_URL").ok())?
            // Override the demo tag from DEMO_TAG_UID env var if present
            .set_override_option("terminal.demo_tag_uid", env::var("DEMO_TAG_UID").ok())?
            // Force the in-memory backend from USE_IN_MEMORY env var if present
            .set_override_option(
                "backend.use_in_memory",
                env::var("USE_IN_MEMORY").ok(),
            )?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 10,
            use_in_memory: false,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            default_mode: "self-service".to_string(),
            demo_tag_uid: "UID123".to_string(),
            mode_store_path: ".bokning-mode".to_string(),
            full_day_horizon: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
