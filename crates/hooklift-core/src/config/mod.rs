//! Host configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod logging;
pub mod orchestrator;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use self::logging::LoggingConfig;
use self::orchestrator::OrchestratorConfig;

use crate::error::AppError;

/// Root host configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Hook definition overrides keyed by hook id (`false` disables a hook).
    #[serde(default)]
    pub hooks: BTreeMap<String, Value>,
    /// Initial contents of the shared configuration handed to hooks.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `HOOKLIFT_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        tracing::debug!(env, "Loading configuration");

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HOOKLIFT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Read a standalone settings overlay (any format the `config` crate
    /// understands) into a JSON object.
    ///
    /// Missing files yield an empty object.
    pub fn load_settings(path: &str) -> Result<Map<String, Value>, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Shared configuration seed: `settings` plus the orchestrator-level
    /// `hookTimeout` when the settings do not already declare one.
    pub fn shared_settings(&self) -> Map<String, Value> {
        let mut settings = self.settings.clone();
        if let Some(ms) = self.orchestrator.hook_timeout_ms {
            settings
                .entry("hookTimeout")
                .or_insert_with(|| Value::from(ms));
        }
        settings
    }
}
