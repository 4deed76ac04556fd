//! Application context: what hook factories receive when they are invoked.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::config::SharedConfig;
use crate::registry::HookRegistry;

/// Context passed to hook factories.
///
/// Gives hooks access to the shared configuration and to the registry, so
/// that discovery hooks (`userhooks`) can register further hooks while the
/// orchestrator is running.
#[derive(Clone)]
pub struct AppContext {
    /// Shared configuration.
    pub config: SharedConfig,
    /// Hook registry for the current run.
    pub registry: Arc<HookRegistry>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish()
    }
}

impl AppContext {
    /// Creates a context over an existing configuration and registry.
    pub fn new(config: SharedConfig, registry: Arc<HookRegistry>) -> Self {
        Self { config, registry }
    }

    /// Creates a context with an empty registry and `settings` as the initial
    /// shared configuration.
    pub fn with_settings(settings: Map<String, Value>) -> Self {
        Self::new(
            SharedConfig::from_map(settings),
            Arc::new(HookRegistry::new()),
        )
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::with_settings(Map::new())
    }
}
