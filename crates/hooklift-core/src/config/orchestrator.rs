//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Settings consumed by the hook orchestrator itself rather than by hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Global load timeout in milliseconds, copied into the shared
    /// configuration as `hookTimeout` unless the settings already set it.
    #[serde(default)]
    pub hook_timeout_ms: Option<u64>,
    /// Hook ids that are no longer hooks and get dropped before preparation.
    #[serde(default = "default_reserved")]
    pub reserved: Vec<String>,
    /// Publish `hook:<id>:loaded` / `hook:<id>:error` events on the host's
    /// broadcast channel.
    #[serde(default = "default_publish_events")]
    pub publish_events: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            hook_timeout_ms: None,
            reserved: default_reserved(),
            publish_events: default_publish_events(),
        }
    }
}

fn default_reserved() -> Vec<String> {
    vec!["controllers".to_string()]
}

fn default_publish_events() -> bool {
    true
}
