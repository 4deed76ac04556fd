//! The normalized hook entity and its lifecycle state.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::definitions::HookModule;

/// Lifecycle state of a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookState {
    /// Registered but not yet prepared.
    Unprepared,
    /// Factory invoked, identity and config key resolved.
    Prepared,
    /// Defaults merged into the shared configuration.
    DefaultsApplied,
    /// `configure` returned successfully.
    Configured,
    /// `load` started, completion not yet observed.
    Loading,
    /// `load` signalled success.
    Loaded,
    /// `configure` or `load` failed, or the load timed out.
    Failed,
}

impl HookState {
    /// Returns the string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unprepared => "unprepared",
            Self::Prepared => "prepared",
            Self::DefaultsApplied => "defaults_applied",
            Self::Configured => "configured",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

impl std::fmt::Display for HookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A prepared hook.
pub struct Hook {
    /// Registry id, as registered.
    id: String,
    /// Lowercased registry id.
    identity: String,
    /// Config section holding this hook's settings.
    config_key: String,
    /// The module built by the hook's factory.
    module: Arc<dyn HookModule>,
    /// Current lifecycle state.
    state: Mutex<HookState>,
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("config_key", &self.config_key)
            .field("state", &self.state())
            .finish()
    }
}

impl Hook {
    /// Creates a hook in the `Prepared` state for the registry id `id`.
    pub fn new(
        id: impl Into<String>,
        config_key: impl Into<String>,
        module: Arc<dyn HookModule>,
    ) -> Self {
        let id = id.into();
        Self {
            identity: id.to_lowercase(),
            id,
            config_key: config_key.into(),
            module,
            state: Mutex::new(HookState::Prepared),
        }
    }

    /// Registry id. Events, errors and bootstrap rules key off this.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lowercased hook id.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Config section name.
    pub fn config_key(&self) -> &str {
        &self.config_key
    }

    /// The hook's module.
    pub fn module(&self) -> &Arc<dyn HookModule> {
        &self.module
    }

    /// Current state.
    pub fn state(&self) -> HookState {
        *self.state.lock()
    }

    /// Moves the hook to `next`.
    pub fn advance(&self, next: HookState) {
        let mut state = self.state.lock();
        trace!(hook = %self.id, from = %*state, to = %next, "Hook state transition");
        *state = next;
    }
}
