//! Hook lifecycle events.
//!
//! Events are published to observers while the orchestrator brings hooks
//! up, so that the host can follow startup progress.

pub mod hook;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use hook::HookPhase;

/// A lifecycle notification for one hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The hook the event is about.
    pub hook_id: String,
    /// What happened to the hook.
    pub phase: HookPhase,
}

impl HookEvent {
    /// Create a new hook event.
    pub fn new(hook_id: impl Into<String>, phase: HookPhase) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            hook_id: hook_id.into(),
            phase,
        }
    }

    /// The bus-style event name, e.g. `hook:orm:loaded`.
    pub fn event_name(&self) -> String {
        format!("hook:{}:{}", self.hook_id, self.phase.as_str())
    }
}
