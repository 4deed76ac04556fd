//! Observers notified as hooks finish loading.

use tokio::sync::broadcast;
use tracing::debug;

use hooklift_core::error::AppError;
use hooklift_core::events::{HookEvent, HookPhase};

/// Receives per-hook load outcomes from the orchestrator.
pub trait HookObserver: Send + Sync + std::fmt::Debug {
    /// `hook:<id>:loaded`.
    fn on_hook_loaded(&self, hook_id: &str);

    /// `hook:<id>:error`.
    fn on_hook_error(&self, hook_id: &str, error: &AppError);
}

/// Observer that ignores every notification.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl HookObserver for NoopObserver {
    fn on_hook_loaded(&self, _hook_id: &str) {}

    fn on_hook_error(&self, _hook_id: &str, _error: &AppError) {}
}

/// Publishes [`HookEvent`]s on a broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    sender: broadcast::Sender<HookEvent>,
}

impl BroadcastObserver {
    /// Creates an observer with room for `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<HookEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: HookEvent) {
        let name = event.event_name();
        // No subscribers is fine; events are fire-and-forget.
        if self.sender.send(event).is_err() {
            debug!(event = %name, "No subscribers for hook event");
        }
    }
}

impl HookObserver for BroadcastObserver {
    fn on_hook_loaded(&self, hook_id: &str) {
        self.publish(HookEvent::new(hook_id, HookPhase::Loaded));
    }

    fn on_hook_error(&self, hook_id: &str, error: &AppError) {
        self.publish(HookEvent::new(
            hook_id,
            HookPhase::Error {
                kind: error.kind,
                message: error.message.clone(),
            },
        ));
    }
}
