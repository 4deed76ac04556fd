//! Single-resolution load completion handle.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use hooklift_core::error::{AppError, AppResult};

/// Outcome a hook reports for its load.
pub type LoadOutcome = Result<(), String>;

/// Handle a hook uses to signal that its load has finished.
///
/// Clones share one underlying signal: the first `done`/`fail` wins and any
/// later attempt is reported as an error. Dropping every clone without
/// signalling is treated as never signalling; the load deadline decides.
#[derive(Clone)]
pub struct Completion {
    /// Hook this handle belongs to.
    hook_id: Arc<str>,
    /// Sender, taken on first resolution.
    sender: Arc<Mutex<Option<oneshot::Sender<LoadOutcome>>>>,
    /// Cancelled once the run has failed and no longer waits on this hook.
    cancel: CancellationToken,
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("hook_id", &self.hook_id)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl Completion {
    /// Creates a handle and the receiver the orchestrator waits on.
    pub fn channel(
        hook_id: &str,
        cancel: CancellationToken,
    ) -> (Self, oneshot::Receiver<LoadOutcome>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            hook_id: Arc::from(hook_id),
            sender: Arc::new(Mutex::new(Some(tx))),
            cancel,
        };
        (completion, rx)
    }

    /// Signals a successful load.
    pub fn done(&self) -> AppResult<()> {
        self.resolve(Ok(()))
    }

    /// Signals a failed load.
    pub fn fail(&self, reason: impl std::fmt::Display) -> AppResult<()> {
        self.resolve(Err(reason.to_string()))
    }

    /// Signals `outcome`. Fails if the handle was already resolved.
    pub fn resolve(&self, outcome: LoadOutcome) -> AppResult<()> {
        let Some(sender) = self.sender.lock().take() else {
            warn!(hook = %self.hook_id, "Load completion signalled more than once");
            return Err(AppError::hook_load(
                &self.hook_id,
                "load completion was signalled more than once",
            ));
        };

        // The orchestrator may have stopped waiting (timeout or sibling
        // failure); a late outcome is dropped.
        let _ = sender.send(outcome);
        Ok(())
    }

    /// Whether `done` or `fail` has been called.
    pub fn is_resolved(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// The hook this handle belongs to.
    pub fn hook_id(&self) -> &str {
        &self.hook_id
    }

    /// Token cancelled once the run has failed; long-running loads may stop early.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hooklift_core::error::ErrorKind;

    #[tokio::test]
    async fn test_first_signal_wins() {
        let (completion, rx) = Completion::channel("orm", CancellationToken::new());
        let clone = completion.clone();

        completion.done().expect("first signal");
        let err = clone.fail("late").expect_err("second signal must fail");

        assert_eq!(err.kind, ErrorKind::HookLoad);
        assert!(clone.is_resolved());
        assert_eq!(rx.await.expect("outcome"), Ok(()));
    }

    #[tokio::test]
    async fn test_fail_carries_reason() {
        let (completion, rx) = Completion::channel("orm", CancellationToken::new());
        completion.fail("adapter missing").expect("signal");
        assert_eq!(rx.await.expect("outcome"), Err("adapter missing".to_string()));
    }

    #[tokio::test]
    async fn test_signal_after_receiver_dropped_is_ok() {
        let (completion, rx) = Completion::channel("orm", CancellationToken::new());
        drop(rx);
        assert!(completion.done().is_ok());
    }

    #[tokio::test]
    async fn test_dropping_all_handles_closes_channel() {
        let (completion, rx) = Completion::channel("orm", CancellationToken::new());
        drop(completion);
        assert!(rx.await.is_err());
    }
}
