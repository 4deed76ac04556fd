//! Timeout guard: races a hook's load against its deadline.
//!
//! Every deadline started during a run is tracked by one [`TimerRegistry`].
//! When any hook fails, [`TimerRegistry::cancel_all`] clears every
//! outstanding deadline so that no sibling reports a timeout for a run that
//! has already been aborted.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hooklift_core::error::{AppError, AppResult};

use crate::api::config::SharedConfig;
use crate::hooks::completion::LoadOutcome;
use crate::hooks::entity::Hook;

/// Load deadline used when neither the hook nor the host configures one.
pub const DEFAULT_HOOK_TIMEOUT_MS: u64 = 20_000;

/// Per-hook override, read from `config[<config_key>]._hookTimeout`.
pub const HOOK_TIMEOUT_KEY: &str = "_hookTimeout";

/// Global setting, read from `config.hookTimeout`.
pub const GLOBAL_TIMEOUT_KEY: &str = "hookTimeout";

/// Hooks whose load runs without a deadline.
pub const TIMEOUT_EXEMPT: &[&str] = &["userhooks"];

/// Resolves the load deadline for a hook's config section.
pub fn resolve_timeout(config: &SharedConfig, config_key: &str) -> Duration {
    let ms = config
        .get_path(&[config_key, HOOK_TIMEOUT_KEY])
        .as_ref()
        .and_then(as_millis)
        .or_else(|| config.get(GLOBAL_TIMEOUT_KEY).as_ref().and_then(as_millis))
        .unwrap_or(DEFAULT_HOOK_TIMEOUT_MS);
    Duration::from_millis(ms)
}

/// The deadline to enforce for `hook`, or `None` if it is exempt.
pub fn timeout_for(hook: &Hook, config: &SharedConfig) -> Option<Duration> {
    if TIMEOUT_EXEMPT.contains(&hook.id()) {
        return None;
    }
    Some(resolve_timeout(config, hook.config_key()))
}

/// A positive millisecond count. Zero counts as unset.
fn as_millis(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|ms| *ms >= 0.0).map(|ms| ms as u64))
        .filter(|ms| *ms > 0)
}

/// Tracks every load deadline started during one orchestration run.
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    /// Parent of every timer token.
    root: CancellationToken,
    /// Number of timers currently armed.
    active: Arc<AtomicUsize>,
}

impl TimerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a timer for `hook_id`.
    pub fn start(&self, hook_id: &str, timeout: Duration) -> Timer {
        self.active.fetch_add(1, Ordering::SeqCst);
        debug!(hook = %hook_id, timeout_ms = timeout.as_millis() as u64, "Load deadline armed");
        Timer {
            token: self.root.child_token(),
            timeout,
            active: self.active.clone(),
        }
    }

    /// Clears every outstanding timer.
    pub fn cancel_all(&self) {
        if !self.root.is_cancelled() {
            debug!(active = self.active(), "Clearing all load deadlines");
        }
        self.root.cancel();
    }

    /// Whether `cancel_all` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Number of timers currently armed.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// A token that is cancelled together with every timer.
    pub fn token(&self) -> CancellationToken {
        self.root.child_token()
    }
}

/// One armed deadline. Disarmed on drop.
#[derive(Debug)]
pub struct Timer {
    token: CancellationToken,
    timeout: Duration,
    active: Arc<AtomicUsize>,
}

impl Timer {
    /// The configured interval.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Races load completions against their deadlines.
#[derive(Debug, Clone)]
pub struct TimeoutGuard {
    timers: TimerRegistry,
}

impl TimeoutGuard {
    /// Creates a guard whose timers are tracked by `timers`.
    pub fn new(timers: TimerRegistry) -> Self {
        Self { timers }
    }

    /// Waits for `completion`, failing with a timeout error if `timeout`
    /// elapses first. With `timeout = None` no deadline is armed.
    ///
    /// If the timer is cleared through [`TimerRegistry::cancel_all`], the
    /// guard keeps waiting without a deadline and never reports a timeout.
    pub async fn guard<F>(
        &self,
        hook_id: &str,
        timeout: Option<Duration>,
        completion: F,
    ) -> AppResult<()>
    where
        F: Future<Output = LoadOutcome>,
    {
        let Some(timeout) = timeout else {
            return completion
                .await
                .map_err(|reason| AppError::hook_load(hook_id, reason));
        };

        let timer = self.timers.start(hook_id, timeout);
        tokio::pin!(completion);

        let outcome = tokio::select! {
            biased;
            outcome = &mut completion => outcome,
            _ = tokio::time::sleep(timer.timeout()) => {
                warn!(
                    hook = %hook_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Hook did not finish loading before its deadline"
                );
                return Err(AppError::hook_timeout(hook_id, timeout));
            }
            _ = timer.token.cancelled() => {
                drop(timer);
                completion.await
            }
        };

        outcome.map_err(|reason| AppError::hook_load(hook_id, reason))
    }
}
