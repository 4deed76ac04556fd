//! Hook orchestrator: brings every registered hook from raw definition to
//! loaded.
//!
//! Stages, each finishing before the next starts:
//!
//! 1. `moduleloader`, 2. `userconfig`, 3. `userhooks`: bootstrap hooks,
//!    strictly sequential (prepare, defaults, configure, load).
//! 4. validate: reserved ids (`controllers`) are dropped.
//! 5. prepare, 6. defaults, 7. configure, 8. load: every remaining hook,
//!    concurrently within the stage.
//!
//! The first error aborts the run. Hooks already in flight are not stopped;
//! the orchestrator only clears all load deadlines and stops waiting for
//! them, so their late results and side effects are disregarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, yield_now};
use tracing::{debug, error, info, trace};

use hooklift_core::error::{AppError, AppResult};

use crate::api::context::AppContext;
use crate::hooks::completion::{Completion, LoadOutcome};
use crate::hooks::entity::{Hook, HookState};
use crate::observer::HookObserver;
use crate::stages::{defaults, preparer};
use crate::timeout::{self, TimeoutGuard, TimerRegistry};

/// Privileged hooks, loaded one after another before any other hook.
pub const BOOTSTRAP_HOOKS: [&str; 3] = ["moduleloader", "userconfig", "userhooks"];

/// Whether `id` is one of the bootstrap hooks.
pub fn is_bootstrap(id: &str) -> bool {
    BOOTSTRAP_HOOKS.contains(&id)
}

/// A hook that reached `Loaded`.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedHook {
    /// Hook identity.
    pub id: String,
    /// Time between the start of `load` and its completion.
    pub elapsed_ms: u64,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Loaded hooks, in completion order.
    pub loaded: Vec<LoadedHook>,
    /// Ids dropped because they were disabled or reserved.
    pub removed: Vec<String>,
    /// Wall time of the whole run.
    pub elapsed_ms: u64,
}

impl LoadReport {
    /// Whether `id` was loaded.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.loaded.iter().any(|hook| hook.id == id)
    }

    fn record_loaded(&mut self, id: &str, elapsed: Duration) {
        self.loaded.push(LoadedHook {
            id: id.to_string(),
            elapsed_ms: elapsed.as_millis() as u64,
        });
    }
}

/// Runs the hook lifecycle once for an application startup.
#[derive(Debug)]
pub struct HookOrchestrator {
    /// Shared configuration and registry.
    app: AppContext,
    /// Receives `loaded` / `error` notifications.
    observer: Arc<dyn HookObserver>,
    /// Ids removed during the validate stage.
    reserved: Vec<String>,
    /// Every load deadline started during the run.
    timers: TimerRegistry,
    /// Deadline enforcement.
    guard: TimeoutGuard,
    /// Set once `run` has been called.
    started: AtomicBool,
}

impl HookOrchestrator {
    /// Creates an orchestrator over `app`, reporting to `observer`.
    pub fn new(app: AppContext, observer: Arc<dyn HookObserver>) -> Self {
        let timers = TimerRegistry::new();
        Self {
            app,
            observer,
            reserved: vec!["controllers".to_string()],
            guard: TimeoutGuard::new(timers.clone()),
            timers,
            started: AtomicBool::new(false),
        }
    }

    /// Replaces the list of reserved ids dropped during validation.
    pub fn with_reserved(mut self, reserved: Vec<String>) -> Self {
        self.reserved = reserved;
        self
    }

    /// The application context hooks are prepared with.
    pub fn app(&self) -> &AppContext {
        &self.app
    }

    /// The timers tracked for this run.
    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    /// Runs every stage. Returns the first error encountered.
    pub async fn run(&self) -> AppResult<LoadReport> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AppError::internal("Hook orchestrator can only run once"));
        }

        let started = Instant::now();
        let mut report = LoadReport::default();
        let registry = &self.app.registry;

        preparer::validate_bootstrap(registry).await?;
        report.removed.extend(registry.remove_disabled().await);

        for id in BOOTSTRAP_HOOKS {
            self.bootstrap(id, &mut report).await?;
        }

        report.removed.extend(self.validate().await);

        let hooks = self.prepare_all(&mut report).await?;
        self.apply_all_defaults(&hooks).await;
        self.configure_all(&hooks).await?;
        self.load_all(&hooks, &mut report).await?;

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            loaded = report.loaded.len(),
            removed = report.removed.len(),
            elapsed_ms = report.elapsed_ms,
            "All hooks loaded"
        );

        Ok(report)
    }

    async fn bootstrap(&self, id: &str, report: &mut LoadReport) -> AppResult<()> {
        if !self.app.registry.contains(id).await {
            trace!(hook = %id, "Bootstrap hook not registered, skipping");
            return Ok(());
        }

        let Some(hook) = preparer::prepare(id, &self.app).await? else {
            report.removed.push(id.to_string());
            return Ok(());
        };

        defaults::apply_defaults(&hook, &self.app.config);
        self.configure_hook(&hook)?;
        let elapsed = self.load_hook(&hook).await?;
        report.record_loaded(hook.id(), elapsed);

        Ok(())
    }

    async fn validate(&self) -> Vec<String> {
        let mut removed = Vec::new();

        for id in &self.reserved {
            if self.app.registry.remove(id).await.is_some() {
                info!(
                    hook = %id,
                    "`{}` is no longer a hook: routing handles it directly. Ignoring its definition.",
                    id
                );
                debug!(
                    hook = %id,
                    "Remove `{}` from the registered hooks (or set it to false) to silence this notice",
                    id
                );
                removed.push(id.clone());
            }
        }

        removed
    }

    async fn prepare_all(&self, report: &mut LoadReport) -> AppResult<Vec<Arc<Hook>>> {
        let registry = &self.app.registry;

        // `userhooks` may have registered more definitions, including disabled ones.
        report.removed.extend(registry.remove_disabled().await);

        let ids: Vec<String> = registry
            .ids()
            .await
            .into_iter()
            .filter(|id| !is_bootstrap(id))
            .collect();

        debug!(count = ids.len(), "Preparing hooks");

        let results = join_all(ids.iter().map(|id| async move {
            yield_now().await;
            preparer::prepare(id, &self.app).await
        }))
        .await;

        let mut hooks = Vec::with_capacity(results.len());
        for (id, result) in ids.iter().zip(results) {
            match result? {
                Some(hook) => hooks.push(hook),
                None => report.removed.push(id.clone()),
            }
        }

        Ok(hooks)
    }

    async fn apply_all_defaults(&self, hooks: &[Arc<Hook>]) {
        join_all(hooks.iter().map(|hook| async move {
            yield_now().await;
            defaults::apply_defaults(hook, &self.app.config);
        }))
        .await;
    }

    async fn configure_all(&self, hooks: &[Arc<Hook>]) -> AppResult<()> {
        let results = join_all(hooks.iter().map(|hook| async move {
            yield_now().await;
            self.configure_hook(hook)
        }))
        .await;

        results.into_iter().collect()
    }

    fn configure_hook(&self, hook: &Hook) -> AppResult<()> {
        match hook.module().configure(&self.app.config) {
            Ok(()) => {
                hook.advance(HookState::Configured);
                Ok(())
            }
            Err(reason) => {
                hook.advance(HookState::Failed);
                error!(hook = %hook.id(), error = %reason, "Hook failed to configure");
                Err(AppError::hook_configure(hook.id(), reason))
            }
        }
    }

    async fn load_all(&self, hooks: &[Arc<Hook>], report: &mut LoadReport) -> AppResult<()> {
        let mut loading: FuturesUnordered<_> = hooks
            .iter()
            .map(|hook| async move {
                yield_now().await;
                (hook, self.load_hook(hook).await)
            })
            .collect();

        while let Some((hook, result)) = loading.next().await {
            let elapsed = result?;
            report.record_loaded(hook.id(), elapsed);
        }

        Ok(())
    }

    async fn load_hook(&self, hook: &Hook) -> AppResult<Duration> {
        let id = hook.id();
        let deadline = timeout::timeout_for(hook, &self.app.config);

        trace!(hook = %id, "Loading hook");
        hook.advance(HookState::Loading);
        let started = Instant::now();

        let (completion, receiver) = Completion::channel(id, self.timers.token());
        let module = hook.module().clone();
        let task = tokio::spawn(async move { module.load(completion).await });

        let result = self
            .guard
            .guard(id, deadline, wait_for_completion(id, task, receiver))
            .await;

        match result {
            Ok(()) => {
                let elapsed = started.elapsed();
                hook.advance(HookState::Loaded);
                info!(
                    hook = %id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Hook loaded successfully"
                );
                self.observer.on_hook_loaded(id);
                Ok(elapsed)
            }
            Err(err) => {
                self.timers.cancel_all();
                hook.advance(HookState::Failed);
                error!(hook = %id, error = %err, "Hook failed to load");
                self.observer.on_hook_error(id, &err);
                Err(err)
            }
        }
    }
}

const LOAD_PANICKED: &str = "load panicked before signalling completion";

/// Waits for the hook's completion signal.
///
/// A load task that panics before signalling is reported as a failure. A
/// signal that never comes (including every handle being dropped) leaves
/// the future pending so the deadline decides.
async fn wait_for_completion(
    hook_id: &str,
    mut task: JoinHandle<()>,
    mut receiver: oneshot::Receiver<LoadOutcome>,
) -> LoadOutcome {
    let mut joined = false;
    let received = tokio::select! {
        biased;
        received = &mut receiver => received,
        result = &mut task => {
            if result.is_err_and(|err| err.is_panic()) {
                return Err(LOAD_PANICKED.to_string());
            }
            joined = true;
            (&mut receiver).await
        }
    };

    if let Ok(outcome) = received {
        return outcome;
    }

    // Completion handles drop while a panic unwinds; the task tells them apart.
    if !joined && task.await.is_err_and(|err| err.is_panic()) {
        return Err(LOAD_PANICKED.to_string());
    }

    debug!(hook = %hook_id, "Load completion dropped without a signal");
    std::future::pending().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_ids() {
        assert!(is_bootstrap("moduleloader"));
        assert!(is_bootstrap("userconfig"));
        assert!(is_bootstrap("userhooks"));
        assert!(!is_bootstrap("controllers"));
    }

    #[test]
    fn test_report_lookup() {
        let mut report = LoadReport::default();
        report.record_loaded("orm", Duration::from_millis(12));
        assert!(report.is_loaded("orm"));
        assert!(!report.is_loaded("views"));
        assert_eq!(report.loaded[0].elapsed_ms, 12);
    }
}
