//! Shared test helpers for orchestrator integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use hooklift_core::error::AppError;
use hooklift_hooks::prelude::*;
use hooklift_hooks::{HookObserver, HookOrchestrator};

/// Observer recording bus-style event names.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn saw(&self, name: &str) -> bool {
        self.events.lock().iter().any(|event| event == name)
    }
}

impl HookObserver for RecordingObserver {
    fn on_hook_loaded(&self, hook_id: &str) {
        self.events.lock().push(format!("hook:{hook_id}:loaded"));
    }

    fn on_hook_error(&self, hook_id: &str, _error: &AppError) {
        self.events.lock().push(format!("hook:{hook_id}:error"));
    }
}

/// Ordered log of what hooks did.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn position(&self, entry: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("journal has no entry `{entry}`"))
    }
}

/// Test harness: an app context, a recording observer, and an orchestrator
/// built on demand.
pub struct TestApp {
    pub app: AppContext,
    pub observer: Arc<RecordingObserver>,
}

impl TestApp {
    pub fn new(settings: Value) -> Self {
        let settings = match settings {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            app: AppContext::with_settings(settings),
            observer: Arc::new(RecordingObserver::default()),
        }
    }

    pub async fn register(&self, id: &str, definition: HookDefinition) {
        self.app
            .registry
            .register(id, definition)
            .await
            .expect("register hook");
    }

    pub fn orchestrator(&self) -> HookOrchestrator {
        HookOrchestrator::new(self.app.clone(), self.observer.clone())
    }
}

/// A hook whose load journals its start and end around `delay`.
pub fn journaled(journal: &Journal, name: &str, delay: Duration) -> HookDefinition {
    let journal = journal.clone();
    let name = name.to_string();
    HookDefinition::from_module(
        ClosureModule::builder()
            .load(move |done| {
                let journal = journal.clone();
                let name = name.clone();
                async move {
                    journal.push(format!("start:{name}"));
                    tokio::time::sleep(delay).await;
                    journal.push(format!("end:{name}"));
                    let _ = done.done();
                }
            })
            .build(),
    )
}

/// A hook that loads immediately.
pub fn plain() -> HookDefinition {
    HookDefinition::from_module(ClosureModule::builder().build())
}

/// A hook whose load holds its completion forever without signalling.
pub fn never_completes() -> HookDefinition {
    HookDefinition::from_module(
        ClosureModule::builder()
            .load(|done| async move {
                std::future::pending::<()>().await;
                drop(done);
            })
            .build(),
    )
}

/// A hook whose load fails after `delay`.
pub fn fails_after(delay: Duration, reason: &'static str) -> HookDefinition {
    HookDefinition::from_module(
        ClosureModule::builder()
            .load(move |done| async move {
                tokio::time::sleep(delay).await;
                let _ = done.fail(reason);
            })
            .build(),
    )
}

/// A factory that counts how many times it was invoked.
pub fn counted(counter: &Arc<AtomicUsize>) -> HookDefinition {
    let counter = counter.clone();
    HookDefinition::factory(FnFactory::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        ClosureModule::builder().build()
    }))
}

/// A hook that counts how many times its load was invoked.
pub fn counted_load(counter: &Arc<AtomicUsize>) -> HookDefinition {
    let counter = counter.clone();
    HookDefinition::from_module(
        ClosureModule::builder()
            .load(move |done| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    let _ = done.done();
                }
            })
            .build(),
    )
}
