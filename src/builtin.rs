//! Hooks shipped with the Hooklift host.
//!
//! The three bootstrap hooks are always registered. `userhooks` pulls further
//! hooks out of [`catalog`] by the names listed under `settings.userhooks`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use hooklift_core::config::AppConfig;
use hooklift_core::error::AppResult;
use hooklift_hooks::prelude::*;
use hooklift_hooks::HookRegistry;

/// Shared-config key listing the catalog hooks `userhooks` registers.
pub const USER_HOOKS_KEY: &str = "userhooks";

/// Registers the bootstrap hooks.
pub async fn register(registry: &HookRegistry) -> AppResult<()> {
    registry
        .register(
            "moduleloader",
            HookDefinition::from_module(Arc::new(ModuleLoaderHook)),
        )
        .await?;
    registry
        .register(
            "userconfig",
            HookDefinition::factory(FnFactory::new(|app| {
                Arc::new(UserConfigHook {
                    config: app.config.clone(),
                })
            })),
        )
        .await?;
    registry
        .register(
            "userhooks",
            HookDefinition::factory(FnFactory::new(|app| {
                Arc::new(UserHooksHook {
                    config: app.config.clone(),
                    registry: app.registry.clone(),
                })
            })),
        )
        .await?;

    Ok(())
}

/// Looks up an optional hook by name.
pub fn catalog(name: &str) -> Option<HookDefinition> {
    match name {
        "heartbeat" => Some(HookDefinition::factory(FnFactory::new(|app| {
            Arc::new(HeartbeatHook {
                config: app.config.clone(),
            })
        }))),
        _ => None,
    }
}

/// Declares where the host finds its files.
#[derive(Debug)]
struct ModuleLoaderHook;

#[async_trait]
impl HookModule for ModuleLoaderHook {
    fn defaults(&self) -> HookDefaults {
        HookDefaults::Static(json!({
            "paths": {
                "config": "config/user",
            }
        }))
    }

    async fn load(&self, done: Completion) {
        let _ = done.done();
    }
}

/// Overlays the user settings file onto the shared configuration.
#[derive(Debug)]
struct UserConfigHook {
    config: SharedConfig,
}

#[async_trait]
impl HookModule for UserConfigHook {
    fn configure(&self, config: &SharedConfig) -> Result<(), String> {
        match config.get_path(&["paths", "config"]) {
            Some(Value::String(_)) => Ok(()),
            _ => Err("`paths.config` must be a file path".to_string()),
        }
    }

    async fn load(&self, done: Completion) {
        let Some(Value::String(path)) = self.config.get_path(&["paths", "config"]) else {
            let _ = done.fail("`paths.config` is not set");
            return;
        };

        let loaded = tokio::task::spawn_blocking({
            let path = path.clone();
            move || AppConfig::load_settings(&path)
        })
        .await;

        match loaded {
            Ok(Ok(settings)) => {
                info!(path = %path, keys = settings.len(), "User settings loaded");
                self.config.overlay(settings);
                let _ = done.done();
            }
            Ok(Err(e)) => {
                let _ = done.fail(e);
            }
            Err(e) => {
                let _ = done.fail(format!("Settings reader stopped: {e}"));
            }
        }
    }
}

/// Registers catalog hooks named in the shared configuration.
#[derive(Debug)]
struct UserHooksHook {
    config: SharedConfig,
    registry: Arc<HookRegistry>,
}

impl UserHooksHook {
    fn requested(&self) -> Result<Vec<String>, String> {
        match self.config.get(USER_HOOKS_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(names)) => names
                .into_iter()
                .map(|name| match name {
                    Value::String(name) => Ok(name),
                    other => Err(format!("Hook names must be strings, got {other}")),
                })
                .collect(),
            Some(other) => Err(format!("`{USER_HOOKS_KEY}` must be a list, got {other}")),
        }
    }
}

#[async_trait]
impl HookModule for UserHooksHook {
    fn configure(&self, _config: &SharedConfig) -> Result<(), String> {
        self.requested().map(|_| ())
    }

    async fn load(&self, done: Completion) {
        let names = match self.requested() {
            Ok(names) => names,
            Err(reason) => {
                let _ = done.fail(reason);
                return;
            }
        };

        for name in names {
            let Some(definition) = catalog(&name) else {
                let _ = done.fail(format!("Unknown user hook '{name}'"));
                return;
            };
            if let Err(e) = self.registry.register(name.as_str(), definition).await {
                let _ = done.fail(e);
                return;
            }
            debug!(hook = %name, "User hook registered");
        }

        let _ = done.done();
    }
}

/// Logs a heartbeat until the run is cancelled.
#[derive(Debug)]
struct HeartbeatHook {
    config: SharedConfig,
}

fn heartbeat_interval(config: &SharedConfig) -> Option<Duration> {
    config
        .get_path(&["heartbeat", "intervalMs"])
        .and_then(|value| value.as_u64())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[async_trait]
impl HookModule for HeartbeatHook {
    fn defaults(&self) -> HookDefaults {
        HookDefaults::Static(json!({ "__configKey__": { "intervalMs": 30_000 } }))
    }

    fn configure(&self, config: &SharedConfig) -> Result<(), String> {
        heartbeat_interval(config)
            .map(|_| ())
            .ok_or_else(|| "`heartbeat.intervalMs` must be a positive integer".to_string())
    }

    async fn load(&self, done: Completion) {
        let Some(period) = heartbeat_interval(&self.config) else {
            let _ = done.fail("`heartbeat.intervalMs` is not set");
            return;
        };

        let stop = done.cancellation().clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut beats: u64 = 0;
            loop {
                tokio::select! {
                    _ = stop.cancelled() => {
                        debug!(beats, "Heartbeat stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        beats += 1;
                        info!(beats, "Heartbeat");
                    }
                }
            }
        });

        let _ = done.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        assert!(catalog("heartbeat").is_some());
        assert!(catalog("nope").is_none());
    }

    #[test]
    fn test_heartbeat_interval_must_be_positive() {
        let config = SharedConfig::new();
        assert!(heartbeat_interval(&config).is_none());

        config.set("heartbeat", json!({ "intervalMs": 0 }));
        assert!(heartbeat_interval(&config).is_none());

        config.set("heartbeat", json!({ "intervalMs": 250 }));
        assert_eq!(heartbeat_interval(&config), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_requested_user_hooks() {
        let app = AppContext::with_settings(Default::default());
        let hook = UserHooksHook {
            config: app.config.clone(),
            registry: app.registry.clone(),
        };
        assert_eq!(hook.requested(), Ok(Vec::new()));

        app.config.set(USER_HOOKS_KEY, json!(["heartbeat"]));
        assert_eq!(hook.requested(), Ok(vec!["heartbeat".to_string()]));

        app.config.set(USER_HOOKS_KEY, json!("heartbeat"));
        assert!(hook.requested().is_err());
    }

    #[tokio::test]
    async fn test_userhooks_registers_from_catalog() {
        let mut settings = serde_json::Map::new();
        settings.insert(USER_HOOKS_KEY.to_string(), json!(["heartbeat"]));
        let app = AppContext::with_settings(settings);
        register(&app.registry).await.expect("register builtins");

        let report = hooklift_hooks::HookOrchestrator::new(
            app.clone(),
            Arc::new(hooklift_hooks::NoopObserver),
        )
        .run()
        .await
        .expect("run");

        assert!(report.is_loaded("userhooks"));
        assert!(report.is_loaded("heartbeat"));
        assert_eq!(
            app.config.get_path(&["heartbeat", "intervalMs"]),
            Some(json!(30_000))
        );
    }

    #[tokio::test]
    async fn test_unknown_user_hook_fails_the_run() {
        let mut settings = serde_json::Map::new();
        settings.insert(USER_HOOKS_KEY.to_string(), json!(["nope"]));
        let app = AppContext::with_settings(settings);
        register(&app.registry).await.expect("register builtins");

        let err = hooklift_hooks::HookOrchestrator::new(app, Arc::new(hooklift_hooks::NoopObserver))
            .run()
            .await
            .expect_err("unknown hook");

        assert_eq!(err.hook_id.as_deref(), Some("userhooks"));
    }
}
