//! Defaults merger: fills shared configuration with each hook's defaults.

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::api::config::SharedConfig;
use crate::hooks::definitions::HookDefaults;
use crate::hooks::entity::{Hook, HookState};

/// Key a hook may use in its defaults to mean "my own config section".
pub const CONFIG_KEY_PLACEHOLDER: &str = "__configKey__";

/// Merges `hook`'s defaults into `config` without touching existing values.
pub fn apply_defaults(hook: &Hook, config: &SharedConfig) {
    let resolved = match hook.module().defaults() {
        HookDefaults::None => Map::new(),
        HookDefaults::Static(value) => into_object(hook, value),
        HookDefaults::Dynamic(compute) => into_object(hook, compute(&config.snapshot())),
    };

    let resolved = rewrite_placeholder(resolved, hook.config_key());
    trace!(hook = %hook.id(), keys = resolved.len(), "Merging hook defaults");

    config.merge_defaults(resolved);
    hook.advance(HookState::DefaultsApplied);
}

/// Moves the value under [`CONFIG_KEY_PLACEHOLDER`] to `config_key`.
pub fn rewrite_placeholder(mut defaults: Map<String, Value>, config_key: &str) -> Map<String, Value> {
    if let Some(own) = defaults.remove(CONFIG_KEY_PLACEHOLDER) {
        defaults.insert(config_key.to_string(), own);
    }
    defaults
}

fn into_object(hook: &Hook, value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            warn!(
                hook = %hook.id(),
                defaults = %other,
                "Hook defaults are not an object, ignoring"
            );
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::hooks::definitions::HookModule;
    use serde_json::json;

    struct WithDefaults(HookDefaults);

    impl HookModule for WithDefaults {
        fn defaults(&self) -> HookDefaults {
            self.0.clone()
        }
    }

    fn hook(config_key: &str, defaults: HookDefaults) -> Hook {
        Hook::new("sample", config_key, Arc::new(WithDefaults(defaults)))
    }

    fn config(value: Value) -> SharedConfig {
        match value {
            Value::Object(map) => SharedConfig::from_map(map),
            _ => SharedConfig::new(),
        }
    }

    #[test]
    fn test_static_defaults_fill_missing_keys() {
        let shared = config(json!({ "a": 1 }));
        let hook = hook("sample", HookDefaults::Static(json!({ "a": 2, "b": 3 })));

        apply_defaults(&hook, &shared);

        assert_eq!(shared.snapshot(), json!({ "a": 1, "b": 3 }));
        assert_eq!(hook.state(), HookState::DefaultsApplied);
    }

    #[test]
    fn test_dynamic_defaults_see_current_config() {
        let shared = config(json!({ "environment": "production" }));
        let hook = hook(
            "sample",
            HookDefaults::Dynamic(Arc::new(|current| {
                let migrate = if current["environment"] == "production" {
                    "safe"
                } else {
                    "alter"
                };
                json!({ "models": { "migrate": migrate } })
            })),
        );

        apply_defaults(&hook, &shared);

        assert_eq!(shared.get_path(&["models", "migrate"]), Some(json!("safe")));
    }

    #[test]
    fn test_placeholder_moves_to_config_key() {
        let shared = config(json!({ "blueprints": { "rest": false } }));
        let hook = hook(
            "blueprints",
            HookDefaults::Static(json!({
                "__configKey__": { "rest": true, "prefix": "/api" }
            })),
        );

        apply_defaults(&hook, &shared);

        assert_eq!(
            shared.snapshot(),
            json!({ "blueprints": { "rest": false, "prefix": "/api" } })
        );
    }

    #[test]
    fn test_missing_and_non_object_defaults_are_empty() {
        let shared = config(json!({ "a": 1 }));

        apply_defaults(&hook("sample", HookDefaults::None), &shared);
        apply_defaults(&hook("sample", HookDefaults::Static(json!([1, 2]))), &shared);

        assert_eq!(shared.snapshot(), json!({ "a": 1 }));
    }
}
