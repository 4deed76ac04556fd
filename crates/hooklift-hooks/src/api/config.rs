//! Shared configuration handle passed to every hook.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Process-wide configuration owned by the host and mutated by hooks.
///
/// Cloning is cheap: every clone refers to the same underlying object. The
/// lock is never held across an await point.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Map<String, Value>>>,
}

impl SharedConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration seeded with `settings`.
    pub fn from_map(settings: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Returns a copy of a top-level value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    /// Returns a copy of the value found by walking `path` through nested objects.
    pub fn get_path(&self, path: &[&str]) -> Option<Value> {
        let (first, rest) = path.split_first()?;
        let inner = self.inner.read();
        let mut current = inner.get(*first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current.clone())
    }

    /// Whether a top-level key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Sets a top-level value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.write().insert(key.into(), value)
    }

    /// Returns the whole configuration as a JSON object.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.inner.read().clone())
    }

    /// Fills in every key of `defaults` that is missing, at any depth.
    ///
    /// Existing values are never replaced. The whole merge happens under a
    /// single write lock, so concurrent merges converge to the same result
    /// regardless of interleaving.
    pub fn merge_defaults(&self, defaults: Map<String, Value>) {
        let mut inner = self.inner.write();
        fill_missing(&mut inner, defaults);
    }

    /// Deep-merges `overlay` over the configuration; overlay values win.
    ///
    /// Used for user-supplied settings, which take precedence over anything
    /// already present.
    pub fn overlay(&self, overlay: Map<String, Value>) {
        let mut inner = self.inner.write();
        overwrite(&mut inner, overlay);
    }
}

fn fill_missing(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            None => {
                target.insert(key, value);
            }
            Some(Value::Object(existing)) => {
                if let Value::Object(nested) = value {
                    fill_missing(existing, nested);
                }
            }
            Some(_) => {}
        }
    }
}

fn overwrite(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => overwrite(existing, nested),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_merge_never_overwrites() {
        let config = SharedConfig::from_map(object(json!({ "a": 1 })));
        config.merge_defaults(object(json!({ "a": 2, "b": 3 })));
        assert_eq!(config.snapshot(), json!({ "a": 1, "b": 3 }));
    }

    #[test]
    fn test_merge_fills_nested_keys_only() {
        let config = SharedConfig::from_map(object(json!({
            "views": { "engine": "handlebars" },
            "port": 8080
        })));
        config.merge_defaults(object(json!({
            "views": { "engine": "ejs", "layout": "layout" },
            "port": { "nested": true }
        })));

        assert_eq!(
            config.snapshot(),
            json!({
                "views": { "engine": "handlebars", "layout": "layout" },
                "port": 8080
            })
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let defaults = object(json!({ "orm": { "migrate": "safe", "pool": { "max": 10 } } }));
        let once = SharedConfig::from_map(object(json!({ "orm": { "pool": { "min": 1 } } })));
        once.merge_defaults(defaults.clone());
        let twice = SharedConfig::from_map(object(json!({ "orm": { "pool": { "min": 1 } } })));
        twice.merge_defaults(defaults.clone());
        twice.merge_defaults(defaults);

        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn test_null_counts_as_present() {
        let config = SharedConfig::from_map(object(json!({ "session": null })));
        config.merge_defaults(object(json!({ "session": { "secret": "x" } })));
        assert_eq!(config.get("session"), Some(Value::Null));
    }

    #[test]
    fn test_overlay_wins() {
        let config = SharedConfig::from_map(object(json!({ "log": { "level": "info", "color": true } })));
        config.overlay(object(json!({ "log": { "level": "silly" } })));
        assert_eq!(
            config.snapshot(),
            json!({ "log": { "level": "silly", "color": true } })
        );
    }

    #[test]
    fn test_get_path() {
        let config = SharedConfig::from_map(object(json!({ "orm": { "_hookTimeout": 50 } })));
        assert_eq!(config.get_path(&["orm", "_hookTimeout"]), Some(json!(50)));
        assert_eq!(config.get_path(&["orm", "missing"]), None);
        assert_eq!(config.get_path(&[]), None);
    }
}
