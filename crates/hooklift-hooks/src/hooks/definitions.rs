//! Hook definitions: the raw input the orchestrator starts from, and the
//! capability traits a hook implements.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::completion::Completion;
use crate::api::config::SharedConfig;
use crate::api::context::AppContext;

/// A raw entry in the hook registry, before preparation.
#[derive(Clone)]
pub enum HookDefinition {
    /// A factory producing the hook module from the application context.
    Factory(Arc<dyn HookFactory>),
    /// A folder-style module; its `index` entry is the effective definition.
    Module(BTreeMap<String, HookDefinition>),
    /// A plain configuration value. `false` and `"false"` disable the hook;
    /// anything else cannot be resolved to a factory.
    Value(Value),
}

impl HookDefinition {
    /// A definition that disables the hook registered under its id.
    pub fn disabled() -> Self {
        Self::Value(Value::Bool(false))
    }

    /// Wraps a factory.
    pub fn factory(factory: impl HookFactory + 'static) -> Self {
        Self::Factory(Arc::new(factory))
    }

    /// Wraps a ready-made module in a factory that always returns it.
    pub fn from_module(module: Arc<dyn HookModule>) -> Self {
        Self::factory(FnFactory::new(move |_| module.clone()))
    }

    /// Whether this definition disables its hook.
    pub fn is_disabled(&self) -> bool {
        match self {
            Self::Value(Value::Bool(false)) => true,
            Self::Value(Value::String(s)) => s == "false",
            _ => false,
        }
    }

    /// Short description used in log lines and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Factory(_) => "factory".to_string(),
            Self::Module(entries) => {
                let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
                format!("module {{{}}}", keys.join(", "))
            }
            Self::Value(value) => format!("value `{value}`"),
        }
    }
}

impl std::fmt::Debug for HookDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Factory(factory) => f
                .debug_struct("Factory")
                .field("config_key", &factory.config_key())
                .finish(),
            Self::Module(entries) => f.debug_tuple("Module").field(entries).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<Value> for HookDefinition {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Produces a hook module from the application context.
pub trait HookFactory: Send + Sync {
    /// The config section this hook's settings live under, if it declares
    /// one. Read before the factory is invoked.
    fn config_key(&self) -> Option<String> {
        None
    }

    /// Builds the hook module.
    fn create(&self, app: &AppContext) -> Arc<dyn HookModule>;
}

/// Configuration defaults declared by a hook.
#[derive(Clone, Default)]
pub enum HookDefaults {
    /// The hook declares no defaults.
    #[default]
    None,
    /// A fixed defaults object.
    Static(Value),
    /// Defaults computed from a snapshot of the shared configuration.
    Dynamic(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
}

impl std::fmt::Debug for HookDefaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Dynamic(_) => write!(f, "Dynamic(<fn>)"),
        }
    }
}

/// The capabilities of a loaded hook. Every capability is optional.
#[async_trait]
pub trait HookModule: Send + Sync {
    /// Defaults to merge into the shared configuration.
    fn defaults(&self) -> HookDefaults {
        HookDefaults::None
    }

    /// Synchronous configuration step, run after all defaults are merged.
    fn configure(&self, _config: &SharedConfig) -> Result<(), String> {
        Ok(())
    }

    /// Loads the hook. Must signal `done` exactly once.
    async fn load(&self, done: Completion) {
        let _ = done.done();
    }
}

/// Closure-backed [`HookFactory`].
pub struct FnFactory {
    /// Declared config key.
    config_key: Option<String>,
    /// Module constructor.
    create: Arc<dyn Fn(&AppContext) -> Arc<dyn HookModule> + Send + Sync>,
}

impl FnFactory {
    /// Creates a factory from a constructor closure.
    pub fn new<F>(create: F) -> Self
    where
        F: Fn(&AppContext) -> Arc<dyn HookModule> + Send + Sync + 'static,
    {
        Self {
            config_key: None,
            create: Arc::new(create),
        }
    }

    /// Declares the config section for the hook.
    pub fn with_config_key(mut self, config_key: impl Into<String>) -> Self {
        self.config_key = Some(config_key.into());
        self
    }
}

impl HookFactory for FnFactory {
    fn config_key(&self) -> Option<String> {
        self.config_key.clone()
    }

    fn create(&self, app: &AppContext) -> Arc<dyn HookModule> {
        (self.create)(app)
    }
}
