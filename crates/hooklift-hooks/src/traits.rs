//! Closure-based hook modules for declaring hooks without new types.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::config::SharedConfig;
use crate::hooks::completion::Completion;
use crate::hooks::definitions::{HookDefaults, HookModule};

type ConfigureFn = Arc<dyn Fn(&SharedConfig) -> Result<(), String> + Send + Sync>;

type LoadFn =
    Arc<dyn Fn(Completion) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> + Send + Sync>;

/// A [`HookModule`] assembled from closures.
///
/// ```rust,ignore
/// let module = ClosureModule::builder()
///     .defaults(json!({ "__configKey__": { "enabled": true } }))
///     .configure(|config| Ok(()))
///     .load(|done| async move { let _ = done.done(); })
///     .build();
/// ```
#[derive(Default)]
pub struct ClosureModule {
    /// Declared defaults.
    defaults: HookDefaults,
    /// Configure step.
    configure: Option<ConfigureFn>,
    /// Load step.
    load: Option<LoadFn>,
}

impl std::fmt::Debug for ClosureModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureModule")
            .field("defaults", &self.defaults)
            .field("configure", &self.configure.as_ref().map(|_| "<closure>"))
            .field("load", &self.load.as_ref().map(|_| "<closure>"))
            .finish()
    }
}

impl ClosureModule {
    /// Starts building a module.
    pub fn builder() -> ClosureModuleBuilder {
        ClosureModuleBuilder {
            module: Self::default(),
        }
    }
}

#[async_trait]
impl HookModule for ClosureModule {
    fn defaults(&self) -> HookDefaults {
        self.defaults.clone()
    }

    fn configure(&self, config: &SharedConfig) -> Result<(), String> {
        match &self.configure {
            Some(configure) => configure(config),
            None => Ok(()),
        }
    }

    async fn load(&self, done: Completion) {
        match &self.load {
            Some(load) => load(done).await,
            None => {
                let _ = done.done();
            }
        }
    }
}

/// Builder for [`ClosureModule`].
#[derive(Debug)]
pub struct ClosureModuleBuilder {
    module: ClosureModule,
}

impl ClosureModuleBuilder {
    /// Fixed defaults object.
    pub fn defaults(mut self, defaults: Value) -> Self {
        self.module.defaults = HookDefaults::Static(defaults);
        self
    }

    /// Defaults computed from the shared configuration.
    pub fn defaults_with<F>(mut self, compute: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.module.defaults = HookDefaults::Dynamic(Arc::new(compute));
        self
    }

    /// Configure step.
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: Fn(&SharedConfig) -> Result<(), String> + Send + Sync + 'static,
    {
        self.module.configure = Some(Arc::new(configure));
        self
    }

    /// Load step. The closure must eventually signal the completion it receives.
    pub fn load<F, Fut>(mut self, load: F) -> Self
    where
        F: Fn(Completion) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.module.load = Some(Arc::new(move |done| Box::pin(load(done))));
        self
    }

    /// Finishes the module.
    pub fn build(self) -> Arc<dyn HookModule> {
        Arc::new(self.module)
    }
}
