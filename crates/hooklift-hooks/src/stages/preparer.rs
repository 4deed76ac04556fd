//! Preparer: turns raw registry definitions into prepared [`Hook`]s.

use std::sync::Arc;

use tracing::{debug, error};

use hooklift_core::error::{AppError, AppResult};

use crate::api::context::AppContext;
use crate::hooks::definitions::{HookDefinition, HookFactory};
use crate::hooks::entity::Hook;
use crate::registry::{HookRegistry, RegistryEntry};

/// Entry used when a folder-style module is registered.
pub const MODULE_INDEX: &str = "index";

/// Checks the structural constraints between bootstrap hooks.
///
/// `userconfig` relies on `moduleloader` to locate user configuration, so it
/// may only be registered together with it.
pub async fn validate_bootstrap(registry: &HookRegistry) -> AppResult<()> {
    if registry.is_active("userconfig").await && !registry.is_active("moduleloader").await {
        return Err(AppError::invalid_configuration(
            "Invalid configuration: the `userconfig` hook cannot be used without the \
             `moduleloader` hook. Enable `moduleloader` or disable `userconfig`.",
        ));
    }
    Ok(())
}

/// Prepares the hook registered under `id`.
///
/// Returns `Ok(None)` when the id is disabled (directly or through its
/// namespace prefix); the id is then removed from the registry. An already
/// prepared hook is returned as is.
pub async fn prepare(id: &str, app: &AppContext) -> AppResult<Option<Arc<Hook>>> {
    let registry = &app.registry;

    let definition = match registry.get(id).await {
        None => return Ok(None),
        Some(RegistryEntry::Hook(hook)) => return Ok(Some(hook)),
        Some(RegistryEntry::Definition(definition)) => definition,
    };

    if definition.is_disabled() || registry.is_disabled(id).await {
        registry.remove(id).await;
        debug!(hook = %id, "Hook disabled, removed from registry");
        return Ok(None);
    }

    let factory = resolve_factory(id, definition)?;

    let config_key = factory
        .config_key()
        .unwrap_or_else(|| id.to_lowercase());
    let module = factory.create(app);

    let hook = Arc::new(Hook::new(id, config_key, module));
    registry.store_hook(id, hook.clone()).await;

    debug!(
        hook = %hook.id(),
        config_key = %hook.config_key(),
        "Hook prepared"
    );

    Ok(Some(hook))
}

fn resolve_factory(id: &str, definition: HookDefinition) -> AppResult<Arc<dyn HookFactory>> {
    let effective = match definition {
        HookDefinition::Module(mut entries) => match entries.remove(MODULE_INDEX) {
            Some(index) => index,
            None => return Err(malformed(id, "module has no `index` entry")),
        },
        other => other,
    };

    match effective {
        HookDefinition::Factory(factory) => Ok(factory),
        other => Err(malformed(id, &format!("found {}", other.describe()))),
    }
}

fn malformed(id: &str, detail: &str) -> AppError {
    error!(
        hook = %id,
        detail = %detail,
        "Malformed hook: definition must resolve to a factory taking the application context"
    );
    AppError::malformed_hook(
        id,
        format!(
            "Malformed hook '{id}': the definition must resolve to a factory \
             taking the application context ({detail})"
        ),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::hooks::definitions::{FnFactory, HookModule};
    use crate::hooks::entity::HookState;
    use hooklift_core::error::ErrorKind;
    use serde_json::json;

    struct Empty;
    impl HookModule for Empty {}

    fn factory() -> HookDefinition {
        HookDefinition::factory(FnFactory::new(|_| Arc::new(Empty) as Arc<dyn HookModule>))
    }

    #[tokio::test]
    async fn test_prepare_stamps_identity_and_config_key() {
        let app = AppContext::default();
        app.registry.set_definition("Orm", factory()).await;

        let hook = prepare("Orm", &app).await.expect("prepare").expect("hook");
        assert_eq!(hook.identity(), "orm");
        assert_eq!(hook.config_key(), "orm");
        assert_eq!(hook.state(), HookState::Prepared);
        assert!(app.registry.hook("Orm").await.is_some());
    }

    #[tokio::test]
    async fn test_prepare_uses_declared_config_key() {
        let app = AppContext::default();
        let def = HookDefinition::factory(
            FnFactory::new(|_| Arc::new(Empty) as Arc<dyn HookModule>).with_config_key("models"),
        );
        app.registry.set_definition("orm", def).await;

        let hook = prepare("orm", &app).await.expect("prepare").expect("hook");
        assert_eq!(hook.config_key(), "models");
    }

    #[tokio::test]
    async fn test_disabled_hook_is_removed() {
        let app = AppContext::default();
        app.registry.set_definition("bar", HookDefinition::disabled()).await;
        app.registry
            .set_definition("baz", HookDefinition::from(json!("false")))
            .await;

        assert!(prepare("bar", &app).await.expect("prepare").is_none());
        assert!(prepare("baz", &app).await.expect("prepare").is_none());
        assert_eq!(app.registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_disabled_namespace_removes_members() {
        let app = AppContext::default();
        app.registry.set_definition("sockets", HookDefinition::disabled()).await;
        app.registry.set_definition("sockets.redis", factory()).await;

        assert!(prepare("sockets.redis", &app).await.expect("prepare").is_none());
        assert!(!app.registry.contains("sockets.redis").await);
    }

    #[tokio::test]
    async fn test_folder_module_uses_index() {
        let app = AppContext::default();
        let mut entries = BTreeMap::new();
        entries.insert(MODULE_INDEX.to_string(), factory());
        app.registry
            .set_definition("views", HookDefinition::Module(entries))
            .await;

        let hook = prepare("views", &app).await.expect("prepare").expect("hook");
        assert_eq!(hook.identity(), "views");
    }

    #[tokio::test]
    async fn test_malformed_definitions_fail() {
        let app = AppContext::default();
        app.registry
            .set_definition("weird", HookDefinition::from(json!({ "load": 1 })))
            .await;
        app.registry
            .set_definition("noindex", HookDefinition::Module(BTreeMap::new()))
            .await;

        let err = prepare("weird", &app).await.expect_err("malformed");
        assert_eq!(err.kind, ErrorKind::MalformedHook);
        assert_eq!(err.hook_id.as_deref(), Some("weird"));

        let err = prepare("noindex", &app).await.expect_err("malformed");
        assert_eq!(err.kind, ErrorKind::MalformedHook);
    }

    #[tokio::test]
    async fn test_userconfig_requires_moduleloader() {
        let app = AppContext::default();
        app.registry.set_definition("userconfig", factory()).await;

        let err = validate_bootstrap(&app.registry).await.expect_err("invalid");
        assert_eq!(err.kind, ErrorKind::InvalidConfiguration);

        app.registry.set_definition("moduleloader", factory()).await;
        assert!(validate_bootstrap(&app.registry).await.is_ok());
    }
}
