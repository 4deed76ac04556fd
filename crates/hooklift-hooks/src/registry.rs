//! Hook registry: raw definitions and prepared hooks keyed by id.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use hooklift_core::error::{AppError, AppResult};

use crate::hooks::definitions::HookDefinition;
use crate::hooks::entity::{Hook, HookState};

/// One slot in the registry.
#[derive(Debug, Clone)]
pub enum RegistryEntry {
    /// Not yet prepared.
    Definition(HookDefinition),
    /// Prepared hook.
    Hook(Arc<Hook>),
}

impl RegistryEntry {
    /// Whether this entry is a definition that disables its hook.
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Definition(def) if def.is_disabled())
    }
}

/// Registry contents behind one lock.
#[derive(Debug, Default)]
struct Entries {
    /// Hook id → entry.
    hooks: BTreeMap<String, RegistryEntry>,
    /// Ids swept as disabled. They stay disabled, along with their
    /// namespace members, for the rest of the run.
    disabled: BTreeSet<String>,
}

impl Entries {
    fn disables(&self, key: &str) -> bool {
        self.disabled.contains(key) || self.hooks.get(key).is_some_and(RegistryEntry::is_disabled)
    }

    fn is_disabled(&self, id: &str) -> bool {
        self.disables(id) || namespace(id).is_some_and(|prefix| self.disables(prefix))
    }
}

/// Registry of all hooks taking part in one orchestration run.
///
/// Ids are unique; iteration is in id order.
#[derive(Debug)]
pub struct HookRegistry {
    entries: RwLock<Entries>,
}

impl HookRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Registers a definition under a new id.
    pub async fn register(&self, id: impl Into<String>, definition: HookDefinition) -> AppResult<()> {
        let id = id.into();
        let mut entries = self.entries.write().await;

        if entries.hooks.contains_key(&id) {
            return Err(AppError::invalid_configuration(format!(
                "Hook '{id}' is already registered"
            )));
        }

        debug!(hook = %id, definition = %definition.describe(), "Registering hook");
        entries.hooks.insert(id, RegistryEntry::Definition(definition));

        Ok(())
    }

    /// Registers or replaces the definition under `id`.
    ///
    /// Used for host-level overrides such as `hooks.<id> = false`.
    pub async fn set_definition(&self, id: impl Into<String>, definition: HookDefinition) {
        let id = id.into();
        let mut entries = self.entries.write().await;
        if entries
            .hooks
            .insert(id.clone(), RegistryEntry::Definition(definition))
            .is_some()
        {
            info!(hook = %id, "Hook definition overridden");
        }
    }

    /// Stores a prepared hook under `id`.
    pub async fn store_hook(&self, id: &str, hook: Arc<Hook>) {
        let mut entries = self.entries.write().await;
        entries.hooks.insert(id.to_string(), RegistryEntry::Hook(hook));
    }

    /// Removes an entry.
    pub async fn remove(&self, id: &str) -> Option<RegistryEntry> {
        let mut entries = self.entries.write().await;
        entries.hooks.remove(id)
    }

    /// Removes every disabled id, and every id whose namespace prefix is
    /// disabled, in one step. Returns the removed ids.
    ///
    /// Removed ids are remembered: an id registered later under a disabled
    /// id or namespace is removed by the next sweep.
    pub async fn remove_disabled(&self) -> Vec<String> {
        let mut entries = self.entries.write().await;

        let removed: Vec<String> = entries
            .hooks
            .keys()
            .filter(|id| entries.is_disabled(id))
            .cloned()
            .collect();

        for id in &removed {
            entries.hooks.remove(id);
            entries.disabled.insert(id.clone());
        }

        removed
    }

    /// Whether `id` is disabled, directly or through its namespace prefix,
    /// including ids already swept by [`remove_disabled`](Self::remove_disabled).
    pub async fn is_disabled(&self, id: &str) -> bool {
        let entries = self.entries.read().await;
        entries.is_disabled(id)
    }

    /// Gets an entry by id.
    pub async fn get(&self, id: &str) -> Option<RegistryEntry> {
        let entries = self.entries.read().await;
        entries.hooks.get(id).cloned()
    }

    /// Gets a prepared hook by id.
    pub async fn hook(&self, id: &str) -> Option<Arc<Hook>> {
        match self.get(id).await {
            Some(RegistryEntry::Hook(hook)) => Some(hook),
            _ => None,
        }
    }

    /// Whether an id is registered.
    pub async fn contains(&self, id: &str) -> bool {
        let entries = self.entries.read().await;
        entries.hooks.contains_key(id)
    }

    /// Whether an id is registered and not disabled.
    pub async fn is_active(&self, id: &str) -> bool {
        let entries = self.entries.read().await;
        entries.hooks.get(id).is_some_and(|entry| !entry.is_disabled())
    }

    /// All registered ids, in order.
    pub async fn ids(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        entries.hooks.keys().cloned().collect()
    }

    /// All prepared hooks with their ids, in id order.
    pub async fn hooks(&self) -> Vec<(String, Arc<Hook>)> {
        let entries = self.entries.read().await;
        entries
            .hooks
            .iter()
            .filter_map(|(id, entry)| match entry {
                RegistryEntry::Hook(hook) => Some((id.clone(), hook.clone())),
                RegistryEntry::Definition(_) => None,
            })
            .collect()
    }

    /// Current state of every entry; unprepared definitions report `Unprepared`.
    pub async fn snapshot_states(&self) -> BTreeMap<String, HookState> {
        let entries = self.entries.read().await;
        entries
            .hooks
            .iter()
            .map(|(id, entry)| {
                let state = match entry {
                    RegistryEntry::Hook(hook) => hook.state(),
                    RegistryEntry::Definition(_) => HookState::Unprepared,
                };
                (id.clone(), state)
            })
            .collect()
    }

    /// Returns entry count.
    pub async fn count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.hooks.len()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The namespace prefix of an id (text before the first `.`), if any.
pub fn namespace(id: &str) -> Option<&str> {
    id.split_once('.').map(|(prefix, _)| prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_namespace() {
        assert_eq!(namespace("sockets.redis"), Some("sockets"));
        assert_eq!(namespace("a.b.c"), Some("a"));
        assert_eq!(namespace("orm"), None);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let registry = HookRegistry::new();
        registry
            .register("orm", HookDefinition::disabled())
            .await
            .expect("first registration");
        assert!(registry.register("orm", HookDefinition::disabled()).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_disabled_sweeps_namespaces() {
        let registry = HookRegistry::new();
        registry.set_definition("sockets", HookDefinition::disabled()).await;
        registry
            .set_definition("sockets.redis", HookDefinition::from(json!(true)))
            .await;
        registry
            .set_definition("views", HookDefinition::from(json!("false")))
            .await;
        registry
            .set_definition("orm", HookDefinition::from(json!(true)))
            .await;

        let removed = registry.remove_disabled().await;

        assert_eq!(removed, vec!["sockets", "sockets.redis", "views"]);
        assert_eq!(registry.ids().await, vec!["orm"]);
    }

    #[tokio::test]
    async fn test_swept_namespace_stays_disabled() {
        let registry = HookRegistry::new();
        registry.set_definition("sockets", HookDefinition::disabled()).await;
        registry.set_definition("views", HookDefinition::disabled()).await;
        registry.remove_disabled().await;

        registry
            .register("sockets.redis", HookDefinition::from(json!(true)))
            .await
            .expect("register");
        registry
            .register("views", HookDefinition::from(json!(true)))
            .await
            .expect("register");
        registry
            .register("orm", HookDefinition::from(json!(true)))
            .await
            .expect("register");

        assert!(registry.is_disabled("sockets.redis").await);
        assert!(registry.is_disabled("views").await);
        assert!(!registry.is_disabled("orm").await);

        let removed = registry.remove_disabled().await;
        assert_eq!(removed, vec!["sockets.redis", "views"]);
        assert_eq!(registry.ids().await, vec!["orm"]);
    }

    #[tokio::test]
    async fn test_is_active() {
        let registry = HookRegistry::new();
        registry.set_definition("moduleloader", HookDefinition::disabled()).await;
        assert!(registry.contains("moduleloader").await);
        assert!(!registry.is_active("moduleloader").await);
        assert!(!registry.is_active("userconfig").await);
    }
}
