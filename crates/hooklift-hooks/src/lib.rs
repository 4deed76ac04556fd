//! # hooklift-hooks
//!
//! Hook lifecycle orchestration for Hooklift. Provides:
//!
//! - Hook definitions, factories, and the prepared hook entity
//! - A registry of hooks for one startup, with namespace-aware disabling
//! - Defaults injection into shared configuration without overwriting
//! - Per-hook load deadlines with run-wide timer cleanup
//! - The phased orchestrator: bootstrap hooks in sequence, then
//!   prepare → defaults → configure → load across all other hooks

pub mod api;
pub mod hooks;
pub mod observer;
pub mod orchestrator;
pub mod prelude;
pub mod registry;
pub mod stages;
pub mod timeout;
pub mod traits;

pub use api::{AppContext, SharedConfig};
pub use hooks::{
    Completion, FnFactory, Hook, HookDefaults, HookDefinition, HookFactory, HookModule, HookState,
};
pub use observer::{BroadcastObserver, HookObserver, NoopObserver};
pub use orchestrator::{HookOrchestrator, LoadReport};
pub use registry::HookRegistry;
pub use timeout::{TimeoutGuard, TimerRegistry};
pub use traits::ClosureModule;
