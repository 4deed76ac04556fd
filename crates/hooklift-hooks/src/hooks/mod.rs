//! Hook model: definitions, the prepared entity, and load completion.

pub mod completion;
pub mod definitions;
pub mod entity;

pub use completion::{Completion, LoadOutcome};
pub use definitions::{FnFactory, HookDefaults, HookDefinition, HookFactory, HookModule};
pub use entity::{Hook, HookState};
