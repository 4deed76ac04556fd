//! Prelude for convenient imports when writing hooks.

pub use async_trait::async_trait;

pub use crate::api::config::SharedConfig;
pub use crate::api::context::AppContext;
pub use crate::hooks::completion::Completion;
pub use crate::hooks::definitions::{
    FnFactory, HookDefaults, HookDefinition, HookFactory, HookModule,
};
pub use crate::traits::{ClosureModule, ClosureModuleBuilder};

pub use hooklift_core::error::{AppError, AppResult};
