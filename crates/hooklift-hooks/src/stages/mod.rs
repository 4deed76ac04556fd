//! Per-hook pipeline stages run by the orchestrator.

pub mod defaults;
pub mod preparer;

pub use defaults::apply_defaults;
pub use preparer::{prepare, validate_bootstrap};
