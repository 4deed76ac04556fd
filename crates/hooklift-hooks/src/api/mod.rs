//! Hook API: context and configuration exposed to hook code.

pub mod config;
pub mod context;

pub use config::SharedConfig;
pub use context::AppContext;
