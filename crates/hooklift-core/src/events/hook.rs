//! Hook lifecycle phases reported to observers.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Terminal outcome of a hook's load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HookPhase {
    /// The hook signalled load completion.
    Loaded,
    /// The hook failed to load or timed out.
    Error {
        /// Error category.
        kind: ErrorKind,
        /// Error message.
        message: String,
    },
}

impl HookPhase {
    /// The suffix used in bus-style event names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Error { .. } => "error",
        }
    }
}
