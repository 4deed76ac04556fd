//! Unified error types for Hooklift.
//!
//! Every failure the orchestrator can report is an [`AppError`] tagged with
//! an [`ErrorKind`]. Hook-scoped errors also carry the id of the hook that
//! produced them, and timeouts carry the interval that elapsed.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// A specialized `Result` type for Hooklift operations.
pub type AppResult<T> = Result<T, AppError>;

/// Error kind categorization used across the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A hook definition could not be resolved to a callable factory.
    MalformedHook,
    /// The set of registered hooks violates a structural constraint.
    InvalidConfiguration,
    /// A hook's `configure` step failed.
    HookConfigure,
    /// A hook's `load` step reported failure.
    HookLoad,
    /// A hook did not finish loading before its deadline.
    HookTimeout,
    /// Host configuration could not be read or deserialized.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedHook => write!(f, "MALFORMED_HOOK"),
            Self::InvalidConfiguration => write!(f, "INVALID_CONFIGURATION"),
            Self::HookConfigure => write!(f, "HOOK_CONFIGURE"),
            Self::HookLoad => write!(f, "HOOK_LOAD"),
            Self::HookTimeout => write!(f, "HOOK_TIMEOUT"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Hooklift.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// The hook this error is attributed to, if any.
    pub hook_id: Option<String>,
    /// The interval that elapsed, for [`ErrorKind::HookTimeout`].
    pub timeout_ms: Option<u64>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            hook_id: None,
            timeout_ms: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(kind, message)
        }
    }

    /// Attribute this error to a hook.
    pub fn for_hook(mut self, hook_id: impl Into<String>) -> Self {
        self.hook_id = Some(hook_id.into());
        self
    }

    /// The definition registered under `hook_id` is not a callable factory.
    pub fn malformed_hook(hook_id: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedHook, message).for_hook(hook_id)
    }

    /// The registered hook set violates a structural constraint.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfiguration, message)
    }

    /// `configure` failed for `hook_id`.
    pub fn hook_configure(hook_id: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::HookConfigure,
            format!("Hook '{hook_id}' failed to configure: {reason}"),
        )
        .for_hook(hook_id)
    }

    /// `load` reported failure for `hook_id`.
    pub fn hook_load(hook_id: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::HookLoad,
            format!("Hook '{hook_id}' failed to load: {reason}"),
        )
        .for_hook(hook_id)
    }

    /// `hook_id` did not signal load completion within `timeout`.
    pub fn hook_timeout(hook_id: &str, timeout: Duration) -> Self {
        let timeout_ms = timeout.as_millis() as u64;
        let mut err = Self::new(
            ErrorKind::HookTimeout,
            format!(
                "The hook '{hook_id}' is taking too long to load. \
                 Make sure it is signalling load completion, or raise \
                 `{hook_id}._hookTimeout` (currently {timeout_ms}ms)"
            ),
        )
        .for_hook(hook_id);
        err.timeout_ms = Some(timeout_ms);
        err
    }

    /// Create a host configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error came from a hook exceeding its deadline.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::HookTimeout
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            hook_id: self.hook_id.clone(),
            timeout_ms: self.timeout_ms,
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
