//! # hooklift-core
//!
//! Core crate for Hooklift. Contains the unified error system, the host
//! configuration schemas, and the hook lifecycle events surfaced to
//! observers.
//!
//! This crate has **no** internal dependencies on other Hooklift crates.

pub mod config;
pub mod error;
pub mod events;

pub use error::{AppError, AppResult, ErrorKind};
