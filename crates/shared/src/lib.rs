//! Shared library for the release finder workspace.
//!
//! This crate provides the pieces every other crate leans on:
//! - Configuration management
//! - Logging infrastructure
//! - The release/mapping data model
//! - Shared error types

pub mod config;
pub mod error;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::FinderError;
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
