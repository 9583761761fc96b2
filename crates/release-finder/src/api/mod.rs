//! Outbound HTTP plumbing shared by every provider.
//!
//! This module provides a timeout- and retry-aware client plus the serde
//! shapes of the JSON payloads the external services return.

pub mod client;
pub mod types;

pub use client::HttpClient;
pub use types::*;
