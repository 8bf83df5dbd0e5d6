//! # flareguard-core
//!
//! Core types, configuration, and utilities for FlareGuard.
//!
//! This crate provides shared functionality used across all FlareGuard crates:
//!
//! - **Configuration**: Loading, validation, and channel enablement
//! - **Types**: Detection events, persisted frames, and dispatch outcomes
//! - **Utilities**: Path resolution and environment handling

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;
pub mod types;

// Re-exports for convenience
pub use config::AlertConfig;
pub use error::{ConfigError, Result};
pub use secret::SecretString;
pub use types::*;
