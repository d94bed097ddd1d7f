//! Common types, traits, and utilities for gpubench
//!
//! This crate provides the foundational types shared across the gpubench
//! workspace: the error taxonomy, the benchmark selection surface,
//! cooperative cancellation, and TOML configuration.

pub mod cancel;
pub mod config;
pub mod error;
pub mod types;

pub use cancel::CancelToken;
pub use config::*;
pub use error::*;
pub use types::*;
