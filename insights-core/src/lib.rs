//! Core shared library for the insights workspace.
//!
//! This crate exposes the ambient pieces every other crate leans on:
//! the canonical error type, environment-driven client configuration,
//! logging setup and JSON helpers.

pub mod config;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::{ClientConfig, Credentials};
pub use errors::{ConfigError, CoreError, Result as CoreResult};
