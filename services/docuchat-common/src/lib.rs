//! DocuChat Common - Shared types, utilities, and configuration.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, GeminiConfig, ObservabilityConfig, ServerConfig, StorageConfig};
pub use error::{Error, Result, ResultExt};
