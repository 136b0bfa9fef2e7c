//! Shared configuration and error handling for the APIM console
//!
//! This crate provides common functionality used across the console crates:
//! - Configuration management following 12-factor principles
//! - Error types and handling

pub mod config;
pub mod error;

pub use config::{Config, LogFormat};
pub use error::{Error, Result};
