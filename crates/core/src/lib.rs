//! Core utilities for the WebP optimizer
//!
//! This crate provides shared functionality used by the conversion triggers:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: the TOML settings store with validation
//! - **Validation**: a fluent validator for settings values
//!
//! # Example
//!
//! ```rust,no_run
//! use webpopt_core::config::Config;
//!
//! let config = Config::load(None).expect("settings should load");
//! let engine_config = config.schema.conversion.to_engine_config().expect("valid settings");
//! assert!(engine_config.quality() >= 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema, ConversionSettings};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::validation::{ValidationResult, Validator};
}
