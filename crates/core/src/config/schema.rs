//! Configuration schema definitions
//!
//! The settings store: conversion options plus the ambient sections the
//! triggers need (logging, attachment store, request tokens).

use serde::{Deserialize, Serialize};
use webpopt_image::ConversionConfig;

use crate::error::Result;
use crate::validation::{ValidationResult, Validator};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigSchema {
    #[serde(default)]
    pub conversion: ConversionSettings,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

impl ConfigSchema {
    /// Check every section and collect all problems.
    pub fn validate(&self) -> ValidationResult {
        let mut result = self.conversion.validate();
        result.merge(
            Validator::new()
                .one_of("logging.level", &self.logging.level, LOG_LEVELS)
                .required("store.path", &self.store.path)
                .warn_if(
                    "security.nonce_secret",
                    self.security.nonce_secret.is_none(),
                    "No nonce secret configured; manual conversion requests cannot be verified",
                )
                .validate(),
        );
        result
    }
}

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Conversion options, the three persisted settings of the optimizer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionSettings {
    /// Convert automatically on upload
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// WebP quality, 1-100
    #[serde(default = "default_quality")]
    pub quality: u32,

    /// Width cap in pixels
    #[serde(default = "default_max_width")]
    pub max_width: u32,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            quality: default_quality(),
            max_width: default_max_width(),
        }
    }
}

impl ConversionSettings {
    /// Range-check the raw values.
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .range("conversion.quality", self.quality, 1, 100)
            .positive("conversion.max_width", u64::from(self.max_width))
            .validate()
    }

    /// Build the engine's per-invocation config.
    pub fn to_engine_config(&self) -> Result<ConversionConfig> {
        self.validate().to_result()?;
        let quality = u8::try_from(self.quality).unwrap_or(u8::MAX);
        Ok(ConversionConfig::new(quality, self.max_width)?.with_enabled(self.enabled))
    }
}

fn default_true() -> bool {
    true
}

fn default_quality() -> u32 {
    u32::from(ConversionConfig::DEFAULT_QUALITY)
}

fn default_max_width() -> u32 {
    ConversionConfig::DEFAULT_MAX_WIDTH
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter level; `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Attachment store location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// JSON file holding attachment records
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "attachments.json".to_string()
}

/// Request token settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Secret used to sign and verify manual conversion tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce_secret: Option<String>,
}
