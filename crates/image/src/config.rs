//! Per-invocation conversion settings.

use serde::Serialize;

use crate::{ImageError, Result};

/// Immutable settings handed to the engine for one conversion.
///
/// Built once at the trigger boundary from the settings store; the engine
/// never reads global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversionConfig {
    enabled: bool,
    quality: u8,
    max_width: u32,
}

impl ConversionConfig {
    /// Default WebP quality.
    pub const DEFAULT_QUALITY: u8 = 82;
    /// Default width cap in pixels.
    pub const DEFAULT_MAX_WIDTH: u32 = 1920;

    /// Create a validated config with automatic conversion enabled.
    ///
    /// `quality` must be in `1..=100` and `max_width` must be positive.
    pub fn new(quality: u8, max_width: u32) -> Result<Self> {
        if !(1..=100).contains(&quality) {
            return Err(ImageError::InvalidConfig(format!(
                "quality must be between 1 and 100, got {quality}"
            )));
        }
        if max_width == 0 {
            return Err(ImageError::InvalidConfig("max_width must be positive".into()));
        }

        Ok(Self {
            enabled: true,
            quality,
            max_width,
        })
    }

    /// Toggle automatic conversion on upload.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether the upload path converts automatically.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// WebP encode quality, 1-100.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Width cap in pixels.
    pub fn max_width(&self) -> u32 {
        self.max_width
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quality: Self::DEFAULT_QUALITY,
            max_width: Self::DEFAULT_MAX_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConversionConfig::default();
        assert!(config.enabled());
        assert_eq!(config.quality(), 82);
        assert_eq!(config.max_width(), 1920);
    }

    #[test]
    fn test_quality_bounds() {
        assert!(ConversionConfig::new(1, 100).is_ok());
        assert!(ConversionConfig::new(100, 100).is_ok());
        assert!(matches!(ConversionConfig::new(0, 100), Err(ImageError::InvalidConfig(_))));
        assert!(matches!(ConversionConfig::new(101, 100), Err(ImageError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_width_rejected() {
        assert!(matches!(ConversionConfig::new(82, 0), Err(ImageError::InvalidConfig(_))));
    }

    #[test]
    fn test_with_enabled() {
        let config = ConversionConfig::new(70, 800).unwrap().with_enabled(false);
        assert!(!config.enabled());
        assert_eq!(config.quality(), 70);
    }
}
