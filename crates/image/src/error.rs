//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur during image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// Conversion settings out of range
    #[error("Invalid conversion config: {0}")]
    InvalidConfig(String),

    /// Resize error
    #[error("Resize error: {0}")]
    ResizeError(String),

    /// WebP encoder rejected the raster
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// No WebP encoder compiled in
    #[error("WebP codec unavailable")]
    CodecUnavailable,

    /// Image processing error
    #[error("Image processing error: {0}")]
    ProcessingError(#[from] image::ImageError),
}
