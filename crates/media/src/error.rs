//! Error types for the media crate.

use thiserror::Error;
use webpopt_image::AttachmentId;

/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, MediaError>;

/// Errors raised around a conversion, never by it.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Caller lacks the required capability
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request token secret unusable
    #[error("Invalid request token secret: {0}")]
    InvalidSecret(String),

    /// No record with this id
    #[error("Attachment {0} not found")]
    NotFound(AttachmentId),

    /// Store contents unreadable
    #[error("Attachment store corrupt: {0}")]
    Corrupt(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
