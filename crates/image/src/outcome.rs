//! What a conversion did.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// The WebP file replaced the source, which is gone
    Converted {
        /// Location of the WebP file
        new_path: PathBuf,
        /// Source size in bytes
        original_size: u64,
        /// WebP size in bytes, strictly smaller than `original_size`
        new_size: u64,
    },
    /// Encoding worked but was not smaller; source kept, output discarded
    SkippedNotSmaller,
    /// Automatic path only: feature off or codec missing
    SkippedDisabled,
    /// Something in the pipeline failed; source kept
    Failed {
        /// Which stage failed and why
        reason: FailureReason,
    },
}

impl ConversionOutcome {
    /// Short stable name, used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Converted { .. } => "converted",
            Self::SkippedNotSmaller => "skipped_not_smaller",
            Self::SkippedDisabled => "skipped_disabled",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether the source was replaced.
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    /// Bytes saved by the replacement, zero unless converted.
    pub fn bytes_saved(&self) -> u64 {
        match self {
            Self::Converted {
                original_size,
                new_size,
                ..
            } => original_size.saturating_sub(*new_size),
            _ => 0,
        }
    }

    pub(crate) fn failed(reason: FailureReason) -> Self {
        Self::Failed { reason }
    }
}

/// Why a conversion failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// Source missing, unreadable or not a supported raster
    #[error("decode failed: {0}")]
    Decode(String),
    /// Target dimensions invalid
    #[error("resize failed: {0}")]
    Resize(String),
    /// Codec could not produce or write WebP output
    #[error("encode failed: {0}")]
    Encode(String),
    /// Swap failed after a successful encode; the source is still in place
    #[error("filesystem error: {0}")]
    Filesystem(String),
    /// Swap failed and could not be rolled back; both files may exist
    #[error("partial replace: {0}")]
    PartialReplace(String),
    /// No WebP encoder available
    #[error("webp codec unavailable")]
    CodecUnavailable,
    /// The caller's deadline passed first
    #[error("conversion timed out")]
    Timeout,
    /// The conversion worker died
    #[error("internal error: {0}")]
    Internal(String),
}

impl FailureReason {
    /// Short stable code for status signals (redirect query strings, metrics).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Resize(_) => "resize",
            Self::Encode(_) => "encode",
            Self::Filesystem(_) => "filesystem",
            Self::PartialReplace(_) => "partial-replace",
            Self::CodecUnavailable => "codec-unavailable",
            Self::Timeout => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_saved() {
        let outcome = ConversionOutcome::Converted {
            new_path: PathBuf::from("/tmp/a.webp"),
            original_size: 500_000,
            new_size: 300_000,
        };
        assert_eq!(outcome.bytes_saved(), 200_000);
        assert_eq!(ConversionOutcome::SkippedNotSmaller.bytes_saved(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let outcome = ConversionOutcome::failed(FailureReason::Decode("bad header".into()));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"]["kind"], "decode");
        assert_eq!(json["reason"]["detail"], "bad header");

        let json = serde_json::to_value(ConversionOutcome::SkippedDisabled).unwrap();
        assert_eq!(json["status"], "skipped_disabled");
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(FailureReason::CodecUnavailable.code(), "codec-unavailable");
        assert_eq!(FailureReason::Timeout.to_string(), "conversion timed out");
    }
}
