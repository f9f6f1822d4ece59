//! The per-item "Convert to WebP" action.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use webpopt_image::{
    AttachmentId, ConversionConfig, ConversionOutcome, Engine, FailureReason, ImageAsset,
    WebpCodec,
};
use webpopt_telemetry::{metrics, Timer, CONVERSION_MS};

use crate::{
    apply_outcome, convert_action, AttachmentRecord, AttachmentStore, MediaError, NonceVerifier,
    Result,
};

/// What the caller is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Site administration; required for manual conversion
    ManageOptions,
    /// May add files to the library
    UploadFiles,
    /// May only look
    Read,
}

/// An authenticated request to convert one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualRequest {
    /// Attachment to convert
    pub attachment_id: AttachmentId,
    /// Strongest capability the caller holds
    pub capability: Capability,
    /// Request token issued for this attachment
    pub nonce: String,
}

/// How the action ended, as reported back to the library screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RedirectStatus {
    /// Source replaced by a smaller WebP
    Converted,
    /// Source replaced, but the record could not be pointed at the new file
    ConvertedUnrecorded,
    /// WebP was not smaller; nothing changed
    NotSmaller,
    /// Conversion failed; nothing changed
    Failed {
        /// Stable failure code
        reason: &'static str,
    },
    /// No such attachment, or its file is gone
    NotFound,
}

impl RedirectStatus {
    fn from_outcome(outcome: &ConversionOutcome) -> Self {
        match outcome {
            ConversionOutcome::Converted { .. } => Self::Converted,
            ConversionOutcome::SkippedNotSmaller => Self::NotSmaller,
            // Explicit conversion ignores the enabled flag, so only a missing
            // codec can skip it.
            ConversionOutcome::SkippedDisabled => Self::Failed {
                reason: FailureReason::CodecUnavailable.code(),
            },
            ConversionOutcome::Failed { reason } => Self::Failed {
                reason: reason.code(),
            },
        }
    }

    /// Query-string form.
    pub fn query(&self) -> String {
        match self {
            Self::Converted => "converted=1".to_string(),
            Self::ConvertedUnrecorded => "converted=1&warning=record-not-updated".to_string(),
            Self::NotSmaller => "converted=0&reason=not-smaller".to_string(),
            Self::Failed { reason } => format!("converted=0&reason={reason}"),
            Self::NotFound => "converted=0&reason=not-found".to_string(),
        }
    }
}

/// Where the action sends the caller afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    /// Attachment the action ran on
    pub attachment_id: AttachmentId,
    /// Result signal
    #[serde(flatten)]
    pub status: RedirectStatus,
}

impl Redirect {
    /// Query string for the library screen.
    pub fn query(&self) -> String {
        self.status.query()
    }

    /// Full location relative to `base`.
    pub fn location(&self, base: &str) -> String {
        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{base}{sep}{}", self.query())
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query())
    }
}

/// Whether the library screen should offer "Convert to WebP" for `record`.
pub fn show_convert_action<C: WebpCodec + ?Sized>(record: &AttachmentRecord, codec: &C) -> bool {
    !record.is_webp() && codec.is_available()
}

/// Manual conversion of one existing attachment.
pub struct ManualAction<'a, C: WebpCodec, S: AttachmentStore + ?Sized, N: NonceVerifier + ?Sized> {
    engine: &'a Engine<C>,
    store: &'a S,
    verifier: &'a N,
}

impl<'a, C, S, N> ManualAction<'a, C, S, N>
where
    C: WebpCodec,
    S: AttachmentStore + ?Sized,
    N: NonceVerifier + ?Sized,
{
    /// Create the action.
    pub fn new(engine: &'a Engine<C>, store: &'a S, verifier: &'a N) -> Self {
        Self {
            engine,
            store,
            verifier,
        }
    }

    /// Run the action.
    ///
    /// Authorization is checked before anything else; a rejected request
    /// never reaches the store or the engine. The enabled flag is ignored.
    pub fn handle(&self, request: &ManualRequest, config: &ConversionConfig) -> Result<Redirect> {
        let id = request.attachment_id;
        self.authorize(request)?;

        let redirect = |status| Redirect {
            attachment_id: id,
            status,
        };

        let Some(record) = self.store.get(id)? else {
            info!(attachment_id = %id, "Manual conversion: attachment not found");
            return Ok(redirect(RedirectStatus::NotFound));
        };
        if !record.file_path.is_file() {
            warn!(
                attachment_id = %id,
                path = %record.file_path.display(),
                "Manual conversion: attachment file missing"
            );
            return Ok(redirect(RedirectStatus::NotFound));
        }

        let asset = ImageAsset::new(record.file_path.clone(), id);
        let timer = Timer::start(CONVERSION_MS);
        let outcome = self.engine.convert(&asset, config);
        timer.stop();
        metrics().record_conversion(outcome.kind(), outcome.bytes_saved());

        // The source is gone once converted, so a store failure here is
        // reported in the redirect instead of discarding the outcome.
        if let Err(e) = apply_outcome(self.store, id, &outcome) {
            error!(
                attachment_id = %id,
                path = %record.file_path.display(),
                error = %e,
                "Converted file but could not update its record"
            );
            metrics().increment("conversions.record_update_failed");
            return Ok(redirect(RedirectStatus::ConvertedUnrecorded));
        }
        Ok(redirect(RedirectStatus::from_outcome(&outcome)))
    }

    fn authorize(&self, request: &ManualRequest) -> Result<()> {
        if request.capability != Capability::ManageOptions {
            warn!(
                attachment_id = %request.attachment_id,
                capability = ?request.capability,
                "Manual conversion refused: missing capability"
            );
            return Err(MediaError::Unauthorized(
                "manage_options capability required".to_string(),
            ));
        }

        if !self
            .verifier
            .verify(&convert_action(request.attachment_id), &request.nonce)
        {
            warn!(
                attachment_id = %request.attachment_id,
                "Manual conversion refused: bad request token"
            );
            return Err(MediaError::Unauthorized(format!(
                "request token not valid for attachment {}",
                request.attachment_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpopt_image::BuiltinCodec;

    struct NoCodec;

    impl WebpCodec for NoCodec {
        fn name(&self) -> &'static str {
            "none"
        }

        fn is_available(&self) -> bool {
            false
        }

        fn encode(&self, _: &image::DynamicImage, _: u8) -> webpopt_image::Result<Vec<u8>> {
            Err(webpopt_image::ImageError::CodecUnavailable)
        }
    }

    #[test]
    fn test_query_strings() {
        assert_eq!(RedirectStatus::Converted.query(), "converted=1");
        assert_eq!(
            RedirectStatus::ConvertedUnrecorded.query(),
            "converted=1&warning=record-not-updated"
        );
        assert_eq!(
            RedirectStatus::NotSmaller.query(),
            "converted=0&reason=not-smaller"
        );
        assert_eq!(
            RedirectStatus::Failed { reason: "decode" }.query(),
            "converted=0&reason=decode"
        );
        assert_eq!(RedirectStatus::NotFound.query(), "converted=0&reason=not-found");
    }

    #[test]
    fn test_location() {
        let redirect = Redirect {
            attachment_id: AttachmentId(3),
            status: RedirectStatus::Converted,
        };
        assert_eq!(redirect.location("/upload.php"), "/upload.php?converted=1");
        assert_eq!(
            redirect.location("/upload.php?mode=list"),
            "/upload.php?mode=list&converted=1"
        );
    }

    #[test]
    fn test_status_from_failure() {
        let outcome = ConversionOutcome::Failed {
            reason: FailureReason::Timeout,
        };
        assert_eq!(
            RedirectStatus::from_outcome(&outcome),
            RedirectStatus::Failed { reason: "timeout" }
        );
    }

    #[test]
    fn test_show_convert_action() {
        let jpeg = AttachmentRecord::new(AttachmentId(1), "/u/a.jpg", "image/jpeg", "a.jpg");
        let webp = AttachmentRecord::new(AttachmentId(2), "/u/b.webp", "image/webp", "b.webp");

        assert!(!show_convert_action(&webp, &BuiltinCodec));
        assert!(!show_convert_action(&jpeg, &NoCodec));
        assert_eq!(
            show_convert_action(&jpeg, &BuiltinCodec),
            BuiltinCodec.is_available()
        );
    }
}
