//! The conversion pipeline.
//!
//! decode → fix orientation → cap width → encode to a temp sibling →
//! strict size gate → rename into place → delete the source.
//!
//! The temp file lives next to the source so the final rename stays on one
//! filesystem. It is removed on drop, so every path that does not reach the
//! rename (skip, failure, panic) cleans up after itself.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    fit_to_width, webp_sibling, BuiltinCodec, ConversionConfig, ConversionOutcome, DecodedImage,
    FailureReason, ImageAsset, WebpCodec,
};

/// Converts one image at a time. Holds no per-conversion state, so a single
/// engine can be shared across threads converting different assets.
///
/// Two calls on the *same* source path must be serialized by the caller.
#[derive(Debug, Clone, Default)]
pub struct Engine<C = BuiltinCodec> {
    codec: C,
}

impl Engine<BuiltinCodec> {
    /// Engine backed by the compiled-in libwebp encoder.
    pub fn new() -> Self {
        Self { codec: BuiltinCodec }
    }
}

impl<C: WebpCodec> Engine<C> {
    /// Engine backed by a custom codec.
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// The codec in use.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Capability probe for callers deciding whether to offer conversion.
    pub fn codec_available(&self) -> bool {
        self.codec.is_available()
    }

    /// Convert on explicit request.
    ///
    /// Ignores `config.enabled()`. Fails fast with
    /// [`FailureReason::CodecUnavailable`] when no encoder is present.
    pub fn convert(&self, asset: &ImageAsset, config: &ConversionConfig) -> ConversionOutcome {
        if !self.codec.is_available() {
            let outcome = ConversionOutcome::failed(FailureReason::CodecUnavailable);
            log_outcome(asset, &outcome, Duration::ZERO);
            return outcome;
        }

        let started = Instant::now();
        let outcome = match self.run(asset, config) {
            Ok(outcome) => outcome,
            Err(reason) => ConversionOutcome::failed(reason),
        };
        log_outcome(asset, &outcome, started.elapsed());
        outcome
    }

    /// Convert a freshly stored upload.
    ///
    /// Returns [`ConversionOutcome::SkippedDisabled`] without touching the file
    /// when automatic conversion is off or the codec is missing.
    pub fn convert_on_upload(&self, asset: &ImageAsset, config: &ConversionConfig) -> ConversionOutcome {
        if !config.enabled() || !self.codec.is_available() {
            debug!(
                attachment_id = %asset.attachment_id,
                enabled = config.enabled(),
                codec = self.codec.name(),
                codec_available = self.codec.is_available(),
                "Automatic conversion skipped"
            );
            return ConversionOutcome::SkippedDisabled;
        }

        self.convert(asset, config)
    }

    fn run(&self, asset: &ImageAsset, config: &ConversionConfig) -> Result<ConversionOutcome, FailureReason> {
        let source = asset.path();

        let data = fs::read(source)
            .map_err(|e| FailureReason::Decode(format!("cannot read {}: {}", source.display(), e)))?;
        let original_size = data.len() as u64;

        let decoded = DecodedImage::decode(&data)
            .map_err(|e| FailureReason::Decode(format!("{}: {}", source.display(), e)))?;
        drop(data);

        let tag = decoded.orientation;
        let decoded = decoded.normalized();
        debug!(
            attachment_id = %asset.attachment_id,
            format = ?decoded.format,
            orientation = ?tag,
            rotated_degrees = tag.correction_degrees(),
            width = decoded.raster.width(),
            height = decoded.raster.height(),
            "Decoded source"
        );

        let raster = fit_to_width(decoded.raster, config.max_width())
            .map_err(|e| FailureReason::Resize(e.to_string()))?;

        let encoded = self
            .codec
            .encode(&raster, config.quality())
            .map_err(|e| FailureReason::Encode(e.to_string()))?;
        drop(raster);

        let target = webp_sibling(source);
        let temp = write_temp(&target, &encoded)?;
        let new_size = encoded.len() as u64;

        if new_size >= original_size {
            debug!(
                attachment_id = %asset.attachment_id,
                original_size,
                new_size,
                "Encoded output not smaller, discarding"
            );
            return Ok(ConversionOutcome::SkippedNotSmaller);
        }

        swap_into_place(temp, source, &target)?;

        Ok(ConversionOutcome::Converted {
            new_path: target,
            original_size,
            new_size,
        })
    }
}

impl<C: WebpCodec + Clone + 'static> Engine<C> {
    /// Run [`Engine::convert`] on a worker thread with a deadline.
    ///
    /// On timeout the worker is not cancelled: it keeps running and may still
    /// replace the file afterwards. Callers must keep serializing conversions
    /// of the same asset until it is known to have finished.
    pub fn convert_with_timeout(
        &self,
        asset: ImageAsset,
        config: ConversionConfig,
        timeout: Duration,
    ) -> ConversionOutcome {
        let engine = self.clone();
        let attachment_id = asset.attachment_id;
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            // receiver may be gone after a timeout
            let _ = tx.send(engine.convert(&asset, &config));
        });

        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    attachment_id = %attachment_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Conversion exceeded deadline"
                );
                ConversionOutcome::failed(FailureReason::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => ConversionOutcome::failed(FailureReason::Internal(
                "conversion worker exited without a result".into(),
            )),
        }
    }
}

/// Write encoded bytes to a hidden temp file next to `target`.
fn write_temp(target: &Path, bytes: &[u8]) -> Result<NamedTempFile, FailureReason> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{stem}."))
        .suffix(".webp.tmp")
        .tempfile_in(dir)
        .map_err(|e| FailureReason::Encode(format!("cannot create output in {}: {}", dir.display(), e)))?;

    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| FailureReason::Encode(format!("cannot write {}: {}", temp.path().display(), e)))?;

    Ok(temp)
}

/// Rename the temp output over `target`, then remove `source`.
///
/// If the source cannot be removed the new file is removed again so exactly
/// one of the two survives. A failed rollback is reported as
/// [`FailureReason::PartialReplace`].
fn swap_into_place(temp: NamedTempFile, source: &Path, target: &Path) -> Result<(), FailureReason> {
    temp.persist(target).map_err(|e| {
        FailureReason::Filesystem(format!("cannot move output to {}: {}", target.display(), e.error))
    })?;

    // in-place replacement of a .webp source, nothing left to delete
    if source == target {
        return Ok(());
    }

    if let Err(delete_err) = fs::remove_file(source) {
        return match fs::remove_file(target) {
            Ok(()) => Err(FailureReason::Filesystem(format!(
                "cannot delete original {}: {}; conversion rolled back",
                source.display(),
                delete_err
            ))),
            Err(rollback_err) => Err(FailureReason::PartialReplace(format!(
                "cannot delete original {} ({}) nor remove {} ({}); both files remain",
                source.display(),
                delete_err,
                target.display(),
                rollback_err
            ))),
        };
    }

    Ok(())
}

fn log_outcome(asset: &ImageAsset, outcome: &ConversionOutcome, elapsed: Duration) {
    let path = asset.path().display();
    let elapsed_ms = elapsed.as_millis() as u64;
    match outcome {
        ConversionOutcome::Converted {
            new_path,
            original_size,
            new_size,
        } => info!(
            attachment_id = %asset.attachment_id,
            path = %path,
            new_path = %new_path.display(),
            original_size,
            new_size,
            elapsed_ms,
            "Converted to WebP"
        ),
        ConversionOutcome::SkippedNotSmaller | ConversionOutcome::SkippedDisabled => info!(
            attachment_id = %asset.attachment_id,
            path = %path,
            outcome = outcome.kind(),
            elapsed_ms,
            "Conversion skipped"
        ),
        ConversionOutcome::Failed { reason } => warn!(
            attachment_id = %asset.attachment_id,
            path = %path,
            reason = reason.code(),
            error = %reason,
            elapsed_ms,
            "Conversion failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_swap_replaces_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("photo.png");
        let target = dir.path().join("photo.webp");
        fs::write(&source, b"png").unwrap();

        let temp = write_temp(&target, b"webp").unwrap();
        swap_into_place(temp, &source, &target).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"webp");
    }

    #[test]
    fn test_swap_in_place_keeps_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("photo.webp");
        fs::write(&target, b"old").unwrap();

        let temp = write_temp(&target, b"new").unwrap();
        swap_into_place(temp, &target, &target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_swap_rolls_back_when_source_cannot_be_deleted() {
        let dir = TempDir::new().unwrap();
        // remove_file refuses a directory on every platform
        let source = dir.path().join("photo.png");
        fs::create_dir(&source).unwrap();
        let target = dir.path().join("photo.webp");

        let temp = write_temp(&target, b"webp").unwrap();
        let result = swap_into_place(temp, &source, &target);

        assert!(matches!(result, Err(FailureReason::Filesystem(_))));
        assert!(!target.exists());
        assert!(source.is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
