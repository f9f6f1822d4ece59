//! Automatic conversion of freshly stored uploads.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, error};
use webpopt_image::{
    AttachmentId, ConversionConfig, ConversionOutcome, Engine, ImageAsset, WebpCodec,
};
use webpopt_telemetry::{metrics, Timer, CONVERSION_MS};

use crate::{apply_outcome, AttachmentRecord, AttachmentStore};

/// A file the media library just stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upload {
    /// Where the file was stored
    pub file_path: PathBuf,
    /// Record created for it
    pub attachment_id: AttachmentId,
}

/// What the hook did with an upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    /// The upload, pointing at the WebP file when converted and untouched
    /// otherwise
    pub upload: Upload,
    /// Engine outcome
    pub outcome: ConversionOutcome,
    /// Updated record, when the conversion went through and the store accepted it
    pub record: Option<AttachmentRecord>,
}

/// Runs the engine on every new upload.
///
/// Never fails: conversion problems only show up in the report and the logs,
/// and the upload itself always goes through.
pub struct UploadHook<'a, C: WebpCodec, S: AttachmentStore + ?Sized> {
    engine: &'a Engine<C>,
    store: &'a S,
}

impl<'a, C: WebpCodec, S: AttachmentStore + ?Sized> UploadHook<'a, C, S> {
    /// Create a hook over an engine and a store.
    pub fn new(engine: &'a Engine<C>, store: &'a S) -> Self {
        Self { engine, store }
    }

    /// Handle one stored upload.
    pub fn on_upload(&self, upload: Upload, config: &ConversionConfig) -> UploadReport {
        let asset = ImageAsset::new(upload.file_path.clone(), upload.attachment_id);

        let timer = Timer::start(CONVERSION_MS);
        let outcome = self.engine.convert_on_upload(&asset, config);
        timer.stop();
        metrics().record_conversion(outcome.kind(), outcome.bytes_saved());

        let new_path = match &outcome {
            ConversionOutcome::Converted { new_path, .. } => new_path.clone(),
            _ => {
                debug!(
                    attachment_id = %upload.attachment_id,
                    outcome = outcome.kind(),
                    "Upload kept as stored"
                );
                return UploadReport {
                    upload,
                    outcome,
                    record: None,
                };
            }
        };

        // The file is already swapped, so the upload follows it even if the
        // record cannot be updated.
        let record = match apply_outcome(self.store, upload.attachment_id, &outcome) {
            Ok(record) => record,
            Err(e) => {
                error!(
                    attachment_id = %upload.attachment_id,
                    new_path = %new_path.display(),
                    error = %e,
                    "Converted file but could not update its record"
                );
                metrics().increment("conversions.record_update_failed");
                None
            }
        };

        UploadReport {
            upload: Upload {
                file_path: new_path,
                attachment_id: upload.attachment_id,
            },
            outcome,
            record,
        }
    }
}
