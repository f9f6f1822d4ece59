//! Attachment records and how a conversion rewrites them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use webpopt_image::{AttachmentId, ConversionOutcome, ImageFormat};

use crate::{AttachmentStore, MediaError, Result};

/// Metadata the media library keeps for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Record id
    pub id: AttachmentId,
    /// Where the file lives on disk
    pub file_path: PathBuf,
    /// MIME type of the file
    pub mime_type: String,
    /// Public reference, usually a URL ending in the file name
    pub guid: String,
    /// Last modification of this record
    pub updated_at: DateTime<Utc>,
}

impl AttachmentRecord {
    /// Create a record for a stored file.
    pub fn new(
        id: AttachmentId,
        file_path: impl Into<PathBuf>,
        mime_type: impl Into<String>,
        guid: impl Into<String>,
    ) -> Self {
        Self {
            id,
            file_path: file_path.into(),
            mime_type: mime_type.into(),
            guid: guid.into(),
            updated_at: Utc::now(),
        }
    }

    /// Whether the file is already WebP.
    pub fn is_webp(&self) -> bool {
        self.mime_type == ImageFormat::WebP.mime_type()
    }

    /// Point the record at the converted file.
    ///
    /// Sets the new path and MIME type and swaps the old file name for the new
    /// one inside the guid.
    pub fn mark_converted(&mut self, new_path: &Path) {
        if let (Some(old_name), Some(new_name)) = (file_name(&self.file_path), file_name(new_path)) {
            self.guid = self.guid.replace(&old_name, &new_name);
        }
        self.file_path = new_path.to_path_buf();
        self.mime_type = ImageFormat::WebP.mime_type().to_string();
        self.updated_at = Utc::now();
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Persist what a conversion did to the attachment's record.
///
/// Only a [`ConversionOutcome::Converted`] changes anything; the updated record
/// is returned. Every other outcome leaves the store untouched and returns
/// `None`.
pub fn apply_outcome<S: AttachmentStore + ?Sized>(
    store: &S,
    id: AttachmentId,
    outcome: &ConversionOutcome,
) -> Result<Option<AttachmentRecord>> {
    let ConversionOutcome::Converted { new_path, .. } = outcome else {
        return Ok(None);
    };

    let mut record = store.get(id)?.ok_or(MediaError::NotFound(id))?;
    record.mark_converted(new_path);
    store.update(record.clone())?;
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use proptest::prelude::*;

    fn record() -> AttachmentRecord {
        AttachmentRecord::new(
            AttachmentId(5),
            "/srv/uploads/2024/06/beach.jpg",
            "image/jpeg",
            "https://example.org/uploads/2024/06/beach.jpg",
        )
    }

    #[test]
    fn test_mark_converted() {
        let mut rec = record();
        rec.mark_converted(Path::new("/srv/uploads/2024/06/beach.webp"));

        assert_eq!(rec.file_path, PathBuf::from("/srv/uploads/2024/06/beach.webp"));
        assert_eq!(rec.mime_type, "image/webp");
        assert_eq!(rec.guid, "https://example.org/uploads/2024/06/beach.webp");
        assert!(rec.is_webp());
    }

    #[test]
    fn test_apply_converted_outcome() {
        let store = MemoryStore::new();
        store.insert(record()).unwrap();

        let outcome = ConversionOutcome::Converted {
            new_path: PathBuf::from("/srv/uploads/2024/06/beach.webp"),
            original_size: 500_000,
            new_size: 300_000,
        };
        let updated = apply_outcome(&store, AttachmentId(5), &outcome).unwrap().unwrap();

        assert_eq!(updated.mime_type, "image/webp");
        assert_eq!(store.get(AttachmentId(5)).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_apply_other_outcomes_is_noop() {
        let store = MemoryStore::new();
        store.insert(record()).unwrap();

        for outcome in [
            ConversionOutcome::SkippedNotSmaller,
            ConversionOutcome::SkippedDisabled,
        ] {
            assert!(apply_outcome(&store, AttachmentId(5), &outcome).unwrap().is_none());
        }
        assert_eq!(store.get(AttachmentId(5)).unwrap().unwrap().mime_type, "image/jpeg");
    }

    #[test]
    fn test_apply_to_missing_record() {
        let store = MemoryStore::new();
        let outcome = ConversionOutcome::Converted {
            new_path: PathBuf::from("/x.webp"),
            original_size: 2,
            new_size: 1,
        };
        assert!(matches!(
            apply_outcome(&store, AttachmentId(9), &outcome),
            Err(MediaError::NotFound(AttachmentId(9)))
        ));
    }

    proptest! {
        #[test]
        fn prop_mark_converted_rewrites_guid_basename(
            stem in "[a-z0-9_-]{1,20}",
            ext in prop::sample::select(vec!["jpg", "jpeg", "png", "gif"]),
        ) {
            let mut rec = AttachmentRecord::new(
                AttachmentId(1),
                format!("/srv/uploads/{stem}.{ext}"),
                "image/jpeg",
                format!("https://example.org/uploads/{stem}.{ext}"),
            );
            rec.mark_converted(&PathBuf::from(format!("/srv/uploads/{stem}.webp")));

            prop_assert_eq!(rec.guid, format!("https://example.org/uploads/{stem}.webp"));
            prop_assert_eq!(rec.mime_type, "image/webp");
        }
    }
}
