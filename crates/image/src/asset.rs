//! The unit of work handed to the engine.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque handle of the media record a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(pub u64);

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source file and the record it should be reported against.
///
/// Built fresh for every call; the engine never holds on to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Absolute path of the existing raster file
    pub source_path: PathBuf,
    /// Record to report back against
    pub attachment_id: AttachmentId,
}

impl ImageAsset {
    /// Create an asset for `source_path`.
    pub fn new(source_path: impl Into<PathBuf>, attachment_id: AttachmentId) -> Self {
        Self {
            source_path: source_path.into(),
            attachment_id,
        }
    }

    /// Path of the source file.
    pub fn path(&self) -> &Path {
        &self.source_path
    }
}
