//! EXIF orientation handling.
//!
//! Only the three pure rotations are corrected. Mirrored variants (EXIF 2, 4,
//! 5 and 7) and anything unrecognized pass through untouched; in every case
//! the tag is reset to [`OrientationTag::Normal`] afterwards.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Orientation stored in a source image's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationTag {
    /// EXIF 1: top-left, no transform
    Normal,
    /// EXIF 2: mirrored horizontally
    FlipHorizontal,
    /// EXIF 3: bottom-right, upside down
    Rotate180,
    /// EXIF 4: mirrored vertically
    FlipVertical,
    /// EXIF 5: mirrored along the main diagonal
    Transpose,
    /// EXIF 6: right-top, needs a clockwise quarter turn
    Rotate90Cw,
    /// EXIF 7: mirrored along the anti-diagonal
    Transverse,
    /// EXIF 8: left-bottom, needs a counter-clockwise quarter turn
    Rotate90Ccw,
    /// Any value outside 1..=8
    Unknown(u8),
}

impl OrientationTag {
    /// Map a raw EXIF orientation value.
    pub fn from_exif(value: u8) -> Self {
        match value {
            1 => Self::Normal,
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90Cw,
            7 => Self::Transverse,
            8 => Self::Rotate90Ccw,
            other => Self::Unknown(other),
        }
    }

    /// Raw EXIF value for this tag.
    pub fn to_exif(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90Cw => 6,
            Self::Transverse => 7,
            Self::Rotate90Ccw => 8,
            Self::Unknown(value) => value,
        }
    }

    /// Clockwise rotation in degrees applied by [`OrientationTag::correct`].
    pub fn correction_degrees(self) -> i32 {
        match self {
            Self::Rotate180 => 180,
            Self::Rotate90Cw => 90,
            Self::Rotate90Ccw => -90,
            _ => 0,
        }
    }

    /// Rotate pixel data so it matches the intended visual orientation.
    pub fn correct(self, raster: DynamicImage) -> DynamicImage {
        match self {
            Self::Rotate180 => raster.rotate180(),
            Self::Rotate90Cw => raster.rotate90(),
            Self::Rotate90Ccw => raster.rotate270(),
            _ => raster,
        }
    }
}
