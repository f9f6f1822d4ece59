//! Decoding source files into an in-memory raster.

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageReader};

use crate::{detect_format, ImageFormat, OrientationTag, Result};

/// A decoded source image together with the orientation its metadata declared.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Pixel data exactly as stored in the file
    pub raster: DynamicImage,
    /// Container format the data was sniffed as
    pub format: ImageFormat,
    /// Orientation tag read from embedded metadata
    pub orientation: OrientationTag,
}

impl DecodedImage {
    /// Decode image file data.
    ///
    /// Formats without orientation metadata, or files whose metadata cannot be
    /// parsed, report [`OrientationTag::Normal`].
    pub fn decode(data: &[u8]) -> Result<Self> {
        let format = detect_format(data)?;

        let mut decoder = ImageReader::with_format(Cursor::new(data), format.decoder_format())
            .into_decoder()?;

        let orientation = decoder
            .orientation()
            .map(|o| OrientationTag::from_exif(o.to_exif()))
            .unwrap_or(OrientationTag::Normal);

        let raster = DynamicImage::from_decoder(decoder)?;

        Ok(Self {
            raster,
            format,
            orientation,
        })
    }

    /// Apply the orientation correction and reset the tag to normal.
    pub fn normalized(self) -> Self {
        Self {
            raster: self.orientation.correct(self.raster),
            format: self.format,
            orientation: OrientationTag::Normal,
        }
    }

    /// Width and height of the raster.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.raster.width(), self.raster.height())
    }
}
