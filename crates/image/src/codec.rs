//! WebP codec capability.

use image::DynamicImage;

use crate::{ImageError, Result};

/// Something that can turn a raster into WebP bytes.
///
/// Doubles as the capability probe: callers ask [`WebpCodec::is_available`]
/// before offering or running a conversion.
pub trait WebpCodec: Send + Sync {
    /// Human-readable codec name for logs and health output.
    fn name(&self) -> &'static str;

    /// Whether the codec can encode right now.
    fn is_available(&self) -> bool;

    /// Encode `raster` as lossy WebP at `quality` (1-100).
    fn encode(&self, raster: &DynamicImage, quality: u8) -> Result<Vec<u8>>;
}

/// The libwebp encoder compiled in through the `webp-encoder` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCodec;

impl WebpCodec for BuiltinCodec {
    fn name(&self) -> &'static str {
        "libwebp"
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "webp-encoder")
    }

    #[cfg(feature = "webp-encoder")]
    fn encode(&self, raster: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        let (width, height) = (raster.width(), raster.height());
        let quality = f32::from(quality);

        // libwebp takes packed RGB or RGBA; keep alpha only when the source has it
        let encoded = if raster.color().has_alpha() {
            let rgba = raster.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, quality)
        } else {
            let rgb = raster.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
        };

        encoded
            .map(|memory| memory.to_vec())
            .map_err(|e| ImageError::EncodeError(format!("libwebp rejected {width}x{height} raster: {e:?}")))
    }

    #[cfg(not(feature = "webp-encoder"))]
    fn encode(&self, _raster: &DynamicImage, _quality: u8) -> Result<Vec<u8>> {
        Err(ImageError::CodecUnavailable)
    }
}

#[cfg(all(test, feature = "webp-encoder"))]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_builtin_is_available() {
        assert!(BuiltinCodec.is_available());
    }

    #[test]
    fn test_encode_rgb_produces_riff_webp() {
        let raster = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 16, Rgb([200, 40, 40])));
        let bytes = BuiltinCodec.encode(&raster, 82).unwrap();
        assert!(bytes.starts_with(b"RIFF"));
        assert_eq!(&bytes[8..12], b"WEBP");

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn test_encode_rgba() {
        let raster = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 128])));
        let bytes = BuiltinCodec.encode(&raster, 50).unwrap();
        assert_eq!(crate::detect_format(&bytes).unwrap(), crate::ImageFormat::WebP);
    }
}
