//! Width-capped downscaling with the image crate.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::{calculate_dimensions, ImageError, Result};

/// Downscale `raster` so its width does not exceed `max_width`.
///
/// Height follows the original aspect ratio. Uses Lanczos3 resampling.
/// Rasters already at or under the cap are returned unchanged.
pub fn fit_to_width(raster: DynamicImage, max_width: u32) -> Result<DynamicImage> {
    let current_width = raster.width();
    let current_height = raster.height();

    if current_width <= max_width {
        return Ok(raster);
    }

    let (new_width, new_height) = calculate_dimensions(current_width, current_height, max_width);
    if new_width == 0 || new_height == 0 {
        return Err(ImageError::ResizeError(format!(
            "{}x{} cannot be scaled to width {}: computed {}x{}",
            current_width, current_height, max_width, new_width, new_height
        )));
    }

    Ok(raster.resize_exact(new_width, new_height, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_downscale_keeps_ratio() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(300, 200));
        let out = fit_to_width(img, 192).unwrap();
        assert_eq!((out.width(), out.height()), (192, 128));
    }

    #[test]
    fn test_narrow_image_untouched() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(100, 400));
        let out = fit_to_width(img, 192).unwrap();
        assert_eq!((out.width(), out.height()), (100, 400));
    }

    #[test]
    fn test_degenerate_height_rejected() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(5000, 1));
        assert!(matches!(fit_to_width(img, 100), Err(ImageError::ResizeError(_))));
    }
}
