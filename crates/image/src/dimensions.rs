//! Target dimension calculation for width-capped downscaling.

/// Calculate target dimensions maintaining aspect ratio.
///
/// # Arguments
/// * `current_width` - Current width
/// * `current_height` - Current height
/// * `max_width` - Width cap; images at or below it are left alone
///
/// # Returns
/// (new_width, new_height). Height is `round(current_height * max_width / current_width)`
/// and may come out as 0 for extreme panoramas; callers must reject that.
///
/// # Example
/// ```
/// use webpopt_image::calculate_dimensions;
///
/// assert_eq!(calculate_dimensions(3000, 2000, 1920), (1920, 1280));
/// assert_eq!(calculate_dimensions(800, 600, 1920), (800, 600));
/// ```
pub fn calculate_dimensions(current_width: u32, current_height: u32, max_width: u32) -> (u32, u32) {
    if current_width <= max_width {
        return (current_width, current_height);
    }

    let ratio = max_width as f64 / current_width as f64;
    let new_height = (current_height as f64 * ratio).round() as u32;

    (max_width, new_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dimension_calculation() {
        // 4000x3000 -> 800 wide
        let (w, h) = calculate_dimensions(4000, 3000, 800);
        assert_eq!(w, 800);
        assert_eq!(h, 600);
    }

    #[test]
    fn test_dimension_no_resize() {
        let (w, h) = calculate_dimensions(500, 400, 800);
        assert_eq!(w, 500);
        assert_eq!(h, 400);
    }

    #[test]
    fn test_exactly_at_limit() {
        assert_eq!(calculate_dimensions(1920, 1080, 1920), (1920, 1080));
    }

    #[test]
    fn test_rounding() {
        // 400 * 320 / 600 = 213.33
        assert_eq!(calculate_dimensions(600, 400, 320), (320, 213));
        // 3 * 2 / 4 = 1.5 rounds half away from zero
        assert_eq!(calculate_dimensions(4, 3, 2), (2, 2));
    }

    #[test]
    fn test_extreme_panorama_collapses_height() {
        assert_eq!(calculate_dimensions(10_000, 1, 1000), (1000, 0));
    }

    proptest! {
        #[test]
        fn prop_width_capped_and_ratio_kept(
            w in 2u32..20_000,
            h in 1u32..20_000,
            max in 1u32..10_000,
        ) {
            let (nw, nh) = calculate_dimensions(w, h, max);
            if w > max {
                prop_assert_eq!(nw, max);
                let exact = h as f64 * max as f64 / w as f64;
                prop_assert!((nh as f64 - exact).abs() <= 1.0);
            } else {
                prop_assert_eq!((nw, nh), (w, h));
            }
        }
    }
}
