//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Height that keeps the aspect ratio when `original` is scaled to
/// `target_width`: `round(height * target_width / width)`, at least 1.
///
/// # Examples
/// ```
/// # use thumbsweep::imaging::calculate_scaled_height;
/// assert_eq!(calculate_scaled_height((1400, 800), 700), 400);
/// assert_eq!(calculate_scaled_height((1000, 333), 700), 233);
/// ```
pub fn calculate_scaled_height(original: (u32, u32), target_width: u32) -> u32 {
    let (w, h) = original;
    if w == 0 {
        return h.max(1);
    }
    let height = (h as f64 * target_width as f64 / w as f64).round() as u32;
    height.max(1)
}

/// Decide whether an image needs downscaling.
///
/// Returns the target `(width, height)` when `original` is wider than
/// `threshold`, `None` when it already fits.
pub fn calculate_downscale(original: (u32, u32), threshold: u32) -> Option<(u32, u32)> {
    let (w, _) = original;
    if w <= threshold {
        return None;
    }
    Some((threshold, calculate_scaled_height(original, threshold)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_height_exact_ratio() {
        // 1400x800 at 700 wide → 700x400
        assert_eq!(calculate_scaled_height((1400, 800), 700), 400);
    }

    #[test]
    fn scaled_height_rounds_to_nearest() {
        // 333 * 700 / 1000 = 233.1 → 233
        assert_eq!(calculate_scaled_height((1000, 333), 700), 233);
        // 335 * 700 / 1000 = 234.5 → 235
        assert_eq!(calculate_scaled_height((1000, 335), 700), 235);
        // 999 * 700 / 1001 = 698.60 → 699
        assert_eq!(calculate_scaled_height((1001, 999), 700), 699);
    }

    #[test]
    fn scaled_height_never_zero() {
        // Extreme panorama: 10000x3 at 700 → 0.21 → clamped to 1
        assert_eq!(calculate_scaled_height((10000, 3), 700), 1);
    }

    #[test]
    fn scaled_height_portrait() {
        // 800x1600 at 700 → 700x1400
        assert_eq!(calculate_scaled_height((800, 1600), 700), 1400);
    }

    #[test]
    fn downscale_skips_at_or_below_threshold() {
        assert_eq!(calculate_downscale((700, 2000), 700), None);
        assert_eq!(calculate_downscale((320, 240), 700), None);
    }

    #[test]
    fn downscale_just_above_threshold() {
        // 701x401 → 700 x round(401 * 700 / 701) = 700 x 400.43 → 400
        assert_eq!(calculate_downscale((701, 401), 700), Some((700, 400)));
    }

    #[test]
    fn downscale_landscape() {
        assert_eq!(calculate_downscale((1400, 800), 700), Some((700, 400)));
    }
}
