//! Luminance calculation utilities using ITU-R BT.601 luma weights.
//!
//! Binarization and zone filtering both threshold on this weighted sum.

use crate::raster::ChannelLayout;

/// BT.601 coefficient for red channel in luminance calculation.
pub const LUMINANCE_R: f32 = 0.2989;

/// BT.601 coefficient for green channel in luminance calculation.
pub const LUMINANCE_G: f32 = 0.5870;

/// BT.601 coefficient for blue channel in luminance calculation.
pub const LUMINANCE_B: f32 = 0.1140;

/// Calculate luminance from normalized RGB values (0.0 to 1.0).
///
/// # Returns
/// Luminance value (0.0 to 1.0)
#[inline]
pub fn calculate_luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMINANCE_R * r + LUMINANCE_G * g + LUMINANCE_B * b
}

/// Luminance of a single pixel's samples.
///
/// A grayscale pixel already is its luminance; alpha is ignored.
#[inline]
pub fn pixel_luminance(pixel: &[f32], layout: ChannelLayout) -> f32 {
    match layout {
        ChannelLayout::Gray => pixel[0],
        ChannelLayout::Rgb | ChannelLayout::Rgba => calculate_luminance(pixel[0], pixel[1], pixel[2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients_sum_to_one() {
        let sum = LUMINANCE_R + LUMINANCE_G + LUMINANCE_B;
        assert!((sum - 1.0).abs() < 1e-3, "Coefficients should sum to ~1.0");
    }

    #[test]
    fn test_luminance_pure_white() {
        assert!((calculate_luminance(1.0, 1.0, 1.0) - 0.9999).abs() < 1e-6);
    }

    #[test]
    fn test_luminance_pure_black() {
        assert_eq!(calculate_luminance(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_luminance_primaries() {
        assert!((calculate_luminance(1.0, 0.0, 0.0) - 0.2989).abs() < 1e-6);
        assert!((calculate_luminance(0.0, 1.0, 0.0) - 0.5870).abs() < 1e-6);
        assert!((calculate_luminance(0.0, 0.0, 1.0) - 0.1140).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_luminance_layouts() {
        assert_eq!(pixel_luminance(&[0.3], ChannelLayout::Gray), 0.3);

        let rgb = pixel_luminance(&[0.5, 0.5, 0.5], ChannelLayout::Rgb);
        let rgba = pixel_luminance(&[0.5, 0.5, 0.5, 0.0], ChannelLayout::Rgba);
        assert_eq!(rgb, rgba);
    }
}
