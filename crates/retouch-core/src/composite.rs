//! Alpha compositing of a secondary image onto a base.
//!
//! The overlay is placed with its top-left corner at a pixel offset on the
//! base canvas and blended per pixel:
//!
//! ```text
//! mask   = overlay_alpha * opacity   (RGBA overlay)
//!        = opacity                   (RGB overlay)
//! result = mask * overlay + (1 - mask) * base
//! ```
//!
//! Only the overlap of the offset overlay with the base is touched. The
//! output always has the base's dimensions and is RGB.

use crate::channels::strip_alpha;
use crate::raster::{ChannelLayout, ImageError, RasterImage, Result};

/// Overlap of an offset overlay with the base canvas, in base coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Overlap {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Overlap {
    fn compute(base: &RasterImage, overlay: &RasterImage, x_offset: i64, y_offset: i64) -> Self {
        let axis = |base_dim: u32, overlay_dim: u32, offset: i64| {
            let start = offset.clamp(0, base_dim as i64);
            let end = offset
                .saturating_add(overlay_dim as i64)
                .clamp(start, base_dim as i64);
            (start as u32, end as u32)
        };
        let (x0, x1) = axis(base.width(), overlay.width(), x_offset);
        let (y0, y1) = axis(base.height(), overlay.height(), y_offset);
        Self { x0, y0, x1, y1 }
    }

    fn is_empty(&self) -> bool {
        self.x0 == self.x1 || self.y0 == self.y1
    }
}

/// Blend `overlay` onto `base` at (`x_offset`, `y_offset`) with a global
/// `opacity` in [0, 1].
///
/// Offsets may be negative or past the far edge; the overlay is clipped to
/// the base canvas either way. Base alpha is discarded before blending.
///
/// # Errors
///
/// * `UnsupportedLayout` if either image is grayscale
/// * `InvalidParameter` if `opacity` is not finite
pub fn composite(
    base: &RasterImage,
    overlay: &RasterImage,
    opacity: f32,
    x_offset: i64,
    y_offset: i64,
) -> Result<RasterImage> {
    base.require_color("composite base")?;
    overlay.require_color("composite overlay")?;
    if !opacity.is_finite() {
        return Err(ImageError::InvalidParameter {
            name: "opacity",
            value: opacity as f64,
        });
    }
    let opacity = opacity.clamp(0.0, 1.0);

    let base = strip_alpha(base);
    let overlap = Overlap::compute(&base, overlay, x_offset, y_offset);
    if overlap.is_empty() {
        return Ok(base);
    }

    let has_alpha = overlay.layout().has_alpha();
    let width = base.width();
    let height = base.height();
    let mut samples = base.into_samples();

    for y in overlap.y0..overlap.y1 {
        let oy = (y as i64 - y_offset) as u32;
        for x in overlap.x0..overlap.x1 {
            let ox = (x as i64 - x_offset) as u32;
            let src = overlay.pixel(ox, oy);
            let mask = if has_alpha { src[3] * opacity } else { opacity };

            let dst = (y as usize * width as usize + x as usize) * 3;
            for c in 0..3 {
                samples[dst + c] = mask * src[c] + (1.0 - mask) * samples[dst + c];
            }
        }
    }

    Ok(RasterImage::from_parts(
        width,
        height,
        ChannelLayout::Rgb,
        samples,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, pixel: &[f32]) -> RasterImage {
        let layout = ChannelLayout::from_channels(pixel.len()).unwrap();
        RasterImage::filled(width, height, layout, pixel).unwrap()
    }

    fn assert_pixel(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "got {actual:?}, want {expected:?}");
        }
    }

    #[test]
    fn test_blend_rgb_overlay() {
        let base = solid(4, 4, &[0.0, 0.0, 0.0]);
        let overlay = solid(2, 2, &[1.0, 1.0, 1.0]);
        let out = composite(&base, &overlay, 0.5, 1, 1).unwrap();

        assert_eq!((out.width(), out.height()), (4, 4));
        assert_pixel(out.pixel(1, 1), &[0.5, 0.5, 0.5]);
        assert_pixel(out.pixel(2, 2), &[0.5, 0.5, 0.5]);
        // Outside the overlay the base is untouched
        assert_pixel(out.pixel(0, 0), &[0.0, 0.0, 0.0]);
        assert_pixel(out.pixel(3, 3), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_overlay_alpha_scales_mask() {
        let base = solid(2, 2, &[0.0, 0.0, 0.0]);
        let overlay = solid(2, 2, &[1.0, 0.0, 0.0, 0.5]);
        let out = composite(&base, &overlay, 0.5, 0, 0).unwrap();
        // mask = 0.5 * 0.5
        assert_pixel(out.pixel(0, 0), &[0.25, 0.0, 0.0]);
    }

    #[test]
    fn test_full_and_zero_opacity() {
        let base = solid(3, 3, &[0.2, 0.4, 0.6]);
        let overlay = solid(3, 3, &[0.9, 0.8, 0.7]);

        let opaque = composite(&base, &overlay, 1.0, 0, 0).unwrap();
        assert_pixel(opaque.pixel(1, 1), &[0.9, 0.8, 0.7]);

        let clear = composite(&base, &overlay, 0.0, 0, 0).unwrap();
        assert!(clear.approx_eq(&base, 1e-6));
    }

    #[test]
    fn test_base_alpha_is_stripped() {
        let base = solid(2, 2, &[0.0, 0.0, 0.0, 0.3]);
        let overlay = solid(1, 1, &[1.0, 1.0, 1.0]);
        let out = composite(&base, &overlay, 1.0, 0, 0).unwrap();
        assert_eq!(out.layout(), ChannelLayout::Rgb);
        assert_pixel(out.pixel(0, 0), &[1.0, 1.0, 1.0]);
        assert_pixel(out.pixel(1, 1), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_oversized_overlay_is_clipped() {
        let base = solid(4, 3, &[0.0, 0.0, 0.0]);
        let overlay = solid(10, 10, &[1.0, 1.0, 1.0]);
        let out = composite(&base, &overlay, 1.0, 2, 1).unwrap();

        assert_eq!((out.width(), out.height()), (4, 3));
        assert_pixel(out.pixel(1, 2), &[0.0, 0.0, 0.0]);
        assert_pixel(out.pixel(2, 1), &[1.0, 1.0, 1.0]);
        assert_pixel(out.pixel(3, 2), &[1.0, 1.0, 1.0]);
        assert_pixel(out.pixel(3, 0), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_offset_beyond_bounds_leaves_base() {
        let base = solid(4, 4, &[0.3, 0.3, 0.3]);
        let overlay = solid(2, 2, &[1.0, 1.0, 1.0]);

        let out = composite(&base, &overlay, 1.0, 10, 0).unwrap();
        assert_eq!(out, base);

        let out = composite(&base, &overlay, 1.0, 0, -5).unwrap();
        assert_eq!(out, base);
    }

    #[test]
    fn test_negative_offset_clips_near_side() {
        let base = solid(4, 4, &[0.0, 0.0, 0.0]);
        // Overlay columns carry their own x index so the clipped part is visible
        let overlay = RasterImage::from_fn(3, 3, ChannelLayout::Rgb, |x, _, _| x as f32 / 2.0).unwrap();
        let out = composite(&base, &overlay, 1.0, -1, -1).unwrap();

        // Base (0, 0) receives overlay (1, 1)
        assert_pixel(out.pixel(0, 0), &[0.5, 0.5, 0.5]);
        assert_pixel(out.pixel(1, 1), &[1.0, 1.0, 1.0]);
        assert_pixel(out.pixel(2, 2), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rejects_gray() {
        let gray = solid(2, 2, &[0.5]);
        let rgb = solid(2, 2, &[0.5, 0.5, 0.5]);
        assert!(composite(&gray, &rgb, 0.5, 0, 0).is_err());
        assert!(composite(&rgb, &gray, 0.5, 0, 0).is_err());
    }

    #[test]
    fn test_rejects_nan_opacity() {
        let rgb = solid(2, 2, &[0.5, 0.5, 0.5]);
        assert!(composite(&rgb, &rgb, f32::NAN, 0, 0).is_err());
    }
}
