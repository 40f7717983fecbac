//! Arbitrary-angle rotation with bilinear interpolation.
//!
//! The canvas expands to the bounding box of the rotated image and exposed
//! background is painted with the viewer's neutral backdrop color.
//!
//! # Algorithm
//!
//! The rotation uses inverse mapping: for each pixel in the output image,
//! we calculate which source pixels contribute to it and interpolate
//! their values.
//!
//! For rotation by angle θ, the inverse transform is:
//! ```text
//! src_x = (dst_x - cx) * cos(-θ) - (dst_y - cy) * sin(-θ) + src_cx
//! src_y = (dst_x - cx) * sin(-θ) + (dst_y - cy) * cos(-θ) + src_cy
//! ```
//!
//! A source coordinate is usable only if `0 <= x < w - 1` and
//! `0 <= y < h - 1`, so all four interpolation taps lie inside the image.

use crate::luminance::calculate_luminance;
use crate::raster::{ChannelLayout, ImageError, RasterImage, Result};

/// Backdrop color #606470 as normalized RGB.
pub const FILL_COLOR: [f32; 3] = [96.0 / 255.0, 100.0 / 255.0, 112.0 / 255.0];

/// Compute the dimensions of the bounding box for a rotated image.
///
/// `new_w = |cos θ|·w + |sin θ|·h` and `new_h = |sin θ|·w + |cos θ|·h`,
/// truncated to integers and never below 1.
///
/// # Example
///
/// ```
/// use retouch_core::transform::compute_rotated_bounds;
///
/// // 90-degree rotation swaps dimensions
/// let (w, h) = compute_rotated_bounds(100, 50, 90.0);
/// assert_eq!(w, 50);
/// assert_eq!(h, 100);
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let angle_normalized = angle_degrees % 360.0;
    if angle_normalized == 0.0 {
        return (width, height);
    }

    // Exact quarter turns: trig round-off would otherwise leak into the sum
    let abs_angle = angle_normalized.abs();
    if abs_angle == 90.0 || abs_angle == 270.0 {
        return (height, width);
    }
    if abs_angle == 180.0 {
        return (width, height);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    let new_w = (w * cos + h * sin) as u32;
    let new_h = (w * sin + h * cos) as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate an image counter-clockwise by `angle_degrees` around its center.
///
/// Any multiple of 360 returns an untouched copy.
///
/// # Errors
///
/// Returns `InvalidParameter` for a non-finite angle.
pub fn rotate(image: &RasterImage, angle_degrees: f64) -> Result<RasterImage> {
    if !angle_degrees.is_finite() {
        return Err(ImageError::InvalidParameter {
            name: "rotation angle",
            value: angle_degrees,
        });
    }
    if angle_degrees % 360.0 == 0.0 {
        return Ok(image.clone());
    }

    let (src_w, src_h) = (image.width() as f64, image.height() as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(image.width(), image.height(), angle_degrees);

    // Negate angle for correct visual rotation direction
    let angle_rad = -angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let fill = fill_pixel(image.layout());
    let channels = image.channels();
    let mut output = Vec::with_capacity(dst_w as usize * dst_h as usize * channels);

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            let dx = dst_x as f64 - dst_cx;
            let dy = dst_y as f64 - dst_cy;

            let src_x = dx * cos - dy * sin + src_cx;
            let src_y = dx * sin + dy * cos + src_cy;

            match sample_bilinear(image, src_x, src_y) {
                Some(pixel) => output.extend_from_slice(&pixel[..channels]),
                None => output.extend_from_slice(&fill[..channels]),
            }
        }
    }

    Ok(RasterImage::from_parts(
        dst_w,
        dst_h,
        image.layout(),
        output,
    ))
}

/// Backdrop pixel for a layout: luminance for gray, opaque for RGBA.
fn fill_pixel(layout: ChannelLayout) -> [f32; 4] {
    let [r, g, b] = FILL_COLOR;
    match layout {
        ChannelLayout::Gray => [calculate_luminance(r, g, b), 0.0, 0.0, 0.0],
        ChannelLayout::Rgb | ChannelLayout::Rgba => [r, g, b, 1.0],
    }
}

/// Sample a pixel using bilinear interpolation.
///
/// Returns `None` when the coordinate is outside the interpolable extent.
fn sample_bilinear(image: &RasterImage, x: f64, y: f64) -> Option<[f32; 4]> {
    let (w, h) = (image.width() as f64, image.height() as f64);
    if x < 0.0 || x >= w - 1.0 || y < 0.0 || y >= h - 1.0 {
        return None;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = image.pixel(x0, y0);
    let p10 = image.pixel(x1, y0);
    let p01 = image.pixel(x0, y1);
    let p11 = image.pixel(x1, y1);

    let mut result = [0.0f32; 4];
    for (i, out) in result.iter_mut().enumerate().take(image.channels()) {
        let v = p00[i] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[i] as f64 * fx * (1.0 - fy)
            + p01[i] as f64 * (1.0 - fx) * fy
            + p11[i] as f64 * fx * fy;
        *out = v as f32;
    }

    Some(result)
}
