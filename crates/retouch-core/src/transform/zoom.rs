//! Cropping and center-anchored zoom.
//!
//! Zoom crops a window of `width / factor x height / factor` pixels around
//! the requested center and resamples it back to the full canvas. The window
//! is clamped to the image, so a center near an edge yields an off-center
//! zoom rather than exposing anything outside the image.

use crate::raster::{resample_linear, ImageError, RasterImage, Result};

/// Pixel rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Copy out a rectangle of pixels.
///
/// The rectangle is clamped to the image bounds and is never smaller
/// than 1x1.
pub fn crop(image: &RasterImage, rect: CropRect) -> RasterImage {
    let left = rect.left.min(image.width() - 1);
    let top = rect.top.min(image.height() - 1);
    let right = left.saturating_add(rect.width).min(image.width());
    let bottom = top.saturating_add(rect.height).min(image.height());

    let out_width = (right - left).max(1);
    let out_height = (bottom - top).max(1);

    // Fast path: full crop returns a clone
    if out_width == image.width() && out_height == image.height() {
        return image.clone();
    }

    let channels = image.channels();
    let row_len = out_width as usize * channels;
    let mut output = Vec::with_capacity(row_len * out_height as usize);

    // Copy pixel data row by row
    for y in top..top + out_height {
        let start = image.offset(left, y);
        output.extend_from_slice(&image.samples()[start..start + row_len]);
    }

    RasterImage::from_parts(out_width, out_height, image.layout(), output)
}

/// Compute the clamped zoom window for an image.
///
/// The window is `trunc(width / factor)` wide, starts at
/// `max(0, trunc(cx - window / 2))` and is cut short at the far edge.
pub fn zoom_window(width: u32, height: u32, factor: f64, center: (f64, f64)) -> CropRect {
    let (left, win_w) = window_axis(width, factor, center.0);
    let (top, win_h) = window_axis(height, factor, center.1);
    CropRect {
        left,
        top,
        width: win_w,
        height: win_h,
    }
}

fn window_axis(dim: u32, factor: f64, center: f64) -> (u32, u32) {
    let window = ((dim as f64 / factor) as u32).max(1);
    let start = (center - window as f64 / 2.0) as i64;
    let start = start.clamp(0, dim as i64 - 1) as u32;
    let end = start.saturating_add(window).min(dim);
    (start, end - start)
}

/// Zoom by `factor` around `center` (source pixel coordinates), keeping the
/// output at the input's dimensions.
///
/// `factor > 1` magnifies; `factor < 1` crops the whole image, which leaves
/// it unchanged. A factor of exactly 1.0 returns a copy.
///
/// # Errors
///
/// Returns `InvalidParameter` if `factor` is not a positive finite number.
pub fn zoom(image: &RasterImage, factor: f64, center: (f64, f64)) -> Result<RasterImage> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ImageError::InvalidParameter {
            name: "zoom factor",
            value: factor,
        });
    }
    if factor == 1.0 {
        return Ok(image.clone());
    }

    let rect = zoom_window(image.width(), image.height(), factor, center);
    let window = crop(image, rect);
    resample_linear(&window, image.width(), image.height())
}

/// Center of an image in pixel coordinates, the default zoom anchor.
pub fn image_center(image: &RasterImage) -> (f64, f64) {
    (image.width() as f64 / 2.0, image.height() as f64 / 2.0)
}
