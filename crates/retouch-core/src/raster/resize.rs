//! Image resizing for preview reduction, overlay scaling and zoom resampling.
//!
//! All functions return new `RasterImage` instances without modifying the input.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Pixel, Rgb, Rgba};

use super::{ChannelLayout, ImageError, RasterImage, Result};

/// Largest output, in pixels, that `resize_nearest` will allocate.
pub const MAX_RESIZE_PIXELS: u64 = 100_000_000;

/// Scale an image by `factor` using nearest-neighbor sampling.
///
/// The output is `floor(width * factor) x floor(height * factor)`. Source
/// indices are `round(linspace(0, dim - 1, new_dim))`, with ties rounded to
/// even, so the first and last rows/columns are always sampled.
///
/// # Errors
///
/// * `InvalidParameter` if `factor` is not a positive finite number, or if
///   the output would exceed [`MAX_RESIZE_PIXELS`]
/// * `EmptyImage` if the scaled image would have zero area
pub fn resize_nearest(image: &RasterImage, factor: f64) -> Result<RasterImage> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ImageError::InvalidParameter {
            name: "resize factor",
            value: factor,
        });
    }

    let scaled_width = (image.width() as f64 * factor).floor();
    let scaled_height = (image.height() as f64 * factor).floor();
    if scaled_width < 1.0 || scaled_height < 1.0 {
        return Err(ImageError::EmptyImage);
    }
    if scaled_width * scaled_height > MAX_RESIZE_PIXELS as f64 {
        return Err(ImageError::InvalidParameter {
            name: "resize factor",
            value: factor,
        });
    }
    let new_width = scaled_width as u32;
    let new_height = scaled_height as u32;

    // Fast path: if dimensions match, just clone
    if new_width == image.width() && new_height == image.height() {
        return Ok(image.clone());
    }

    let xs = nearest_indices(image.width(), new_width);
    let ys = nearest_indices(image.height(), new_height);
    let channels = image.channels();

    let mut output = Vec::with_capacity(new_width as usize * new_height as usize * channels);
    for &sy in &ys {
        for &sx in &xs {
            output.extend_from_slice(image.pixel(sx, sy));
        }
    }

    Ok(RasterImage::from_parts(
        new_width,
        new_height,
        image.layout(),
        output,
    ))
}

/// Resample an image to exact dimensions with the triangle (bilinear) filter.
///
/// When enlarging, destination pixel `d` samples source coordinate
/// `(d + 0.5) * src / dst - 0.5` with edge pixels replicated. Zero target
/// dimensions are raised to 1.
///
/// # Errors
///
/// Returns `BufferMismatch` if the samples cannot be wrapped in an image
/// buffer.
pub fn resample_linear(image: &RasterImage, width: u32, height: u32) -> Result<RasterImage> {
    let width = width.max(1);
    let height = height.max(1);

    // Fast path: if dimensions match, just clone
    if image.width() == width && image.height() == height {
        return Ok(image.clone());
    }

    let samples = match image.layout() {
        ChannelLayout::Gray => resize_buffer::<Luma<f32>>(image, width, height)?,
        ChannelLayout::Rgb => resize_buffer::<Rgb<f32>>(image, width, height)?,
        ChannelLayout::Rgba => resize_buffer::<Rgba<f32>>(image, width, height)?,
    };

    Ok(RasterImage::from_parts(width, height, image.layout(), samples))
}

fn resize_buffer<P>(image: &RasterImage, width: u32, height: u32) -> Result<Vec<f32>>
where
    P: Pixel<Subpixel = f32> + 'static,
{
    let buffer = ImageBuffer::<P, Vec<f32>>::from_raw(
        image.width(),
        image.height(),
        image.samples().to_vec(),
    )
    .ok_or_else(|| ImageError::BufferMismatch {
        expected: image.pixel_count() as usize * image.channels(),
        actual: image.samples().len(),
    })?;

    Ok(imageops::resize(&buffer, width, height, FilterType::Triangle).into_raw())
}

/// `round(linspace(0, src - 1, dst))` with ties-to-even rounding.
fn nearest_indices(src: u32, dst: u32) -> Vec<u32> {
    if dst == 1 {
        return vec![0];
    }
    let last = (src - 1) as f64;
    let step = last / (dst - 1) as f64;
    (0..dst)
        .map(|i| ((i as f64 * step).round_ties_even() as u32).min(src - 1))
        .collect()
}
