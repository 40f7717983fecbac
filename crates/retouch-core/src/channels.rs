//! Channel layer operations.
//!
//! Three distinct channel views are offered:
//! - [`isolate_channel`] keeps one channel and zeroes the other two
//! - [`dim_other_channels`] keeps one channel and attenuates the others,
//!   leaving a visible trace of them
//! - [`remove_channel`] attenuates one channel, the subtractive "CMY"
//!   preview (removing red leaves cyan, and so on)
//!
//! Attenuating operations first run [`restore_attenuated_channels`] so that
//! chaining them from an already-attenuated image does not darken it twice.

use crate::raster::{clamp_unit, ChannelLayout, ColorChannel, RasterImage, Result};

/// Multiplier applied to an attenuated channel.
pub const ATTENUATION_FACTOR: f32 = 0.1;

/// Multiplier used to recover a previously attenuated channel.
pub const RECOVERY_FACTOR: f32 = 10.0;

/// Drop the alpha channel of an RGBA image; other layouts are returned as is.
pub fn strip_alpha(image: &RasterImage) -> RasterImage {
    if !image.layout().has_alpha() {
        return image.clone();
    }

    let samples = image
        .samples()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RasterImage::from_parts(image.width(), image.height(), ChannelLayout::Rgb, samples)
}

/// Keep only `channel`; the other two color channels become 0.
///
/// The result is always a 3-channel RGB image (alpha is dropped).
pub fn isolate_channel(image: &RasterImage, channel: ColorChannel) -> Result<RasterImage> {
    image.require_color("channel isolation")?;

    let keep = channel.index();
    let mut samples = Vec::with_capacity(image.pixel_count() as usize * 3);
    for px in image.samples().chunks_exact(image.channels()) {
        for c in 0..3 {
            samples.push(if c == keep { px[c] } else { 0.0 });
        }
    }

    Ok(RasterImage::from_parts(
        image.width(),
        image.height(),
        ChannelLayout::Rgb,
        samples,
    ))
}

/// Keep `channel` and attenuate the other two by [`ATTENUATION_FACTOR`].
pub fn dim_other_channels(image: &RasterImage, channel: ColorChannel) -> Result<RasterImage> {
    let restored = restore_attenuated_channels(image)?;
    let others: Vec<usize> = ColorChannel::ALL
        .into_iter()
        .filter(|c| *c != channel)
        .map(ColorChannel::index)
        .collect();
    Ok(scale_channels(&restored, &others, ATTENUATION_FACTOR))
}

/// Attenuate `channel` by [`ATTENUATION_FACTOR`], leaving the others intact.
pub fn remove_channel(image: &RasterImage, channel: ColorChannel) -> Result<RasterImage> {
    let restored = restore_attenuated_channels(image)?;
    Ok(scale_channels(&restored, &[channel.index()], ATTENUATION_FACTOR))
}

/// Undo a previous attenuation.
///
/// Every color channel whose mean is below the average of the other two
/// channels' means is multiplied by [`RECOVERY_FACTOR`] and clamped. Means
/// are taken from the input, before any correction.
pub fn restore_attenuated_channels(image: &RasterImage) -> Result<RasterImage> {
    image.require_color("channel restoration")?;

    let means = channel_means(image);
    let attenuated: Vec<usize> = (0..3)
        .filter(|&c| {
            let others = (0..3).filter(|&o| o != c).map(|o| means[o]).sum::<f64>() / 2.0;
            means[c] < others
        })
        .collect();

    if attenuated.is_empty() {
        return Ok(image.clone());
    }
    Ok(scale_channels(image, &attenuated, RECOVERY_FACTOR))
}

fn channel_means(image: &RasterImage) -> [f64; 3] {
    let mut sums = [0.0f64; 3];
    for px in image.samples().chunks_exact(image.channels()) {
        for (sum, &v) in sums.iter_mut().zip(px) {
            *sum += v as f64;
        }
    }
    let n = image.pixel_count() as f64;
    sums.map(|s| s / n)
}

fn scale_channels(image: &RasterImage, targets: &[usize], factor: f32) -> RasterImage {
    let mut samples = image.samples().to_vec();
    for px in samples.chunks_exact_mut(image.channels()) {
        for &c in targets {
            px[c] = clamp_unit(px[c] * factor);
        }
    }
    RasterImage::from_parts(image.width(), image.height(), image.layout(), samples)
}
