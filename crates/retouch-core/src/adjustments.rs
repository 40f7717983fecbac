//! Tonal adjustment algorithms
//!
//! Brightness, per-channel offset, contrast curves and color inversion.
//! Every function returns a new image; alpha samples pass through unchanged.

use serde::{Deserialize, Serialize};

use crate::raster::{clamp_unit, ColorChannel, RasterImage, Result};

/// Contrast curve family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContrastCurve {
    /// Lifts dark tones: `ln(1 + k·x) / ln(1 + k)`.
    #[default]
    Logarithmic,
    /// Deepens dark tones, keeps highlights: `exp(k·(x − 1))`.
    Exponential,
}

/// Multiply every color sample by `factor`.
///
/// Formula: `output = clamp(input * factor, 0, 1)`. A factor of 1.0 is the
/// identity.
///
/// # Example
/// ```
/// use retouch_core::raster::{ChannelLayout, RasterImage};
/// use retouch_core::adjustments::brightness;
///
/// let img = RasterImage::filled(2, 2, ChannelLayout::Rgb, &[1.0, 1.0, 1.0]).unwrap();
/// let dimmed = brightness(&img, 0.5);
/// assert_eq!(dimmed.pixel(0, 0), &[0.5, 0.5, 0.5]);
/// ```
pub fn brightness(image: &RasterImage, factor: f32) -> RasterImage {
    map_color(image, |v| v * factor)
}

/// Add `delta` to a single color channel and clamp.
///
/// # Errors
///
/// Returns `UnsupportedLayout` for grayscale images.
pub fn adjust_channel(image: &RasterImage, channel: ColorChannel, delta: f32) -> Result<RasterImage> {
    image.require_color("channel adjust")?;

    let channels = image.channels();
    let target = channel.index();
    let mut samples = image.samples().to_vec();
    for px in samples.chunks_exact_mut(channels) {
        px[target] = clamp_unit(px[target] + delta);
    }

    Ok(RasterImage::from_parts(
        image.width(),
        image.height(),
        image.layout(),
        samples,
    ))
}

/// Apply a contrast curve of strength `strength` (k).
///
/// A non-finite strength returns a copy. The logarithmic curve is defined
/// for k > 0 and is the identity otherwise, its limit as k → 0. The
/// exponential curve is evaluated for any finite k and clamped, so k = 0
/// maps every sample to 1.
pub fn contrast(image: &RasterImage, strength: f32, curve: ContrastCurve) -> RasterImage {
    if !strength.is_finite() {
        return image.clone();
    }

    match curve {
        ContrastCurve::Logarithmic if strength <= 0.0 => image.clone(),
        ContrastCurve::Logarithmic => {
            let denominator = strength.ln_1p();
            map_color(image, |v| (strength * v).ln_1p() / denominator)
        }
        ContrastCurve::Exponential => map_color(image, |v| (strength * (v - 1.0)).exp()),
    }
}

/// Invert colors: `output = 1 - input`.
///
/// Applying it twice returns the original image.
pub fn invert(image: &RasterImage) -> RasterImage {
    map_color(image, |v| 1.0 - v)
}

/// Map every non-alpha sample through `f`, clamping the result.
fn map_color<F>(image: &RasterImage, f: F) -> RasterImage
where
    F: Fn(f32) -> f32,
{
    let channels = image.channels();
    let color = image.layout().color_channels();
    let mut samples = image.samples().to_vec();
    for px in samples.chunks_exact_mut(channels) {
        for v in &mut px[..color] {
            *v = f(*v);
        }
    }

    RasterImage::from_parts(image.width(), image.height(), image.layout(), samples)
}
