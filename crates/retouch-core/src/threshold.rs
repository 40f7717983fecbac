//! Luminance-threshold operations: binarization and light/dark zone recoloring.

use serde::{Deserialize, Serialize};

use crate::luminance::pixel_luminance;
use crate::raster::{ChannelLayout, RasterImage, Result};

/// Default binarization cutoff.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Which side of the threshold a zone filter selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneMode {
    /// Pixels with luminance >= threshold.
    #[default]
    Light,
    /// Pixels with luminance < threshold.
    Dark,
}

impl ZoneMode {
    #[inline]
    fn selects(self, luminance: f32, threshold: f32) -> bool {
        match self {
            ZoneMode::Light => luminance >= threshold,
            ZoneMode::Dark => luminance < threshold,
        }
    }
}

/// Convert to black and white at `threshold`.
///
/// Each pixel's color channels become 1.0 if its luminance is >= `threshold`
/// and 0.0 otherwise. Grayscale input yields RGB; alpha is carried through.
pub fn binarize(image: &RasterImage, threshold: f32) -> RasterImage {
    let layout = match image.layout() {
        ChannelLayout::Gray | ChannelLayout::Rgb => ChannelLayout::Rgb,
        ChannelLayout::Rgba => ChannelLayout::Rgba,
    };

    let mut samples = Vec::with_capacity(image.pixel_count() as usize * layout.channels());
    for px in image.samples().chunks_exact(image.channels()) {
        let value = if pixel_luminance(px, image.layout()) >= threshold {
            1.0
        } else {
            0.0
        };
        samples.extend_from_slice(&[value, value, value]);
        if layout.has_alpha() {
            samples.push(px[3]);
        }
    }

    RasterImage::from_parts(image.width(), image.height(), layout, samples)
}

/// Paint the light or dark zones of an image with a solid color.
///
/// Pixels selected by `mode` at `threshold` get their R, G, B replaced by
/// `color`; every other pixel, and alpha, is left untouched.
///
/// # Errors
///
/// Returns `UnsupportedLayout` for grayscale images.
pub fn filter_zones(
    image: &RasterImage,
    threshold: f32,
    mode: ZoneMode,
    color: [f32; 3],
) -> Result<RasterImage> {
    image.require_color("zone filter")?;

    let layout = image.layout();
    let mut samples = image.samples().to_vec();
    for px in samples.chunks_exact_mut(image.channels()) {
        if mode.selects(pixel_luminance(px, layout), threshold) {
            px[..3].copy_from_slice(&color);
        }
    }

    Ok(RasterImage::from_parts(
        image.width(),
        image.height(),
        layout,
        samples,
    ))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn image_strategy(layout: ChannelLayout) -> impl Strategy<Value = RasterImage> {
        (1u32..=12, 1u32..=12).prop_flat_map(move |(w, h)| {
            let size = (w * h) as usize * layout.channels();
            prop::collection::vec(0.0f32..=1.0, size..=size)
                .prop_map(move |samples| RasterImage::new(w, h, layout, samples).unwrap())
        })
    }

    fn in_unit_range(image: &RasterImage) -> bool {
        image.samples().iter().all(|v| (0.0..=1.0).contains(v))
    }

    proptest! {
        /// Property: binarized color samples are exactly 0 or 1.
        #[test]
        fn prop_binarize_is_binary(
            img in prop_oneof![Just(ChannelLayout::Gray), Just(ChannelLayout::Rgb), Just(ChannelLayout::Rgba)].prop_flat_map(image_strategy),
            threshold in prop_oneof![Just(0.0f32), Just(1.0f32), 0.0f32..=1.0],
        ) {
            let out = binarize(&img, threshold);
            prop_assert!(in_unit_range(&out));
            let channels = out.channels();
            for (i, v) in out.samples().iter().enumerate() {
                if i % channels < 3 {
                    prop_assert!(*v == 0.0 || *v == 1.0);
                }
            }
        }

        /// Property: zone recoloring keeps shape and range for any threshold
        /// and color.
        #[test]
        fn prop_filter_zones_in_range(
            img in prop_oneof![Just(ChannelLayout::Rgb), Just(ChannelLayout::Rgba)].prop_flat_map(image_strategy),
            threshold in prop_oneof![Just(0.0f32), Just(1.0f32), 0.0f32..=1.0],
            dark in any::<bool>(),
            color in prop::array::uniform3(0.0f32..=1.0),
        ) {
            let mode = if dark { ZoneMode::Dark } else { ZoneMode::Light };
            let out = filter_zones(&img, threshold, mode, color).unwrap();
            prop_assert_eq!((out.width(), out.height()), (img.width(), img.height()));
            prop_assert!(in_unit_range(&out));
        }
    }
}
