//! Per-channel intensity histograms.
//!
//! Samples are mapped to 8-bit intensities (truncating, like an integer
//! cast) and counted into `bin_count` equal partitions of [0, 255]. The last
//! bin is closed on the right so 255 is always counted.

use serde::Serialize;

use crate::raster::{ImageError, RasterImage, Result};

/// Histogram bins for each color channel of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    bin_count: usize,
    /// One bin vector per color channel (R, G, B, or a single gray channel).
    channels: Vec<Vec<u32>>,
}

impl Histogram {
    /// Create an empty histogram with `channel_count` channels.
    pub fn new(bin_count: usize, channel_count: usize) -> Self {
        Self {
            bin_count,
            channels: vec![vec![0; bin_count]; channel_count],
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Bins for one channel, if it exists.
    pub fn channel(&self, index: usize) -> Option<&[u32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<u32>] {
        &self.channels
    }

    /// Find the maximum value across all channels for normalization
    pub fn max_value(&self) -> u32 {
        self.channels
            .iter()
            .flat_map(|bins| bins.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Lower edge of every bin followed by the upper edge of the last, in
    /// 8-bit intensity units.
    pub fn bin_edges(&self) -> Vec<f64> {
        let width = 255.0 / self.bin_count as f64;
        (0..=self.bin_count).map(|i| i as f64 * width).collect()
    }

    #[inline]
    fn bin_index(&self, intensity: u8) -> usize {
        (intensity as usize * self.bin_count / 255).min(self.bin_count - 1)
    }
}

/// Compute a histogram with `bin_count` bins for every color channel.
///
/// Alpha is not counted.
///
/// # Errors
///
/// Returns `InvalidParameter` when `bin_count` is zero.
///
/// # Example
/// ```
/// use retouch_core::histogram::compute_histogram;
/// use retouch_core::raster::{ChannelLayout, RasterImage};
///
/// let img = RasterImage::new(2, 1, ChannelLayout::Rgb, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
/// let hist = compute_histogram(&img, 4).unwrap();
/// assert_eq!(hist.channel(0).unwrap(), &[1, 0, 0, 1]);
/// ```
pub fn compute_histogram(image: &RasterImage, bin_count: usize) -> Result<Histogram> {
    if bin_count == 0 {
        return Err(ImageError::InvalidParameter {
            name: "bin count",
            value: 0.0,
        });
    }

    let color = image.layout().color_channels();
    let mut hist = Histogram::new(bin_count, color);

    for px in image.samples().chunks_exact(image.channels()) {
        for (c, &v) in px[..color].iter().enumerate() {
            let bin = hist.bin_index(to_intensity(v));
            hist.channels[c][bin] += 1;
        }
    }

    Ok(hist)
}

/// Map a normalized sample to 0..=255, truncating.
#[inline]
fn to_intensity(value: f32) -> u8 {
    (value * 255.0) as u8
}
