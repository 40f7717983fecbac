//! Core raster types shared by every transform.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for raster loading, saving and transforms.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The file could not be opened or decoded.
    #[error("Failed to read image {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// The file could not be encoded or written.
    #[error("Failed to write image {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// The file extension does not name a known raster format.
    #[error("Unsupported image format for {0}")]
    UnsupportedFormat(PathBuf),

    /// Sample buffer length doesn't match the declared shape.
    #[error("Invalid sample buffer: expected {expected} samples, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },

    /// Width or height is zero.
    #[error("Image has zero area")]
    EmptyImage,

    /// A sample is non-finite or outside [0, 1].
    #[error("Sample {index} is not normalized: {value}")]
    SampleOutOfRange { index: usize, value: f32 },

    /// The operation cannot run on an image with this many channels.
    #[error("{operation} does not support {channels}-channel images")]
    UnsupportedLayout {
        operation: &'static str,
        channels: usize,
    },

    /// A scalar parameter is outside the range the operation accepts.
    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Coarse classification of an [`ImageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unreadable/unwritable path or undecodable data. Surfaced to the caller.
    Io,
    /// Malformed image or parameter handed to a transform.
    Shape,
}

impl ImageError {
    /// Classify this error as an I/O or a shape failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImageError::Read { .. } | ImageError::Write { .. } | ImageError::UnsupportedFormat(_) => {
                ErrorKind::Io
            }
            _ => ErrorKind::Shape,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// Channel arrangement of a raster. Channel order is always R, G, B, (A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// Single luminance channel.
    Gray,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
}

impl ChannelLayout {
    /// Number of interleaved samples per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    /// Number of non-alpha samples per pixel.
    #[inline]
    pub fn color_channels(self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::Rgb | ChannelLayout::Rgba => 3,
        }
    }

    #[inline]
    pub fn has_alpha(self) -> bool {
        self == ChannelLayout::Rgba
    }

    /// Map a channel count (1, 3 or 4) to a layout.
    pub fn from_channels(channels: usize) -> Result<Self> {
        match channels {
            1 => Ok(ChannelLayout::Gray),
            3 => Ok(ChannelLayout::Rgb),
            4 => Ok(ChannelLayout::Rgba),
            other => Err(ImageError::UnsupportedLayout {
                operation: "raster",
                channels: other,
            }),
        }
    }
}

/// One of the three color channels, addressed by the UI as 0, 1, 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChannel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl ColorChannel {
    pub const ALL: [ColorChannel; 3] = [ColorChannel::Red, ColorChannel::Green, ColorChannel::Blue];

    /// Sample offset of this channel within a pixel.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for ColorChannel {
    type Error = ImageError;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            0 => Ok(ColorChannel::Red),
            1 => Ok(ColorChannel::Green),
            2 => Ok(ColorChannel::Blue),
            other => Err(ImageError::InvalidParameter {
                name: "channel",
                value: other as f64,
            }),
        }
    }
}

/// A raster image with normalized floating-point samples.
///
/// Samples are interleaved in row-major order and always lie in [0, 1].
/// Every constructor enforces that invariant, so transforms never need to
/// re-validate their input. `Clone` is a deep copy of the sample buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    samples: Vec<f32>,
}

impl RasterImage {
    /// Create an image from already-normalized samples.
    ///
    /// # Errors
    ///
    /// * `EmptyImage` if either dimension is zero
    /// * `BufferMismatch` if `samples.len() != width * height * channels`
    /// * `SampleOutOfRange` if a sample is non-finite or outside [0, 1]
    pub fn new(width: u32, height: u32, layout: ChannelLayout, samples: Vec<f32>) -> Result<Self> {
        check_shape(width, height, layout, samples.len())?;
        if let Some((index, &value)) = samples
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(ImageError::SampleOutOfRange { index, value });
        }
        Ok(Self {
            width,
            height,
            layout,
            samples,
        })
    }

    /// Create an image from arbitrary samples, clamping each into [0, 1].
    ///
    /// NaN samples become 0.0.
    pub fn from_unclamped(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        samples: Vec<f32>,
    ) -> Result<Self> {
        check_shape(width, height, layout, samples.len())?;
        Ok(Self::from_parts(width, height, layout, samples))
    }

    /// Build an image by evaluating `f(x, y, channel)` for every sample.
    pub fn from_fn<F>(width: u32, height: u32, layout: ChannelLayout, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32, usize) -> f32,
    {
        let channels = layout.channels();
        let mut samples = Vec::with_capacity(width as usize * height as usize * channels);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    samples.push(f(x, y, c));
                }
            }
        }
        Self::from_unclamped(width, height, layout, samples)
    }

    /// Create an image where every pixel has the same value.
    pub fn filled(width: u32, height: u32, layout: ChannelLayout, pixel: &[f32]) -> Result<Self> {
        if pixel.len() != layout.channels() {
            return Err(ImageError::BufferMismatch {
                expected: layout.channels(),
                actual: pixel.len(),
            });
        }
        Self::from_fn(width, height, layout, |_, _, c| pixel[c])
    }

    /// Internal constructor for transform outputs whose shape is correct by
    /// construction. Clamps every sample.
    pub(crate) fn from_parts(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        mut samples: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(
            samples.len(),
            width as usize * height as usize * layout.channels(),
            "Sample buffer size mismatch"
        );
        debug_assert!(width > 0 && height > 0, "Transform produced an empty image");
        for sample in &mut samples {
            *sample = clamp_unit(*sample);
        }
        Self {
            width,
            height,
            layout,
            samples,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Samples per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Interleaved sample buffer.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Samples of the pixel at (x, y).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let start = self.offset(x, y);
        &self.samples[start..start + self.channels()]
    }

    /// Buffer offset of the first sample of pixel (x, y).
    #[inline]
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels()
    }

    /// Fail with `UnsupportedLayout` unless the image carries R, G and B.
    pub fn require_color(&self, operation: &'static str) -> Result<()> {
        if self.layout == ChannelLayout::Gray {
            return Err(ImageError::UnsupportedLayout {
                operation,
                channels: self.channels(),
            });
        }
        Ok(())
    }

    /// True if both images have the same shape and every sample pair is
    /// within `tolerance`.
    pub fn approx_eq(&self, other: &RasterImage, tolerance: f32) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.layout == other.layout
            && self
                .samples
                .iter()
                .zip(&other.samples)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// Clamp a sample into [0, 1], mapping NaN to 0.
#[inline]
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn check_shape(width: u32, height: u32, layout: ChannelLayout, len: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ImageError::EmptyImage);
    }
    let expected = width as usize * height as usize * layout.channels();
    if len != expected {
        return Err(ImageError::BufferMismatch {
            expected,
            actual: len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let img = RasterImage::new(4, 2, ChannelLayout::Rgb, vec![0.5; 24]).unwrap();

        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 2);
        assert_eq!(img.channels(), 3);
        assert_eq!(img.pixel_count(), 8);
        assert_eq!(img.pixel(3, 1), &[0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_rejects_buffer_mismatch() {
        let err = RasterImage::new(4, 2, ChannelLayout::Rgba, vec![0.5; 24]).unwrap_err();
        assert!(matches!(
            err,
            ImageError::BufferMismatch {
                expected: 32,
                actual: 24
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn test_rejects_zero_area() {
        let err = RasterImage::new(0, 5, ChannelLayout::Gray, vec![]).unwrap_err();
        assert!(matches!(err, ImageError::EmptyImage));
    }

    #[test]
    fn test_rejects_unnormalized_samples() {
        let err = RasterImage::new(1, 1, ChannelLayout::Rgb, vec![0.0, 1.5, 0.2]).unwrap_err();
        assert!(matches!(err, ImageError::SampleOutOfRange { index: 1, .. }));

        let err = RasterImage::new(1, 1, ChannelLayout::Gray, vec![f32::NAN]).unwrap_err();
        assert!(matches!(err, ImageError::SampleOutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_from_unclamped_clamps() {
        let img =
            RasterImage::from_unclamped(1, 1, ChannelLayout::Rgb, vec![-0.5, 2.0, f32::NAN])
                .unwrap();
        assert_eq!(img.samples(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_filled() {
        let img = RasterImage::filled(2, 2, ChannelLayout::Rgba, &[0.1, 0.2, 0.3, 1.0]).unwrap();
        assert_eq!(img.pixel(1, 1), &[0.1, 0.2, 0.3, 1.0]);
        assert!(RasterImage::filled(2, 2, ChannelLayout::Rgb, &[0.1]).is_err());
    }

    #[test]
    fn test_layout_from_channels() {
        assert_eq!(ChannelLayout::from_channels(1).unwrap(), ChannelLayout::Gray);
        assert_eq!(ChannelLayout::from_channels(3).unwrap(), ChannelLayout::Rgb);
        assert_eq!(ChannelLayout::from_channels(4).unwrap(), ChannelLayout::Rgba);
        assert!(ChannelLayout::from_channels(2).is_err());
    }

    #[test]
    fn test_color_channel_from_index() {
        assert_eq!(ColorChannel::try_from(0).unwrap(), ColorChannel::Red);
        assert_eq!(ColorChannel::try_from(2).unwrap(), ColorChannel::Blue);
        assert!(ColorChannel::try_from(3).is_err());
    }

    #[test]
    fn test_require_color() {
        let gray = RasterImage::filled(2, 2, ChannelLayout::Gray, &[0.5]).unwrap();
        assert!(gray.require_color("test").is_err());

        let rgb = RasterImage::filled(2, 2, ChannelLayout::Rgb, &[0.5; 3]).unwrap();
        assert!(rgb.require_color("test").is_ok());
    }

    #[test]
    fn test_clone_is_deep() {
        let a = RasterImage::filled(2, 2, ChannelLayout::Gray, &[0.5]).unwrap();
        let b = a.clone();
        assert_ne!(a.samples().as_ptr(), b.samples().as_ptr());
        assert_eq!(a, b);
    }

    #[test]
    fn test_error_kinds() {
        let io = ImageError::Read {
            path: PathBuf::from("missing.png"),
            reason: "not found".to_string(),
        };
        assert_eq!(io.kind(), ErrorKind::Io);
        assert_eq!(
            io.to_string(),
            "Failed to read image missing.png: not found"
        );
        assert_eq!(ImageError::EmptyImage.kind(), ErrorKind::Shape);
    }
}
