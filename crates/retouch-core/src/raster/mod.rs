//! Raster image representation, file codecs and resampling.
//!
//! This module provides:
//! - `RasterImage`, a normalized floating-point image (gray, RGB or RGBA)
//! - Loading and saving standard raster files (PNG, JPEG, BMP)
//! - Nearest-neighbor scaling and linear resampling
//!
//! # Sample Convention
//!
//! Samples are `f32` in [0, 1], interleaved R, G, B, (A) in row-major
//! order. The invariant is enforced at construction, so every transform in
//! this crate can assume normalized input and produces normalized output.

mod io;
mod resize;
mod types;

pub use io::{from_dynamic, load, save, to_dynamic};
pub use resize::{resample_linear, resize_nearest};
pub(crate) use types::clamp_unit;
pub use types::{ChannelLayout, ColorChannel, ErrorKind, ImageError, RasterImage, Result};
