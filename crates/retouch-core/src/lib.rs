//! Retouch Core - Image manipulation engine
//!
//! This crate provides a pure transform library over normalized float images
//! and an editing session that layers undo/redo, a reduced-resolution preview
//! and secondary-image compositing on top of it.
//!
//! - [`raster`]: image type, file loading/saving, resizing
//! - [`adjustments`], [`channels`], [`threshold`]: per-pixel operations
//! - [`transform`]: rotation and zoom
//! - [`composite`]: alpha blending of a secondary image
//! - [`histogram`]: per-channel intensity bins
//! - [`session`]: the editing state machine

pub mod adjustments;
pub mod channels;
pub mod composite;
pub mod histogram;
pub mod luminance;
pub mod raster;
pub mod session;
pub mod threshold;
pub mod transform;

pub use adjustments::ContrastCurve;
pub use histogram::Histogram;
pub use raster::{ChannelLayout, ColorChannel, ErrorKind, ImageError, RasterImage, Result};
pub use session::{Session, SessionConfig};
pub use threshold::ZoneMode;
