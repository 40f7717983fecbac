//! Geometric transforms: rotation and zoom.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Zoom centers are in source pixel coordinates
//! - Origin is top-left corner

mod rotation;
mod zoom;

pub use rotation::{compute_rotated_bounds, rotate, FILL_COLOR};
pub use zoom::{crop, image_center, zoom, zoom_window, CropRect};
