//! Tunable limits for an editing session.

use serde::{Deserialize, Serialize};

/// Numeric policy of a [`Session`](super::Session).
///
/// Every field has a default, so a configuration file only needs to name
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Images with more pixels than this are edited on a reduced preview.
    pub preview_pixel_limit: u64,
    /// Total pixels the undo history may hold; divided by the image size to
    /// get the entry cap.
    pub history_pixel_budget: u64,
    /// Entry cap floor, whatever the image size.
    pub min_history: usize,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Opacity of the placement preview shown when a secondary image loads.
    pub default_fuse_opacity: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview_pixel_limit: 1_000_000,
            history_pixel_budget: 10_000_000,
            min_history: 5,
            min_zoom: 0.1,
            max_zoom: 5.0,
            default_fuse_opacity: 0.5,
        }
    }
}

impl SessionConfig {
    /// Replace nonsensical values with their defaults.
    pub fn sanitize(mut self) -> Self {
        let defaults = Self::default();
        if self.preview_pixel_limit == 0 {
            self.preview_pixel_limit = defaults.preview_pixel_limit;
        }
        if self.history_pixel_budget == 0 {
            self.history_pixel_budget = defaults.history_pixel_budget;
        }
        self.min_history = self.min_history.max(1);

        let zoom_ok = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= self.max_zoom;
        if !zoom_ok {
            self.min_zoom = defaults.min_zoom;
            self.max_zoom = defaults.max_zoom;
        }

        if !(0.0..=1.0).contains(&self.default_fuse_opacity) {
            self.default_fuse_opacity = defaults.default_fuse_opacity;
        }
        self
    }

    /// History entry cap for an image of `pixel_count` pixels:
    /// `max(min_history, history_pixel_budget / pixel_count)`.
    pub fn max_history_for(&self, pixel_count: u64) -> usize {
        let by_budget = self.history_pixel_budget / pixel_count.max(1);
        (by_budget as usize).max(self.min_history)
    }

    /// Preview scale for an image of `pixel_count` pixels, or `None` when the
    /// image fits under the limit: `sqrt(limit / pixel_count)`.
    pub fn reduction_for(&self, pixel_count: u64) -> Option<f64> {
        if pixel_count <= self.preview_pixel_limit {
            return None;
        }
        Some((self.preview_pixel_limit as f64 / pixel_count as f64).sqrt())
    }

    pub fn clamp_zoom(&self, factor: f64) -> f64 {
        factor.clamp(self.min_zoom, self.max_zoom)
    }
}
