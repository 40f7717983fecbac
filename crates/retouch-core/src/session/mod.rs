//! Editing session: the stateful half of the engine.
//!
//! A [`Session`] owns every image slot of an edit:
//!
//! - `original`: the image as decoded, never modified
//! - `base`: the reference that slider-style adjustments are recomputed
//!   from; a reduced preview of `original` for large images
//! - `working`: what is displayed, the result of the latest operation
//! - an undo/redo [`History`] of `working` snapshots
//! - an optional secondary image for compositing
//!
//! Adjustments are re-derived from `base` on every call, so dragging one
//! control after another always starts from the last committed state.
//! Inversion is the exception: it applies to `working` and commits the result
//! as the new base.
//!
//! Operations invoked before their source image exists do nothing. A
//! transform that rejects its input is logged and leaves the session as it
//! was. Only loading and saving files report errors to the caller.

mod config;
mod history;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::adjustments::{self, ContrastCurve};
use crate::channels;
use crate::composite::composite;
use crate::histogram::{compute_histogram, Histogram};
use crate::raster::{self, ColorChannel, RasterImage, Result};
use crate::threshold::{self, ZoneMode};
use crate::transform;

pub use config::SessionConfig;
pub use history::History;

/// The loaded image and everything derived from it.
#[derive(Debug, Clone)]
struct Document {
    original: RasterImage,
    base: RasterImage,
    working: RasterImage,
    history: History,
    /// Scale of `base` relative to `original` when a reduced preview is used.
    reduction_factor: Option<f64>,
}

impl Document {
    fn new(original: RasterImage, config: &SessionConfig) -> Self {
        let reduction_factor = config.reduction_for(original.pixel_count());
        let (base, reduction_factor) = reduce(&original, reduction_factor);
        let history = History::new(base.clone(), config.max_history_for(base.pixel_count()));
        Self {
            working: base.clone(),
            original,
            base,
            history,
            reduction_factor,
        }
    }

    /// Make `base` the new baseline with a fresh history.
    fn rebase(&mut self, base: RasterImage, config: &SessionConfig) {
        self.history = History::new(base.clone(), config.max_history_for(base.pixel_count()));
        self.working = base.clone();
        self.base = base;
    }

    /// Run `transform` on `base` and display the result.
    fn apply<F>(&mut self, operation: &'static str, transform: F) -> bool
    where
        F: FnOnce(&RasterImage) -> Result<RasterImage>,
    {
        match transform(&self.base) {
            Ok(image) => {
                self.show(operation, image);
                true
            }
            Err(err) => {
                warn!(operation, error = %err, "Transform rejected input; session unchanged");
                false
            }
        }
    }

    /// Display `image` and record it in the history.
    fn show(&mut self, operation: &'static str, image: RasterImage) {
        let pushed = self.history.push(image.clone());
        self.working = image;
        debug!(
            operation,
            width = self.working.width(),
            height = self.working.height(),
            history = self.history.len(),
            pushed,
            "Applied operation"
        );
    }
}

/// Build the base for `original`, downscaled by `factor` if given.
///
/// Falls back to a full-resolution copy when the reduced image would have
/// zero area.
fn reduce(original: &RasterImage, factor: Option<f64>) -> (RasterImage, Option<f64>) {
    let Some(factor) = factor else {
        return (original.clone(), None);
    };
    match raster::resize_nearest(original, factor) {
        Ok(base) => (base, Some(factor)),
        Err(err) => {
            warn!(factor, error = %err, "Preview reduction failed; editing at full resolution");
            (original.clone(), None)
        }
    }
}

/// The secondary image used for compositing.
#[derive(Debug, Clone)]
struct Overlay {
    /// As loaded; every resize starts from here.
    original: RasterImage,
    current: RasterImage,
}

/// A single-image editing session with undo/redo and compositing.
///
/// # Example
/// ```
/// use retouch_core::raster::{ChannelLayout, RasterImage};
/// use retouch_core::session::Session;
///
/// let mut session = Session::new();
/// let white = RasterImage::filled(4, 4, ChannelLayout::Rgb, &[1.0; 3]).unwrap();
/// session.load_image(white);
///
/// session.set_brightness(0.5);
/// session.undo();
/// session.invert_colors();
/// assert!(session.current_image().unwrap().samples().iter().all(|&v| v == 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    document: Option<Document>,
    overlay: Option<Overlay>,
    zoom_factor: f64,
    source_path: Option<PathBuf>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create an empty session with `config` (sanitized).
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config: config.sanitize(),
            document: None,
            overlay: None,
            zoom_factor: 1.0,
            source_path: None,
        }
    }

    // ===== Loading and saving =====

    /// Decode `path` and make it the image being edited.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or decoded; the
    /// session is left untouched in that case.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let image = raster::load(path)?;
        self.load_image(image);
        self.source_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Make an already decoded image the one being edited.
    ///
    /// Any secondary image stays loaded.
    pub fn load_image(&mut self, image: RasterImage) {
        let document = Document::new(image, &self.config);
        info!(
            width = document.original.width(),
            height = document.original.height(),
            preview_width = document.base.width(),
            preview_height = document.base.height(),
            reduction = document.reduction_factor,
            max_history = document.history.cap(),
            "Started editing"
        );
        self.document = Some(document);
        self.zoom_factor = 1.0;
        self.source_path = None;
    }

    /// Write the current result to `path`.
    ///
    /// The top of the history is written when anything has been recorded, so
    /// a display-only state (such as a discarded fusion preview) is never
    /// saved. Without a loaded image this does nothing.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the format is unknown or the file cannot be
    /// written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let Some(doc) = &self.document else {
            debug!("No image loaded; nothing to save");
            return Ok(());
        };
        let image = if doc.history.len() > 1 {
            doc.history.current()
        } else {
            &doc.working
        };
        raster::save(image, path)
    }

    // ===== History =====

    /// Step back one history entry. No-op at the initial state.
    pub fn undo(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        match doc.history.undo() {
            Some(image) => {
                doc.working = image.clone();
                debug!(history = doc.history.len(), "Undo");
            }
            None => debug!("Nothing to undo"),
        }
    }

    /// Re-apply the most recently undone entry. No-op if nothing was undone.
    pub fn redo(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        match doc.history.redo() {
            Some(image) => {
                doc.working = image.clone();
                debug!(history = doc.history.len(), "Redo");
            }
            None => debug!("Nothing to redo"),
        }
    }

    /// Make the displayed image the new base and start a fresh history.
    pub fn commit_as_base(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        let working = doc.working.clone();
        doc.rebase(working, &self.config);
        debug!(max_history = doc.history.cap(), "Committed working image as base");
    }

    /// Discard every edit and start again from the loaded image.
    pub fn reset(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        let (base, reduction_factor) = reduce(&doc.original, doc.reduction_factor);
        doc.reduction_factor = reduction_factor;
        doc.rebase(base, &self.config);
        self.zoom_factor = 1.0;
        debug!("Reset to original");
    }

    // ===== Adjustments (re-derived from base) =====

    pub fn set_brightness(&mut self, factor: f32) {
        self.apply("brightness", |base| Ok(adjustments::brightness(base, factor)));
    }

    /// Apply a contrast curve. A strength of zero or below leaves the session
    /// untouched.
    pub fn set_contrast(&mut self, strength: f32, curve: ContrastCurve) {
        if !strength.is_finite() || strength <= 0.0 {
            debug!(operation = "contrast", strength, "Non-positive strength; ignoring");
            return;
        }
        self.apply("contrast", |base| {
            Ok(adjustments::contrast(base, strength, curve))
        });
    }

    /// Rotate counter-clockwise by `degrees`.
    pub fn set_rotation(&mut self, degrees: f64) {
        self.apply("rotation", |base| transform::rotate(base, degrees));
    }

    /// Zoom to `percent` (100 = no zoom) around `center`, or the image
    /// center. The factor is clamped to the configured zoom range.
    pub fn set_zoom_absolute(&mut self, percent: f64, center: Option<(f64, f64)>) {
        let factor = self.config.clamp_zoom(percent / 100.0);
        self.apply_zoom(factor, center);
    }

    /// Multiply the current zoom factor by `factor`, then clamp.
    pub fn set_zoom_relative(&mut self, factor: f64, center: Option<(f64, f64)>) {
        let factor = self.config.clamp_zoom(self.zoom_factor * factor);
        self.apply_zoom(factor, center);
    }

    fn apply_zoom(&mut self, factor: f64, center: Option<(f64, f64)>) {
        let applied = self.apply("zoom", |base| {
            let center = center.unwrap_or_else(|| transform::image_center(base));
            transform::zoom(base, factor, center)
        });
        if applied {
            self.zoom_factor = factor;
        }
    }

    /// Add `delta` to one color channel.
    pub fn adjust_channel(&mut self, channel: ColorChannel, delta: f32) {
        self.apply("channel adjust", |base| {
            adjustments::adjust_channel(base, channel, delta)
        });
    }

    // ===== Filters =====

    /// Invert the displayed image and commit the result as the new base.
    ///
    /// Unlike other operations this starts from `working`, so repeated calls
    /// toggle.
    pub fn invert_colors(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            debug!(operation = "invert", "No image loaded; ignoring");
            return;
        };
        let inverted = adjustments::invert(&doc.working);
        doc.base = inverted.clone();
        doc.history
            .set_cap(self.config.max_history_for(inverted.pixel_count()));
        doc.show("invert", inverted);
    }

    pub fn binarize(&mut self, threshold: f32) {
        self.apply("binarize", |base| Ok(threshold::binarize(base, threshold)));
    }

    /// Show only one channel; the others become black.
    pub fn isolate_channel(&mut self, channel: ColorChannel) {
        self.apply("isolate channel", |base| {
            channels::isolate_channel(base, channel)
        });
    }

    /// Show one channel with a faint trace of the other two.
    pub fn dim_channels(&mut self, channel: ColorChannel) {
        self.apply("dim channels", |base| {
            channels::dim_other_channels(base, channel)
        });
    }

    /// Attenuate one channel, previewing its subtractive complement.
    pub fn remove_channel(&mut self, channel: ColorChannel) {
        self.apply("remove channel", |base| {
            channels::remove_channel(base, channel)
        });
    }

    /// Paint light or dark zones with `color`.
    pub fn filter_zones(&mut self, threshold: f32, mode: ZoneMode, color: [f32; 3]) {
        self.apply("zone filter", |base| {
            threshold::filter_zones(base, threshold, mode, color)
        });
    }

    /// Show the base unchanged (the "all channels" choice of the channel
    /// selectors).
    pub fn restore_base(&mut self) {
        self.apply("restore base", |base| Ok(base.clone()));
    }

    // ===== Secondary image =====

    /// Decode `path` as the secondary image and show a placement preview.
    ///
    /// Does nothing, without touching the file, when no image is loaded.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or decoded.
    pub fn load_secondary(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.document.is_none() {
            debug!("No image loaded; ignoring secondary image");
            return Ok(());
        }
        let image = raster::load(path)?;
        self.load_secondary_image(image);
        Ok(())
    }

    /// Use an already decoded image as the secondary image and show a
    /// placement preview at the default opacity.
    pub fn load_secondary_image(&mut self, image: RasterImage) {
        let Some(doc) = self.document.as_mut() else {
            debug!("No image loaded; ignoring secondary image");
            return;
        };
        let opacity = self.config.default_fuse_opacity;
        let applied = doc.apply("load secondary", |base| {
            composite(base, &image, opacity, 0, 0)
        });
        if applied {
            self.overlay = Some(Overlay {
                original: image.clone(),
                current: image,
            });
        }
    }

    /// Blend the secondary image onto the base.
    pub fn fuse_secondary(&mut self, opacity: f32, x_offset: i64, y_offset: i64) {
        let Some(overlay) = &self.overlay else {
            debug!(operation = "fuse", "No secondary image; ignoring");
            return;
        };
        let Some(doc) = self.document.as_mut() else {
            debug!(operation = "fuse", "No image loaded; ignoring");
            return;
        };
        doc.apply("fuse", |base| {
            composite(base, &overlay.current, opacity, x_offset, y_offset)
        });
    }

    /// Rescale the secondary image, always starting from the image as loaded.
    pub fn resize_secondary(&mut self, factor: f64) {
        let Some(overlay) = self.overlay.as_mut() else {
            debug!(operation = "resize secondary", "No secondary image; ignoring");
            return;
        };
        match raster::resize_nearest(&overlay.original, factor) {
            Ok(resized) => {
                debug!(
                    factor,
                    width = resized.width(),
                    height = resized.height(),
                    "Resized secondary image"
                );
                overlay.current = resized;
            }
            Err(err) => warn!(factor, error = %err, "Secondary resize rejected"),
        }
    }

    /// Show the base again without recording anything; the secondary image
    /// is kept.
    pub fn discard_fusion_preview(&mut self) {
        if let Some(doc) = self.document.as_mut() {
            doc.working = doc.base.clone();
            debug!("Discarded fusion preview");
        }
    }

    /// Discard the fusion preview and forget the secondary image.
    pub fn discard_fusion_fully(&mut self) {
        self.discard_fusion_preview();
        self.overlay = None;
    }

    // ===== Read-only views =====

    /// The image to display, if one is loaded.
    pub fn current_image(&self) -> Option<&RasterImage> {
        self.document.as_ref().map(|doc| &doc.working)
    }

    /// Histogram of the displayed image.
    pub fn histogram_bins(&self, bin_count: usize) -> Option<Histogram> {
        let doc = self.document.as_ref()?;
        match compute_histogram(&doc.working, bin_count) {
            Ok(hist) => Some(hist),
            Err(err) => {
                warn!(bin_count, error = %err, "Histogram rejected");
                None
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn original(&self) -> Option<&RasterImage> {
        self.document.as_ref().map(|doc| &doc.original)
    }

    pub fn base(&self) -> Option<&RasterImage> {
        self.document.as_ref().map(|doc| &doc.base)
    }

    pub fn working(&self) -> Option<&RasterImage> {
        self.current_image()
    }

    /// The secondary image at its current size.
    pub fn secondary(&self) -> Option<&RasterImage> {
        self.overlay.as_ref().map(|overlay| &overlay.current)
    }

    /// The secondary image as loaded.
    pub fn secondary_original(&self) -> Option<&RasterImage> {
        self.overlay.as_ref().map(|overlay| &overlay.original)
    }

    /// Number of history entries; 0 when nothing is loaded.
    pub fn history_len(&self) -> usize {
        self.document.as_ref().map_or(0, |doc| doc.history.len())
    }

    pub fn redo_len(&self) -> usize {
        self.document.as_ref().map_or(0, |doc| doc.history.redo_len())
    }

    pub fn max_history(&self) -> Option<usize> {
        self.document.as_ref().map(|doc| doc.history.cap())
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Preview scale relative to the original, when a reduced preview is used.
    pub fn reduction_factor(&self) -> Option<f64> {
        self.document.as_ref().and_then(|doc| doc.reduction_factor)
    }

    /// Path of the file loaded with [`Session::load`].
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn apply<F>(&mut self, operation: &'static str, transform: F) -> bool
    where
        F: FnOnce(&RasterImage) -> Result<RasterImage>,
    {
        match self.document.as_mut() {
            Some(doc) => doc.apply(operation, transform),
            None => {
                debug!(operation, "No image loaded; ignoring");
                false
            }
        }
    }
}
