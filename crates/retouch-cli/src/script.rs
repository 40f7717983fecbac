//! Edit scripts: a YAML list of session operations replayed in order.
//!
//! ```yaml
//! - op: brightness
//!   factor: 1.2
//! - op: rotate
//!   degrees: 15
//! - op: load_secondary
//!   path: logo.png
//! - op: fuse
//!   opacity: 0.7
//!   x: 40
//!   y: 20
//! - op: undo
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use retouch_core::threshold::DEFAULT_THRESHOLD;
use retouch_core::{ColorChannel, ContrastCurve, Session, ZoneMode};
use serde::Deserialize;
use tracing::debug;

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_zone_color() -> [f32; 3] {
    [1.0, 0.0, 0.0]
}

/// One session operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum EditStep {
    Brightness {
        factor: f32,
    },
    Contrast {
        strength: f32,
        #[serde(default)]
        curve: ContrastCurve,
    },
    Rotate {
        degrees: f64,
    },
    /// Absolute zoom in percent.
    Zoom {
        percent: f64,
        #[serde(default)]
        center: Option<(f64, f64)>,
    },
    ZoomBy {
        factor: f64,
        #[serde(default)]
        center: Option<(f64, f64)>,
    },
    AdjustChannel {
        channel: ColorChannel,
        delta: f32,
    },
    Invert,
    Binarize {
        #[serde(default = "default_threshold")]
        threshold: f32,
    },
    IsolateChannel {
        channel: ColorChannel,
    },
    RemoveChannel {
        channel: ColorChannel,
    },
    DimChannels {
        channel: ColorChannel,
    },
    FilterZones {
        #[serde(default = "default_threshold")]
        threshold: f32,
        #[serde(default)]
        mode: ZoneMode,
        #[serde(default = "default_zone_color")]
        color: [f32; 3],
    },
    RestoreBase,
    LoadSecondary {
        path: PathBuf,
    },
    Fuse {
        opacity: f32,
        #[serde(default)]
        x: i64,
        #[serde(default)]
        y: i64,
    },
    ResizeSecondary {
        factor: f64,
    },
    DiscardFusion,
    DiscardFusionFully,
    Undo,
    Redo,
    Commit,
    Reset,
}

impl EditStep {
    /// Run this step against `session`. Relative secondary-image paths are
    /// resolved against `base_dir`.
    pub fn apply(&self, session: &mut Session, base_dir: &Path) -> Result<()> {
        match self {
            EditStep::Brightness { factor } => session.set_brightness(*factor),
            EditStep::Contrast { strength, curve } => session.set_contrast(*strength, *curve),
            EditStep::Rotate { degrees } => session.set_rotation(*degrees),
            EditStep::Zoom { percent, center } => session.set_zoom_absolute(*percent, *center),
            EditStep::ZoomBy { factor, center } => session.set_zoom_relative(*factor, *center),
            EditStep::AdjustChannel { channel, delta } => session.adjust_channel(*channel, *delta),
            EditStep::Invert => session.invert_colors(),
            EditStep::Binarize { threshold } => session.binarize(*threshold),
            EditStep::IsolateChannel { channel } => session.isolate_channel(*channel),
            EditStep::RemoveChannel { channel } => session.remove_channel(*channel),
            EditStep::DimChannels { channel } => session.dim_channels(*channel),
            EditStep::FilterZones {
                threshold,
                mode,
                color,
            } => session.filter_zones(*threshold, *mode, *color),
            EditStep::RestoreBase => session.restore_base(),
            EditStep::LoadSecondary { path } => {
                let path = base_dir.join(path);
                session
                    .load_secondary(&path)
                    .with_context(|| format!("Failed to load secondary image {}", path.display()))?;
            }
            EditStep::Fuse { opacity, x, y } => session.fuse_secondary(*opacity, *x, *y),
            EditStep::ResizeSecondary { factor } => session.resize_secondary(*factor),
            EditStep::DiscardFusion => session.discard_fusion_preview(),
            EditStep::DiscardFusionFully => session.discard_fusion_fully(),
            EditStep::Undo => session.undo(),
            EditStep::Redo => session.redo(),
            EditStep::Commit => session.commit_as_base(),
            EditStep::Reset => session.reset(),
        }
        Ok(())
    }
}

/// Parse a script from YAML text.
pub fn parse_script(contents: &str) -> Result<Vec<EditStep>> {
    let steps: Option<Vec<EditStep>> = serde_yaml::from_str(contents)?;
    Ok(steps.unwrap_or_default())
}

/// Read and parse a script file.
pub fn load_script(path: &Path) -> Result<Vec<EditStep>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    parse_script(&contents).with_context(|| format!("Failed to parse script {}", path.display()))
}

/// Apply every step in order, stopping at the first I/O failure.
pub fn run_script(session: &mut Session, steps: &[EditStep], base_dir: &Path) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        debug!(index, ?step, "Running step");
        step.apply(session, base_dir)
            .with_context(|| format!("Step {} failed", index + 1))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retouch_core::raster::{self, ChannelLayout, RasterImage};

    fn white_session() -> Session {
        let mut session = Session::new();
        session.load_image(RasterImage::filled(4, 4, ChannelLayout::Rgb, &[1.0; 3]).unwrap());
        session
    }

    #[test]
    fn test_parse_every_step_shape() {
        let yaml = r#"
- op: brightness
  factor: 0.5
- op: contrast
  strength: 3
  curve: exponential
- op: rotate
  degrees: -12.5
- op: zoom
  percent: 150
  center: [10, 20]
- op: zoom_by
  factor: 1.25
- op: adjust_channel
  channel: green
  delta: 0.1
- op: invert
- op: binarize
- op: isolate_channel
  channel: red
- op: remove_channel
  channel: blue
- op: dim_channels
  channel: green
- op: filter_zones
  threshold: 0.3
  mode: dark
  color: [0, 0, 1]
- op: restore_base
- op: load_secondary
  path: overlay.png
- op: fuse
  opacity: 0.7
  x: -4
- op: resize_secondary
  factor: 0.5
- op: discard_fusion
- op: discard_fusion_fully
- op: undo
- op: redo
- op: commit
- op: reset
"#;
        let steps = parse_script(yaml).unwrap();
        assert_eq!(steps.len(), 22);
        assert_eq!(
            steps[1],
            EditStep::Contrast {
                strength: 3.0,
                curve: ContrastCurve::Exponential
            }
        );
        assert_eq!(
            steps[3],
            EditStep::Zoom {
                percent: 150.0,
                center: Some((10.0, 20.0))
            }
        );
        assert_eq!(steps[7], EditStep::Binarize { threshold: 0.5 });
        assert_eq!(steps[14], EditStep::Fuse { opacity: 0.7, x: -4, y: 0 });
    }

    #[test]
    fn test_defaults() {
        let steps = parse_script("- op: contrast\n  strength: 2\n- op: filter_zones\n").unwrap();
        assert_eq!(
            steps[0],
            EditStep::Contrast {
                strength: 2.0,
                curve: ContrastCurve::Logarithmic
            }
        );
        assert_eq!(
            steps[1],
            EditStep::FilterZones {
                threshold: 0.5,
                mode: ZoneMode::Light,
                color: [1.0, 0.0, 0.0]
            }
        );
    }

    #[test]
    fn test_empty_script() {
        assert!(parse_script("").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_unknown_op_and_fields() {
        assert!(parse_script("- op: sharpen\n").is_err());
        assert!(parse_script("- op: brightness\n  factor: 1\n  gamma: 2\n").is_err());
        assert!(parse_script("- op: isolate_channel\n  channel: purple\n").is_err());
    }

    #[test]
    fn test_run_script_edits_session() {
        let mut session = white_session();
        let steps = parse_script("- op: brightness\n  factor: 0.5\n- op: undo\n- op: invert\n").unwrap();
        run_script(&mut session, &steps, Path::new(".")).unwrap();
        assert!(session
            .current_image()
            .unwrap()
            .samples()
            .iter()
            .all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn test_secondary_path_relative_to_script() {
        let dir = tempfile::tempdir().unwrap();
        let overlay = RasterImage::filled(2, 2, ChannelLayout::Rgb, &[0.0; 3]).unwrap();
        raster::save(&overlay, dir.path().join("overlay.png")).unwrap();

        let mut session = white_session();
        let steps = parse_script("- op: load_secondary\n  path: overlay.png\n").unwrap();
        run_script(&mut session, &steps, dir.path()).unwrap();
        assert!(session.secondary().is_some());
    }

    #[test]
    fn test_missing_secondary_reports_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = white_session();
        let steps = parse_script("- op: invert\n- op: load_secondary\n  path: nope.png\n").unwrap();
        let err = run_script(&mut session, &steps, dir.path()).unwrap_err();
        assert!(err.to_string().contains("Step 2"));
    }
}
