//! Immutable per-export state.
//!
//! An [`ExportSnapshot`] is taken once, at the moment an export is requested, so later
//! edits to the live gradient cannot race the in-flight pipeline. The snapshot plus a
//! [`FrameLoopPlan`] fully determine every frame of the output.

use crate::animation::engine::AnimationSpec;
use crate::foundation::core::{FrameIndex, Point, PresentationTime, Size};
use crate::gradient::color::Rgba;
use crate::gradient::template::GradientTemplate;
use crate::render::backend::FrameScene;
use std::time::Duration;

/// Default timeout for a whole export run.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Caller-facing knobs for one video export.
#[derive(Debug, Clone)]
pub struct VideoExportOptions {
    /// Logical view size the gradient is laid out in.
    pub view_size: Size,
    /// Output duration in seconds.
    pub duration_secs: f64,
    /// Integer output frame rate.
    pub frame_rate: u32,
    /// Multiplier from view size to output pixels.
    pub render_scale: f64,
    /// Whether control points move at all.
    pub animate: bool,
    /// Motion to apply when `animate` is set.
    pub animation: AnimationSpec,
    /// Multiplier applied to elapsed seconds before they become animation phase.
    pub animation_speed: f64,
    /// Smooth (gaussian) color interpolation.
    pub smooth_colors: bool,
    /// Post-render blur radius in output pixels; 0 disables.
    pub blur_radius: f64,
    /// Draw control-point dots.
    pub show_dots: bool,
    /// Rounded-corner mask radius as a fraction of the shorter side; 0 disables.
    pub corner_radius: f64,
    /// Abort the export if it runs longer than this.
    pub timeout: Duration,
    /// Directory for the generated output file; the system temp dir when `None`.
    pub output_dir: Option<std::path::PathBuf>,
}

impl Default for VideoExportOptions {
    fn default() -> Self {
        Self {
            view_size: Size::new(320.0, 320.0),
            duration_secs: 5.0,
            frame_rate: 30,
            render_scale: 1.0,
            animate: true,
            animation: AnimationSpec::BuiltIn,
            animation_speed: 1.0,
            smooth_colors: true,
            blur_radius: 0.0,
            show_dots: false,
            corner_radius: 0.0,
            timeout: DEFAULT_EXPORT_TIMEOUT,
            output_dir: None,
        }
    }
}

/// Everything the frame loop needs, copied out of the live model at export start.
///
/// Read-only for the lifetime of one export; owned exclusively by that export call.
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    /// Grid side length.
    pub grid_size: usize,
    /// Base (unanimated) control-point positions.
    pub base_positions: Vec<Point>,
    /// One color per control point.
    pub colors: Vec<Rgba>,
    /// Fill behind the mesh.
    pub background: Rgba,
    /// Motion applied per frame; [`AnimationSpec::Static`] when animation is off.
    pub animation: AnimationSpec,
    /// Phase multiplier baked in from the options.
    pub animation_speed: f64,
    /// Smooth color interpolation.
    pub smooth_colors: bool,
    /// Blur radius in output pixels.
    pub blur_radius: f64,
    /// Control-point dot visibility.
    pub show_dots: bool,
    /// Rounded-corner mask radius fraction.
    pub corner_radius: f64,
}

impl ExportSnapshot {
    /// Capture a template plus options into an immutable snapshot.
    pub fn capture(template: &GradientTemplate, options: &VideoExportOptions) -> Self {
        let animation = if options.animate {
            options.animation.clone()
        } else {
            AnimationSpec::Static
        };
        Self {
            grid_size: template.grid_size,
            base_positions: template.points.clone(),
            colors: template.colors.clone(),
            background: template.background,
            animation,
            animation_speed: options.animation_speed,
            smooth_colors: options.smooth_colors,
            blur_radius: options.blur_radius,
            show_dots: options.show_dots,
            corner_radius: options.corner_radius,
        }
    }

    /// Build the scene for a given elapsed time, applying animation speed and motion.
    pub fn scene_at(&self, elapsed_secs: f64) -> FrameScene {
        let phase = elapsed_secs * self.animation_speed;
        FrameScene {
            grid_size: self.grid_size,
            positions: self.animation.positions(&self.base_positions, phase),
            colors: self.colors.clone(),
            background: self.background,
            smooth_colors: self.smooth_colors,
            blur_radius: self.blur_radius,
            show_dots: self.show_dots,
            corner_radius: self.corner_radius,
        }
    }
}

/// Frame bookkeeping derived from duration and frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLoopPlan {
    /// Number of frames to append; always at least 1.
    pub total_frames: u64,
    /// Integer output frame rate.
    pub frame_rate: u32,
}

impl FrameLoopPlan {
    /// `total_frames = max(1, round(duration * frame_rate))`.
    pub fn new(duration_secs: f64, frame_rate: u32) -> Self {
        let raw = (duration_secs * f64::from(frame_rate)).round();
        let total_frames = if raw < 1.0 { 1 } else { raw as u64 };
        Self {
            total_frames,
            frame_rate,
        }
    }

    /// Seconds covered by one frame.
    pub fn time_per_frame(&self) -> f64 {
        1.0 / f64::from(self.frame_rate)
    }

    /// Elapsed seconds at the start of frame `index`.
    pub fn elapsed_at(&self, index: FrameIndex) -> f64 {
        index.0 as f64 * self.time_per_frame()
    }

    /// Exact rational presentation timestamp of frame `index`.
    pub fn presentation_time(&self, index: FrameIndex) -> PresentationTime {
        PresentationTime::of_frame(index, self.frame_rate)
    }
}
