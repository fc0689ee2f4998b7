//! Animated mesh gradients with video and still export.
//!
//! A mesh gradient is an N×N grid of colored control points interpolated into a smooth 2D
//! color field. This crate models such gradients ([`GradientTemplate`]), animates their
//! control points deterministically over time ([`animation`]), rasterizes frames on the
//! CPU ([`render`]), and exports the result either as a single image or as an H.264 MP4
//! through the system `ffmpeg` ([`export`]).
//!
//! The video pipeline is demand-driven: an encoder session signals when it can accept
//! another frame, and a frame-loop driver answers each signal by rendering and appending
//! exactly one ordered run of frames, with cooperative timeout and cancellation and a
//! guarantee that no failure path leaves a partial file behind.
//!
//! ```no_run
//! use meshgrad::{PresetSize3, VideoExportOptions, export_video};
//!
//! let template = PresetSize3::AuroraBorealis.template();
//! let options = VideoExportOptions {
//!     duration_secs: 3.0,
//!     frame_rate: 30,
//!     ..VideoExportOptions::default()
//! };
//! let path = export_video(&template, &options)?;
//! println!("wrote {}", path.display());
//! # Ok::<(), meshgrad::ExportError>(())
//! ```

#![forbid(unsafe_code)]

pub mod animation;
pub mod export;
pub mod foundation;
pub mod gradient;
pub mod render;

pub use animation::engine::{AnimationSpec, animated_positions};
pub use animation::pattern::{AnimationPattern, Axis, PointAnimation};
pub use export::controller::{export_video, export_video_cancellable};
pub use export::driver::CancelToken;
pub use export::encoder::{EncoderSession, InMemorySession, PixelBuffer, PixelBufferPool};
pub use export::ffmpeg::ContainerFormat;
pub use export::image::{StillExportOptions, StillFormat, export_still};
pub use export::snapshot::{
    DEFAULT_EXPORT_TIMEOUT, ExportSnapshot, FrameLoopPlan, VideoExportOptions,
};
pub use export::validate::{ExportViolation, validate, validate_strict};
pub use foundation::core::{FrameIndex, PixelSize, Point, PresentationTime, Size, Vec2};
pub use foundation::error::{ExportError, ExportResult};
pub use gradient::color::Rgba;
pub use gradient::presets::{Preset, PresetSize2, PresetSize3, PresetSize4};
pub use gradient::template::{GradientTemplate, TemplateViolation};
pub use render::backend::{FrameRGBA, FrameRenderer, FrameScene, RendererKind, create_renderer};
pub use render::host::RenderHost;
