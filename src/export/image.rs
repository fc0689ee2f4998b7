//! Still-image export.
//!
//! Renders a single frame of the gradient (phase 0, no animation) and writes it as PNG or
//! JPEG. Shares the rasterizer and the size/scale bounds with the video pipeline but needs
//! none of its encoder machinery.

use crate::export::ffmpeg::ensure_parent_dir;
use crate::export::validate::{MAX_DIMENSION, MAX_RENDER_SCALE};
use crate::foundation::core::{PixelSize, Size};
use crate::foundation::error::{ExportError, ExportResult};
use crate::gradient::template::GradientTemplate;
use crate::render::backend::{FrameRGBA, FrameScene, RendererKind, create_renderer};
use std::path::Path;

/// Still output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillFormat {
    /// Lossless, keeps alpha.
    Png,
    /// Lossy, alpha flattened onto the template background.
    Jpeg {
        /// Encoder quality, 1..=100.
        quality: u8,
    },
}

/// Options for one still export.
#[derive(Debug, Clone)]
pub struct StillExportOptions {
    /// Logical view size.
    pub view_size: Size,
    /// Multiplier from view size to output pixels.
    pub render_scale: f64,
    /// Smooth color interpolation.
    pub smooth_colors: bool,
    /// Blur radius in output pixels; 0 disables.
    pub blur_radius: f64,
    /// Draw control-point dots.
    pub show_dots: bool,
    /// Rounded-corner mask radius fraction; 0 disables.
    pub corner_radius: f64,
    /// Output format.
    pub format: StillFormat,
}

impl Default for StillExportOptions {
    fn default() -> Self {
        Self {
            view_size: Size::new(320.0, 320.0),
            render_scale: 1.0,
            smooth_colors: true,
            blur_radius: 0.0,
            show_dots: false,
            corner_radius: 0.0,
            format: StillFormat::Png,
        }
    }
}

/// Render `template` once and write it to `out_path`.
pub fn export_still(
    template: &GradientTemplate,
    options: &StillExportOptions,
    out_path: &Path,
) -> ExportResult<()> {
    template.validate()?;
    for (axis, value) in [
        ("width", options.view_size.width),
        ("height", options.view_size.height),
    ] {
        if !value.is_finite() || value <= 0.0 || value > MAX_DIMENSION {
            return Err(ExportError::invalid_configuration(format!(
                "{axis} must be finite and in (0, {MAX_DIMENSION}], got {value}"
            )));
        }
    }
    if !options.render_scale.is_finite()
        || options.render_scale <= 0.0
        || options.render_scale > MAX_RENDER_SCALE
    {
        return Err(ExportError::invalid_configuration(format!(
            "render scale must be finite and in (0, {MAX_RENDER_SCALE}], got {}",
            options.render_scale
        )));
    }

    let size = PixelSize::from_view(options.view_size, options.render_scale);
    let scene = FrameScene {
        grid_size: template.grid_size,
        positions: template.points.clone(),
        colors: template.colors.clone(),
        background: template.background,
        smooth_colors: options.smooth_colors,
        blur_radius: options.blur_radius,
        show_dots: options.show_dots,
        corner_radius: options.corner_radius,
    };

    let mut renderer = create_renderer(RendererKind::Cpu);
    let frame = renderer
        .render(&scene, size)
        .ok_or(ExportError::FrameRenderingFailed)?;

    ensure_parent_dir(out_path)?;
    write_frame(&frame, options.format, template, out_path)
}

fn write_frame(
    frame: &FrameRGBA,
    format: StillFormat,
    template: &GradientTemplate,
    out_path: &Path,
) -> ExportResult<()> {
    use anyhow::Context as _;

    let straight = unpremultiply(&frame.data);
    let rgba = image::RgbaImage::from_raw(frame.width, frame.height, straight)
        .ok_or(ExportError::FrameRenderingFailed)?;

    match format {
        StillFormat::Png => {
            rgba.save_with_format(out_path, image::ImageFormat::Png)
                .with_context(|| format!("failed to write PNG '{}'", out_path.display()))?;
        }
        StillFormat::Jpeg { quality } => {
            if quality == 0 || quality > 100 {
                return Err(ExportError::invalid_configuration(
                    "jpeg quality must be in 1..=100",
                ));
            }
            let bg = template.background.to_rgb8();
            let rgb = flatten_to_rgb(&rgba, bg);
            let file = std::fs::File::create(out_path)
                .with_context(|| format!("failed to create '{}'", out_path.display()))?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                std::io::BufWriter::new(file),
                quality,
            );
            encoder
                .encode_image(&rgb)
                .with_context(|| format!("failed to write JPEG '{}'", out_path.display()))?;
        }
    }
    Ok(())
}

fn unpremultiply(premul: &[u8]) -> Vec<u8> {
    let mut out = premul.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = px[3];
        if a == 0 || a == 255 {
            continue;
        }
        for c in px.iter_mut().take(3) {
            let v = (u16::from(*c) * 255 + u16::from(a) / 2) / u16::from(a);
            *c = v.min(255) as u8;
        }
    }
    out
}

fn flatten_to_rgb(rgba: &image::RgbaImage, bg: [u8; 3]) -> image::RgbImage {
    image::RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let px = rgba.get_pixel(x, y);
        let a = u16::from(px[3]);
        let inv = 255 - a;
        image::Rgb([
            ((u16::from(px[0]) * a + u16::from(bg[0]) * inv + 127) / 255) as u8,
            ((u16::from(px[1]) * a + u16::from(bg[1]) * inv + 127) / 255) as u8,
            ((u16::from(px[2]) * a + u16::from(bg[2]) * inv + 127) / 255) as u8,
        ])
    })
}
