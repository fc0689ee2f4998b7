use crate::foundation::core::{PixelSize, Point};
use crate::gradient::color::Rgba;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**; the `premultiplied` flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Expected byte length for the frame's dimensions.
    pub fn byte_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Everything a renderer needs to draw one frame.
///
/// Positions are already animated for the frame's phase; the renderer itself is stateless
/// with respect to time.
#[derive(Clone, Debug)]
pub struct FrameScene {
    /// Grid side length.
    pub grid_size: usize,
    /// Animated control-point positions, unit-square coordinates, row-major.
    pub positions: Vec<Point>,
    /// One color per control point.
    pub colors: Vec<Rgba>,
    /// Fill behind the mesh.
    pub background: Rgba,
    /// Smooth (gaussian-weighted) color interpolation instead of plain inverse-distance.
    pub smooth_colors: bool,
    /// Post-rasterization blur radius in output pixels; 0 disables.
    pub blur_radius: f64,
    /// Draw a small marker dot at each control point.
    pub show_dots: bool,
    /// Rounded-corner mask radius in unit coordinates of the shorter side; 0 disables.
    pub corner_radius: f64,
}

/// A rasterizer for mesh-gradient frames.
///
/// `render` must be deterministic for identical inputs; `None` signals a renderer failure
/// and is terminal for the export that issued it.
pub trait FrameRenderer: Send {
    /// Rasterize one scene at the given pixel size.
    fn render(&mut self, scene: &FrameScene, target: PixelSize) -> Option<FrameRGBA>;
}

/// Available renderer kinds.
///
/// - `Cpu` is always available.
#[derive(Clone, Copy, Debug)]
pub enum RendererKind {
    /// Pure-CPU rasterizer.
    Cpu,
}

/// Create a renderer implementation.
pub fn create_renderer(kind: RendererKind) -> Box<dyn FrameRenderer> {
    match kind {
        RendererKind::Cpu => Box::new(crate::render::cpu::CpuMeshRenderer::new()),
    }
}
