//! Pure-CPU mesh rasterizer.
//!
//! Colors are interpolated between control points with inverse-distance weighting, or a
//! gaussian falloff when smooth interpolation is requested. The result is composited over
//! the scene background, optionally masked to rounded corners, overlaid with control-point
//! dots, and blurred.

use crate::foundation::core::PixelSize;
use crate::render::backend::{FrameRGBA, FrameRenderer, FrameScene};
use crate::render::blur::blur_rgba8_premul;

/// CPU rasterizer; always available, no platform requirements.
#[derive(Debug, Default)]
pub struct CpuMeshRenderer {
    scratch: Vec<u8>,
}

impl CpuMeshRenderer {
    /// New renderer with an empty scratch buffer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameRenderer for CpuMeshRenderer {
    fn render(&mut self, scene: &FrameScene, target: PixelSize) -> Option<FrameRGBA> {
        if target.width == 0 || target.height == 0 {
            return None;
        }
        if scene.positions.len() != scene.colors.len() || scene.positions.is_empty() {
            return None;
        }

        let len = target.rgba_byte_len();
        self.scratch.clear();
        self.scratch.resize(len, 0);

        rasterize(scene, target, &mut self.scratch);

        if scene.corner_radius > 0.0 {
            apply_corner_mask(&mut self.scratch, target, scene.corner_radius);
        }
        if scene.show_dots {
            draw_dots(&mut self.scratch, target, scene);
        }

        let data = if scene.blur_radius > 0.0 {
            // past the shorter side the kernel covers the whole frame anyway
            let cap = f64::from(target.width.min(target.height));
            let radius = scene.blur_radius.round().clamp(1.0, cap) as u32;
            blur_rgba8_premul(&self.scratch, target.width, target.height, radius).ok()?
        } else {
            self.scratch.clone()
        };

        Some(FrameRGBA {
            width: target.width,
            height: target.height,
            data,
            premultiplied: true,
        })
    }
}

fn rasterize(scene: &FrameScene, target: PixelSize, out: &mut [u8]) {
    let w = target.width as usize;
    let h = target.height as usize;
    let bg = scene.background;

    // gaussian sigma tied to the control-point spacing
    let spacing = 1.0 / (scene.grid_size.max(2) - 1) as f64;
    let gauss_denom = 2.0 * spacing * spacing;

    for y in 0..h {
        let v = (y as f64 + 0.5) / h as f64;
        for x in 0..w {
            let u = (x as f64 + 0.5) / w as f64;

            let mut sum_w = 0.0;
            let mut r = 0.0;
            let mut g = 0.0;
            let mut b = 0.0;
            let mut a = 0.0;
            for (p, c) in scene.positions.iter().zip(&scene.colors) {
                let dx = u - p.x;
                let dy = v - p.y;
                let d2 = dx * dx + dy * dy;
                let weight = if scene.smooth_colors {
                    (-d2 / gauss_denom).exp()
                } else {
                    1.0 / (d2 + 1e-6)
                };
                sum_w += weight;
                r += weight * c.r;
                g += weight * c.g;
                b += weight * c.b;
                a += weight * c.a;
            }

            let (r, g, b, a) = if sum_w > 0.0 {
                (r / sum_w, g / sum_w, b / sum_w, a / sum_w)
            } else {
                (bg.r, bg.g, bg.b, bg.a)
            };

            // mesh over background, straight alpha, then premultiply
            let out_a = a + bg.a * (1.0 - a);
            let (mr, mg, mb) = if out_a > 0.0 {
                (
                    (r * a + bg.r * bg.a * (1.0 - a)) / out_a,
                    (g * a + bg.g * bg.a * (1.0 - a)) / out_a,
                    (b * a + bg.b * bg.a * (1.0 - a)) / out_a,
                )
            } else {
                (0.0, 0.0, 0.0)
            };

            let idx = (y * w + x) * 4;
            out[idx] = to_u8(mr * out_a);
            out[idx + 1] = to_u8(mg * out_a);
            out[idx + 2] = to_u8(mb * out_a);
            out[idx + 3] = to_u8(out_a);
        }
    }
}

fn apply_corner_mask(pixels: &mut [u8], target: PixelSize, corner_radius: f64) {
    let w = target.width as f64;
    let h = target.height as f64;
    let radius = (corner_radius * w.min(h)).clamp(0.0, w.min(h) / 2.0);
    if radius <= 0.0 {
        return;
    }

    let wi = target.width as usize;
    for y in 0..target.height as usize {
        let py = y as f64 + 0.5;
        for x in 0..wi {
            let px = x as f64 + 0.5;
            let cx = px.clamp(radius, w - radius);
            let cy = py.clamp(radius, h - radius);
            let dx = px - cx;
            let dy = py - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            // 1px antialiasing band at the arc edge
            let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
            if coverage < 1.0 {
                let idx = (y * wi + x) * 4;
                for c in 0..4 {
                    pixels[idx + c] = (f64::from(pixels[idx + c]) * coverage).round() as u8;
                }
            }
        }
    }
}

fn draw_dots(pixels: &mut [u8], target: PixelSize, scene: &FrameScene) {
    let w = target.width as f64;
    let h = target.height as f64;
    let dot_radius = (0.01 * w.min(h)).max(2.0);
    let wi = target.width as usize;
    let hi = target.height as usize;

    for p in &scene.positions {
        let cx = p.x * w;
        let cy = p.y * h;
        let x0 = ((cx - dot_radius - 1.0).floor().max(0.0)) as usize;
        let x1 = ((cx + dot_radius + 1.0).ceil().min(w)) as usize;
        let y0 = ((cy - dot_radius - 1.0).floor().max(0.0)) as usize;
        let y1 = ((cy + dot_radius + 1.0).ceil().min(h)) as usize;

        for y in y0..y1.min(hi) {
            for x in x0..x1.min(wi) {
                let dx = (x as f64 + 0.5) - cx;
                let dy = (y as f64 + 0.5) - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (dot_radius + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let idx = (y * wi + x) * 4;
                    let c = (coverage * 255.0).round() as u16;
                    for ch in 0..4 {
                        let base = u16::from(pixels[idx + ch]);
                        // white dot, premultiplied blend
                        let blended = base + (c * (255 - base.min(255)) + 127) / 255;
                        pixels[idx + ch] = blended.min(255) as u8;
                    }
                }
            }
        }
    }
}

fn to_u8(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Point;
    use crate::gradient::color::Rgba;

    fn solid_scene(color: Rgba) -> FrameScene {
        FrameScene {
            grid_size: 2,
            positions: vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 1.0),
                Point::new(1.0, 1.0),
            ],
            colors: vec![color; 4],
            background: Rgba::rgb(0.0, 0.0, 0.0),
            smooth_colors: false,
            blur_radius: 0.0,
            show_dots: false,
            corner_radius: 0.0,
        }
    }

    #[test]
    fn renders_requested_dimensions() {
        let mut r = CpuMeshRenderer::new();
        let frame = r
            .render(
                &solid_scene(Rgba::rgb(1.0, 0.0, 0.0)),
                PixelSize {
                    width: 16,
                    height: 9,
                },
            )
            .unwrap();
        assert_eq!(frame.width, 16);
        assert_eq!(frame.height, 9);
        assert_eq!(frame.data.len(), 16 * 9 * 4);
        assert!(frame.premultiplied);
    }

    #[test]
    fn uniform_colors_render_uniformly() {
        let mut r = CpuMeshRenderer::new();
        let frame = r
            .render(
                &solid_scene(Rgba::rgb(0.0, 1.0, 0.0)),
                PixelSize {
                    width: 8,
                    height: 8,
                },
            )
            .unwrap();
        for px in frame.data.chunks_exact(4) {
            assert_eq!(px, [0, 255, 0, 255]);
        }
    }

    #[test]
    fn zero_size_and_count_mismatch_fail() {
        let mut r = CpuMeshRenderer::new();
        assert!(
            r.render(
                &solid_scene(Rgba::WHITE),
                PixelSize {
                    width: 0,
                    height: 8
                }
            )
            .is_none()
        );

        let mut scene = solid_scene(Rgba::WHITE);
        scene.colors.pop();
        assert!(
            r.render(
                &scene,
                PixelSize {
                    width: 8,
                    height: 8
                }
            )
            .is_none()
        );
    }

    #[test]
    fn corner_mask_clears_the_corner_pixel() {
        let mut r = CpuMeshRenderer::new();
        let mut scene = solid_scene(Rgba::rgb(1.0, 1.0, 1.0));
        scene.corner_radius = 0.5;
        let frame = r
            .render(
                &scene,
                PixelSize {
                    width: 32,
                    height: 32,
                },
            )
            .unwrap();
        assert_eq!(frame.data[3], 0); // top-left corner alpha
        let center = ((16 * 32 + 16) * 4) as usize;
        assert_eq!(frame.data[center + 3], 255);
    }

    #[test]
    fn pathological_blur_radius_is_clamped_to_the_frame() {
        let mut r = CpuMeshRenderer::new();
        let mut scene = solid_scene(Rgba::rgb(0.2, 0.4, 0.6));
        scene.blur_radius = 1e12;
        let frame = r
            .render(
                &scene,
                PixelSize {
                    width: 8,
                    height: 8,
                },
            )
            .unwrap();
        assert_eq!(frame.data.len(), 8 * 8 * 4);
    }

    #[test]
    fn determinism() {
        let mut r = CpuMeshRenderer::new();
        let scene = solid_scene(Rgba::rgb(0.3, 0.6, 0.9));
        let size = PixelSize {
            width: 12,
            height: 12,
        };
        let a = r.render(&scene, size).unwrap();
        let b = r.render(&scene, size).unwrap();
        assert_eq!(a.data, b.data);
    }
}
