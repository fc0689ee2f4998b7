use crate::foundation::core::Point;

/// Axis along which a single point oscillates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal only.
    X,
    /// Vertical only.
    Y,
    /// Horizontal via cosine, vertical via sine, same amplitude and frequency.
    Both,
}

/// Oscillation of one control point around its base position.
///
/// Displacement is `amplitude * cos(phase * frequency)`; with [`Axis::Both`] the vertical
/// component uses `sin` instead, tracing an ellipse.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointAnimation {
    /// Index into the template's row-major point array.
    pub point_index: usize,
    /// Which coordinate(s) to move.
    pub axis: Axis,
    /// Peak displacement in unit-square coordinates; may be negative.
    pub amplitude: f64,
    /// Phase multiplier; 1.0 completes one cycle per `2π` of phase.
    pub frequency: f64,
}

impl PointAnimation {
    /// New animation with an explicit frequency.
    pub fn new(point_index: usize, axis: Axis, amplitude: f64, frequency: f64) -> Self {
        Self {
            point_index,
            axis,
            amplitude,
            frequency,
        }
    }

    /// New animation with the default frequency of 1.0.
    pub fn with_unit_frequency(point_index: usize, axis: Axis, amplitude: f64) -> Self {
        Self::new(point_index, axis, amplitude, 1.0)
    }

    fn apply(&self, point: &mut Point, phase: f64) {
        let value = (phase * self.frequency).cos();
        match self.axis {
            Axis::X => point.x += self.amplitude * value,
            Axis::Y => point.y += self.amplitude * value,
            Axis::Both => {
                point.x += self.amplitude * value;
                point.y += self.amplitude * (phase * self.frequency).sin();
            }
        }
    }
}

/// An ordered set of per-point oscillations applied on top of a base layout.
///
/// Unlike the built-in grid motions in [`engine`](crate::animation::engine), pattern output
/// is clamped into the unit square.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct AnimationPattern {
    /// Individual point oscillations, applied in order.
    pub animations: Vec<PointAnimation>,
}

impl AnimationPattern {
    /// Pattern from an explicit list of point animations.
    pub fn new(animations: Vec<PointAnimation>) -> Self {
        Self { animations }
    }

    /// Stock pattern for a given grid side length; grids other than 3 and 4 get an empty
    /// pattern (identity motion).
    pub fn default_for_grid(grid_size: usize) -> Self {
        match grid_size {
            3 => Self::new(vec![
                PointAnimation::with_unit_frequency(1, Axis::X, 0.4),
                PointAnimation::new(3, Axis::Y, 0.3, 1.1),
                PointAnimation::new(4, Axis::Y, -0.4, 0.9),
                PointAnimation::new(4, Axis::X, 0.2, 0.7),
                PointAnimation::new(5, Axis::Y, -0.2, 0.9),
                PointAnimation::new(7, Axis::X, -0.4, 1.2),
            ]),
            4 => Self::new(vec![
                // edge points
                PointAnimation::new(1, Axis::X, 0.1, 0.7),
                PointAnimation::new(2, Axis::X, -0.1, 0.8),
                PointAnimation::new(4, Axis::Y, 0.1, 0.9),
                PointAnimation::new(7, Axis::Y, -0.1, 0.6),
                PointAnimation::new(11, Axis::Y, -0.1, 1.2),
                PointAnimation::new(13, Axis::X, 0.1, 1.3),
                PointAnimation::new(14, Axis::X, -0.1, 1.4),
                // interior points
                PointAnimation::new(5, Axis::Both, 0.15, 0.8),
                PointAnimation::new(6, Axis::Both, -0.15, 1.0),
                PointAnimation::new(9, Axis::Both, 0.15, 1.2),
                PointAnimation::new(10, Axis::Both, -0.15, 1.4),
            ]),
            _ => Self::default(),
        }
    }

    /// True when the pattern moves nothing.
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Apply every animation at the given phase. Out-of-range point indices are skipped;
    /// every resulting coordinate is clamped into `[0,1]`.
    pub fn apply(&self, base: &[Point], phase: f64) -> Vec<Point> {
        let mut out = base.to_vec();
        for anim in &self.animations {
            let Some(p) = out.get_mut(anim.point_index) else {
                continue;
            };
            anim.apply(p, phase);
            p.x = p.x.clamp(0.0, 1.0);
            p.y = p.y.clamp(0.0, 1.0);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center_grid(n: usize) -> Vec<Point> {
        vec![Point::new(0.5, 0.5); n * n]
    }

    #[test]
    fn x_axis_moves_only_x() {
        let pattern = AnimationPattern::new(vec![PointAnimation::with_unit_frequency(
            0,
            Axis::X,
            0.25,
        )]);
        let out = pattern.apply(&center_grid(2), 0.0);
        assert!((out[0].x - 0.75).abs() < 1e-12);
        assert!((out[0].y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn both_axis_uses_cos_and_sin() {
        let pattern = AnimationPattern::new(vec![PointAnimation::with_unit_frequency(
            0,
            Axis::Both,
            0.2,
        )]);
        let phase = std::f64::consts::FRAC_PI_2;
        let out = pattern.apply(&center_grid(2), phase);
        // cos(pi/2) = 0, sin(pi/2) = 1
        assert!((out[0].x - 0.5).abs() < 1e-12);
        assert!((out[0].y - 0.7).abs() < 1e-12);
    }

    #[test]
    fn output_is_always_clamped_to_unit_square() {
        let pattern = AnimationPattern::new(vec![
            PointAnimation::with_unit_frequency(0, Axis::Both, 5.0),
            PointAnimation::with_unit_frequency(1, Axis::X, -9.0),
        ]);
        for step in 0..64 {
            let phase = step as f64 * 0.37;
            for p in pattern.apply(&center_grid(2), phase) {
                assert!((0.0..=1.0).contains(&p.x), "x out of range: {}", p.x);
                assert!((0.0..=1.0).contains(&p.y), "y out of range: {}", p.y);
            }
        }
    }

    #[test]
    fn out_of_range_index_is_skipped() {
        let pattern = AnimationPattern::new(vec![PointAnimation::with_unit_frequency(
            99,
            Axis::X,
            0.5,
        )]);
        let base = center_grid(2);
        assert_eq!(pattern.apply(&base, 1.0), base);
    }

    #[test]
    fn default_patterns_exist_for_3_and_4_only() {
        assert_eq!(AnimationPattern::default_for_grid(3).animations.len(), 6);
        assert_eq!(AnimationPattern::default_for_grid(4).animations.len(), 11);
        assert!(AnimationPattern::default_for_grid(2).is_empty());
        assert!(AnimationPattern::default_for_grid(5).is_empty());
    }
}
