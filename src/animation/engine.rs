//! Deterministic phase-to-positions motion.
//!
//! The engine is a pure function of `(base positions, phase)`. Built-in motions exist for
//! 3×3 and 4×4 grids and assign absolute coordinates from fixed oscillator tables; any
//! other grid size is the identity. Built-in output is deliberately not clamped to the
//! unit square, unlike [`AnimationPattern`] output, so points near an edge can glide past
//! it instead of snapping against it.

use crate::animation::pattern::AnimationPattern;
use crate::foundation::core::Point;

/// How control points move over time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnimationSpec {
    /// Points never move.
    Static,
    /// Stock per-grid-size motion ([`animated_positions`]).
    #[default]
    BuiltIn,
    /// Caller-supplied pattern; takes precedence over the built-ins for grids of side
    /// length 3 or more.
    Pattern(AnimationPattern),
}

impl AnimationSpec {
    /// Resolve positions for one frame.
    pub fn positions(&self, base: &[Point], phase: f64) -> Vec<Point> {
        match self {
            Self::Static => base.to_vec(),
            Self::BuiltIn => animated_positions(base, phase),
            Self::Pattern(pattern) if base.len() >= 9 => pattern.apply(base, phase),
            Self::Pattern(_) => animated_positions(base, phase),
        }
    }
}

/// Built-in motion, keyed by point count: 9..15 points use the medium-grid table, exactly
/// 16 the large-grid table (with phase halved), anything else is returned unchanged. The
/// medium table writes up to index 7, so counts below 8 also fall back to the identity
/// rather than indexing past the slice.
pub fn animated_positions(base: &[Point], phase: f64) -> Vec<Point> {
    let count = base.len();
    if (8..16).contains(&count) {
        medium_grid(base, phase)
    } else if count == 16 {
        large_grid(base, phase)
    } else {
        base.to_vec()
    }
}

fn medium_grid(base: &[Point], phase: f64) -> Vec<Point> {
    let mut out = base.to_vec();

    out[1].x = 0.5 + 0.4 * phase.cos();
    out[3].y = 0.5 + 0.3 * (phase * 1.1).cos();
    out[4].y = 0.5 - 0.4 * (phase * 0.9).cos();
    out[4].x = 0.5 + 0.2 * (phase * 0.7).cos();
    out[5].y = 0.5 - 0.2 * (phase * 0.9).cos();
    out[7].x = 0.5 - 0.4 * (phase * 1.2).cos();

    out
}

fn large_grid(base: &[Point], phase: f64) -> Vec<Point> {
    let mut out = base.to_vec();
    let phase = phase / 2.0;

    out[1].x = 0.33 + 0.1 * (phase * 0.7).cos();
    out[2].x = 0.67 - 0.1 * (phase * 0.8).cos();
    out[4].y = 0.33 + 0.1 * (phase * 0.9).cos();
    out[5].x = 0.33 + 0.15 * (phase * 0.8).cos();
    out[5].y = 0.33 + 0.15 * (phase * 0.9).cos();
    out[6].x = 0.67 - 0.15 * phase.cos();
    out[6].y = 0.33 + 0.15 * (phase * 1.1).cos();
    out[7].y = 0.37 - 0.1 * (phase * 0.6).cos();
    out[9].x = 0.33 + 0.15 * (phase * 1.2).cos();
    out[9].y = 0.67 - 0.15 * (phase * 1.3).cos();
    out[10].x = 0.67 - 0.15 * (phase * 1.4).cos();
    out[10].y = 0.67 - 0.15 * (phase * 1.5).cos();
    out[11].y = 0.67 - 0.1 * (phase * 1.2).cos();
    out[13].x = 0.33 + 0.1 * (phase * 1.3).cos();
    out[14].x = 0.67 - 0.1 * (phase * 1.4).cos();

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize) -> Vec<Point> {
        let step = 1.0 / (n - 1) as f64;
        let mut pts = Vec::with_capacity(n * n);
        for y in 0..n {
            for x in 0..n {
                pts.push(Point::new(x as f64 * step, y as f64 * step));
            }
        }
        pts
    }

    #[test]
    fn unsupported_grid_is_exact_identity() {
        let base = uniform(5); // 25 points, outside both tables
        assert_eq!(animated_positions(&base, 1.234), base);
        let base = uniform(2); // 4 points
        assert_eq!(animated_positions(&base, 1.234), base);
    }

    #[test]
    fn counts_too_small_for_the_medium_table_are_identity() {
        // non-square counts in 5..8 cannot hold the table's highest index
        for n in 5..8 {
            let base = vec![Point::new(0.5, 0.5); n];
            assert_eq!(animated_positions(&base, 1.234), base);
        }
    }

    #[test]
    fn static_spec_is_identity_for_any_grid() {
        let base = uniform(3);
        assert_eq!(AnimationSpec::Static.positions(&base, 2.5), base);
    }

    #[test]
    fn medium_grid_moves_expected_points() {
        let base = uniform(3);
        let out = animated_positions(&base, 0.0);
        // cos(0) = 1
        assert!((out[1].x - 0.9).abs() < 1e-12);
        assert!((out[3].y - 0.8).abs() < 1e-12);
        assert!((out[4].y - 0.1).abs() < 1e-12);
        assert!((out[4].x - 0.7).abs() < 1e-12);
        // untouched points keep their base coordinates
        assert_eq!(out[0], base[0]);
        assert_eq!(out[8], base[8]);
    }

    #[test]
    fn large_grid_halves_the_phase() {
        let base = uniform(4);
        let out = animated_positions(&base, 2.0);
        // index 6 x uses the raw halved phase: 0.67 - 0.15 * cos(1.0)
        let expected = 0.67 - 0.15 * 1.0_f64.cos();
        assert!((out[6].x - expected).abs() < 1e-12);
    }

    #[test]
    fn determinism_same_inputs_same_outputs() {
        let base = uniform(4);
        assert_eq!(animated_positions(&base, 3.21), animated_positions(&base, 3.21));
    }

    #[test]
    fn pattern_overrides_builtin_for_large_enough_grids() {
        let base = uniform(3);
        let spec = AnimationSpec::Pattern(AnimationPattern::default());
        // empty pattern means identity, which differs from the built-in table
        assert_eq!(spec.positions(&base, 1.0), base);
    }

    #[test]
    fn pattern_falls_back_to_builtin_below_nine_points() {
        let base = uniform(2);
        let spec = AnimationSpec::Pattern(AnimationPattern::default_for_grid(3));
        assert_eq!(spec.positions(&base, 1.0), base);
    }
}
