use crate::foundation::core::Point;
use crate::foundation::error::{ExportError, ExportResult};
use crate::gradient::color::Rgba;

/// Immutable description of a mesh gradient.
///
/// A template is an `grid_size × grid_size` grid of control points in unit-square
/// coordinates, one color per point, plus a background color for regions the mesh does not
/// cover. `points.len() == colors.len() == grid_size²` is the structural invariant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GradientTemplate {
    /// Human-readable template name.
    pub name: String,
    /// Grid side length; a value of 3 means a 3×3 grid of 9 control points.
    pub grid_size: usize,
    /// Control-point positions in `[0,1]×[0,1]`, row-major.
    pub points: Vec<Point>,
    /// One color per control point, same order as `points`.
    pub colors: Vec<Rgba>,
    /// Base color for areas not directly covered by the mesh.
    pub background: Rgba,
}

/// A single structural violation found in a template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateViolation {
    /// `grid_size` is zero.
    ZeroGridSize,
    /// `points.len()` does not equal `grid_size²`.
    PointCount { expected: usize, actual: usize },
    /// `colors.len()` does not equal `grid_size²`.
    ColorCount { expected: usize, actual: usize },
    /// A base control point lies outside the unit square.
    PointOutOfRange { index: usize, x: f64, y: f64 },
}

impl std::fmt::Display for TemplateViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroGridSize => write!(f, "grid size must be greater than 0"),
            Self::PointCount { expected, actual } => {
                write!(f, "expected {expected} points, got {actual}")
            }
            Self::ColorCount { expected, actual } => {
                write!(f, "expected {expected} colors, got {actual}")
            }
            Self::PointOutOfRange { index, x, y } => {
                write!(f, "point {index} at ({x}, {y}) is outside [0,1]×[0,1]")
            }
        }
    }
}

impl GradientTemplate {
    /// Build a validated template; the first violation becomes an error.
    pub fn new(
        name: impl Into<String>,
        grid_size: usize,
        points: Vec<Point>,
        colors: Vec<Rgba>,
        background: Rgba,
    ) -> ExportResult<Self> {
        let t = Self {
            name: name.into(),
            grid_size,
            points,
            colors,
            background,
        };
        t.validate()?;
        Ok(t)
    }

    /// Non-throwing validator: returns every violation instead of failing on the first.
    pub fn violations(&self) -> Vec<TemplateViolation> {
        let mut out = Vec::new();
        if self.grid_size == 0 {
            out.push(TemplateViolation::ZeroGridSize);
        }
        let expected = self.grid_size * self.grid_size;
        if self.points.len() != expected {
            out.push(TemplateViolation::PointCount {
                expected,
                actual: self.points.len(),
            });
        }
        if self.colors.len() != expected {
            out.push(TemplateViolation::ColorCount {
                expected,
                actual: self.colors.len(),
            });
        }
        for (index, p) in self.points.iter().enumerate() {
            if !(0.0..=1.0).contains(&p.x) || !(0.0..=1.0).contains(&p.y) {
                out.push(TemplateViolation::PointOutOfRange {
                    index,
                    x: p.x,
                    y: p.y,
                });
            }
        }
        out
    }

    /// Throwing wrapper over [`GradientTemplate::violations`].
    pub fn validate(&self) -> ExportResult<()> {
        match self.violations().into_iter().next() {
            None => Ok(()),
            Some(v) => Err(ExportError::invalid_configuration(format!(
                "template '{}': {v}",
                self.name
            ))),
        }
    }

    /// Number of control points (`grid_size²`).
    pub fn point_count(&self) -> usize {
        self.grid_size * self.grid_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_points(n: usize) -> Vec<Point> {
        let step = if n > 1 { 1.0 / (n - 1) as f64 } else { 1.0 };
        let mut pts = Vec::with_capacity(n * n);
        for y in 0..n {
            for x in 0..n {
                pts.push(Point::new(x as f64 * step, y as f64 * step));
            }
        }
        pts
    }

    #[test]
    fn valid_template_passes() {
        let t = GradientTemplate::new(
            "test",
            2,
            uniform_points(2),
            vec![Rgba::WHITE; 4],
            Rgba::rgb(0.0, 0.0, 0.0),
        )
        .unwrap();
        assert!(t.violations().is_empty());
        assert_eq!(t.point_count(), 4);
    }

    #[test]
    fn count_mismatch_is_reported() {
        let t = GradientTemplate {
            name: "bad".to_owned(),
            grid_size: 3,
            points: uniform_points(2),
            colors: vec![Rgba::WHITE; 9],
            background: Rgba::WHITE,
        };
        let v = t.violations();
        assert!(matches!(
            v[0],
            TemplateViolation::PointCount {
                expected: 9,
                actual: 4
            }
        ));
        assert!(t.validate().is_err());
    }

    #[test]
    fn out_of_range_point_is_reported() {
        let mut pts = uniform_points(2);
        pts[1] = Point::new(1.2, 0.0);
        let t = GradientTemplate {
            name: "oob".to_owned(),
            grid_size: 2,
            points: pts,
            colors: vec![Rgba::WHITE; 4],
            background: Rgba::WHITE,
        };
        assert!(
            t.violations()
                .iter()
                .any(|v| matches!(v, TemplateViolation::PointOutOfRange { index: 1, .. }))
        );
    }

    #[test]
    fn zero_grid_size_is_reported() {
        let t = GradientTemplate {
            name: "zero".to_owned(),
            grid_size: 0,
            points: Vec::new(),
            colors: Vec::new(),
            background: Rgba::WHITE,
        };
        assert_eq!(t.violations(), vec![TemplateViolation::ZeroGridSize]);
    }
}
