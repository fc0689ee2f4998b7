//! Pre-flight export validation.
//!
//! Pure checks, run before any file or encoder resource is touched. Available standalone
//! so a caller can validate a form before offering the export action at all.

use crate::foundation::core::Size;
use crate::foundation::error::{ExportError, ExportResult};
use crate::gradient::template::{GradientTemplate, TemplateViolation};

/// Inclusive upper bound on export duration, in seconds.
pub const MAX_DURATION_SECS: f64 = 3600.0;
/// Inclusive upper bound on frame rate.
pub const MAX_FRAME_RATE: u32 = 120;
/// Inclusive upper bound on either view axis.
pub const MAX_DIMENSION: f64 = 8192.0;
/// Inclusive upper bound on render scale.
pub const MAX_RENDER_SCALE: f64 = 4.0;

/// One reason an export request is unacceptable.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportViolation {
    /// Duration is not in `(0, 3600]` seconds or not finite.
    Duration(f64),
    /// Frame rate is not in `(0, 120]`.
    FrameRate(u32),
    /// A view axis is not finite or not in `(0, 8192]`.
    Dimension { axis: &'static str, value: f64 },
    /// Render scale is not finite or not in `(0, 4]`.
    RenderScale(f64),
    /// The template itself is malformed.
    Template(TemplateViolation),
}

impl std::fmt::Display for ExportViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duration(d) => {
                write!(f, "duration must be in (0, {MAX_DURATION_SECS}] seconds, got {d}")
            }
            Self::FrameRate(r) => {
                write!(f, "frame rate must be in (0, {MAX_FRAME_RATE}], got {r}")
            }
            Self::Dimension { axis, value } => {
                write!(f, "{axis} must be finite and in (0, {MAX_DIMENSION}], got {value}")
            }
            Self::RenderScale(s) => {
                write!(f, "render scale must be finite and in (0, {MAX_RENDER_SCALE}], got {s}")
            }
            Self::Template(v) => write!(f, "{v}"),
        }
    }
}

/// Collect every violation of the export bounds; an empty list means the request is valid.
pub fn validate(
    template: &GradientTemplate,
    view: Size,
    duration_secs: f64,
    frame_rate: u32,
    render_scale: f64,
) -> Vec<ExportViolation> {
    let mut out = Vec::new();

    if !duration_secs.is_finite() || duration_secs <= 0.0 || duration_secs > MAX_DURATION_SECS {
        out.push(ExportViolation::Duration(duration_secs));
    }
    if frame_rate == 0 || frame_rate > MAX_FRAME_RATE {
        out.push(ExportViolation::FrameRate(frame_rate));
    }
    for (axis, value) in [("width", view.width), ("height", view.height)] {
        if !value.is_finite() || value <= 0.0 || value > MAX_DIMENSION {
            out.push(ExportViolation::Dimension { axis, value });
        }
    }
    if !render_scale.is_finite() || render_scale <= 0.0 || render_scale > MAX_RENDER_SCALE {
        out.push(ExportViolation::RenderScale(render_scale));
    }
    out.extend(template.violations().into_iter().map(ExportViolation::Template));

    out
}

/// Throwing wrapper over [`validate`]: the first violation becomes
/// [`ExportError::InvalidConfiguration`].
pub fn validate_strict(
    template: &GradientTemplate,
    view: Size,
    duration_secs: f64,
    frame_rate: u32,
    render_scale: f64,
) -> ExportResult<()> {
    match validate(template, view, duration_secs, frame_rate, render_scale)
        .into_iter()
        .next()
    {
        None => Ok(()),
        Some(v) => Err(ExportError::invalid_configuration(v.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Point;
    use crate::gradient::color::Rgba;

    fn template() -> GradientTemplate {
        GradientTemplate {
            name: "t".to_owned(),
            grid_size: 2,
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 1.0),
                Point::new(1.0, 1.0),
            ],
            colors: vec![Rgba::WHITE; 4],
            background: Rgba::WHITE,
        }
    }

    fn check(duration: f64, rate: u32, view: Size, scale: f64) -> Vec<ExportViolation> {
        validate(&template(), view, duration, rate, scale)
    }

    #[test]
    fn accepts_boundary_values() {
        let v = check(3600.0, 120, Size::new(8192.0, 8192.0), 4.0);
        assert!(v.is_empty(), "boundary values must pass: {v:?}");
        assert!(check(0.01, 1, Size::new(1.0, 1.0), 0.01).is_empty());
    }

    #[test]
    fn rejects_out_of_range_duration() {
        assert!(matches!(
            check(0.0, 30, Size::new(100.0, 100.0), 1.0)[0],
            ExportViolation::Duration(_)
        ));
        assert!(matches!(
            check(-1.0, 30, Size::new(100.0, 100.0), 1.0)[0],
            ExportViolation::Duration(_)
        ));
        assert!(matches!(
            check(3600.01, 30, Size::new(100.0, 100.0), 1.0)[0],
            ExportViolation::Duration(_)
        ));
        assert!(matches!(
            check(f64::NAN, 30, Size::new(100.0, 100.0), 1.0)[0],
            ExportViolation::Duration(_)
        ));
    }

    #[test]
    fn rejects_out_of_range_frame_rate() {
        assert!(matches!(
            check(1.0, 0, Size::new(100.0, 100.0), 1.0)[0],
            ExportViolation::FrameRate(0)
        ));
        assert!(matches!(
            check(1.0, 121, Size::new(100.0, 100.0), 1.0)[0],
            ExportViolation::FrameRate(121)
        ));
    }

    #[test]
    fn rejects_bad_dimensions() {
        for bad in [0.0, -5.0, 8192.5, f64::INFINITY, f64::NAN] {
            let v = check(1.0, 30, Size::new(bad, 100.0), 1.0);
            assert!(
                v.iter()
                    .any(|v| matches!(v, ExportViolation::Dimension { axis: "width", .. })),
                "width {bad} must be rejected"
            );
        }
    }

    #[test]
    fn rejects_bad_render_scale() {
        for bad in [0.0, -1.0, 4.0001, f64::NAN, f64::INFINITY] {
            assert!(
                check(1.0, 30, Size::new(100.0, 100.0), bad)
                    .iter()
                    .any(|v| matches!(v, ExportViolation::RenderScale(_))),
                "scale {bad} must be rejected"
            );
        }
    }

    #[test]
    fn rejects_malformed_template() {
        let mut t = template();
        t.colors.pop();
        let v = validate(&t, Size::new(100.0, 100.0), 1.0, 30, 1.0);
        assert!(v.iter().any(|v| matches!(v, ExportViolation::Template(_))));
    }

    #[test]
    fn collects_multiple_violations() {
        let v = check(0.0, 0, Size::new(0.0, 0.0), 0.0);
        assert!(v.len() >= 4);
    }

    #[test]
    fn strict_wrapper_surfaces_invalid_configuration() {
        let err = validate_strict(&template(), Size::new(100.0, 100.0), 0.0, 30, 1.0).unwrap_err();
        assert!(matches!(err, ExportError::InvalidConfiguration(_)));
    }
}
