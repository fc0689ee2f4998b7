use crate::foundation::error::{ExportError, ExportResult};

pub use kurbo::{Point, Vec2};

/// Absolute 0-based frame index in export timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Logical view size in points, as seen by the caller.
///
/// Physical output dimensions are derived from this via the render scale; see
/// [`PixelSize::from_view`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in logical units.
    pub width: f64,
    /// Height in logical units.
    pub height: f64,
}

impl Size {
    /// Create a logical size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Physical output dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create a pixel size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Derive physical pixel dimensions from a logical view size and a render scale.
    ///
    /// Each axis is rounded to the nearest pixel and floored at 1px so a tiny view times a
    /// small scale can never produce a zero-sized frame.
    pub fn from_view(view: Size, render_scale: f64) -> Self {
        fn axis(v: f64, scale: f64) -> u32 {
            let px = (v * scale).round();
            if px < 1.0 { 1 } else { px as u32 }
        }
        Self {
            width: axis(view.width, render_scale),
            height: axis(view.height, render_scale),
        }
    }

    /// Total byte length of one tightly packed RGBA8 frame at this size.
    pub fn rgba_byte_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Exact rational media timestamp: `value / timescale` seconds.
///
/// Presentation times are kept rational so thousands of frames accumulate zero drift; the
/// n-th frame of an `fps` export is exactly `PresentationTime { value: n, timescale: fps }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PresentationTime {
    /// Tick count.
    pub value: u64,
    /// Ticks per second, must be non-zero.
    pub timescale: u32,
}

impl PresentationTime {
    /// Create a validated timestamp.
    pub fn new(value: u64, timescale: u32) -> ExportResult<Self> {
        if timescale == 0 {
            return Err(ExportError::invalid_configuration(
                "PresentationTime timescale must be > 0",
            ));
        }
        Ok(Self { value, timescale })
    }

    /// Timestamp of frame `index` at an integer frame rate.
    pub fn of_frame(index: FrameIndex, frame_rate: u32) -> Self {
        Self {
            value: index.0,
            timescale: frame_rate.max(1),
        }
    }

    /// Convert to floating-point seconds (display/debugging only).
    pub fn as_secs_f64(self) -> f64 {
        self.value as f64 / f64::from(self.timescale)
    }
}

impl PartialOrd for PresentationTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PresentationTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Cross-multiply in u128 so mixed timescales compare exactly.
        let lhs = u128::from(self.value) * u128::from(other.timescale);
        let rhs = u128::from(other.value) * u128::from(self.timescale);
        lhs.cmp(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_size_from_view_rounds_and_floors_at_one() {
        assert_eq!(
            PixelSize::from_view(Size::new(320.0, 320.0), 1.0),
            PixelSize::new(320, 320)
        );
        assert_eq!(
            PixelSize::from_view(Size::new(100.0, 50.0), 1.5),
            PixelSize::new(150, 75)
        );
        assert_eq!(
            PixelSize::from_view(Size::new(0.1, 0.1), 0.5),
            PixelSize::new(1, 1)
        );
    }

    #[test]
    fn presentation_time_orders_across_timescales() {
        let half = PresentationTime::new(1, 2).unwrap();
        let quarter = PresentationTime::new(1, 4).unwrap();
        let also_half = PresentationTime::new(2, 4).unwrap();
        assert!(quarter < half);
        assert_eq!(half.cmp(&also_half), std::cmp::Ordering::Equal);
    }

    #[test]
    fn presentation_time_rejects_zero_timescale() {
        assert!(PresentationTime::new(0, 0).is_err());
    }
}
