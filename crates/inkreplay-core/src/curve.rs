//! Midpoint-chained stroke segments for the 2D recreation.
//!
//! Each consecutive pair `(P_i, P_i+1)` becomes a quadratic segment with
//! `P_i` as control point, ending at the pair's midpoint. The path passes
//! near, not through, the samples, which smooths capture noise.

use crate::recording::StrokeRecording;
use kurbo::{BezPath, Point, Size};

/// One drawable piece of the smoothed stroke, in target space.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSegment {
    /// Index of the segment's first point in the recording.
    pub index: usize,
    pub start: Point,
    pub control: Point,
    pub end: Point,
    /// Pressure-weighted line width.
    pub width: f64,
}

impl StrokeSegment {
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.quad_to(self.control, self.end);
        path
    }
}

/// Build the segments for the first `revealed_count` points of `recording`
/// drawn on a surface of size `target`.
///
/// A segment touching an invalid point is skipped; the next drawable
/// segment restarts at its own first point.
pub fn midpoint_segments(
    recording: &StrokeRecording,
    revealed_count: usize,
    target: Size,
    base_line_width: f64,
) -> Vec<StrokeSegment> {
    let points = &recording.points()[..revealed_count.min(recording.len())];
    if points.len() < 2 {
        return Vec::new();
    }

    let normalizer = recording.normalizer();
    let mut segments = Vec::with_capacity(points.len() - 1);
    let mut pen: Option<Point> = None;

    for (index, pair) in points.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        if !a.is_valid() || !b.is_valid() {
            pen = None;
            continue;
        }

        let control = normalizer.project(a, target);
        let end = control.midpoint(normalizer.project(b, target));
        segments.push(StrokeSegment {
            index,
            start: pen.unwrap_or(control),
            control,
            end,
            width: normalizer.line_width(base_line_width, target, a.pressure),
        });
        pen = Some(end);
    }

    let skipped = points.len() - 1 - segments.len();
    if skipped > 0 {
        log::debug!("Skipped {} segments touching invalid points", skipped);
    }
    segments
}
