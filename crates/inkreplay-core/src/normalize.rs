//! Coordinate normalization between capture space, `[0, 1]` space and any
//! target surface.
//!
//! Every consumer (live preview, export, 3D ribbon) scales through these
//! functions so they agree on relative stroke geometry regardless of their
//! own surface size.

use crate::recording::StrokePoint;
use kurbo::{Point, Size};
use thiserror::Error;

/// Normalization errors.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NormalizeError {
    #[error("Invalid capture dimension: {width}x{height}")]
    InvalidDimension { width: f64, height: f64 },
}

/// Result type for normalization.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// A point relative to the capture viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    /// Horizontal position, 0 at the left edge and 1 at the right.
    pub u: f64,
    /// Vertical position, 0 at the top edge and 1 at the bottom.
    pub v: f64,
    pub pressure: f64,
}

fn check_dimensions(width: f64, height: f64) -> NormalizeResult<()> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(NormalizeError::InvalidDimension { width, height })
    }
}

/// Divide a capture-space point by the capture dimensions.
pub fn to_normalized(
    point: &StrokePoint,
    capture_width: f64,
    capture_height: f64,
) -> NormalizeResult<NormalizedPoint> {
    check_dimensions(capture_width, capture_height)?;
    Ok(NormalizedPoint {
        u: point.x / capture_width,
        v: point.y / capture_height,
        pressure: point.pressure,
    })
}

/// Scale a normalized point out to a `target_width` x `target_height` surface.
pub fn to_target(point: NormalizedPoint, target_width: f64, target_height: f64) -> Point {
    Point::new(point.u * target_width, point.v * target_height)
}

/// Line width for a surface of size `target_dim`, given a width chosen for
/// a surface of size `reference_dim`.
pub fn scaled_width(base_width: f64, reference_dim: f64, target_dim: f64, pressure: f64) -> f64 {
    base_width * (target_dim / reference_dim) * (1.0 + pressure)
}

/// Normalizer bound to one capture viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateNormalizer {
    capture: Size,
}

impl CoordinateNormalizer {
    /// Create a normalizer for a capture viewport of the given size.
    pub fn new(capture: Size) -> NormalizeResult<Self> {
        check_dimensions(capture.width, capture.height)?;
        Ok(Self { capture })
    }

    /// Only for sizes that already went through [`CoordinateNormalizer::new`].
    pub(crate) fn from_validated(capture: Size) -> Self {
        Self { capture }
    }

    pub fn capture_size(&self) -> Size {
        self.capture
    }

    /// Capture width divided by capture height.
    pub fn aspect_ratio(&self) -> f64 {
        self.capture.width / self.capture.height
    }

    pub fn normalize(&self, point: &StrokePoint) -> NormalizedPoint {
        NormalizedPoint {
            u: point.x / self.capture.width,
            v: point.y / self.capture.height,
            pressure: point.pressure,
        }
    }

    /// Map a capture-space point onto a target surface.
    pub fn project(&self, point: &StrokePoint, target: Size) -> Point {
        to_target(self.normalize(point), target.width, target.height)
    }

    /// Pressure-weighted line width on a target surface.
    ///
    /// The capture width is the reference dimension.
    pub fn line_width(&self, base_width: f64, target: Size, pressure: f64) -> f64 {
        scaled_width(base_width, self.capture.width, target.width, pressure)
    }
}
