//! Stroke recordings produced by a capture session.
//!
//! A recording flattens every pen-down/pen-up of a session into one ordered
//! point sequence. Segments that cross a pen lift are bridged when rendered.

use crate::normalize::{CoordinateNormalizer, NormalizeError};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a recording.
pub type RecordingId = Uuid;

/// Pressure used when a sample carries none.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Recording errors.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error(transparent)]
    InvalidDimension(#[from] NormalizeError),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for recording operations.
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Accept any JSON value and keep it only if it is a number.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

/// A sample as delivered by the capture surface.
///
/// Fields are optional because capture hardware is not trusted: any field
/// that is missing or not a number deserializes to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub y: Option<f64>,
    /// Monotonic milliseconds.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pressure: Option<f64>,
}

impl RawSample {
    pub fn new(x: f64, y: f64, timestamp: i64, pressure: Option<f64>) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            timestamp: Some(timestamp as f64),
            pressure,
        }
    }
}

/// A validated sample.
///
/// Validity is decided once at ingestion. Invalid points keep their slot in
/// the sequence so the 2D renderer can skip exactly the segments touching
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Monotonic milliseconds.
    pub timestamp: i64,
    /// Pressure in `[0, 1]`.
    pub pressure: f64,
    valid: bool,
}

impl StrokePoint {
    /// Create a point, tagging it invalid if either coordinate is not finite.
    pub fn new(x: f64, y: f64, timestamp: i64, pressure: f64) -> Self {
        let pressure = if pressure.is_finite() {
            pressure.clamp(0.0, 1.0)
        } else {
            DEFAULT_PRESSURE
        };
        Self {
            x,
            y,
            timestamp,
            pressure,
            valid: x.is_finite() && y.is_finite(),
        }
    }

    /// Whether both coordinates are finite.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Position in capture space.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Payload handed over by the capture surface at session end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureSession {
    /// Capture viewport width, in the samples' coordinate space.
    pub width: f64,
    /// Capture viewport height, in the samples' coordinate space.
    pub height: f64,
    #[serde(default)]
    pub samples: Vec<RawSample>,
}

/// The immutable result of one capture session.
#[derive(Debug, Clone)]
pub struct StrokeRecording {
    id: RecordingId,
    points: Vec<StrokePoint>,
    capture_size: Size,
}

impl StrokeRecording {
    /// Ingest raw samples captured on a `width` x `height` viewport.
    ///
    /// Samples without a numeric timestamp are dropped. The remaining points
    /// are ordered by timestamp; ties keep capture order.
    pub fn from_samples<I>(samples: I, width: f64, height: f64) -> RecordingResult<Self>
    where
        I: IntoIterator<Item = RawSample>,
    {
        let normalizer = CoordinateNormalizer::new(Size::new(width, height))?;

        let mut dropped = 0usize;
        let mut points: Vec<StrokePoint> = samples
            .into_iter()
            .filter_map(|sample| {
                let Some(timestamp) = sample.timestamp.filter(|t| t.is_finite()) else {
                    dropped += 1;
                    return None;
                };
                Some(StrokePoint::new(
                    sample.x.unwrap_or(f64::NAN),
                    sample.y.unwrap_or(f64::NAN),
                    timestamp as i64,
                    sample.pressure.unwrap_or(DEFAULT_PRESSURE),
                ))
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);

        if dropped > 0 {
            log::warn!("Dropped {} samples without a numeric timestamp", dropped);
        }
        let invalid = points.iter().filter(|p| !p.is_valid()).count();
        if invalid > 0 {
            log::warn!("{} samples have non-finite coordinates and will be skipped", invalid);
        }

        let recording = Self {
            id: Uuid::new_v4(),
            points,
            capture_size: normalizer.capture_size(),
        };
        log::debug!(
            "Created recording {} with {} points ({}x{})",
            recording.id,
            recording.len(),
            width,
            height
        );
        Ok(recording)
    }

    /// Ingest a capture session payload.
    pub fn from_session(session: CaptureSession) -> RecordingResult<Self> {
        Self::from_samples(session.samples, session.width, session.height)
    }

    /// Parse a capture session from JSON.
    pub fn from_json(json: &str) -> RecordingResult<Self> {
        let session: CaptureSession =
            serde_json::from_str(json).map_err(|e| RecordingError::Parse(e.to_string()))?;
        Self::from_session(session)
    }

    pub fn id(&self) -> RecordingId {
        self.id
    }

    /// All points, including invalid ones, in timestamp order.
    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    /// Points with finite coordinates.
    pub fn valid_points(&self) -> impl Iterator<Item = &StrokePoint> + '_ {
        self.points.iter().filter(|p| p.is_valid())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capture_size(&self) -> Size {
        self.capture_size
    }

    /// Normalizer bound to this recording's capture size.
    pub fn normalizer(&self) -> CoordinateNormalizer {
        CoordinateNormalizer::from_validated(self.capture_size)
    }

    /// Bounding box of the valid points in capture space.
    pub fn bounds(&self) -> Option<Rect> {
        let mut points = self.valid_points();
        let first = points.next()?.position();
        Some(points.fold(Rect::from_points(first, first), |rect, p| {
            rect.union_pt(p.position())
        }))
    }

    /// Time between the first and last sample, in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0,
        }
    }
}
