//! InkReplay Core Library
//!
//! Platform-agnostic stroke recordings and the geometry derived from them:
//! coordinate normalization, progressive reveal, smoothed 2D segments and
//! the 3D ribbon centerline.

pub mod config;
pub mod curve;
pub mod normalize;
pub mod recording;
pub mod reveal;
pub mod ribbon;
pub mod style;

pub use config::{ConfigError, ReplayConfig};
pub use curve::{StrokeSegment, midpoint_segments};
pub use normalize::{CoordinateNormalizer, NormalizeError, NormalizedPoint, scaled_width, to_normalized, to_target};
pub use recording::{CaptureSession, RawSample, RecordingError, RecordingId, StrokePoint, StrokeRecording, DEFAULT_PRESSURE};
pub use reveal::{ArcLengthReveal, ArcLengthScheduler, IndexReveal, IndexScheduler, RevealPolicy, RevealScheduler, RevealState};
pub use ribbon::{RibbonGeometryBuilder3D, RibbonMesh, SampledCurve3D};
pub use style::{SerializableColor, StrokeStyle};
