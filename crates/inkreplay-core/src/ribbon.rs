//! 3D ribbon geometry.
//!
//! A recording is lifted into 3D (pressure becomes depth), interpolated with
//! a uniform Catmull-Rom spline, resampled densely and measured so the
//! ribbon can be revealed by length instead of by point index.

use crate::normalize::to_target;
use crate::recording::StrokeRecording;
use crate::style::SerializableColor;
use glam::Vec3;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Reference number of centerline samples per input segment.
pub const DEFAULT_RESAMPLE_MULTIPLIER: usize = 10;

/// A densely sampled centerline with its cumulative arc length.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledCurve3D {
    centerline: Vec<Vec3>,
    cumulative_length: Vec<f32>,
    total_length: f32,
}

impl SampledCurve3D {
    fn from_centerline(centerline: Vec<Vec3>) -> Self {
        let mut cumulative_length = Vec::with_capacity(centerline.len());
        let mut total = 0.0f32;
        cumulative_length.push(0.0);
        for pair in centerline.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative_length.push(total);
        }
        Self {
            centerline,
            cumulative_length,
            total_length: total,
        }
    }

    pub fn centerline(&self) -> &[Vec3] {
        &self.centerline
    }

    /// Arc length from the start to each centerline sample.
    pub fn cumulative_length(&self) -> &[f32] {
        &self.cumulative_length
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn len(&self) -> usize {
        self.centerline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centerline.is_empty()
    }
}

/// Uniform Catmull-Rom interpolation between `p1` and `p2`.
fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Vertex and index buffers for a flat ribbon, plus its reveal parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RibbonMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Arc length at each vertex; both vertices of a cross-section share it.
    pub distances: Vec<f32>,
    /// Triangle list.
    pub indices: Vec<u32>,
    pub total_length: f32,
    /// Length of the still-hidden tail.
    pub dash_offset: f32,
    pub color: SerializableColor,
}

impl RibbonMesh {
    /// Update the reveal parameter. `revealed_fraction` is clamped to `[0, 1]`.
    pub fn set_revealed_fraction(&mut self, revealed_fraction: f64) {
        self.dash_offset = revealed_fraction.clamp(0.0, 1.0) as f32 * self.total_length;
    }

    /// Length prefix the consumer should draw.
    pub fn visible_length(&self) -> f32 {
        (self.total_length - self.dash_offset).max(0.0)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Builds the 3D centerline and ribbon for a recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonGeometryBuilder3D {
    /// Centerline samples per input segment.
    pub multiplier: usize,
    /// Depth, in units of capture height, at full pressure.
    pub depth: f32,
    /// Ribbon width, in units of capture height.
    pub width: f32,
}

impl Default for RibbonGeometryBuilder3D {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_RESAMPLE_MULTIPLIER,
            depth: 0.5,
            width: 0.01,
        }
    }
}

impl RibbonGeometryBuilder3D {
    pub fn new(multiplier: usize, depth: f32, width: f32) -> Self {
        Self {
            multiplier: multiplier.max(1),
            depth,
            width,
        }
    }

    /// Lift the valid points into 3D, centered on their bounding box.
    ///
    /// The plane is one unit tall and `aspect` units wide, so shapes keep
    /// the capture proportions.
    fn control_points(&self, recording: &StrokeRecording) -> Vec<Vec3> {
        let normalizer = recording.normalizer();
        let aspect = normalizer.aspect_ratio();

        let planar: Vec<(kurbo::Point, f64)> = recording
            .valid_points()
            .map(|p| (to_target(normalizer.normalize(p), aspect, 1.0), p.pressure))
            .collect();
        let Some(&(first, _)) = planar.first() else {
            return Vec::new();
        };
        let center = planar
            .iter()
            .fold(Rect::from_points(first, first), |rect, (p, _)| rect.union_pt(*p))
            .center();

        planar
            .into_iter()
            .map(|(p, pressure)| {
                Vec3::new(
                    (p.x - center.x) as f32,
                    // Capture y grows downward, scene y grows upward.
                    (center.y - p.y) as f32,
                    pressure as f32 * self.depth,
                )
            })
            .collect()
    }

    /// Build the resampled centerline. Fewer than two valid points yield
    /// `None`.
    pub fn build(&self, recording: &StrokeRecording) -> Option<SampledCurve3D> {
        let controls = self.control_points(recording);
        if controls.len() < 2 {
            return None;
        }

        let k = self.multiplier.max(1);
        let last = controls.len() - 1;
        let mut centerline = Vec::with_capacity(last * k + 1);
        for i in 0..last {
            let p0 = controls[i.saturating_sub(1)];
            let p1 = controls[i];
            let p2 = controls[i + 1];
            let p3 = controls[(i + 2).min(last)];
            for j in 0..k {
                centerline.push(catmull_rom(p0, p1, p2, p3, j as f32 / k as f32));
            }
        }
        centerline.push(controls[last]);

        let curve = SampledCurve3D::from_centerline(centerline);
        log::debug!(
            "Built centerline for recording {}: {} samples, length {:.4}",
            recording.id(),
            curve.len(),
            curve.total_length()
        );
        Some(curve)
    }

    /// Build a flat ribbon along `curve` with the given reveal state.
    pub fn to_ribbon(
        &self,
        curve: &SampledCurve3D,
        revealed_fraction: f64,
        color: SerializableColor,
    ) -> RibbonMesh {
        let line = curve.centerline();
        let half_width = self.width * 0.5;
        let mut positions = Vec::with_capacity(line.len() * 2);
        let mut normals = Vec::with_capacity(line.len() * 2);
        let mut distances = Vec::with_capacity(line.len() * 2);
        let mut side = Vec3::Y;

        for (i, &point) in line.iter().enumerate() {
            let prev = line[i.saturating_sub(1)];
            let next = line[(i + 1).min(line.len() - 1)];
            let tangent = (next - prev).normalize_or_zero();
            // Keep the previous side vector through zero-length stretches.
            let candidate = tangent.cross(Vec3::Z).normalize_or_zero();
            if candidate != Vec3::ZERO {
                side = candidate;
            }
            let normal = side.cross(tangent).normalize_or(Vec3::Z);

            let distance = curve.cumulative_length()[i];
            for offset in [half_width, -half_width] {
                positions.push((point + side * offset).to_array());
                normals.push(normal.to_array());
                distances.push(distance);
            }
        }

        let mut indices = Vec::with_capacity(line.len().saturating_sub(1) * 6);
        for i in 0..line.len().saturating_sub(1) as u32 {
            let (a, b, c, d) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
            indices.extend_from_slice(&[a, b, c, b, d, c]);
        }

        let mut mesh = RibbonMesh {
            positions,
            normals,
            distances,
            indices,
            total_length: curve.total_length(),
            dash_offset: 0.0,
            color,
        };
        mesh.set_revealed_fraction(revealed_fraction);
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RawSample;

    fn recording(points: &[(f64, f64, f64)]) -> StrokeRecording {
        let samples = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y, p))| RawSample::new(x, y, i as i64, Some(p)));
        StrokeRecording::from_samples(samples, 100.0, 100.0).unwrap()
    }

    #[test]
    fn test_sample_count() {
        let rec = recording(&[(0.0, 0.0, 0.5), (50.0, 10.0, 0.5), (80.0, 60.0, 0.5), (20.0, 90.0, 0.5)]);
        let builder = RibbonGeometryBuilder3D::default();
        let curve = builder.build(&rec).unwrap();
        assert_eq!(curve.len(), (4 - 1) * 10 + 1);
        assert_eq!(curve.cumulative_length().len(), curve.len());

        let builder = RibbonGeometryBuilder3D::new(4, 0.5, 0.01);
        assert_eq!(builder.build(&rec).unwrap().len(), 3 * 4 + 1);
    }

    #[test]
    fn test_cumulative_length() {
        let rec = recording(&[(0.0, 0.0, 0.5), (50.0, 10.0, 0.2), (80.0, 60.0, 0.9)]);
        let curve = RibbonGeometryBuilder3D::default().build(&rec).unwrap();
        let lengths = curve.cumulative_length();
        assert_eq!(lengths[0], 0.0);
        assert!(lengths.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(*lengths.last().unwrap(), curve.total_length());
        assert!(curve.total_length() > 0.0);
    }

    #[test]
    fn test_passes_through_controls() {
        let rec = recording(&[(0.0, 0.0, 0.0), (100.0, 0.0, 0.0), (100.0, 100.0, 1.0)]);
        let curve = RibbonGeometryBuilder3D::default().build(&rec).unwrap();
        let line = curve.centerline();
        // Bounding box is [0,1]x[0,1], centered at (0.5, 0.5).
        assert!(line[0].distance(Vec3::new(-0.5, 0.5, 0.0)) < 1e-6);
        assert!(line[10].distance(Vec3::new(0.5, 0.5, 0.0)) < 1e-6);
        assert!(line[20].distance(Vec3::new(0.5, -0.5, 0.5)) < 1e-6);
    }

    #[test]
    fn test_degenerate_input() {
        let builder = RibbonGeometryBuilder3D::default();
        assert!(builder.build(&recording(&[])).is_none());
        assert!(builder.build(&recording(&[(1.0, 1.0, 0.5)])).is_none());
        assert!(builder.build(&recording(&[(1.0, 1.0, 0.5), (f64::NAN, 2.0, 0.5)])).is_none());
    }

    #[test]
    fn test_invalid_points_skipped() {
        let rec = recording(&[(0.0, 0.0, 0.5), (f64::NAN, 0.0, 0.5), (10.0, 0.0, 0.5)]);
        let curve = RibbonGeometryBuilder3D::default().build(&rec).unwrap();
        assert_eq!(curve.len(), 11);
    }

    #[test]
    fn test_ribbon_mesh() {
        let rec = recording(&[(0.0, 0.0, 0.5), (50.0, 10.0, 0.5), (80.0, 60.0, 0.5)]);
        let builder = RibbonGeometryBuilder3D::default();
        let curve = builder.build(&rec).unwrap();
        let mesh = builder.to_ribbon(&curve, 1.0, SerializableColor::black());

        assert_eq!(mesh.vertex_count(), curve.len() * 2);
        assert_eq!(mesh.triangle_count(), (curve.len() - 1) * 2);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        assert_eq!(mesh.distances.last().copied(), Some(curve.total_length()));
        assert!((mesh.dash_offset - curve.total_length()).abs() < 1e-6);
        assert_eq!(mesh.visible_length(), 0.0);
    }

    #[test]
    fn test_ribbon_width() {
        let rec = recording(&[(0.0, 50.0, 0.5), (100.0, 50.0, 0.5)]);
        let builder = RibbonGeometryBuilder3D::new(10, 0.5, 0.2);
        let curve = builder.build(&rec).unwrap();
        let mesh = builder.to_ribbon(&curve, 0.0, SerializableColor::black());
        let left = Vec3::from_array(mesh.positions[0]);
        let right = Vec3::from_array(mesh.positions[1]);
        assert!((left.distance(right) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_reveal_parameter() {
        let rec = recording(&[(0.0, 0.0, 0.5), (100.0, 0.0, 0.5)]);
        let builder = RibbonGeometryBuilder3D::default();
        let curve = builder.build(&rec).unwrap();
        let mut mesh = builder.to_ribbon(&curve, 1.0, SerializableColor::black());

        mesh.set_revealed_fraction(0.25);
        assert!((mesh.dash_offset - 0.25 * mesh.total_length).abs() < 1e-6);
        assert!((mesh.visible_length() - 0.75 * mesh.total_length).abs() < 1e-6);

        mesh.set_revealed_fraction(0.0);
        assert!((mesh.visible_length() - mesh.total_length).abs() < 1e-6);
    }
}
