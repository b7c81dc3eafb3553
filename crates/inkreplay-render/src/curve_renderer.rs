//! Smoothed, pressure-weighted 2D recreation of a recording.

use crate::encode::encode_png;
use crate::surface::{Background, RasterSurface, RenderResult};
use inkreplay_core::{StrokeRecording, StrokeStyle, midpoint_segments};

#[cfg(feature = "cpu-raster")]
use crate::cpu::CpuSurface;
#[cfg(feature = "cpu-raster")]
use kurbo::Size;

/// Straight-alpha RGBA pixels and their dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba_data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl RasterImage {
    /// RGBA of the pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        let px = &self.rgba_data[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        encode_png(&self.rgba_data, self.width, self.height)
    }
}

/// Renders the revealed prefix of a recording as midpoint-chained curves.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveRenderer2D {
    style: StrokeStyle,
}

impl CurveRenderer2D {
    pub fn new(style: StrokeStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    /// Draw one full frame: clear `surface`, stroke the segments of the
    /// first `revealed_count` points, present.
    ///
    /// Returns the number of segments drawn.
    pub fn render<S: RasterSurface + ?Sized>(
        &self,
        surface: &mut S,
        recording: &StrokeRecording,
        revealed_count: usize,
        background: Background,
    ) -> RenderResult<usize> {
        surface.clear(background);

        let segments = midpoint_segments(
            recording,
            revealed_count,
            surface.size(),
            self.style.base_line_width,
        );
        for segment in &segments {
            surface.stroke_path(&segment.to_path(), segment.width, self.style.pen_color);
        }

        surface.present()?;
        Ok(segments.len())
    }

    /// Render the whole recording into a fresh off-screen surface of
    /// `size` pixels.
    ///
    /// The live preview and the export scale through the same normalized
    /// coordinates, so proportions match at any size.
    #[cfg(feature = "cpu-raster")]
    pub fn export(
        &self,
        recording: &StrokeRecording,
        size: Size,
        background: Background,
    ) -> RenderResult<RasterImage> {
        let result = CpuSurface::new(size).and_then(|mut surface| {
            self.render(&mut surface, recording, recording.len(), background)?;
            let image = surface.to_image();
            surface.release();
            image
        });

        match &result {
            Ok(image) => log::info!(
                "Exported recording {} at {}x{}",
                recording.id(),
                image.width,
                image.height
            ),
            Err(e) => log::error!("Failed to export recording {}: {}", recording.id(), e),
        }
        result
    }

    /// [`CurveRenderer2D::export`] encoded as PNG.
    #[cfg(feature = "cpu-raster")]
    pub fn export_png(
        &self,
        recording: &StrokeRecording,
        size: Size,
        background: Background,
    ) -> RenderResult<Vec<u8>> {
        self.export(recording, size, background)?.to_png()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};
    use inkreplay_core::RawSample;
    use kurbo::{PathEl, Point, Size};
    use peniko::Color;

    fn recording(points: &[(f64, f64)], w: f64, h: f64) -> StrokeRecording {
        let samples = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| RawSample::new(x, y, i as i64 * 16, Some(0.5)));
        StrokeRecording::from_samples(samples, w, h).unwrap()
    }

    fn zigzag(n: usize) -> StrokeRecording {
        let points: Vec<(f64, f64)> = (0..n)
            .map(|i| (10.0 + i as f64 * 7.0, if i % 2 == 0 { 20.0 } else { 60.0 }))
            .collect();
        recording(&points, 100.0, 100.0)
    }

    #[test]
    fn test_scenario_scaled_segments() {
        let rec = recording(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], 20.0, 20.0);
        let renderer = CurveRenderer2D::new(StrokeStyle::new(Color::BLACK, 2.0));
        let mut surface = RecordingSurface::new(Size::new(40.0, 40.0));

        let drawn = renderer.render(&mut surface, &rec, rec.len(), Background::white()).unwrap();
        assert_eq!(drawn, 2);

        let strokes: Vec<_> = surface.strokes().collect();
        assert_eq!(strokes.len(), 2);
        for (_, width) in &strokes {
            assert!((width - 2.0 * 2.0 * 1.5).abs() < f64::EPSILON);
        }
        assert_eq!(
            strokes[0].0.elements(),
            &[
                PathEl::MoveTo(Point::new(0.0, 0.0)),
                PathEl::QuadTo(Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            ]
        );
        assert_eq!(
            strokes[1].0.elements(),
            &[
                PathEl::MoveTo(Point::new(10.0, 0.0)),
                PathEl::QuadTo(Point::new(20.0, 0.0), Point::new(20.0, 10.0)),
            ]
        );
    }

    #[test]
    fn test_every_frame_clears_first() {
        let rec = zigzag(6);
        let renderer = CurveRenderer2D::default();
        let mut surface = RecordingSurface::new(Size::new(50.0, 50.0));

        renderer.render(&mut surface, &rec, 6, Background::white()).unwrap();
        renderer.render(&mut surface, &rec, 3, Background::Transparent).unwrap();

        assert_eq!(surface.commands()[0], DrawCommand::Clear(None));
        assert_eq!(surface.strokes().count(), 2);
        assert_eq!(surface.frames(), 2);
    }

    #[test]
    fn test_malformed_point_skips_touching_segments() {
        let rec = recording(&[(0.0, 0.0), (5.0, 5.0), (f64::NAN, 1.0), (8.0, 2.0), (9.0, 9.0)], 10.0, 10.0);
        let renderer = CurveRenderer2D::default();
        let mut surface = RecordingSurface::new(Size::new(10.0, 10.0));
        let drawn = renderer.render(&mut surface, &rec, rec.len(), Background::white()).unwrap();
        assert_eq!(drawn, 2);
    }

    #[test]
    fn test_empty_and_single_point() {
        let renderer = CurveRenderer2D::default();
        let mut surface = RecordingSurface::new(Size::new(10.0, 10.0));

        let empty = recording(&[], 10.0, 10.0);
        assert_eq!(renderer.render(&mut surface, &empty, 0, Background::white()).unwrap(), 0);
        assert_eq!(surface.strokes().count(), 0);

        let single = recording(&[(5.0, 5.0)], 10.0, 10.0);
        assert_eq!(renderer.render(&mut surface, &single, 1, Background::white()).unwrap(), 0);
        assert_eq!(surface.strokes().count(), 0);
    }

    #[test]
    #[cfg(feature = "cpu-raster")]
    fn test_export_empty_has_no_stroke_pixels() {
        let renderer = CurveRenderer2D::default();
        let empty = recording(&[], 10.0, 10.0);

        let image = renderer.export(&empty, Size::new(16.0, 16.0), Background::Transparent).unwrap();
        assert!(image.rgba_data.iter().all(|&b| b == 0));

        let image = renderer.export(&empty, Size::new(16.0, 16.0), Background::white()).unwrap();
        assert!(image.rgba_data.iter().all(|&b| b == 255));
    }

    #[test]
    #[cfg(feature = "cpu-raster")]
    fn test_export_transparent_background() {
        let renderer = CurveRenderer2D::new(StrokeStyle::new(Color::BLACK, 2.0));
        let rec = zigzag(8);
        let image = renderer.export(&rec, Size::new(64.0, 64.0), Background::Transparent).unwrap();

        assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 0]));
        assert!(image.rgba_data.chunks(4).any(|px| px[3] > 0));
    }

    #[test]
    #[cfg(feature = "cpu-raster")]
    fn test_export_is_deterministic() {
        let renderer = CurveRenderer2D::default();
        let rec = zigzag(12);
        let a = renderer.export(&rec, Size::new(80.0, 60.0), Background::white()).unwrap();
        let b = renderer.export(&rec, Size::new(80.0, 60.0), Background::white()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());
    }

    #[test]
    #[cfg(feature = "cpu-raster")]
    fn test_export_invalid_size() {
        let renderer = CurveRenderer2D::default();
        let rec = zigzag(3);
        assert!(renderer.export(&rec, Size::new(0.0, 0.0), Background::white()).is_err());
    }

    #[test]
    #[cfg(feature = "cpu-raster")]
    fn test_export_png_to_disk() {
        let renderer = CurveRenderer2D::default();
        let rec = zigzag(5);
        let png = renderer.export_png(&rec, Size::new(32.0, 32.0), Background::Transparent).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stroke.png");
        std::fs::write(&path, &png).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), png);
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let image = RasterImage {
            rgba_data: vec![1, 2, 3, 4],
            width: 1,
            height: 1,
        };
        assert_eq!(image.pixel(0, 0), Some([1, 2, 3, 4]));
        assert_eq!(image.pixel(1, 0), None);
    }
}
