//! Vello CPU raster surface.

use crate::curve_renderer::RasterImage;
use crate::surface::{Background, RasterSurface, RenderError, RenderResult, pixel_size};
use kurbo::{BezPath, PathEl, Size};
use peniko::Color;
use vello_cpu::color::{AlphaColor, Srgb};
use vello_cpu::kurbo::{self as cpu_kurbo, Cap, Join};
use vello_cpu::{Pixmap, RenderContext};

/// Resources held while the surface is live.
struct CpuTarget {
    ctx: RenderContext,
    pixmap: Pixmap,
    width: u16,
    height: u16,
}

impl CpuTarget {
    fn new(size: Size) -> RenderResult<Self> {
        let (width, height) = pixel_size(size)?;
        Ok(Self {
            ctx: RenderContext::new(width, height),
            pixmap: Pixmap::new(width, height),
            width,
            height,
        })
    }
}

fn to_cpu_color(color: Color) -> AlphaColor<Srgb> {
    let rgba = color.to_rgba8();
    AlphaColor::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

fn to_cpu_point(p: kurbo::Point) -> cpu_kurbo::Point {
    cpu_kurbo::Point::new(p.x, p.y)
}

fn to_cpu_path(path: &BezPath) -> cpu_kurbo::BezPath {
    let mut out = cpu_kurbo::BezPath::new();
    for element in path.elements() {
        match *element {
            PathEl::MoveTo(p) => out.move_to(to_cpu_point(p)),
            PathEl::LineTo(p) => out.line_to(to_cpu_point(p)),
            PathEl::QuadTo(c, p) => out.quad_to(to_cpu_point(c), to_cpu_point(p)),
            PathEl::CurveTo(c1, c2, p) => {
                out.curve_to(to_cpu_point(c1), to_cpu_point(c2), to_cpu_point(p))
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Off-screen raster surface backed by Vello CPU.
///
/// Owns its render context and pixmap. `release` drops both; `resize`
/// releases before allocating at the new size.
pub struct CpuSurface {
    target: Option<CpuTarget>,
    size: Size,
}

impl CpuSurface {
    /// Allocate a surface of `size` pixels.
    pub fn new(size: Size) -> RenderResult<Self> {
        let target = CpuTarget::new(size)?;
        log::debug!("Allocated CPU surface {}x{}", target.width, target.height);
        Ok(Self {
            target: Some(target),
            size,
        })
    }

    pub fn is_released(&self) -> bool {
        self.target.is_none()
    }

    /// Copy out the last presented frame as straight-alpha RGBA8.
    pub fn to_image(&self) -> RenderResult<RasterImage> {
        let target = self.target.as_ref().ok_or(RenderError::SurfaceUnavailable)?;
        let mut rgba_data = Vec::with_capacity(target.pixmap.data().len() * 4);
        for pixel in target.pixmap.data() {
            let a = pixel.a as u32;
            let unpremultiply = |c: u8| {
                if a == 0 {
                    0
                } else {
                    ((c as u32 * 255 + a / 2) / a).min(255) as u8
                }
            };
            rgba_data.extend_from_slice(&[
                unpremultiply(pixel.r),
                unpremultiply(pixel.g),
                unpremultiply(pixel.b),
                pixel.a,
            ]);
        }
        Ok(RasterImage {
            rgba_data,
            width: target.width as u32,
            height: target.height as u32,
        })
    }
}

impl RasterSurface for CpuSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, background: Background) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        target.ctx = RenderContext::new(target.width, target.height);
        if let Background::Opaque(color) = background {
            target.ctx.set_paint(to_cpu_color(color));
            target.ctx.fill_rect(&cpu_kurbo::Rect::new(
                0.0,
                0.0,
                target.width as f64,
                target.height as f64,
            ));
        }
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Color) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        target.ctx.set_paint(to_cpu_color(color));
        target.ctx.set_stroke(
            cpu_kurbo::Stroke::new(width)
                .with_caps(Cap::Round)
                .with_join(Join::Round),
        );
        target.ctx.stroke_path(&to_cpu_path(path));
    }

    fn present(&mut self) -> RenderResult<()> {
        let target = self.target.as_mut().ok_or(RenderError::SurfaceUnavailable)?;
        target.ctx.flush();
        target.pixmap = Pixmap::new(target.width, target.height);
        target.ctx.render_to_pixmap(&mut target.pixmap);
        Ok(())
    }

    fn resize(&mut self, size: Size) -> RenderResult<()> {
        pixel_size(size)?;
        self.release();
        let target = CpuTarget::new(size)?;
        log::debug!("Reallocated CPU surface {}x{}", target.width, target.height);
        self.target = Some(target);
        self.size = size;
        Ok(())
    }

    fn release(&mut self) {
        if self.target.take().is_some() {
            log::debug!("Released CPU surface {}x{}", self.size.width, self.size.height);
        }
    }
}
