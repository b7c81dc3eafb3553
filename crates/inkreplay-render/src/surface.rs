//! Raster surface abstraction.

use inkreplay_core::SerializableColor;
use kurbo::{BezPath, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Surface unavailable")]
    SurfaceUnavailable,
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Invalid surface size: {width}x{height}")]
    InvalidDimension { width: f64, height: f64 },
    #[error("Not attached to a display surface")]
    Detached,
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// How a surface is cleared before each frame.
#[derive(Debug, Clone, Copy)]
pub enum Background {
    /// Fill with a color (live preview uses opaque white).
    Opaque(Color),
    /// Clear to fully transparent (export variant).
    Transparent,
}

impl Background {
    pub fn white() -> Self {
        Background::Opaque(Color::WHITE)
    }

    /// Fill color, `None` when transparent.
    pub fn color(&self) -> Option<Color> {
        match *self {
            Background::Opaque(color) => Some(color),
            Background::Transparent => None,
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::white()
    }
}

/// A 2D destination for stroke frames.
///
/// A frame is `clear`, any number of `stroke_path` calls, then `present`.
pub trait RasterSurface {
    /// Current size in pixels.
    fn size(&self) -> Size;

    /// Drop everything drawn so far and fill with `background`.
    fn clear(&mut self, background: Background);

    /// Stroke `path` with round caps and joins.
    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Color);

    /// Finish the frame.
    fn present(&mut self) -> RenderResult<()>;

    /// Release backing resources and reacquire them at `size`.
    fn resize(&mut self, size: Size) -> RenderResult<()>;

    /// Release backing resources. Later draws are dropped until `resize`.
    fn release(&mut self);
}

/// Validate a surface size and convert it to whole pixels.
pub(crate) fn pixel_size(size: Size) -> RenderResult<(u16, u16)> {
    let valid = |v: f64| v.is_finite() && v >= 1.0 && v <= u16::MAX as f64;
    if !valid(size.width) || !valid(size.height) {
        return Err(RenderError::InvalidDimension {
            width: size.width,
            height: size.height,
        });
    }
    Ok((size.width.round() as u16, size.height.round() as u16))
}

/// A draw call captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Clear, with the fill color or `None` for transparent.
    Clear(Option<SerializableColor>),
    Stroke {
        path: BezPath,
        width: f64,
        color: SerializableColor,
    },
}

/// Surface that keeps the draw calls of the current frame instead of
/// rasterizing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
    frames: usize,
    released: bool,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Draw calls since the last clear, including the clear itself.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Stroke calls of the current frame.
    pub fn strokes(&self) -> impl Iterator<Item = (&BezPath, f64)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Stroke { path, width, .. } => Some((path, *width)),
            DrawCommand::Clear(_) => None,
        })
    }

    /// Number of presented frames.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl RasterSurface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, background: Background) {
        self.commands.clear();
        self.commands
            .push(DrawCommand::Clear(background.color().map(SerializableColor::from)));
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Color) {
        if self.released {
            return;
        }
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            width,
            color: color.into(),
        });
    }

    fn present(&mut self) -> RenderResult<()> {
        if self.released {
            return Err(RenderError::SurfaceUnavailable);
        }
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, size: Size) -> RenderResult<()> {
        pixel_size(size)?;
        self.release();
        self.size = size;
        self.released = false;
        Ok(())
    }

    fn release(&mut self) {
        self.commands.clear();
        self.released = true;
    }
}
