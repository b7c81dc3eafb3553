//! Live 2D preview bound to one display surface.

use crate::curve_renderer::CurveRenderer2D;
use crate::surface::{Background, RasterSurface, RenderError, RenderResult};
use inkreplay_core::{IndexScheduler, StrokeRecording};
use kurbo::Size;
use std::sync::Arc;

/// Owns a raster surface and the index reveal that drives it.
///
/// The host pulls frames: one [`CurvePreview::tick`] per display frame
/// advances the reveal and redraws.
pub struct CurvePreview<S: RasterSurface> {
    surface: Option<S>,
    renderer: CurveRenderer2D,
    background: Background,
    scheduler: IndexScheduler,
    recording: Option<Arc<StrokeRecording>>,
}

impl<S: RasterSurface> CurvePreview<S> {
    pub fn new(renderer: CurveRenderer2D, background: Background) -> Self {
        Self {
            surface: None,
            renderer,
            background,
            scheduler: IndexScheduler::default(),
            recording: None,
        }
    }

    /// Take ownership of `surface` and draw the current state into it.
    ///
    /// A previously attached surface is released first.
    pub fn attach(&mut self, surface: S) -> RenderResult<()> {
        if let Some(mut old) = self.surface.take() {
            old.release();
        }
        self.surface = Some(surface);
        self.redraw()
    }

    /// Cancel the reveal, release the surface and hand it back.
    pub fn detach(&mut self) -> Option<S> {
        self.scheduler.cancel();
        let mut surface = self.surface.take()?;
        surface.release();
        Some(surface)
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Replace the recording and restart the reveal from zero.
    pub fn set_recording(&mut self, recording: Arc<StrokeRecording>) -> RenderResult<()> {
        self.scheduler.cancel();
        self.scheduler.start(&recording);
        self.recording = Some(recording);
        self.redraw()
    }

    /// Advance the reveal by one frame and redraw.
    ///
    /// Returns `false` once there is nothing left to reveal.
    pub fn tick(&mut self) -> RenderResult<bool> {
        if self.surface.is_none() {
            return Err(RenderError::Detached);
        }
        if !self.scheduler.advance() {
            return Ok(false);
        }
        self.redraw()?;
        Ok(true)
    }

    /// Recreate the surface at `size` and redraw the current state.
    pub fn resize(&mut self, size: Size) -> RenderResult<()> {
        let surface = self.surface.as_mut().ok_or(RenderError::Detached)?;
        surface.resize(size)?;
        self.redraw()
    }

    /// Number of points currently revealed.
    pub fn revealed_count(&self) -> usize {
        self.scheduler.state().revealed_count().unwrap_or(0)
    }

    pub fn is_complete(&self) -> bool {
        self.scheduler.is_complete()
    }

    pub fn is_animating(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn recording(&self) -> Option<&Arc<StrokeRecording>> {
        self.recording.as_ref()
    }

    fn redraw(&mut self) -> RenderResult<()> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        match &self.recording {
            Some(recording) => {
                let revealed = self.scheduler.state().revealed_count().unwrap_or(0);
                self.renderer.render(surface, recording, revealed, self.background)?;
            }
            None => {
                surface.clear(self.background);
                surface.present()?;
            }
        }
        Ok(())
    }
}

impl<S: RasterSurface> Drop for CurvePreview<S> {
    fn drop(&mut self) {
        self.detach();
    }
}
