//! InkReplay Render Library
//!
//! Surfaces and renderers for recorded strokes.
//! The default raster backend uses Vello CPU so frames and exports are
//! produced without a GPU.

mod curve_renderer;
mod encode;
mod preview;
mod scene;
mod surface;

#[cfg(feature = "cpu-raster")]
mod cpu;

pub use curve_renderer::{CurveRenderer2D, RasterImage};
pub use encode::encode_png;
pub use preview::CurvePreview;
pub use scene::{HeadlessMesh, HeadlessScene, MeshHandle, RibbonView, SceneBackend};
pub use surface::{Background, DrawCommand, RasterSurface, RecordingSurface, RenderError, RenderResult};

#[cfg(feature = "cpu-raster")]
pub use cpu::CpuSurface;
