//! Pull-based replay of a recording file: each frame normalizes, advances
//! the reveal and renders, for the 2D preview and the 3D ribbon.

use clap::Parser;
use inkreplay_core::{ConfigError, RecordingError, ReplayConfig, StrokeRecording};
use inkreplay_render::{Background, CpuSurface, CurvePreview, CurveRenderer2D, HeadlessScene, RenderError, RibbonView};
use kurbo::Size;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    #[error(transparent)]
    Recording(#[from] RecordingError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Replay a captured stroke and export its raster and ribbon.
#[derive(Parser, Debug)]
#[command(name = "inkreplay", author, version, about)]
pub struct ReplayArgs {
    /// Capture session JSON (`width`, `height`, `samples`)
    pub recording: PathBuf,

    /// Replay configuration JSON
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Preview and export width in pixels
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Preview and export height in pixels
    #[arg(long, default_value = "600")]
    pub height: u32,

    /// Write the exported raster to this PNG file
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Export with a transparent background
    #[arg(long)]
    pub transparent: bool,

    /// Write the ribbon mesh to this JSON file
    #[arg(long)]
    pub mesh: Option<PathBuf>,
}

/// What a replay did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub points: usize,
    pub preview_frames: usize,
    pub ribbon_frames: usize,
}

fn read(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|e| AppError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    fs::write(path, data).map_err(|e| AppError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    log::info!("Wrote {} ({} bytes)", path.display(), data.len());
    Ok(())
}

pub fn load_config(path: Option<&Path>) -> Result<ReplayConfig, AppError> {
    match path {
        Some(path) => Ok(ReplayConfig::from_json(&read(path)?)?),
        None => Ok(ReplayConfig::default()),
    }
}

pub fn run(args: &ReplayArgs) -> Result<ReplaySummary, AppError> {
    let config = load_config(args.config.as_deref())?;
    let recording = Arc::new(StrokeRecording::from_json(&read(&args.recording)?)?);
    let size = Size::new(args.width as f64, args.height as f64);
    log::info!(
        "Loaded recording {} ({} points, {} ms)",
        recording.id(),
        recording.len(),
        recording.duration_ms()
    );

    let renderer = CurveRenderer2D::new(config.stroke_style());
    let mut preview = CurvePreview::new(renderer, Background::Opaque(config.preview_background.into()));
    preview.attach(CpuSurface::new(size)?)?;
    preview.set_recording(recording.clone())?;
    let mut preview_frames = 0;
    while preview.tick()? {
        preview_frames += 1;
    }

    let mut view = RibbonView::new(
        config.ribbon_builder(),
        config.ribbon_color,
        config.arc_length_scheduler(),
    );
    view.attach(HeadlessScene::new(), size)?;
    view.set_recording(&recording)?;
    let mut ribbon_frames = 0;
    while view.tick() {
        ribbon_frames += 1;
    }

    if let Some(path) = &args.png {
        let background = if args.transparent {
            Background::Transparent
        } else {
            Background::Opaque(config.preview_background.into())
        };
        let png = renderer.export_png(&recording, size, background)?;
        write(path, &png)?;
    }

    if let Some(path) = &args.mesh {
        match view.mesh() {
            Some(mesh) => {
                let json = serde_json::to_vec_pretty(mesh)
                    .map_err(|e| AppError::Serialization(e.to_string()))?;
                write(path, &json)?;
            }
            None => log::warn!("Recording has no ribbon geometry, skipping mesh output"),
        }
    }

    preview.detach();
    view.detach();

    Ok(ReplaySummary {
        points: recording.len(),
        preview_frames,
        ribbon_frames,
    })
}
