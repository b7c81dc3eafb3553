//! 3D ribbon view bound to one scene backend.

use crate::surface::{RenderError, RenderResult};
use inkreplay_core::{
    ArcLengthScheduler, RecordingId, RibbonGeometryBuilder3D, RibbonMesh, SampledCurve3D,
    SerializableColor, StrokeRecording,
};
use kurbo::Size;
use std::collections::HashMap;

/// Opaque handle to a mesh uploaded to a [`SceneBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// The 3D scene consumer: scene graph, camera, lights and GPU buffers live
/// behind this trait.
pub trait SceneBackend {
    /// Create the scene for a viewport of `viewport` pixels.
    fn acquire(&mut self, viewport: Size) -> RenderResult<()>;

    /// Upload a ribbon and add it to the scene.
    fn upload_mesh(&mut self, mesh: &RibbonMesh) -> RenderResult<MeshHandle>;

    /// Per-frame reveal update for an uploaded ribbon.
    fn set_reveal(&mut self, handle: MeshHandle, dash_offset: f32, visible_length: f32);

    /// Remove a ribbon and free its buffers and material.
    fn release_mesh(&mut self, handle: MeshHandle);

    /// Tear down the scene. Every mesh must already be released.
    fn release(&mut self);
}

/// A ribbon as seen by [`HeadlessScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMesh {
    pub mesh: RibbonMesh,
    pub reveal_updates: usize,
}

/// In-memory scene backend that keeps uploaded meshes and their reveal
/// state. Used when no GPU scene is available.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    viewport: Option<Size>,
    meshes: HashMap<MeshHandle, HeadlessMesh>,
    next_handle: u64,
    acquisitions: usize,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_acquired(&self) -> bool {
        self.viewport.is_some()
    }

    pub fn viewport(&self) -> Option<Size> {
        self.viewport
    }

    /// Meshes currently held by the scene.
    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&HeadlessMesh> {
        self.meshes.get(&handle)
    }

    /// How many times the scene has been created.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }
}

impl SceneBackend for HeadlessScene {
    fn acquire(&mut self, viewport: Size) -> RenderResult<()> {
        if !(viewport.width > 0.0 && viewport.height > 0.0) {
            return Err(RenderError::InvalidDimension {
                width: viewport.width,
                height: viewport.height,
            });
        }
        self.viewport = Some(viewport);
        self.acquisitions += 1;
        Ok(())
    }

    fn upload_mesh(&mut self, mesh: &RibbonMesh) -> RenderResult<MeshHandle> {
        if self.viewport.is_none() {
            return Err(RenderError::SurfaceUnavailable);
        }
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;
        self.meshes.insert(
            handle,
            HeadlessMesh {
                mesh: mesh.clone(),
                reveal_updates: 0,
            },
        );
        Ok(handle)
    }

    fn set_reveal(&mut self, handle: MeshHandle, dash_offset: f32, _visible_length: f32) {
        if let Some(entry) = self.meshes.get_mut(&handle) {
            entry.mesh.dash_offset = dash_offset;
            entry.reveal_updates += 1;
        }
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        self.meshes.remove(&handle);
    }

    fn release(&mut self) {
        if !self.meshes.is_empty() {
            log::warn!("Scene released with {} live meshes", self.meshes.len());
            self.meshes.clear();
        }
        self.viewport = None;
    }
}

/// Resources bound to one attached scene.
struct Attached<B> {
    backend: B,
    viewport: Size,
    mesh: Option<MeshHandle>,
}

/// Owns a scene backend, the ribbon for the current recording and the
/// arc-length reveal that draws it in.
///
/// `attach` acquires the backend; `detach` (or drop) releases the ribbon
/// and then the scene.
pub struct RibbonView<B: SceneBackend> {
    attached: Option<Attached<B>>,
    builder: RibbonGeometryBuilder3D,
    color: SerializableColor,
    scheduler: ArcLengthScheduler,
    recording: Option<RecordingId>,
    curve: Option<SampledCurve3D>,
    mesh: Option<RibbonMesh>,
}

impl<B: SceneBackend> RibbonView<B> {
    pub fn new(builder: RibbonGeometryBuilder3D, color: SerializableColor, scheduler: ArcLengthScheduler) -> Self {
        Self {
            attached: None,
            builder,
            color,
            scheduler,
            recording: None,
            curve: None,
            mesh: None,
        }
    }

    /// Acquire `backend` for a `viewport`-sized display.
    ///
    /// A previously attached backend is detached first.
    pub fn attach(&mut self, mut backend: B, viewport: Size) -> RenderResult<()> {
        self.detach();
        backend.acquire(viewport)?;
        self.attached = Some(Attached {
            backend,
            viewport,
            mesh: None,
        });
        Ok(())
    }

    /// Reset the reveal, release the ribbon and the scene, and hand the
    /// backend back.
    ///
    /// The view forgets its recording, so the next `set_recording` rebuilds
    /// the ribbon and replays it from the start.
    pub fn detach(&mut self) -> Option<B> {
        self.scheduler.reset();
        self.recording = None;
        self.curve = None;
        self.mesh = None;
        let mut attached = self.attached.take()?;
        if let Some(handle) = attached.mesh.take() {
            attached.backend.release_mesh(handle);
        }
        attached.backend.release();
        log::debug!("Detached ribbon view");
        Some(attached.backend)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Replace the recording: reset the reveal, drop the old ribbon, build
    /// the new one fully hidden and start drawing it in.
    ///
    /// Recordings with fewer than two valid points produce no ribbon. If the
    /// upload fails the view holds no recording, so the same one can be
    /// set again.
    pub fn set_recording(&mut self, recording: &StrokeRecording) -> RenderResult<()> {
        if self.recording == Some(recording.id()) {
            return Ok(());
        }
        let attached = self.attached.as_mut().ok_or(RenderError::Detached)?;

        self.scheduler.reset();
        if let Some(handle) = attached.mesh.take() {
            attached.backend.release_mesh(handle);
        }
        self.recording = None;
        self.mesh = None;
        self.curve = None;

        let Some(curve) = self.builder.build(recording) else {
            log::debug!("Recording {} has no ribbon geometry", recording.id());
            self.recording = Some(recording.id());
            return Ok(());
        };
        let mesh = self.builder.to_ribbon(&curve, 1.0, self.color);
        let handle = attached.backend.upload_mesh(&mesh).map_err(|e| {
            log::error!("Failed to upload ribbon for recording {}: {}", recording.id(), e);
            e
        })?;
        attached.mesh = Some(handle);
        log::debug!(
            "Uploaded ribbon for recording {}: {} vertices",
            recording.id(),
            mesh.vertex_count()
        );

        self.recording = Some(recording.id());
        self.curve = Some(curve);
        self.mesh = Some(mesh);
        self.scheduler.start(recording);
        Ok(())
    }

    /// Advance the reveal by one frame and push the new reveal parameter.
    ///
    /// Returns `false` once the ribbon is fully drawn or there is none.
    pub fn tick(&mut self) -> bool {
        let (Some(attached), Some(mesh)) = (self.attached.as_mut(), self.mesh.as_mut()) else {
            return false;
        };
        if !self.scheduler.advance() {
            return false;
        }
        if let Some(fraction) = self.scheduler.state().revealed_fraction() {
            mesh.set_revealed_fraction(fraction);
        }
        if let Some(handle) = attached.mesh {
            attached.backend.set_reveal(handle, mesh.dash_offset, mesh.visible_length());
        }
        true
    }

    /// Tear the scene down and rebuild it at `viewport`, keeping the ribbon
    /// and its reveal state.
    ///
    /// On failure the view stays attached with the backend released; a later
    /// `resize` or `detach` still works.
    pub fn resize(&mut self, viewport: Size) -> RenderResult<()> {
        let attached = self.attached.as_mut().ok_or(RenderError::Detached)?;
        if let Some(handle) = attached.mesh.take() {
            attached.backend.release_mesh(handle);
        }
        attached.backend.release();

        if let Err(e) = attached.backend.acquire(viewport) {
            log::error!("Failed to reacquire scene at {}x{}: {}", viewport.width, viewport.height, e);
            return Err(e);
        }
        attached.viewport = viewport;
        if let Some(mesh) = &self.mesh {
            let handle = match attached.backend.upload_mesh(mesh) {
                Ok(handle) => handle,
                Err(e) => {
                    log::error!("Failed to reupload ribbon: {}", e);
                    attached.backend.release();
                    return Err(e);
                }
            };
            attached.backend.set_reveal(handle, mesh.dash_offset, mesh.visible_length());
            attached.mesh = Some(handle);
        }
        Ok(())
    }

    /// Current hidden fraction of the ribbon.
    pub fn revealed_fraction(&self) -> f64 {
        self.scheduler.state().revealed_fraction().unwrap_or(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.mesh.is_none() || self.scheduler.is_complete()
    }

    pub fn curve(&self) -> Option<&SampledCurve3D> {
        self.curve.as_ref()
    }

    pub fn mesh(&self) -> Option<&RibbonMesh> {
        self.mesh.as_ref()
    }

    pub fn backend(&self) -> Option<&B> {
        self.attached.as_ref().map(|attached| &attached.backend)
    }

    pub fn viewport(&self) -> Option<Size> {
        self.attached.as_ref().map(|attached| attached.viewport)
    }

    pub fn mesh_handle(&self) -> Option<MeshHandle> {
        self.attached.as_ref().and_then(|attached| attached.mesh)
    }
}

impl<B: SceneBackend> Drop for RibbonView<B> {
    fn drop(&mut self) {
        self.detach();
    }
}
