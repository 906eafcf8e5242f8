//! Collaborator traits for compute, display and shader programs.
//!
//! The renderer only talks to these traits. [`WgpuBackend`](super::WgpuBackend)
//! is the shipped implementation; tests drive the frame loop with a recording one.

use crate::util::Result;

use super::dispatch::DispatchGrid;
use super::kernel::{BufferHandle, ImageHandle, KernelArgs};
use super::layout::CameraUniform;
use super::scene_data::GpuScene;

/// Device buffers holding an uploaded scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneBuffers {
    pub nodes: BufferHandle,
    pub primitives: BufferHandle,
}

/// Compute side: kernel, scene buffers and the compute half of the shared image.
pub trait ComputeBackend {
    /// Compile the kernel. Failures carry the build log.
    fn build_kernel(&mut self, source: &str, entry: &str) -> Result<()>;
    /// Upload (or re-upload) flattened scene data.
    fn upload_scene(&mut self, scene: &GpuScene) -> Result<SceneBuffers>;
    fn write_camera(&mut self, camera: &CameraUniform) -> Result<()>;
    /// Buffer the camera mirror lives in.
    fn camera_buffer(&self) -> Result<BufferHandle>;
    /// Current shared output image.
    fn shared_image(&self) -> Result<ImageHandle>;
    fn acquire_shared_image(&mut self) -> Result<()>;
    fn dispatch(&mut self, args: &KernelArgs, grid: &DispatchGrid) -> Result<()>;
    /// Block until submitted compute work completes.
    fn finish(&mut self) -> Result<()>;
    fn release_shared_image(&mut self) -> Result<()>;
}

/// Display side: window surface, quad draw, present.
pub trait DisplayBackend {
    fn create_window(&mut self, width: u32, height: u32) -> Result<()>;
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
    fn draw_fullscreen_quad(&mut self, program: ProgramHandle) -> Result<()>;
    fn present_frame(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
}

/// Display shader programs.
pub trait ProgramService {
    fn load_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramHandle>;
    fn use_program(&mut self, program: ProgramHandle) -> Result<()>;
    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) -> Result<()>;
}

/// Everything [`Renderer`](crate::render::Renderer) needs from a device.
pub trait Backend: ComputeBackend + DisplayBackend + ProgramService {}

impl<T: ComputeBackend + DisplayBackend + ProgramService> Backend for T {}

/// Compute ownership of the shared image.
///
/// Dispatch goes through the lease. Dropping it without [`release`] still
/// hands the image back to display; errors from that path are logged.
///
/// [`release`]: ComputeLease::release
pub struct ComputeLease<'a, B: ComputeBackend + ?Sized> {
    backend: &'a mut B,
    held: bool,
}

impl<'a, B: ComputeBackend + ?Sized> ComputeLease<'a, B> {
    pub fn acquire(backend: &'a mut B) -> Result<Self> {
        backend.acquire_shared_image()?;
        Ok(Self { backend, held: true })
    }

    pub fn dispatch(&mut self, args: &KernelArgs, grid: &DispatchGrid) -> Result<()> {
        self.backend.dispatch(args, grid)
    }

    pub fn finish(&mut self) -> Result<()> {
        self.backend.finish()
    }

    /// Hand the image back to display.
    pub fn release(mut self) -> Result<()> {
        self.held = false;
        self.backend.release_shared_image()
    }
}

impl<B: ComputeBackend + ?Sized> Drop for ComputeLease<'_, B> {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = self.backend.release_shared_image() {
                log::warn!("Failed to release shared image: {e}");
            }
        }
    }
}
