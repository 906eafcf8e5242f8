//! GPU upload, kernel ABI and the compute/display handshake.
//!
//! ## Architecture
//! ```text
//! Bvh + Geometry → GpuScene (Pod arrays) → ComputeBackend::upload_scene → device buffers
//!                                                   │
//! Camera → CameraUniform → write_camera ────────────┤
//!                                                   ▼
//!            acquire → dispatch(KernelArgs, DispatchGrid) → finish → release
//!                                                   │
//!                              DisplayBackend::draw_fullscreen_quad → present_frame
//! ```

mod backend;
mod dispatch;
mod kernel;
mod layout;
mod scene_data;
mod shared_image;
mod vector;
#[cfg(feature = "gpu")]
mod wgpu_backend;

pub use backend::{
    Backend, ComputeBackend, ComputeLease, DisplayBackend, ProgramHandle, ProgramService, SceneBuffers,
    UniformValue,
};
pub use dispatch::{div_up, DispatchGrid, WORKGROUP_SIZE};
pub use kernel::{ArgKind, ArgValue, BufferHandle, ImageHandle, KernelArg, KernelArgs, KERNEL_ENTRY};
pub use layout::{CameraUniform, FrameParams, GpuBvhNode, GpuPrimitive, FRAME_FLAG_NORMALS, MAX_LEAF_PRIMITIVES};
pub use scene_data::GpuScene;
pub use shared_image::{ImageOwner, SharedImage};
pub use vector::{GpuVector, UploadPlan, MIN_CAPACITY};
#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuBackend;

/// Built-in trace kernel.
pub const TRACE_WGSL: &str = include_str!("shaders/trace.wgsl");
/// Built-in full-screen quad program (vertex `vs_main`, fragment `fs_main`).
pub const QUAD_WGSL: &str = include_str!("shaders/quad.wgsl");
