//! # Star
//!
//! Real-time BVH ray tracer. Scenes are flattened into a linear BVH, uploaded
//! to the GPU and traced by a compute kernel that writes into an image shared
//! with the display path. A CPU renderer traces the same scenes for reference.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math helpers
//! - [`geom`] - Rays, bounds, triangles, spheres and the primitive set
//! - [`accel`] - BVH construction, flattening and CPU traversal
//! - [`gpu`] - GPU layouts, kernel arguments and the compute/display backends
//! - [`scene`] - Camera, input and built-in scenes
//! - [`render`] - Frame loop, shading and the CPU renderer
//! - [`config`] - Render settings
//!
//! ## Example
//!
//! ```ignore
//! use star::prelude::*;
//!
//! let scene = star::scene::preset("cornell", 640, 480)?;
//! let bvh = build_bvh(&scene.geometry, BuildOptions::default());
//! let image = star::render::cpu::render(&scene.geometry, &bvh, &scene.camera, &CpuOptions::default());
//! ```

pub mod util;
pub mod geom;
pub mod accel;
pub mod gpu;
pub mod scene;
pub mod render;
pub mod config;

pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::accel::{build_bvh, BuildOptions, Bvh, SplitMethod};
    pub use crate::config::RenderConfig;
    pub use crate::geom::{Geometry, Intersection, Ray, TriangleMesh};
    pub use crate::gpu::{Backend, ComputeBackend, DisplayBackend, ProgramService};
    pub use crate::render::{CpuOptions, Framebuffer, Renderer, ShadingMode};
    pub use crate::scene::{Camera, InputState, Scene};
    pub use crate::util::{Error, Result};
}
