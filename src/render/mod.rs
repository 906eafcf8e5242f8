//! Rendering: the GPU frame loop and the CPU reference path.

pub mod cpu;
mod framebuffer;
mod renderer;
mod shading;

pub use cpu::CpuOptions;
#[cfg(feature = "image")]
pub use framebuffer::save_rgba8_png;
pub use framebuffer::Framebuffer;
pub use renderer::Renderer;
pub use shading::{shade, ShadingMode, ALBEDO, AMBIENT, BACKGROUND, LIGHT_DIR};
