//! Scenes: geometry plus a camera placement, and the input they respond to.

mod camera;
mod input;
pub mod presets;

pub use camera::Camera;
pub use input::{InputSource, InputState, PointerButton};
pub use presets::{preset, PRESETS};

use crate::geom::Geometry;

/// Geometry and the camera that views it.
#[derive(Clone)]
pub struct Scene {
    pub name: String,
    pub geometry: Geometry,
    pub camera: Camera,
}

impl Scene {
    pub fn new(name: impl Into<String>, geometry: Geometry, camera: Camera) -> Self {
        Self { name: name.into(), geometry, camera }
    }
}
