//! CPU reference renderer: one primary ray per pixel through the BVH.

use rayon::prelude::*;

use crate::accel::Bvh;
use crate::geom::Geometry;
use crate::scene::Camera;
use crate::util::Vec3;

use super::framebuffer::Framebuffer;
use super::shading::{shade, ShadingMode};

#[derive(Debug, Clone, Copy, Default)]
pub struct CpuOptions {
    pub shading: ShadingMode,
}

/// Render the camera's full viewport. Rows are traced in parallel.
#[tracing::instrument(skip_all, fields(width = camera.size().0, height = camera.size().1))]
pub fn render(geometry: &Geometry, bvh: &Bvh, camera: &Camera, options: &CpuOptions) -> Framebuffer {
    let (width, height) = camera.size();
    let start = std::time::Instant::now();

    let pixels: Vec<Vec3> = (0..height)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..width).map(move |x| {
                let ray = camera.generate_ray(x as f32, y as f32);
                let hit = bvh.intersect(geometry, &ray);
                shade(geometry, bvh, &ray, hit.as_ref(), options.shading)
            })
        })
        .collect();

    log::info!(
        "CPU render {}x{} ({} primitives) in {:.1} ms",
        width,
        height,
        geometry.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Framebuffer::from_pixels(width, height, pixels)
}
