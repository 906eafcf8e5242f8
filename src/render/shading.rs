//! Shading model shared by the CPU renderer and `trace.wgsl`.

use serde::{Deserialize, Serialize};

use crate::accel::Bvh;
use crate::geom::{Geometry, Intersection, Ray};
use crate::gpu::FRAME_FLAG_NORMALS;
use crate::util::Vec3;

/// normalize(0.4, 1.0, 0.3)
pub const LIGHT_DIR: Vec3 = Vec3::new(0.3582, 0.8956, 0.2687);
pub const ALBEDO: Vec3 = Vec3::splat(0.8);
pub const AMBIENT: f32 = 0.1;
pub const BACKGROUND: Vec3 = Vec3::new(0.3, 0.3, 0.8);
/// Offset along the normal for occlusion rays.
pub const SHADOW_BIAS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadingMode {
    /// Directional light with a hard shadow ray.
    #[default]
    Lambert,
    /// Visualise the shading normal.
    Normals,
}

impl ShadingMode {
    /// Kernel frame flags for this mode.
    pub fn flags(self) -> u32 {
        match self {
            ShadingMode::Lambert => 0,
            ShadingMode::Normals => FRAME_FLAG_NORMALS,
        }
    }
}

/// Colour for `ray` given its nearest hit.
pub fn shade(geometry: &Geometry, bvh: &Bvh, ray: &Ray, hit: Option<&Intersection>, mode: ShadingMode) -> Vec3 {
    let Some(hit) = hit else {
        return BACKGROUND;
    };
    let prim = &geometry.primitives[hit.primitive];
    let mut n = prim.shading_normal(&geometry.meshes, hit);
    if n.dot(ray.direction) > 0.0 {
        n = -n;
    }

    if mode == ShadingMode::Normals {
        return n * 0.5 + 0.5;
    }

    let lambert = n.dot(LIGHT_DIR).max(0.0);
    let mut visible = 1.0;
    if lambert > 0.0 {
        let shadow = Ray::new(hit.position + n * SHADOW_BIAS, LIGHT_DIR);
        if bvh.intersect_p(geometry, &shadow) {
            visible = 0.0;
        }
    }
    ALBEDO * (AMBIENT + lambert * visible)
}
