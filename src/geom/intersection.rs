//! Nearest-hit record.

use crate::util::{Vec2, Vec3};

/// Nearest hit found so far along a ray.
///
/// `distance` starts at `+inf` and primitives only overwrite the record when
/// their hit is strictly nearer, so it never increases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Index of the hit primitive in the scene's primitive list.
    pub primitive: usize,
    /// World-space hit position.
    pub position: Vec3,
    /// Geometric normal (unit length, world space).
    pub normal: Vec3,
    /// Ray parameter of the hit.
    pub distance: f32,
    /// Barycentric `(u, v)` for triangles; spherical `(phi, theta)` in `[0,1]` for spheres.
    pub uv: Vec2,
}

impl Intersection {
    /// Record with no hit.
    pub const NONE: Self = Self {
        primitive: usize::MAX,
        position: Vec3::ZERO,
        normal: Vec3::ZERO,
        distance: f32::INFINITY,
        uv: Vec2::ZERO,
    };

    /// Whether a primitive has written into this record.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.distance.is_finite()
    }

    /// Interpolate per-vertex attributes with the hit's barycentric coordinates.
    ///
    /// `values[0]` is weighted by `1 - u - v`, `values[1]` by `u`, `values[2]` by `v`.
    pub fn interpolate<T>(&self, values: [T; 3]) -> T
    where
        T: Copy + std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
    {
        let w = 1.0 - self.uv.x - self.uv.y;
        values[0] * w + values[1] * self.uv.x + values[2] * self.uv.y
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Self::NONE
    }
}
