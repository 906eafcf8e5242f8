//! Math type re-exports and small float helpers.
//!
//! This module re-exports the `glam` types used throughout the crate.

pub use glam::{Affine3A, Mat3, Mat4, UVec2, Vec2, Vec3, Vec3A, Vec4};

/// Smallest ray parameter accepted for a hit (self-intersection guard).
pub const RAY_EPSILON: f32 = 1e-4;

/// Determinant threshold below which a ray is treated as parallel to a triangle.
pub const PARALLEL_EPSILON: f32 = 1e-8;

/// Whether `x` is within `PARALLEL_EPSILON` of zero.
#[inline]
pub fn is_nearly_zero(x: f32) -> bool {
    x.abs() < PARALLEL_EPSILON
}

/// Reciprocal that maps zero and near-zero values to a signed infinity.
///
/// `-0.0` maps to `-inf` so slab tests keep the ray's travel direction.
#[inline]
pub fn safe_recip(x: f32) -> f32 {
    if is_nearly_zero(x) {
        f32::INFINITY.copysign(x)
    } else {
        1.0 / x
    }
}

/// Component of `v` along `axis` (0 = x, 1 = y, 2 = z).
#[inline]
pub fn axis_component(v: Vec3, axis: usize) -> f32 {
    match axis {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}

/// Relative float comparison used by tests and sanity checks.
pub fn approx_eq(a: f32, b: f32, rel: f32) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= rel * scale
}
