//! Parametric ray and its precomputed traversal data.

use std::fmt;

use crate::util::{safe_recip, Vec3, RAY_EPSILON};

/// Ray `origin + t * direction` restricted to `[t_min, t_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    /// Ray over `[RAY_EPSILON, +inf)`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            t_min: RAY_EPSILON,
            t_max: f32::INFINITY,
        }
    }

    /// Ray over an explicit parametric range.
    ///
    /// Negative `t_min` is clamped to zero.
    pub fn with_range(origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> Self {
        Self {
            origin,
            direction,
            t_min: t_min.max(0.0),
            t_max,
        }
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Whether `t` lies inside the ray's parametric range.
    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        t >= self.t_min && t <= self.t_max
    }

    /// Whether the range is non-empty (`t_max > t_min`).
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.t_max > self.t_min
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ray {{origin: {}, direction: {}, t: [{}, {}]}}",
            self.origin, self.direction, self.t_min, self.t_max
        )
    }
}

/// Per-ray reciprocal direction and sign, computed once per traversal.
#[derive(Debug, Clone, Copy)]
pub struct RayInvDir {
    pub inv_dir: Vec3,
    pub dir_is_neg: [bool; 3],
}

impl RayInvDir {
    pub fn new(ray: &Ray) -> Self {
        let d = ray.direction;
        let inv_dir = Vec3::new(safe_recip(d.x), safe_recip(d.y), safe_recip(d.z));
        Self {
            inv_dir,
            dir_is_neg: [
                inv_dir.x.is_sign_negative(),
                inv_dir.y.is_sign_negative(),
                inv_dir.z.is_sign_negative(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let r = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(r.at(5.0), Vec3::new(0.0, 0.0, -5.0));
        assert!(r.contains(5.0));
        assert!(!r.contains(0.0));
    }

    #[test]
    fn test_with_range_clamps_negative_min() {
        let r = Ray::with_range(Vec3::ZERO, Vec3::X, -1.0, 3.0);
        assert_eq!(r.t_min, 0.0);
        assert!(r.is_valid());
    }

    #[test]
    fn test_inv_dir_signs() {
        let r = Ray::new(Vec3::ZERO, Vec3::new(-1.0, 0.0, -0.0));
        let inv = RayInvDir::new(&r);
        assert_eq!(inv.dir_is_neg, [true, false, true]);
        assert_eq!(inv.inv_dir.y, f32::INFINITY);
        assert_eq!(inv.inv_dir.z, f32::NEG_INFINITY);
    }
}
