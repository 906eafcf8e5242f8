//! Axis-aligned bounding box.

use std::fmt;

use super::ray::{Ray, RayInvDir};
use crate::util::{axis_component, Vec3};

/// Axis-aligned bounding box with single precision corners.
///
/// The empty box has `min = +inf` and `max = -inf`, so any union with it
/// returns the other operand unchanged.
#[derive(Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from two corners in any order.
    #[inline]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a bounding box from a single point.
    #[inline]
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest box containing all `points`.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Self::EMPTY, |b, p| b.union_point(p))
    }

    /// Check if this box contains nothing (`min > max` on some axis).
    ///
    /// A flat box (zero extent on an axis) is not empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Smallest box containing both boxes.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Smallest box containing this box and `p`.
    #[inline]
    pub fn union_point(&self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Midpoint of the box.
    #[inline]
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Vector from `min` to `max`.
    #[inline]
    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    /// Total surface area; zero for empty boxes.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Axis (0=x, 1=y, 2=z) of greatest extent. Ties prefer the lower axis.
    pub fn max_extent_axis(&self) -> usize {
        let d = self.diagonal();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Position of `p` relative to the corners: `min` maps to 0, `max` to 1.
    ///
    /// Axes with zero extent map to 0.
    pub fn offset(&self, p: Vec3) -> Vec3 {
        let mut o = p - self.min;
        let d = self.diagonal();
        if d.x > 0.0 {
            o.x /= d.x;
        } else {
            o.x = 0.0;
        }
        if d.y > 0.0 {
            o.y /= d.y;
        } else {
            o.y = 0.0;
        }
        if d.z > 0.0 {
            o.z /= d.z;
        } else {
            o.z = 0.0;
        }
        o
    }

    /// Whether `p` lies inside or on the box.
    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Whether `other` lies entirely inside this box. Empty boxes are contained everywhere.
    pub fn contains(&self, other: &Self) -> bool {
        other.is_empty() || (other.min.cmpge(self.min).all() && other.max.cmple(self.max).all())
    }

    /// Extent of the box along `axis`.
    #[inline]
    pub fn extent(&self, axis: usize) -> f32 {
        axis_component(self.max, axis) - axis_component(self.min, axis)
    }

    /// Whether the ray's parametric interval overlaps the box.
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.intersect_range(ray).is_some()
    }

    /// Parametric interval `(t0, t1)` of the ray inside the box, clipped to
    /// `[ray.t_min, ray.t_max]`.
    pub fn intersect_range(&self, ray: &Ray) -> Option<(f32, f32)> {
        let inv = RayInvDir::new(ray);
        self.intersect_slabs(ray.origin, &inv, ray.t_min, ray.t_max)
    }

    /// Slab test with precomputed reciprocal direction.
    ///
    /// Comparisons are written so a NaN slab distance (origin exactly on a
    /// slab with a zero direction component) leaves the interval unchanged.
    #[inline]
    pub fn intersect_slabs(
        &self,
        origin: Vec3,
        inv: &RayInvDir,
        t_min: f32,
        t_max: f32,
    ) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }

        let mut t0 = t_min;
        let mut t1 = t_max;
        for axis in 0..3 {
            let o = axis_component(origin, axis);
            let inv_d = axis_component(inv.inv_dir, axis);
            let mut t_near = (axis_component(self.min, axis) - o) * inv_d;
            let mut t_far = (axis_component(self.max, axis) - o) * inv_d;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            if t_near > t0 {
                t0 = t_near;
            }
            if t_far < t1 {
                t1 = t_far;
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox({:?} - {:?})", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> BBox {
        BBox::new(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn test_empty() {
        let b = BBox::EMPTY;
        assert!(b.is_empty());
        assert_eq!(b.surface_area(), 0.0);
        assert_eq!(b.union(&unit()), unit());
        assert!(!b.intersect_p(&Ray::new(Vec3::splat(-1.0), Vec3::ONE)));
    }

    #[test]
    fn test_union_and_centroid() {
        let a = unit();
        let b = BBox::new(Vec3::splat(2.0), Vec3::splat(3.0));
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::ZERO);
        assert_eq!(u.max, Vec3::splat(3.0));
        assert_eq!(u.centroid(), Vec3::splat(1.5));
        assert!(u.contains(&a));
        assert!(u.contains(&b));
    }

    #[test]
    fn test_max_extent_axis() {
        assert_eq!(BBox::new(Vec3::ZERO, Vec3::new(3.0, 1.0, 1.0)).max_extent_axis(), 0);
        assert_eq!(BBox::new(Vec3::ZERO, Vec3::new(1.0, 3.0, 1.0)).max_extent_axis(), 1);
        assert_eq!(BBox::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 3.0)).max_extent_axis(), 2);
    }

    #[test]
    fn test_surface_area() {
        assert_eq!(unit().surface_area(), 6.0);
    }

    #[test]
    fn test_offset() {
        let b = BBox::new(Vec3::ZERO, Vec3::new(2.0, 4.0, 0.0));
        assert_eq!(b.offset(Vec3::new(1.0, 1.0, 0.0)), Vec3::new(0.5, 0.25, 0.0));
    }

    #[test]
    fn test_slab_hit_and_range() {
        let r = Ray::new(Vec3::new(0.5, 0.5, 5.0), Vec3::NEG_Z);
        let (t0, t1) = unit().intersect_range(&r).unwrap();
        assert!((t0 - 4.0).abs() < 1e-6);
        assert!((t1 - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_slab_miss() {
        let r = Ray::new(Vec3::new(2.0, 0.5, 5.0), Vec3::NEG_Z);
        assert!(!unit().intersect_p(&r));
    }

    #[test]
    fn test_slab_respects_t_max() {
        let r = Ray::with_range(Vec3::new(0.5, 0.5, 5.0), Vec3::NEG_Z, 0.0, 3.0);
        assert!(!unit().intersect_p(&r));
    }

    #[test]
    fn test_slab_axis_parallel_ray() {
        // Zero x/y direction components: reciprocal is +-inf.
        let inside = Ray::new(Vec3::new(0.5, 0.5, -5.0), Vec3::Z);
        assert!(unit().intersect_p(&inside));

        let outside = Ray::new(Vec3::new(1.5, 0.5, -5.0), Vec3::Z);
        assert!(!unit().intersect_p(&outside));

        let negative_zero = Ray::new(Vec3::new(0.5, 0.5, -5.0), Vec3::new(-0.0, 0.0, 1.0));
        assert!(unit().intersect_p(&negative_zero));
    }

    #[test]
    fn test_flat_box_is_hit() {
        let flat = BBox::new(Vec3::new(-1.0, -1.0, -5.0), Vec3::new(1.0, 1.0, -5.0));
        assert!(!flat.is_empty());
        assert!(flat.intersect_p(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)));
    }

    #[test]
    fn test_origin_inside() {
        let r = Ray::new(Vec3::splat(0.5), Vec3::X);
        let (t0, t1) = unit().intersect_range(&r).unwrap();
        assert!(t0 <= 0.5);
        assert!((t1 - 0.5).abs() < 1e-6);
    }
}
