//! Analytic sphere primitive stored in world space.

use std::f32::consts::PI;

use crate::util::{Vec2, Vec3};

use super::bbox::BBox;
use super::intersection::Intersection;
use super::ray::Ray;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius: radius.abs() }
    }

    pub fn world_bound(&self) -> BBox {
        let r = Vec3::splat(self.radius);
        BBox::new(self.center - r, self.center + r)
    }

    /// Nearest root inside the ray's range.
    #[inline]
    fn hit(&self, ray: &Ray) -> Option<f32> {
        // See <http://en.wikipedia.org/wiki/Line%E2%80%93sphere_intersection>
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        if a == 0.0 {
            return None;
        }
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let near = (-half_b - sqrt_d) / a;
        if ray.contains(near) {
            return Some(near);
        }
        let far = (-half_b + sqrt_d) / a;
        ray.contains(far).then_some(far)
    }

    /// Nearest-hit test; writes into `hit` only when strictly nearer.
    pub fn intersect(&self, ray: &Ray, index: usize, hit: &mut Intersection) -> bool {
        let Some(t) = self.hit(ray) else {
            return false;
        };
        if t >= hit.distance {
            return false;
        }

        let position = ray.at(t);
        let normal = ((position - self.center) / self.radius).normalize_or_zero();
        let phi = normal.z.atan2(normal.x);
        let phi = if phi < 0.0 { phi + 2.0 * PI } else { phi };
        let theta = normal.y.clamp(-1.0, 1.0).acos();

        *hit = Intersection {
            primitive: index,
            position,
            normal,
            distance: t,
            uv: Vec2::new(phi / (2.0 * PI), theta / PI),
        };
        true
    }

    /// Occlusion test. Never touches the ray.
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.hit(ray).is_some()
    }
}
