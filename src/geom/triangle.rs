//! Triangle primitive referencing a mesh in the arena.

use crate::util::{is_nearly_zero, Vec2, Vec3};

use super::bbox::BBox;
use super::intersection::Intersection;
use super::mesh::{MeshArena, MeshHandle};
use super::ray::Ray;

/// One triangle of a [`TriangleMesh`](super::TriangleMesh).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub mesh: MeshHandle,
    pub vertices: [u32; 3],
}

/// Raw Möller–Trumbore result: ray parameter and barycentrics.
struct RawHit {
    t: f32,
    u: f32,
    v: f32,
}

impl Triangle {
    pub fn new(mesh: MeshHandle, vertices: [u32; 3]) -> Self {
        Self { mesh, vertices }
    }

    /// World-space vertex positions.
    #[inline]
    pub fn world_vertices(&self, meshes: &MeshArena) -> [Vec3; 3] {
        let m = meshes.get(self.mesh);
        let [a, b, c] = self.vertices;
        [m.world_position(a), m.world_position(b), m.world_position(c)]
    }

    /// Bound in the mesh's object space.
    pub fn object_bound(&self, meshes: &MeshArena) -> BBox {
        let m = meshes.get(self.mesh);
        BBox::from_points(self.vertices.iter().map(|&i| m.object_position(i)))
    }

    /// Bound in world space.
    pub fn world_bound(&self, meshes: &MeshArena) -> BBox {
        BBox::from_points(self.world_vertices(meshes))
    }

    /// Unnormalized geometric normal (`e1 x e2`, counter-clockwise front face).
    pub fn face_normal(&self, meshes: &MeshArena) -> Vec3 {
        let [p0, p1, p2] = self.world_vertices(meshes);
        (p1 - p0).cross(p2 - p0)
    }

    /// Surface area in world space.
    pub fn area(&self, meshes: &MeshArena) -> f32 {
        0.5 * self.face_normal(meshes).length()
    }

    // Möller–Trumbore. See <https://en.wikipedia.org/wiki/Möller–Trumbore_intersection_algorithm>.
    #[inline]
    fn hit(&self, meshes: &MeshArena, ray: &Ray) -> Option<RawHit> {
        let [p0, p1, p2] = self.world_vertices(meshes);
        let edge1 = p1 - p0;
        let edge2 = p2 - p0;

        let p = ray.direction.cross(edge2);
        let det = edge1.dot(p);
        if is_nearly_zero(det) {
            return None; // parallel to the plane
        }
        let inv_det = 1.0 / det;

        let s = ray.origin - p0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = ray.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        if !ray.contains(t) {
            return None;
        }
        Some(RawHit { t, u, v })
    }

    /// Nearest-hit test; writes into `hit` only when strictly nearer.
    ///
    /// `index` is this primitive's position in the scene's primitive list.
    pub fn intersect(&self, meshes: &MeshArena, ray: &Ray, index: usize, hit: &mut Intersection) -> bool {
        let Some(raw) = self.hit(meshes, ray) else {
            return false;
        };
        if raw.t >= hit.distance {
            return false;
        }

        *hit = Intersection {
            primitive: index,
            position: ray.at(raw.t),
            normal: self.face_normal(meshes).normalize_or_zero(),
            distance: raw.t,
            uv: Vec2::new(raw.u, raw.v),
        };
        true
    }

    /// Occlusion test. Never touches the ray.
    pub fn intersect_p(&self, meshes: &MeshArena, ray: &Ray) -> bool {
        self.hit(meshes, ray).is_some()
    }

    /// Per-vertex world normals; the face normal repeated when the mesh has none.
    pub fn normals(&self, meshes: &MeshArena) -> [Vec3; 3] {
        let m = meshes.get(self.mesh);
        let [a, b, c] = self.vertices;
        match (m.world_normal(a), m.world_normal(b), m.world_normal(c)) {
            (Some(na), Some(nb), Some(nc)) => [na, nb, nc],
            _ => [self.face_normal(meshes).normalize_or_zero(); 3],
        }
    }

    /// Per-vertex UVs; `(0,0) (1,0) (1,1)` when the mesh has none.
    pub fn uvs(&self, meshes: &MeshArena) -> [Vec2; 3] {
        let m = meshes.get(self.mesh);
        let [a, b, c] = self.vertices;
        match (m.uv(a), m.uv(b), m.uv(c)) {
            (Some(ua), Some(ub), Some(uc)) => [ua, ub, uc],
            _ => [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)],
        }
    }
}
