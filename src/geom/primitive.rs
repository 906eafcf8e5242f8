//! Closed set of intersectable primitives and the geometry that owns them.

use crate::util::{Vec2, Vec3};

use super::bbox::BBox;
use super::intersection::Intersection;
use super::mesh::{MeshArena, MeshHandle, TriangleMesh};
use super::ray::Ray;
use super::sphere::Sphere;
use super::triangle::Triangle;

/// Primitive variant. Leaf scans dispatch with a `match`, not a vtable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Triangle(Triangle),
    Sphere(Sphere),
}

/// Discriminant written into the GPU primitive record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PrimitiveKind {
    Triangle = 0,
    Sphere = 1,
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Triangle(_) => PrimitiveKind::Triangle,
            Primitive::Sphere(_) => PrimitiveKind::Sphere,
        }
    }

    #[inline]
    pub fn world_bound(&self, meshes: &MeshArena) -> BBox {
        match self {
            Primitive::Triangle(t) => t.world_bound(meshes),
            Primitive::Sphere(s) => s.world_bound(),
        }
    }

    #[inline]
    pub fn intersect(&self, meshes: &MeshArena, ray: &Ray, index: usize, hit: &mut Intersection) -> bool {
        match self {
            Primitive::Triangle(t) => t.intersect(meshes, ray, index, hit),
            Primitive::Sphere(s) => s.intersect(ray, index, hit),
        }
    }

    #[inline]
    pub fn intersect_p(&self, meshes: &MeshArena, ray: &Ray) -> bool {
        match self {
            Primitive::Triangle(t) => t.intersect_p(meshes, ray),
            Primitive::Sphere(s) => s.intersect_p(ray),
        }
    }

    /// Shading normal at `hit`: interpolated vertex normals for triangles,
    /// the geometric normal for spheres.
    pub fn shading_normal(&self, meshes: &MeshArena, hit: &Intersection) -> Vec3 {
        match self {
            Primitive::Triangle(t) => hit.interpolate(t.normals(meshes)).normalize_or(hit.normal),
            Primitive::Sphere(_) => hit.normal,
        }
    }

    /// Texture coordinate at `hit`.
    pub fn shading_uv(&self, meshes: &MeshArena, hit: &Intersection) -> Vec2 {
        match self {
            Primitive::Triangle(t) => hit.interpolate(t.uvs(meshes)),
            Primitive::Sphere(_) => hit.uv,
        }
    }
}

/// All meshes and primitives of a scene.
///
/// Primitive indices are stable: the BVH stores them and hits report them.
#[derive(Clone, Default)]
pub struct Geometry {
    pub meshes: MeshArena,
    pub primitives: Vec<Primitive>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `mesh` and add one triangle primitive per valid index triple.
    pub fn add_mesh(&mut self, mesh: TriangleMesh) -> MeshHandle {
        let tris: Vec<[u32; 3]> = mesh.valid_triangles().map(|i| mesh.indices[i]).collect();
        let handle = self.meshes.insert(mesh);
        self.primitives.extend(
            tris.into_iter()
                .map(|v| Primitive::Triangle(Triangle::new(handle, v))),
        );
        handle
    }

    pub fn add_sphere(&mut self, center: Vec3, radius: f32) -> usize {
        self.primitives.push(Primitive::Sphere(Sphere::new(center, radius)));
        self.primitives.len() - 1
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// World bound of every primitive.
    pub fn world_bound(&self) -> BBox {
        self.primitives
            .iter()
            .fold(BBox::EMPTY, |b, p| b.union(&p.world_bound(&self.meshes)))
    }

    /// Brute-force nearest hit over every primitive. Reference for BVH tests.
    pub fn intersect_brute_force(&self, ray: &Ray) -> Option<Intersection> {
        let mut hit = Intersection::default();
        for (i, prim) in self.primitives.iter().enumerate() {
            prim.intersect(&self.meshes, ray, i, &mut hit);
        }
        hit.is_hit().then_some(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Affine3A;

    #[test]
    fn test_add_mesh_creates_triangles() {
        let mut g = Geometry::new();
        g.add_mesh(TriangleMesh::cube(Affine3A::IDENTITY));
        g.add_sphere(Vec3::new(0.0, 3.0, 0.0), 1.0);
        assert_eq!(g.len(), 13);
        assert_eq!(g.primitives[12].kind(), PrimitiveKind::Sphere);
        let b = g.world_bound();
        assert_eq!(b.max.y, 4.0);
        assert_eq!(b.min.y, -0.5);
    }

    #[test]
    fn test_brute_force_nearest() {
        let mut g = Geometry::new();
        g.add_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0);
        g.add_sphere(Vec3::new(0.0, 0.0, -5.0), 1.0);
        let hit = g.intersect_brute_force(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap();
        assert_eq!(hit.primitive, 1);
        assert!((hit.distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_shading_normal_interpolates() {
        let mut g = Geometry::new();
        g.add_mesh(TriangleMesh::quad(Vec2::splat(2.0), Affine3A::from_translation(Vec3::NEG_Z * 3.0)));
        let ray = Ray::new(Vec3::new(0.2, -0.2, 0.0), Vec3::NEG_Z);
        let hit = g.intersect_brute_force(&ray).unwrap();
        let prim = &g.primitives[hit.primitive];
        let n = prim.shading_normal(&g.meshes, &hit);
        assert!((n - Vec3::Z).length() < 1e-5);
        let uv = prim.shading_uv(&g.meshes, &hit);
        assert!((uv - Vec2::new(0.6, 0.4)).length() < 1e-4);
    }
}
