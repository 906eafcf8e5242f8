//! Triangle meshes and the arena that owns them.
//!
//! Triangles never own vertex data. They hold a [`MeshHandle`] into a
//! [`MeshArena`] plus three vertex indices, which keeps the primitive array
//! small and free of reference counting in the intersection loop.

use std::fmt;

use crate::util::{Affine3A, Mat3, Vec2, Vec3};

use super::bbox::BBox;

/// Indexed triangle mesh with an object-to-world transform.
#[derive(Clone)]
pub struct TriangleMesh {
    /// Object-space vertex positions.
    pub positions: Vec<Vec3>,
    /// Object-space vertex normals (empty or one per position).
    pub normals: Vec<Vec3>,
    /// Vertex texture coordinates (empty or one per position).
    pub uvs: Vec<Vec2>,
    /// Vertex index triples.
    pub indices: Vec<[u32; 3]>,
    object_to_world: Affine3A,
    world_to_object: Affine3A,
    world_positions: Vec<Vec3>,
}

impl TriangleMesh {
    /// Create a mesh in object space; `positions` are transformed once and cached.
    ///
    /// Normals / UVs whose length does not match `positions` are dropped.
    pub fn new(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        uvs: Vec<Vec2>,
        indices: Vec<[u32; 3]>,
        object_to_world: Affine3A,
    ) -> Self {
        let normals = if normals.len() == positions.len() { normals } else { Vec::new() };
        let uvs = if uvs.len() == positions.len() { uvs } else { Vec::new() };
        let world_positions = positions
            .iter()
            .map(|&p| object_to_world.transform_point3(p))
            .collect();

        Self {
            positions,
            normals,
            uvs,
            indices,
            object_to_world,
            world_to_object: object_to_world.inverse(),
            world_positions,
        }
    }

    /// Axis-aligned quad centred at the origin in the XY plane, facing +Z.
    pub fn quad(size: Vec2, object_to_world: Affine3A) -> Self {
        let h = size * 0.5;
        let positions = vec![
            Vec3::new(-h.x, -h.y, 0.0),
            Vec3::new(h.x, -h.y, 0.0),
            Vec3::new(h.x, h.y, 0.0),
            Vec3::new(-h.x, h.y, 0.0),
        ];
        let normals = vec![Vec3::Z; 4];
        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        Self::new(positions, normals, uvs, vec![[0, 1, 2], [0, 2, 3]], object_to_world)
    }

    /// Unit cube centred at the origin, flat-shaded (24 vertices, 12 triangles).
    pub fn cube(object_to_world: Affine3A) -> Self {
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(12);
        for (n, u, v) in faces {
            let base = positions.len() as u32;
            let c = n * 0.5;
            for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                positions.push(c + u * su + v * sv);
                normals.push(n);
                uvs.push(Vec2::new(su + 0.5, sv + 0.5));
            }
            indices.push([base, base + 1, base + 2]);
            indices.push([base, base + 2, base + 3]);
        }
        Self::new(positions, normals, uvs, indices, object_to_world)
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn object_to_world(&self) -> &Affine3A {
        &self.object_to_world
    }

    pub fn world_to_object(&self) -> &Affine3A {
        &self.world_to_object
    }

    /// Cached world-space position of vertex `i`.
    #[inline]
    pub fn world_position(&self, i: u32) -> Vec3 {
        self.world_positions[i as usize]
    }

    /// Object-space position of vertex `i`.
    #[inline]
    pub fn object_position(&self, i: u32) -> Vec3 {
        self.positions[i as usize]
    }

    /// World-space normal of vertex `i`, if the mesh has normals.
    pub fn world_normal(&self, i: u32) -> Option<Vec3> {
        let n = *self.normals.get(i as usize)?;
        // Normal matrix = transpose(inverse(upper 3x3)).
        let normal_mat: Mat3 = Mat3::from(self.world_to_object.matrix3).transpose();
        Some((normal_mat * n).normalize_or_zero())
    }

    /// Texture coordinate of vertex `i`, if the mesh has UVs.
    pub fn uv(&self, i: u32) -> Option<Vec2> {
        self.uvs.get(i as usize).copied()
    }

    /// World-space bound of all vertices.
    pub fn world_bound(&self) -> BBox {
        BBox::from_points(self.world_positions.iter().copied())
    }

    /// Indices of triangles whose vertex indices are all in range.
    pub fn valid_triangles(&self) -> impl Iterator<Item = usize> + '_ {
        let n = self.positions.len() as u32;
        self.indices
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.iter().all(|&i| i < n))
            .map(|(i, _)| i)
    }
}

impl fmt::Display for TriangleMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TriangleMesh({} vertices, {} triangles)", self.vertex_count(), self.triangle_count())
    }
}

/// Index of a mesh inside a [`MeshArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Owner of all meshes in a scene.
#[derive(Clone, Default)]
pub struct MeshArena {
    meshes: Vec<TriangleMesh>,
}

impl MeshArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a mesh and return its handle.
    pub fn insert(&mut self, mesh: TriangleMesh) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle((self.meshes.len() - 1) as u32)
    }

    #[inline]
    pub fn get(&self, handle: MeshHandle) -> &TriangleMesh {
        &self.meshes[handle.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshHandle, &TriangleMesh)> {
        self.meshes
            .iter()
            .enumerate()
            .map(|(i, m)| (MeshHandle(i as u32), m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_world_positions() {
        let mesh = TriangleMesh::quad(
            Vec2::splat(2.0),
            Affine3A::from_translation(Vec3::new(0.0, 0.0, -5.0)),
        );
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.world_position(0), Vec3::new(-1.0, -1.0, -5.0));
        assert_eq!(mesh.object_position(0), Vec3::new(-1.0, -1.0, 0.0));
        let b = mesh.world_bound();
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, -5.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, -5.0));
    }

    #[test]
    fn test_cube_is_closed() {
        let mesh = TriangleMesh::cube(Affine3A::IDENTITY);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.vertex_count(), 24);
        let b = mesh.world_bound();
        assert_eq!(b.min, Vec3::splat(-0.5));
        assert_eq!(b.max, Vec3::splat(0.5));
    }

    #[test]
    fn test_world_normal_follows_rotation() {
        let mesh = TriangleMesh::quad(
            Vec2::ONE,
            Affine3A::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let n = mesh.world_normal(0).unwrap();
        assert!((n - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_mismatched_attributes_dropped() {
        let mesh = TriangleMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec3::Z],
            vec![],
            vec![[0, 1, 2], [0, 1, 7]],
            Affine3A::IDENTITY,
        );
        assert!(mesh.normals.is_empty());
        assert!(mesh.world_normal(0).is_none());
        assert_eq!(mesh.valid_triangles().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_arena_handles() {
        let mut arena = MeshArena::new();
        let a = arena.insert(TriangleMesh::cube(Affine3A::IDENTITY));
        let b = arena.insert(TriangleMesh::quad(Vec2::ONE, Affine3A::IDENTITY));
        assert_eq!(a, MeshHandle(0));
        assert_eq!(b, MeshHandle(1));
        assert_eq!(arena.get(b).triangle_count(), 2);
        assert_eq!(arena.len(), 2);
    }
}
