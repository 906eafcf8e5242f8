//! Serialize BVH + primitives into kernel-ready arrays.

use crate::accel::Bvh;
use crate::geom::Geometry;
use crate::util::Result;

use super::layout::{GpuBvhNode, GpuPrimitive};

/// Scene data ready for upload.
#[derive(Debug, Clone, Default)]
pub struct GpuScene {
    /// Flat node array, same order as the CPU BVH.
    pub nodes: Vec<GpuBvhNode>,
    /// Primitive records in BVH leaf order, so a leaf's `offset` indexes here directly.
    pub primitives: Vec<GpuPrimitive>,
}

impl GpuScene {
    /// Convert a built BVH. Fails if a leaf is too large for the GPU node.
    #[tracing::instrument(skip_all, fields(nodes = bvh.nodes().len()))]
    pub fn new(geometry: &Geometry, bvh: &Bvh) -> Result<Self> {
        let nodes = bvh
            .nodes()
            .iter()
            .map(GpuBvhNode::from_node)
            .collect::<Result<Vec<_>>>()?;

        let primitives = bvh
            .primitive_indices()
            .iter()
            .map(|&i| GpuPrimitive::from_primitive(&geometry.meshes, &geometry.primitives[i as usize], i))
            .collect();

        let scene = Self { nodes, primitives };
        log::debug!(
            "GPU scene: {} nodes ({} KiB), {} primitives ({} KiB)",
            scene.nodes.len(),
            scene.nodes_bytes().len() / 1024,
            scene.primitives.len(),
            scene.primitives_bytes().len() / 1024
        );
        Ok(scene)
    }

    pub fn primitive_count(&self) -> u32 {
        self.primitives.len() as u32
    }

    pub fn node_count(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    pub fn primitives_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.primitives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::{build_bvh, BuildOptions};
    use crate::geom::{PrimitiveKind, TriangleMesh};
    use crate::util::{Affine3A, Vec3};

    #[test]
    fn test_leaf_order() {
        let mut g = Geometry::new();
        g.add_mesh(TriangleMesh::cube(Affine3A::IDENTITY));
        for i in 0..5 {
            g.add_sphere(Vec3::new(3.0 + i as f32 * 2.0, 0.0, 0.0), 0.5);
        }
        let bvh = build_bvh(&g, BuildOptions { max_leaf_size: 2, ..Default::default() });
        let scene = GpuScene::new(&g, &bvh).unwrap();

        assert_eq!(scene.node_count() as usize, bvh.nodes().len());
        assert_eq!(scene.primitive_count(), 17);
        for (slot, rec) in scene.primitives.iter().enumerate() {
            assert_eq!(rec.index, bvh.primitive_indices()[slot]);
            let expected = g.primitives[rec.index as usize].kind();
            assert_eq!(rec.kind(), Some(expected));
        }
        assert!(scene.primitives.iter().any(|p| p.kind() == Some(PrimitiveKind::Sphere)));
        assert_eq!(scene.nodes_bytes().len(), scene.nodes.len() * 32);
    }

    #[test]
    fn test_empty_scene() {
        let g = Geometry::new();
        let bvh = build_bvh(&g, BuildOptions::default());
        let scene = GpuScene::new(&g, &bvh).unwrap();
        assert!(scene.is_empty());
        assert_eq!(scene.primitive_count(), 0);
    }
}
