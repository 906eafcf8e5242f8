//! GPU-visible record layouts.
//!
//! Every struct here is `#[repr(C)]` + `Pod` and mirrors a WGSL struct in
//! `trace.wgsl` field for field. `vec3` members are padded to 16 bytes by
//! pairing them with a scalar.

use bytemuck::{Pod, Zeroable};

use crate::accel::LinearBvhNode;
use crate::geom::{MeshArena, Primitive, PrimitiveKind};
use crate::util::{Error, Result};

/// Largest leaf the 16-bit count field can address.
pub const MAX_LEAF_PRIMITIVES: usize = u16::MAX as usize;

/// Flattened BVH node for the kernel (32 bytes).
///
/// `packed` packs `primitive_count` (low 16 bits) and `axis` (bits 16..24);
/// WGSL reads it as a single `u32`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuBvhNode {
    pub bbox_min: [f32; 3],
    /// Primitive offset (leaf) or second child index (interior).
    pub offset: u32,
    pub bbox_max: [f32; 3],
    pub packed: u32,
}

impl GpuBvhNode {
    pub fn from_node(node: &LinearBvhNode) -> Result<Self> {
        let count = node.primitive_count as usize;
        if count > MAX_LEAF_PRIMITIVES {
            return Err(Error::LeafTooLarge { count, max: MAX_LEAF_PRIMITIVES });
        }
        Ok(Self {
            bbox_min: node.bound.min.to_array(),
            offset: node.offset,
            bbox_max: node.bound.max.to_array(),
            packed: (count as u32) | ((node.axis as u32) << 16),
        })
    }

    #[inline]
    pub fn primitive_count(&self) -> u16 {
        (self.packed & 0xffff) as u16
    }

    #[inline]
    pub fn axis(&self) -> u8 {
        ((self.packed >> 16) & 0xff) as u8
    }
}

/// Primitive record for the kernel (96 bytes).
///
/// Triangles: `v0..v2` world positions, `n0..n2` world normals.
/// Spheres: `v0` = centre, `v1[0]` = radius, normals unused.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPrimitive {
    pub v0: [f32; 3],
    pub kind: u32,
    pub v1: [f32; 3],
    /// Index into `Geometry::primitives`.
    pub index: u32,
    pub v2: [f32; 3],
    pub _pad0: u32,
    pub n0: [f32; 3],
    pub _pad1: u32,
    pub n1: [f32; 3],
    pub _pad2: u32,
    pub n2: [f32; 3],
    pub _pad3: u32,
}

impl GpuPrimitive {
    pub fn from_primitive(meshes: &MeshArena, prim: &Primitive, index: u32) -> Self {
        let mut out = Self::zeroed();
        out.kind = prim.kind() as u32;
        out.index = index;
        match prim {
            Primitive::Triangle(t) => {
                let [v0, v1, v2] = t.world_vertices(meshes);
                let [n0, n1, n2] = t.normals(meshes);
                out.v0 = v0.to_array();
                out.v1 = v1.to_array();
                out.v2 = v2.to_array();
                out.n0 = n0.to_array();
                out.n1 = n1.to_array();
                out.n2 = n2.to_array();
            }
            Primitive::Sphere(s) => {
                out.v0 = s.center.to_array();
                out.v1 = [s.radius, 0.0, 0.0];
            }
        }
        out
    }

    pub fn kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            0 => Some(PrimitiveKind::Triangle),
            1 => Some(PrimitiveKind::Sphere),
            _ => None,
        }
    }
}

/// Camera mirror written every frame (64 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub origin: [f32; 3],
    pub flags: u32,
    pub front: [f32; 3],
    pub tan_half_fov: f32,
    pub right: [f32; 3],
    pub aspect: f32,
    pub up: [f32; 3],
    pub _pad: f32,
}

/// Shade with the surface normal instead of the directional light.
pub const FRAME_FLAG_NORMALS: u32 = 1;

/// Scalar kernel parameters (16 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct FrameParams {
    pub width: u32,
    pub height: u32,
    pub primitive_count: u32,
    pub flags: u32,
}
