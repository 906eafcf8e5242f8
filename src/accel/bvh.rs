//! Linear BVH and explicit-stack traversal.

use smallvec::SmallVec;

use crate::geom::{BBox, Geometry, Intersection, Ray, RayInvDir};

/// Flattened BVH node.
///
/// `offset` is the first primitive slot for leaves (`primitive_count > 0`)
/// and the index of the second child for interior nodes. The first child of
/// an interior node at index `i` is always at `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearBvhNode {
    pub bound: BBox,
    pub offset: u32,
    pub primitive_count: u32,
    pub axis: u8,
}

impl LinearBvhNode {
    pub fn leaf(bound: BBox, first: u32, count: u32) -> Self {
        Self { bound, offset: first, primitive_count: count, axis: 0 }
    }

    pub fn interior(bound: BBox, second_child: u32, axis: u8) -> Self {
        Self { bound, offset: second_child, primitive_count: 0, axis }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.primitive_count > 0
    }

    /// Index of the second child. Only meaningful for interior nodes.
    #[inline]
    pub fn second_child(&self) -> u32 {
        self.offset
    }

    /// Slots in [`Bvh::primitive_indices`] covered by a leaf.
    #[inline]
    pub fn primitive_range(&self) -> std::ops::Range<usize> {
        let first = self.offset as usize;
        first..first + self.primitive_count as usize
    }
}

/// Tree shape summary used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: usize,
    pub max_leaf_size: usize,
    pub primitive_count: usize,
}

/// Built BVH: flat node array plus the leaf-ordered primitive index list.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<LinearBvhNode>,
    primitive_indices: Vec<u32>,
}

/// Traversal stack depth kept inline before spilling to the heap.
const STACK_INLINE: usize = 64;

impl Bvh {
    pub(crate) fn from_parts(nodes: Vec<LinearBvhNode>, primitive_indices: Vec<u32>) -> Self {
        Self { nodes, primitive_indices }
    }

    /// Flat node array (index 0 = root, empty for an empty scene).
    pub fn nodes(&self) -> &[LinearBvhNode] {
        &self.nodes
    }

    /// Indices into `Geometry::primitives`, in leaf order.
    pub fn primitive_indices(&self) -> &[u32] {
        &self.primitive_indices
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root bound; empty for an empty tree.
    pub fn bound(&self) -> BBox {
        self.nodes.first().map(|n| n.bound).unwrap_or(BBox::EMPTY)
    }

    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            node_count: self.nodes.len(),
            primitive_count: self.primitive_indices.len(),
            ..Default::default()
        };
        if self.nodes.is_empty() {
            return stats;
        }

        let mut stack: SmallVec<[(u32, usize); STACK_INLINE]> = SmallVec::new();
        stack.push((0, 0));
        while let Some((i, depth)) = stack.pop() {
            let node = &self.nodes[i as usize];
            stats.max_depth = stats.max_depth.max(depth);
            if node.is_leaf() {
                stats.leaf_count += 1;
                stats.max_leaf_size = stats.max_leaf_size.max(node.primitive_count as usize);
            } else {
                stack.push((node.second_child(), depth + 1));
                stack.push((i + 1, depth + 1));
            }
        }
        stats
    }

    /// Nearest hit along `ray`, or `None`.
    ///
    /// The caller's ray is not modified; traversal shrinks a local copy of
    /// `t_max` to the nearest distance found so far.
    pub fn intersect(&self, geometry: &Geometry, ray: &Ray) -> Option<Intersection> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut ray = *ray;
        let inv = RayInvDir::new(&ray);
        let mut hit = Intersection::default();

        let mut stack: SmallVec<[u32; STACK_INLINE]> = SmallVec::new();
        stack.push(0);
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i as usize];
            if node.bound.intersect_slabs(ray.origin, &inv, ray.t_min, ray.t_max).is_none() {
                continue;
            }

            if node.is_leaf() {
                for slot in node.primitive_range() {
                    let index = self.primitive_indices[slot] as usize;
                    if geometry.primitives[index].intersect(&geometry.meshes, &ray, index, &mut hit) {
                        ray.t_max = hit.distance;
                    }
                }
            } else {
                // Near child pops first.
                let first = i + 1;
                let second = node.second_child();
                if inv.dir_is_neg[node.axis as usize] {
                    stack.push(first);
                    stack.push(second);
                } else {
                    stack.push(second);
                    stack.push(first);
                }
            }
        }

        hit.is_hit().then_some(hit)
    }

    /// Whether anything is hit inside the ray's range. Returns on the first hit.
    pub fn intersect_p(&self, geometry: &Geometry, ray: &Ray) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        let inv = RayInvDir::new(ray);
        let mut stack: SmallVec<[u32; STACK_INLINE]> = SmallVec::new();
        stack.push(0);
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i as usize];
            if node.bound.intersect_slabs(ray.origin, &inv, ray.t_min, ray.t_max).is_none() {
                continue;
            }

            if node.is_leaf() {
                for slot in node.primitive_range() {
                    let index = self.primitive_indices[slot] as usize;
                    if geometry.primitives[index].intersect_p(&geometry.meshes, ray) {
                        return true;
                    }
                }
            } else {
                let first = i + 1;
                let second = node.second_child();
                if inv.dir_is_neg[node.axis as usize] {
                    stack.push(first);
                    stack.push(second);
                } else {
                    stack.push(second);
                    stack.push(first);
                }
            }
        }
        false
    }
}
