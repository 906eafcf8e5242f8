//! Top-down BVH construction and depth-first flattening.
//!
//! The recursive builder produces an owned tree of [`BuildNode`]s over a
//! reordered primitive index list, which is then flattened into the linear
//! [`LinearBvhNode`] array consumed by CPU traversal and GPU upload.

use serde::{Deserialize, Serialize};

use crate::geom::{BBox, Geometry};
use crate::gpu::MAX_LEAF_PRIMITIVES;
use crate::util::{axis_component, Error, Result, Vec3};

use super::bvh::{Bvh, LinearBvhNode};

/// Deepest tree the kernel's fixed traversal stack can walk.
pub const MAX_KERNEL_DEPTH: usize = 62;

/// Number of SAH buckets for split evaluation.
const NUM_BUCKETS: usize = 12;

/// Ranges at or below this size skip SAH and split at the median.
const SAH_MIN_PRIMITIVES: usize = 4;

/// SAH cost ratio: traversal vs intersection.
const TRAVERSAL_COST: f32 = 0.125;
const INTERSECT_COST: f32 = 1.0;

/// How an interior node chooses its partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitMethod {
    /// Midpoint of the centroid bound along the split axis.
    Middle,
    /// Median of centroids along the split axis.
    #[default]
    EqualCounts,
    /// Bucketed surface area heuristic.
    Sah,
}

impl SplitMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "middle" => Some(Self::Middle),
            "equal-counts" | "median" => Some(Self::EqualCounts),
            "sah" => Some(Self::Sah),
            _ => None,
        }
    }
}

/// BVH build parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Ranges with at most this many primitives become leaves.
    pub max_leaf_size: usize,
    pub split: SplitMethod,
    /// Recursion guard; ranges reaching this depth become leaves.
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_leaf_size: 4,
            split: SplitMethod::EqualCounts,
            max_depth: 48,
        }
    }
}

impl BuildOptions {
    /// Reject options that would produce a tree the GPU kernel cannot walk.
    pub fn validate(&self) -> Result<()> {
        if self.max_leaf_size == 0 || self.max_leaf_size > MAX_LEAF_PRIMITIVES {
            return Err(Error::InvalidConfig(format!(
                "bvh.max_leaf_size {} outside 1..={MAX_LEAF_PRIMITIVES}",
                self.max_leaf_size
            )));
        }
        if self.max_depth == 0 || self.max_depth > MAX_KERNEL_DEPTH {
            return Err(Error::InvalidConfig(format!(
                "bvh.max_depth {} outside 1..={MAX_KERNEL_DEPTH}",
                self.max_depth
            )));
        }
        Ok(())
    }
}

/// Per-primitive data cached during the build.
#[derive(Debug, Clone, Copy)]
struct PrimitiveInfo {
    index: usize,
    bound: BBox,
    centroid: Vec3,
}

/// Build-time node. Interior nodes own their children.
#[derive(Debug)]
pub enum BuildNode {
    Leaf {
        bound: BBox,
        first: usize,
        count: usize,
    },
    Interior {
        bound: BBox,
        axis: u8,
        children: [Box<BuildNode>; 2],
    },
}

impl BuildNode {
    pub fn bound(&self) -> &BBox {
        match self {
            BuildNode::Leaf { bound, .. } | BuildNode::Interior { bound, .. } => bound,
        }
    }
}

#[derive(Clone, Copy, Default)]
struct Bucket {
    count: usize,
    bound: BBox,
}

/// Recursive BVH builder over a [`Geometry`].
pub struct BvhBuilder {
    options: BuildOptions,
    total_nodes: usize,
    max_depth_reached: usize,
}

impl BvhBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options: BuildOptions {
                max_leaf_size: options.max_leaf_size.max(1),
                max_depth: options.max_depth.max(1),
                ..options
            },
            total_nodes: 0,
            max_depth_reached: 0,
        }
    }

    /// Build and flatten. Zero primitives produce an empty node array.
    #[tracing::instrument(skip_all, fields(prim_count = geometry.len()))]
    pub fn build(mut self, geometry: &Geometry) -> Bvh {
        if geometry.is_empty() {
            return Bvh::from_parts(Vec::new(), Vec::new());
        }

        let mut infos: Vec<PrimitiveInfo> = geometry
            .primitives
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let bound = p.world_bound(&geometry.meshes);
                PrimitiveInfo { index, bound, centroid: bound.centroid() }
            })
            .collect();

        let mut ordered = Vec::with_capacity(infos.len());
        let root = self.recursive_build(&mut infos, 0, &mut ordered);

        let mut nodes = Vec::with_capacity(self.total_nodes);
        flatten(&root, &mut nodes);
        debug_assert_eq!(nodes.len(), self.total_nodes);

        log::debug!(
            "BVH built: {} primitives, {} nodes, depth {}",
            ordered.len(),
            nodes.len(),
            self.max_depth_reached
        );
        Bvh::from_parts(nodes, ordered)
    }

    fn make_leaf(&mut self, infos: &[PrimitiveInfo], bound: BBox, ordered: &mut Vec<u32>) -> Box<BuildNode> {
        let first = ordered.len();
        ordered.extend(infos.iter().map(|pi| pi.index as u32));
        Box::new(BuildNode::Leaf { bound, first, count: infos.len() })
    }

    fn recursive_build(
        &mut self,
        infos: &mut [PrimitiveInfo],
        depth: usize,
        ordered: &mut Vec<u32>,
    ) -> Box<BuildNode> {
        self.total_nodes += 1;
        self.max_depth_reached = self.max_depth_reached.max(depth);

        let bound = infos.iter().fold(BBox::EMPTY, |b, pi| b.union(&pi.bound));
        let count = infos.len();
        if count <= self.options.max_leaf_size || depth >= self.options.max_depth {
            return self.make_leaf(infos, bound, ordered);
        }

        let centroid_bound = infos
            .iter()
            .fold(BBox::EMPTY, |b, pi| b.union_point(pi.centroid));
        let axis = centroid_bound.max_extent_axis();
        if centroid_bound.extent(axis) <= 0.0 {
            // All centroids coincide; no split separates them.
            return self.make_leaf(infos, bound, ordered);
        }

        let mid = match self.options.split {
            SplitMethod::Middle => split_middle(infos, &centroid_bound, axis),
            SplitMethod::EqualCounts => split_equal_counts(infos, axis),
            SplitMethod::Sah => {
                if count <= SAH_MIN_PRIMITIVES {
                    split_equal_counts(infos, axis)
                } else {
                    split_sah(infos, &bound, &centroid_bound, axis)
                }
            }
        };
        debug_assert!(mid > 0 && mid < count);

        let (left, right) = infos.split_at_mut(mid);
        let c0 = self.recursive_build(left, depth + 1, ordered);
        let c1 = self.recursive_build(right, depth + 1, ordered);
        Box::new(BuildNode::Interior {
            bound: c0.bound().union(c1.bound()),
            axis: axis as u8,
            children: [c0, c1],
        })
    }
}

/// Median split via selection; returns the split index.
fn split_equal_counts(infos: &mut [PrimitiveInfo], axis: usize) -> usize {
    let mid = infos.len() / 2;
    infos.select_nth_unstable_by(mid, |a, b| {
        axis_component(a.centroid, axis).total_cmp(&axis_component(b.centroid, axis))
    });
    mid
}

/// Midpoint split; falls back to the median when one side would be empty.
fn split_middle(infos: &mut [PrimitiveInfo], centroid_bound: &BBox, axis: usize) -> usize {
    let pmid = axis_component(centroid_bound.centroid(), axis);
    let mid = partition(infos, |pi| axis_component(pi.centroid, axis) < pmid);
    if mid == 0 || mid == infos.len() {
        split_equal_counts(infos, axis)
    } else {
        mid
    }
}

fn bucket_index(centroid_bound: &BBox, centroid: Vec3, axis: usize) -> usize {
    let rel = axis_component(centroid_bound.offset(centroid), axis);
    ((NUM_BUCKETS as f32 * rel) as usize).min(NUM_BUCKETS - 1)
}

/// Bucketed SAH split; returns the split index.
///
/// Only reached for ranges above the leaf size, so it always splits and
/// picks the cheapest bucket boundary.
fn split_sah(infos: &mut [PrimitiveInfo], bound: &BBox, centroid_bound: &BBox, axis: usize) -> usize {
    let mut buckets = [Bucket::default(); NUM_BUCKETS];
    for pi in infos.iter() {
        let b = &mut buckets[bucket_index(centroid_bound, pi.centroid, axis)];
        b.count += 1;
        b.bound = b.bound.union(&pi.bound);
    }

    // Prefix sweep from the left.
    let mut left_area = [0.0f32; NUM_BUCKETS - 1];
    let mut left_count = [0usize; NUM_BUCKETS - 1];
    let mut sweep = BBox::EMPTY;
    let mut sweep_count = 0;
    for i in 0..NUM_BUCKETS - 1 {
        sweep = sweep.union(&buckets[i].bound);
        sweep_count += buckets[i].count;
        left_area[i] = sweep.surface_area();
        left_count[i] = sweep_count;
    }

    // Suffix sweep from the right: cost of splitting after bucket i - 1.
    let total_area = bound.surface_area().max(f32::MIN_POSITIVE);
    let mut best_cost = f32::INFINITY;
    let mut best_bucket = 0;
    sweep = BBox::EMPTY;
    sweep_count = 0;
    for i in (1..NUM_BUCKETS).rev() {
        sweep = sweep.union(&buckets[i].bound);
        sweep_count += buckets[i].count;
        if left_count[i - 1] == 0 || sweep_count == 0 {
            continue;
        }
        let cost = TRAVERSAL_COST
            + INTERSECT_COST
                * (left_count[i - 1] as f32 * left_area[i - 1] + sweep_count as f32 * sweep.surface_area())
                / total_area;
        if cost < best_cost {
            best_cost = cost;
            best_bucket = i - 1;
        }
    }

    if !best_cost.is_finite() {
        return split_equal_counts(infos, axis);
    }
    let mid = partition(infos, |pi| bucket_index(centroid_bound, pi.centroid, axis) <= best_bucket);
    if mid == 0 || mid == infos.len() {
        split_equal_counts(infos, axis)
    } else {
        mid
    }
}

/// Partition slice in-place. Returns count of elements where predicate is true.
fn partition<T, F>(slice: &mut [T], pred: F) -> usize
where
    F: Fn(&T) -> bool,
{
    let mut left = 0;
    let mut right = slice.len();
    while left < right {
        if pred(&slice[left]) {
            left += 1;
        } else {
            right -= 1;
            slice.swap(left, right);
        }
    }
    left
}

/// Depth-first flattening. Returns the index of `node` in `nodes`.
///
/// The first child of an interior node is written directly after it; the
/// node's `offset` is the array length at the moment the second subtree starts.
fn flatten(node: &BuildNode, nodes: &mut Vec<LinearBvhNode>) -> u32 {
    let index = nodes.len();
    match node {
        BuildNode::Leaf { bound, first, count } => {
            nodes.push(LinearBvhNode::leaf(*bound, *first as u32, *count as u32));
        }
        BuildNode::Interior { bound, axis, children } => {
            nodes.push(LinearBvhNode::interior(*bound, 0, *axis));
            flatten(&children[0], nodes);
            let second = flatten(&children[1], nodes);
            nodes[index].offset = second;
        }
    }
    index as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::TriangleMesh;
    use crate::util::{Affine3A, Vec2};

    #[test]
    fn test_options_validate() {
        BuildOptions::default().validate().unwrap();
        let deep = BuildOptions { max_depth: MAX_KERNEL_DEPTH + 1, ..Default::default() };
        assert!(matches!(deep.validate(), Err(Error::InvalidConfig(_))));
        let empty_leaf = BuildOptions { max_leaf_size: 0, ..Default::default() };
        assert!(matches!(empty_leaf.validate(), Err(Error::InvalidConfig(_))));
        let huge_leaf = BuildOptions { max_leaf_size: MAX_LEAF_PRIMITIVES + 1, ..Default::default() };
        assert!(matches!(huge_leaf.validate(), Err(Error::InvalidConfig(_))));
    }

    fn spheres_along_x(n: usize) -> Geometry {
        let mut g = Geometry::new();
        for i in 0..n {
            g.add_sphere(Vec3::new(i as f32 * 2.0, 0.0, 0.0), 0.5);
        }
        g
    }

    fn check_flattening(bvh: &Bvh) {
        // Walk the tree recursively and compare the expected preorder layout.
        fn walk(bvh: &Bvh, i: usize) -> usize {
            let node = &bvh.nodes()[i];
            if node.is_leaf() {
                return i + 1;
            }
            let right_start = walk(bvh, i + 1);
            assert_eq!(node.second_child() as usize, right_start, "node {i}");
            walk(bvh, right_start)
        }
        if !bvh.nodes().is_empty() {
            assert_eq!(walk(bvh, 0), bvh.nodes().len());
        }
    }

    #[test]
    fn test_empty_geometry() {
        let bvh = BvhBuilder::new(BuildOptions::default()).build(&Geometry::new());
        assert!(bvh.nodes().is_empty());
        assert!(bvh.primitive_indices().is_empty());
    }

    #[test]
    fn test_single_primitive_is_leaf() {
        let bvh = BvhBuilder::new(BuildOptions::default()).build(&spheres_along_x(1));
        assert_eq!(bvh.nodes().len(), 1);
        assert!(bvh.nodes()[0].is_leaf());
        assert_eq!(bvh.nodes()[0].primitive_count, 1);
    }

    #[test]
    fn test_small_set_single_leaf() {
        let bvh = BvhBuilder::new(BuildOptions::default()).build(&spheres_along_x(3));
        assert_eq!(bvh.nodes().len(), 1);
        assert_eq!(bvh.nodes()[0].primitive_count, 3);
    }

    #[test]
    fn test_all_split_methods_cover_every_primitive() {
        let g = spheres_along_x(100);
        for split in [SplitMethod::Middle, SplitMethod::EqualCounts, SplitMethod::Sah] {
            let bvh = BvhBuilder::new(BuildOptions { split, ..Default::default() }).build(&g);
            assert!(bvh.nodes().len() > 1, "{split:?}");
            let mut sorted = bvh.primitive_indices().to_vec();
            sorted.sort();
            assert_eq!(sorted, (0..100).collect::<Vec<u32>>(), "{split:?}");
            check_flattening(&bvh);

            let root = &bvh.nodes()[0];
            assert!(root.bound.min.x <= -0.5);
            assert!(root.bound.max.x >= 198.5);
        }
    }

    #[test]
    fn test_leaf_size_respected() {
        let g = spheres_along_x(50);
        let bvh = BvhBuilder::new(BuildOptions { max_leaf_size: 2, ..Default::default() }).build(&g);
        assert!(bvh.nodes().iter().filter(|n| n.is_leaf()).all(|n| n.primitive_count <= 2));
    }

    #[test]
    fn test_coincident_centroids_make_one_leaf() {
        let mut g = Geometry::new();
        for _ in 0..10 {
            g.add_sphere(Vec3::ZERO, 1.0);
        }
        let bvh = BvhBuilder::new(BuildOptions::default()).build(&g);
        assert_eq!(bvh.nodes().len(), 1);
        assert_eq!(bvh.nodes()[0].primitive_count, 10);
    }

    #[test]
    fn test_depth_guard() {
        let g = spheres_along_x(64);
        let opts = BuildOptions { max_leaf_size: 1, max_depth: 2, ..Default::default() };
        let bvh = BvhBuilder::new(opts).build(&g);
        assert_eq!(bvh.stats().max_depth, 2);
        assert_eq!(bvh.primitive_indices().len(), 64);
        check_flattening(&bvh);
    }

    #[test]
    fn test_parent_bounds_contain_children() {
        let mut g = Geometry::new();
        for i in 0..8 {
            g.add_mesh(TriangleMesh::quad(
                Vec2::ONE,
                Affine3A::from_translation(Vec3::new(i as f32, (i % 3) as f32, -(i as f32))),
            ));
        }
        let bvh = BvhBuilder::new(BuildOptions { max_leaf_size: 1, ..Default::default() }).build(&g);
        for (i, node) in bvh.nodes().iter().enumerate() {
            if !node.is_leaf() {
                assert!(node.bound.contains(&bvh.nodes()[i + 1].bound));
                assert!(node.bound.contains(&bvh.nodes()[node.second_child() as usize].bound));
            }
        }
    }

    #[test]
    fn test_split_method_parse() {
        assert_eq!(SplitMethod::parse("sah"), Some(SplitMethod::Sah));
        assert_eq!(SplitMethod::parse("median"), Some(SplitMethod::EqualCounts));
        assert_eq!(SplitMethod::parse("bogus"), None);
    }
}
