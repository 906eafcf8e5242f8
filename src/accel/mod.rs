//! BVH acceleration structure.
//!
//! ## Architecture
//! ```text
//! Geometry → BvhBuilder (recursive, owned BuildNode tree) → flatten → Bvh { nodes, primitive_indices }
//!                                                                      ├→ Bvh::intersect / intersect_p (CPU)
//!                                                                      └→ gpu::GpuScene (upload)
//! ```

mod build;
mod bvh;

pub use build::{BuildNode, BuildOptions, BvhBuilder, SplitMethod, MAX_KERNEL_DEPTH};
pub use bvh::{Bvh, BvhStats, LinearBvhNode};

use crate::geom::Geometry;

/// Build a BVH over `geometry` with `options`.
pub fn build_bvh(geometry: &Geometry, options: BuildOptions) -> Bvh {
    BvhBuilder::new(options).build(geometry)
}
