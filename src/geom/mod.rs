//! Scene geometry: bounds, rays, meshes and primitives.

mod bbox;
mod intersection;
mod mesh;
mod primitive;
mod ray;
mod sphere;
mod triangle;

pub use bbox::BBox;
pub use intersection::Intersection;
pub use mesh::{MeshArena, MeshHandle, TriangleMesh};
pub use primitive::{Geometry, Primitive, PrimitiveKind};
pub use ray::{Ray, RayInvDir};
pub use sphere::Sphere;
pub use triangle::Triangle;
