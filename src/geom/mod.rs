//! Geometric queries in 3D space
//! Bounding volumes, primitives, raycasts, convex shape casts and
//! voxel grid traversal

pub mod aabb;
pub mod spatial;
pub mod prim;
pub mod tri;
pub mod raycast;
pub mod query;
pub mod shape;
pub mod mesh;
pub mod set;
pub mod voxel;
