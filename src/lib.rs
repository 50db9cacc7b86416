#[macro_use]
extern crate log;
extern crate cgmath;
extern crate tobj;

#[cfg(test)]
extern crate rand;

pub mod geom;
pub mod driver;

pub use driver::{ActorDriver, Ground};
pub use geom::aabb::Aabb;
pub use geom::mesh::GeoMesh;
pub use geom::prim::{Edge3, Prim, Tri3};
pub use geom::query::{EmptyQuery, Geometry, Isect, Query, Ray, Sweep};
pub use geom::raycast::raycast;
pub use geom::set::GeoSet;
pub use geom::shape::{ConvexShape, Ellipsoid};
pub use geom::spatial::Spatial;
pub use geom::voxel::{Side, VoxelTrace};
