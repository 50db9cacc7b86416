//! Geometric primitives that collision queries run against.
//!
//! These are the "direct" variants that own their positions. Meshes
//! store indexed variants (indices into a shared vertex buffer) and
//! materialize these on demand; both read identically to the query
//! engine, which never mutates a primitive.

use ::cgmath::Vector3;

use super::aabb::Aabb;
use super::spatial::Spatial;

/// A line segment between two points.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Edge3 {
    pub a: Vector3<f32>,
    pub b: Vector3<f32>
}

impl Edge3 {
    pub fn new(a: Vector3<f32>, b: Vector3<f32>) -> Edge3 {
        Edge3 { a, b }
    }
}

impl Spatial for Edge3 {
    fn bounds(&self) -> Aabb {
        Aabb::contain_edge(self)
    }
}

/// A triangle spanned by three points.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tri3 {
    pub a: Vector3<f32>,
    pub b: Vector3<f32>,
    pub c: Vector3<f32>
}

impl Tri3 {
    pub fn new(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Tri3 {
        Tri3 { a, b, c }
    }
}

impl Spatial for Tri3 {
    fn bounds(&self) -> Aabb {
        Aabb::contain_tri(self)
    }
}

/// Tagged union over the three primitive kinds, used to type-erase the
/// contacted object in query results.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Prim {
    Vertex(Vector3<f32>),
    Edge(Edge3),
    Tri(Tri3)
}

impl Spatial for Prim {
    fn bounds(&self) -> Aabb {
        match *self {
            Prim::Vertex(v) => Aabb::new(v, v),
            Prim::Edge(ref e) => e.bounds(),
            Prim::Tri(ref t) => t.bounds()
        }
    }
}
