//!
//! Free functions on triangles: barycentric coordinates, normals,
//! planes, areas and interpolation.
//!

use ::cgmath::{Vector3, Vector4};
use ::cgmath::prelude::*;

use super::prim::Tri3;

/// Computes the barycentric coordinates `[u, v, w]` of the given point
/// projected onto the given triangle. For a degenerate triangle the
/// denominator is zero and the coordinates come out non-finite; callers
/// treat such triangles as unhittable via `bary_contained`.
pub fn barycentric(t: &Tri3, p: Vector3<f32>) -> Vector3<f32> {
    let v0 = t.b - t.a;
    let v1 = t.c - t.a;
    let v2 = p - t.a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00*d11 - d01*d01;

    let v = (d11*d20 - d01*d21)/denom;
    let w = (d00*d21 - d01*d20)/denom;
    let u = 1.0 - v - w;

    Vector3::new(u, v, w)
}

/// Returns whether the given barycentric coordinates lie on the
/// triangle, boundary included. False for NaN coordinates.
pub fn bary_contained(bary: Vector3<f32>) -> bool {
    bary.y >= 0.0 && bary.z >= 0.0 && (bary.y + bary.z) <= 1.0
}

/// Interpolates between the triangle's vertices with the given
/// barycentric weights.
pub fn interpolate(t: &Tri3, bary: Vector3<f32>) -> Vector3<f32> {
    t.a*bary.x + t.b*bary.y + t.c*bary.z
}

/// Returns the normal of the given triangle. Zero-length for a
/// degenerate triangle.
pub fn normal(t: &Tri3) -> Vector3<f32> {
    let n = (t.c - t.a).cross(t.b - t.a);
    let len = n.magnitude();
    if len == 0.0 { n } else { n/len }
}

/// Returns the plane of the given triangle as `(normal, d)` packed into
/// a Vector4, with `normal . p = d` for points on the plane.
pub fn plane(t: &Tri3) -> Vector4<f32> {
    let n = normal(t);
    Vector4::new(n.x, n.y, n.z, t.a.dot(n))
}

/// Returns the distance from the given point to the given plane.
pub fn plane_dist(p: Vector3<f32>, plane: Vector4<f32>) -> f32 {
    plane.x*p.x + plane.y*p.y + plane.z*p.z - plane.w
}

/// Returns the area of the given triangle.
pub fn area(t: &Tri3) -> f32 {
    (t.b - t.a).cross(t.c - t.a).magnitude()*0.5
}
