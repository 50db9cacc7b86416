//! Convex query shapes and the analytic collision tests behind them.
//!
//! The only shape implemented is an axis-aligned ellipsoid. Every test
//! scales the involved coordinates component-wise by the reciprocal
//! radii, turning the problem into one against a unit sphere; this is
//! valid because scaling by a diagonal matrix commutes with the sphere
//! quadratic form.

use ::cgmath::{Vector3, Vector4};
use ::cgmath::prelude::*;

use super::aabb::Aabb;
use super::prim::{Edge3, Prim, Tri3};
use super::query::{Isect, Sweep};
use super::tri;

const EPSILON: f32 = 1.0/65536.0;

/// Solves `a*t^2 + b*t + c = 0` for the contact time of a sweep.
///
/// Root policy: with two forward roots the smaller (entry) is returned;
/// if either root is negative the larger is returned, so a sweep
/// starting inside the sphere reports its exit and a sweep that has
/// fully passed the sphere reports a negative time for the caller to
/// reject. `a == 0` degenerates to a linear solve.
fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<f32> {
    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        return Some(-c/b);
    }

    let discriminant = b*b - 4.0*a*c;
    if discriminant < 0.0 || !discriminant.is_finite() {
        return None;
    }

    let a2 = 2.0*a;
    if discriminant == 0.0 {
        return Some(-b/a2);
    }

    let sqrt_disc = discriminant.sqrt();
    let s1 = (-b - sqrt_disc)/a2;
    let s2 = (sqrt_disc - b)/a2;

    if s1 < 0.0 || s2 < 0.0 {
        Some(if s1 > s2 { s1 } else { s2 })
    } else {
        Some(if s1 < s2 { s1 } else { s2 })
    }
}

/// Returns the time at which a sphere of radius `r` moving along `dp`
/// touches the given plane, 0 if it already overlaps it, or a negative
/// or NaN value when moving parallel or away.
fn sweep_sphere_plane(p: Vector3<f32>, dp: Vector3<f32>, plane: Vector4<f32>, r: f32) -> f32 {
    let mut n = Vector3::new(plane.x, plane.y, plane.z);
    let mut dist = tri::plane_dist(p, plane);
    if dist < 0.0 {
        dist = -dist;
        n = -n;
    }
    if dist < r {
        return 0.0;
    }
    (r - dist)/n.dot(dp)
}

/// A convex volume that can be statically intersected against, or swept
/// along a displacement into, each primitive kind. All operations write
/// into a caller-owned result record and return whether they hit.
pub trait ConvexShape {
    fn isect_vertex(&self, p: Vector3<f32>, result: &mut Isect) -> bool;
    fn isect_edge(&self, e: &Edge3, result: &mut Isect) -> bool;
    fn isect_tri(&self, t: &Tri3, result: &mut Isect) -> bool;

    fn sweep_vertex(&self, dp: Vector3<f32>, p: Vector3<f32>, result: &mut Sweep) -> bool;
    fn sweep_edge(&self, dp: Vector3<f32>, e: &Edge3, result: &mut Sweep) -> bool;
    fn sweep_tri(&self, dp: Vector3<f32>, t: &Tri3, result: &mut Sweep) -> bool;

    /// A tight bounding box around this shape.
    fn bounds(&self) -> Aabb;
}

/// An axis-aligned ellipsoid, given by its center and one positive
/// radius per local axis.
#[derive(Debug, Clone)]
pub struct Ellipsoid {
    pub pos: Vector3<f32>,
    pub radii: Vector3<f32>
}

impl Ellipsoid {
    pub fn new(pos: Vector3<f32>, radii: Vector3<f32>) -> Ellipsoid {
        assert!(radii.x > 0.0 && radii.y > 0.0 && radii.z > 0.0,
            "Ellipsoid radii must be positive, got {:?}", radii);
        Ellipsoid { pos, radii }
    }

    /// Full containment case: the primitive passes through the center,
    /// so there is no meaningful separating direction. Reports the
    /// smallest radius as the depth, pushing out along that axis.
    fn isect_center(&self, prim: Prim, result: &mut Isect) -> bool {
        let (axis, radius) = if self.radii.y <= self.radii.x && self.radii.y <= self.radii.z {
            (Vector3::new(0.0, 1.0, 0.0), self.radii.y)
        } else if self.radii.x <= self.radii.z {
            (Vector3::new(1.0, 0.0, 0.0), self.radii.x)
        } else {
            (Vector3::new(0.0, 0.0, 1.0), self.radii.z)
        };

        result.prim = Some(prim);
        result.point = self.pos;
        result.surface = self.pos - axis*radius;
        result.depth = radius;
        result.normal = axis;
        true
    }
}

impl ConvexShape for Ellipsoid {
    fn isect_vertex(&self, p: Vector3<f32>, result: &mut Isect) -> bool {
        let dir = (p - self.pos).div_element_wise(self.radii);
        let sq_len = dir.magnitude2();
        if sq_len > 1.0 {
            return false; //Too far away.
        }

        let len = sq_len.sqrt();
        if len.is_nan() {
            return false;
        }
        if len < EPSILON {
            return self.isect_center(Prim::Vertex(p), result); //Intersecting center.
        }

        let unit = dir/len;
        result.prim = Some(Prim::Vertex(p));
        result.point = p;
        result.normal = -unit;
        result.surface = unit.mul_element_wise(self.radii) + self.pos;
        result.depth = (result.point - result.surface).magnitude();
        true
    }

    fn isect_edge(&self, e: &Edge3, result: &mut Isect) -> bool {
        let a_dir = (e.a - self.pos).div_element_wise(self.radii);
        let e_dir = (e.b - e.a).div_element_wise(self.radii);

        let e_len_sq = e_dir.magnitude2();
        let et = -a_dir.dot(e_dir)/e_len_sq;
        if et < 0.0 || et > 1.0 {
            return false; //Not touching the segment.
        }

        let dir = a_dir + e_dir*et;
        let sq_len = dir.magnitude2();
        if sq_len > 1.0 {
            return false; //Too far away.
        }

        let len = sq_len.sqrt();
        if len.is_nan() {
            return false;
        }
        if len < EPSILON {
            return self.isect_center(Prim::Edge(*e), result); //Intersecting center.
        }

        let unit = dir/len;
        result.prim = Some(Prim::Edge(*e));
        result.point = e.a.lerp(e.b, et);
        result.normal = (-unit).div_element_wise(self.radii).normalize();
        result.surface = unit.mul_element_wise(self.radii) + self.pos;
        result.depth = (result.point - result.surface).magnitude();
        true
    }

    fn isect_tri(&self, t: &Tri3, result: &mut Isect) -> bool {
        let scaled = Tri3::new(
            (t.a - self.pos).div_element_wise(self.radii),
            (t.b - self.pos).div_element_wise(self.radii),
            (t.c - self.pos).div_element_wise(self.radii)
        );

        let mut plane = tri::plane(&scaled);
        if plane.w > 0.0 {
            plane = -plane;
        }
        if plane.w < -1.0 || plane.w.is_nan() {
            return false; //Too far apart, or degenerate triangle.
        }

        let bary = tri::barycentric(t, self.pos);
        if !tri::bary_contained(bary) {
            return false; //Deepest point not inside the triangle.
        }

        if plane.w.abs() < EPSILON {
            return self.isect_center(Prim::Tri(*t), result); //Intersecting center.
        }

        let normal = Vector3::new(plane.x, plane.y, plane.z);
        result.prim = Some(Prim::Tri(*t));
        result.point = tri::interpolate(t, bary);
        result.surface = (tri::interpolate(&scaled, bary)/(-plane.w))
            .mul_element_wise(self.radii) + self.pos;
        result.normal = normal.div_element_wise(self.radii).normalize();
        result.depth = (result.point - result.surface).magnitude();
        true
    }

    fn sweep_vertex(&self, dp: Vector3<f32>, p: Vector3<f32>, result: &mut Sweep) -> bool {
        let dpe = dp.div_element_wise(self.radii);
        let p_dir = (self.pos - p).div_element_wise(self.radii);

        let t = match solve_quadratic(
            dpe.magnitude2(),
            2.0*p_dir.dot(dpe),
            p_dir.magnitude2() - 1.0)
        {
            Some(t) => t,
            None => return false //Missed the vertex.
        };

        if t < 0.0 || t > 1.0 {
            return false; //Moving away, or won't get there in time.
        }

        result.prim = Some(Prim::Vertex(p));
        result.time = t;
        result.point = p;
        result.position = self.pos + dp*t;
        result.normal = (result.position - result.point)
            .div_element_wise(self.radii).normalize();
        true
    }

    fn sweep_edge(&self, dp: Vector3<f32>, e: &Edge3, result: &mut Sweep) -> bool {
        let dpe = dp.div_element_wise(self.radii);
        let dpe_len = dpe.magnitude2();

        let ae = e.a.div_element_wise(self.radii);
        let be = e.b.div_element_wise(self.radii);

        let seg_dir = be - ae;
        let seg_sq_len = seg_dir.magnitude2();
        let a_dir = (e.a - self.pos).div_element_wise(self.radii);

        let seg_dot_dp = seg_dir.dot(dpe);
        let seg_dot_a = seg_dir.dot(a_dir);

        let t = match solve_quadratic(
            seg_dot_dp*seg_dot_dp - seg_sq_len*dpe_len,
            2.0*(seg_sq_len*dpe.dot(a_dir) - seg_dot_dp*seg_dot_a),
            seg_sq_len*(1.0 - a_dir.magnitude2()) + seg_dot_a*seg_dot_a)
        {
            Some(t) => t,
            None => return false //Missed the line.
        };

        if t < 0.0 || t > 1.0 {
            return false; //Moving away, or won't get there in time.
        }

        let et = (seg_dot_dp*t - seg_dot_a)/seg_sq_len;
        if et < 0.0 || et > 1.0 {
            return false; //Hit the line but missed the segment.
        }
        if !et.is_finite() {
            return false; //Degenerate segment.
        }

        result.prim = Some(Prim::Edge(*e));
        result.time = t;
        result.point = e.a.lerp(e.b, et);
        result.position = self.pos + dp*t;
        //Divided by the radii twice: once into sphere space, and once
        //more for the inverse-transpose normal transform.
        result.normal = (result.position - result.point)
            .div_element_wise(self.radii)
            .div_element_wise(self.radii)
            .normalize();
        true
    }

    fn sweep_tri(&self, dp: Vector3<f32>, t: &Tri3, result: &mut Sweep) -> bool {
        let p0 = self.pos.div_element_wise(self.radii);
        let c_dir = dp.div_element_wise(self.radii);

        let scaled = Tri3::new(
            t.a.div_element_wise(self.radii),
            t.b.div_element_wise(self.radii),
            t.c.div_element_wise(self.radii)
        );

        let plane = tri::plane(&scaled);
        let time = sweep_sphere_plane(p0, c_dir, plane, 1.0);
        if time.is_nan() || time <= 0.0 || time >= 1.0 {
            return false; //Moving away, or won't get there in time.
        }

        let position = self.pos + dp*time;
        let bary = tri::barycentric(t, position);
        if !tri::bary_contained(bary) {
            //The contact projects outside the triangle interior. The
            //earliest contact, if any, is against one of the edges.
            let edges = [
                Edge3::new(t.a, t.b),
                Edge3::new(t.b, t.c),
                Edge3::new(t.c, t.a)
            ];

            let mut first = Sweep::new();
            let mut current = Sweep::new();
            for edge in &edges {
                if self.sweep_edge(dp, edge, &mut current) && current.time < first.time {
                    first.set(&current);
                }
            }

            if !first.hit() {
                return false;
            }
            result.set(&first);
            result.prim = Some(Prim::Tri(*t));
            return true;
        }

        result.prim = Some(Prim::Tri(*t));
        result.time = time;
        result.point = tri::interpolate(t, bary);
        result.position = position;
        result.normal = (position - result.point).normalize();
        true
    }

    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos - self.radii, self.pos + self.radii)
    }
}
