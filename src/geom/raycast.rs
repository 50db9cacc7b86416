//! Ray-versus-triangle intersection.

use ::cgmath::Vector3;
use ::cgmath::prelude::*;

use super::prim::{Prim, Tri3};
use super::query::Ray;

/// Casts the ray `p0 + t*dp` against the given triangle, writing the
/// result into `result` and returning whether the ray hit. A terminated
/// ray is a segment: hits past `t = 1` are rejected. Backfaces are hit
/// like frontfaces, with the reported normal flipped to face the ray
/// origin.
pub fn raycast(t: &Tri3, p0: Vector3<f32>, dp: Vector3<f32>, terminated: bool, result: &mut Ray) -> bool {
    let ab = t.b - t.a;
    let ac = t.c - t.a;

    let mut n = ab.cross(ac);
    let mut d = -dp.dot(n);
    if d == 0.0 {
        return false; //Ray parallel to triangle.
    }
    let backface = d < 0.0;
    if backface {
        d = -d;
        n = -n;
    }

    let ood = 1.0/d;
    let ap = p0 - t.a;
    let time = ap.dot(n)*ood;
    if time < 0.0 {
        return false; //Ray behind triangle.
    }
    if terminated && time > 1.0 {
        return false; //Triangle too far.
    }

    //Barycentric numerators are tested against the unnormalized
    //denominator first, so a division only happens on a hit.
    let e = if backface { dp.cross(ap) } else { ap.cross(dp) };
    let v = ac.dot(e);
    if v < 0.0 || v > d {
        return false; //Missed triangle.
    }
    let w = -ab.dot(e);
    if w < 0.0 || v + w > d {
        return false; //Missed triangle.
    }

    let v = v*ood;
    let w = w*ood;
    let u = 1.0 - v - w;

    result.prim = Some(Prim::Tri(*t));
    result.time = time;
    result.point = t.a*u + t.b*v + t.c*w;
    result.normal = n.normalize();
    true
}

/// Convenience wrapper returning an owned result, a miss sentinel when
/// nothing was hit.
pub fn raycast_tri(t: &Tri3, p0: Vector3<f32>, dp: Vector3<f32>, terminated: bool) -> Ray {
    let mut result = Ray::new();
    if !raycast(t, p0, dp, terminated, &mut result) {
        result.reset();
    }
    result
}

#[cfg(test)]
mod test {

    use super::*;
    use geom::tri::barycentric;

    fn tri() -> Tri3 {
        Tri3::new(
            Vector3::new(-1.0, 0.0, -1.0),
            Vector3::new(1.0, 0.0, -1.0),
            Vector3::new(0.0, 0.0, 1.0)
        )
    }

    #[test]
    fn test_hit_through_centroid() {
        let t = tri();
        let centroid = (t.a + t.b + t.c)/3.0;
        let p0 = centroid + Vector3::new(0.0, 2.0, 0.0);
        let mut result = Ray::new();

        assert!(raycast(&t, p0, Vector3::new(0.0, -4.0, 0.0), true, &mut result));
        assert!((result.time - 0.5).abs() < 1e-5, "Expected hit at t = 0.5, got {}", result.time);
        assert!((result.point - centroid).magnitude() < 1e-5);
        assert!((result.normal.y - 1.0).abs() < 1e-5, "Normal should face the ray origin");

        let bary = barycentric(&t, result.point);
        assert!(bary.x >= 0.0 && bary.y >= 0.0 && bary.z >= 0.0);
        assert!((bary.x + bary.y + bary.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_backface_hit_flips_normal() {
        let t = tri();
        let p0 = Vector3::new(0.0, -2.0, 0.0);
        let mut result = Ray::new();

        assert!(raycast(&t, p0, Vector3::new(0.0, 4.0, 0.0), true, &mut result));
        assert!((result.normal.y + 1.0).abs() < 1e-5, "Backface normal should still face the ray origin");
    }

    #[test]
    fn test_parallel_ray_misses() {
        let t = tri();
        let mut result = Ray::new();
        assert!(!raycast(&t, Vector3::new(-5.0, 1.0, 0.0), Vector3::new(10.0, 0.0, 0.0), false, &mut result));
    }

    #[test]
    fn test_behind_origin_misses() {
        let t = tri();
        let mut result = Ray::new();
        assert!(!raycast(&t, Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 1.0, 0.0), false, &mut result),
            "Triangle behind the ray origin should not be hit");
    }

    #[test]
    fn test_terminated_ray_stops_short() {
        let t = tri();
        let p0 = Vector3::new(0.0, 2.0, 0.0);
        let dp = Vector3::new(0.0, -1.0, 0.0);
        let mut result = Ray::new();

        assert!(!raycast(&t, p0, dp, true, &mut result), "Segment ends a unit above the triangle");
        assert!(raycast(&t, p0, dp, false, &mut result), "Unterminated ray should reach it");
        assert!((result.time - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_miss_beside_triangle() {
        let t = tri();
        let mut result = Ray::new();
        assert!(!raycast(&t, Vector3::new(5.0, 2.0, 0.0), Vector3::new(0.0, -4.0, 0.0), true, &mut result));
    }
}
