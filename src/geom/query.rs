//! Query result records and the geometry query contract.
//!
//! Result records are caller-owned scratch structures: a query loop
//! owns one instance and overwrites it per candidate, so the engine
//! never allocates per-primitive. A miss is a sentinel value (`+inf`
//! time, `-inf` depth), never an error; fields other than the sentinel
//! are only meaningful while `hit()` is true.

use std::f32::{INFINITY, NEG_INFINITY};

use ::cgmath::{Vector3, Zero};

use super::aabb::Aabb;
use super::prim::Prim;
use super::shape::ConvexShape;

/// The result of casting a ray against a triangle.
#[derive(Debug, Clone)]
pub struct Ray {
    /// The triangle that was hit.
    pub prim: Option<Prim>,
    /// The interpolation parameter at the time of contact.
    pub time: f32,
    /// The point of contact.
    pub point: Vector3<f32>,
    /// The outward unit normal of the hit triangle.
    pub normal: Vector3<f32>
}

impl Ray {
    pub fn new() -> Ray {
        Ray {
            prim: None,
            time: INFINITY,
            point: Vector3::zero(),
            normal: Vector3::zero()
        }
    }

    /// Resets this result to prepare for a new cast.
    pub fn reset(&mut self) {
        self.time = INFINITY;
    }

    /// Copies the given result into this one.
    pub fn set(&mut self, other: &Ray) {
        self.prim = other.prim;
        self.time = other.time;
        self.point = other.point;
        self.normal = other.normal;
    }

    /// Returns whether the cast hit anything.
    pub fn hit(&self) -> bool {
        self.time.is_finite()
    }
}

/// The result of a static intersection test.
#[derive(Debug, Clone)]
pub struct Isect {
    /// The primitive that was intersected.
    pub prim: Option<Prim>,
    /// The deepest point on the intersected primitive within the shape.
    pub point: Vector3<f32>,
    /// The closest point on the shape's surface to the deepest point.
    pub surface: Vector3<f32>,
    /// The distance between the deepest point and the surface point.
    pub depth: f32,
    /// The separating normal at the surface point.
    pub normal: Vector3<f32>
}

impl Isect {
    pub fn new() -> Isect {
        Isect {
            prim: None,
            point: Vector3::zero(),
            surface: Vector3::zero(),
            depth: NEG_INFINITY,
            normal: Vector3::zero()
        }
    }

    /// Resets this result to prepare for a new intersection.
    pub fn reset(&mut self) {
        self.depth = NEG_INFINITY;
    }

    /// Copies the given result into this one.
    pub fn set(&mut self, other: &Isect) {
        self.prim = other.prim;
        self.point = other.point;
        self.surface = other.surface;
        self.depth = other.depth;
        self.normal = other.normal;
    }

    /// Returns whether the test touched anything.
    pub fn hit(&self) -> bool {
        self.depth.is_finite()
    }
}

/// The result of a swept collision test.
#[derive(Debug, Clone)]
pub struct Sweep {
    /// The primitive that was hit.
    pub prim: Option<Prim>,
    /// The interpolation parameter at the time of contact.
    pub time: f32,
    /// The point of contact between the swept shape and the primitive.
    pub point: Vector3<f32>,
    /// The surface normal of the primitive at the point of contact.
    pub normal: Vector3<f32>,
    /// The position of the swept shape at the time of contact.
    pub position: Vector3<f32>
}

impl Sweep {
    pub fn new() -> Sweep {
        Sweep {
            prim: None,
            time: INFINITY,
            point: Vector3::zero(),
            normal: Vector3::zero(),
            position: Vector3::zero()
        }
    }

    /// Resets this result to prepare for a new sweep.
    pub fn reset(&mut self) {
        self.time = INFINITY;
    }

    /// Copies the given result into this one.
    pub fn set(&mut self, other: &Sweep) {
        self.prim = other.prim;
        self.time = other.time;
        self.point = other.point;
        self.normal = other.normal;
        self.position = other.position;
    }

    /// Returns whether the sweep hit anything.
    pub fn hit(&self) -> bool {
        self.time.is_finite()
    }
}

/// Pull-style candidate iterator over one query. `next` tests the next
/// candidate, writing into the caller-owned result, and returns whether
/// *this* candidate was a hit; callers accumulate the best result
/// themselves.
pub trait Query<R> {
    fn has_next(&self) -> bool;
    fn next(&mut self, result: &mut R) -> bool;
}

/// A query that never yields a candidate.
pub struct EmptyQuery;

impl<R> Query<R> for EmptyQuery {
    fn has_next(&self) -> bool {
        false
    }

    fn next(&mut self, _result: &mut R) -> bool {
        false
    }
}

/// Contract for anything that can be raycast, intersected and swept
/// against. Containers without real bounds report the infinite box and
/// stay dirty-free, which excludes them from culling rather than
/// producing wrong culls.
pub trait Geometry {
    /// Casts a ray through this geometry, yielding a candidate test per
    /// triangle.
    fn ray<'a>(&'a self, p0: Vector3<f32>, dp: Vector3<f32>, terminated: bool) -> Box<Query<Ray> + 'a>;

    /// Intersects the given shape against this geometry, yielding a
    /// candidate test per primitive.
    fn isect<'a>(&'a self, shape: &'a ConvexShape) -> Box<Query<Isect> + 'a>;

    /// Sweeps the given shape along `dp` through this geometry,
    /// yielding a candidate test per primitive.
    fn sweep<'a>(&'a self, shape: &'a ConvexShape, dp: Vector3<f32>) -> Box<Query<Sweep> + 'a>;

    fn bounds(&self) -> Aabb {
        Aabb::infinite()
    }

    fn are_bounds_dirty(&self) -> bool {
        false
    }

    fn mark_bounds_dirty(&self) {
    }

    fn update_bounds(&self) {
    }

    /// Runs the ray query to exhaustion and returns the earliest hit,
    /// or a miss sentinel if nothing was hit.
    fn ray_first(&self, p0: Vector3<f32>, dp: Vector3<f32>, terminated: bool) -> Ray {
        let mut query = self.ray(p0, dp, terminated);
        let mut first = Ray::new();
        let mut current = Ray::new();

        while query.has_next() {
            if query.next(&mut current) && current.time < first.time {
                first.set(&current);
            }
        }

        first
    }

    /// Runs the intersection query to exhaustion and returns the
    /// deepest hit, or a miss sentinel if nothing was hit.
    fn isect_deepest(&self, shape: &ConvexShape) -> Isect {
        let mut query = self.isect(shape);
        let mut deepest = Isect::new();
        let mut current = Isect::new();

        while query.has_next() {
            if query.next(&mut current) && current.depth > deepest.depth {
                deepest.set(&current);
            }
        }

        deepest
    }

    /// Runs the sweep query to exhaustion and returns the earliest hit,
    /// or a miss sentinel if nothing was hit.
    fn sweep_first(&self, shape: &ConvexShape, dp: Vector3<f32>) -> Sweep {
        let mut query = self.sweep(shape, dp);
        let mut first = Sweep::new();
        let mut current = Sweep::new();

        while query.has_next() {
            if query.next(&mut current) && current.time < first.time {
                first.set(&current);
            }
        }

        first
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_miss_sentinels() {
        let ray = Ray::new();
        let isect = Isect::new();
        let sweep = Sweep::new();

        assert!(!ray.hit());
        assert!(!isect.hit());
        assert!(!sweep.hit());
    }

    #[test]
    fn test_reset_clears_hit() {
        let mut sweep = Sweep::new();
        sweep.time = 0.5;
        assert!(sweep.hit());
        sweep.reset();
        assert!(!sweep.hit());

        let mut isect = Isect::new();
        isect.depth = 0.25;
        assert!(isect.hit());
        isect.reset();
        assert!(!isect.hit());
    }

    #[test]
    fn test_set_copies_all_fields() {
        let mut a = Sweep::new();
        let mut b = Sweep::new();
        b.time = 0.25;
        b.point = Vector3::new(1.0, 2.0, 3.0);
        b.normal = Vector3::new(0.0, 1.0, 0.0);
        b.position = Vector3::new(4.0, 5.0, 6.0);

        a.set(&b);
        assert_eq!(a.time, 0.25);
        assert_eq!(a.point, b.point);
        assert_eq!(a.normal, b.normal);
        assert_eq!(a.position, b.position);
    }
}
