//! Axis-aligned bounding boxes over f32, f64 and i32 scalars.
//!
//! The empty box is canonically `min = +inf, max = -inf` per axis (or
//! `i32::MAX`/`i32::MIN` for integer boxes), so that expansion is the
//! identity on an empty box and union stays associative and commutative.

use std::i32;

use ::cgmath::{BaseFloat, BaseNum, Vector3};
use ::cgmath::prelude::*;

use super::prim::{Edge3, Tri3};

/// An axis-aligned bounding box in 3D. Invariant when non-empty:
/// `min.axis <= max.axis` on every axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb<S = f32> {
    pub min: Vector3<S>,
    pub max: Vector3<S>
}

impl<S> Aabb<S>
    where S: BaseNum
{
    pub fn new(min: Vector3<S>, max: Vector3<S>) -> Aabb<S> {
        Aabb { min, max }
    }

    /// Returns whether the two boxes overlap, boundaries included.
    pub fn touching(&self, other: &Aabb<S>) -> bool {
        self.max.x >= other.min.x && other.max.x >= self.min.x &&
            self.max.y >= other.min.y && other.max.y >= self.min.y &&
            self.max.z >= other.min.z && other.max.z >= self.min.z
    }

    /// Returns whether the other box is totally enclosed by this one.
    pub fn encloses(&self, other: &Aabb<S>) -> bool {
        self.max.x >= other.max.x && self.min.x <= other.min.x &&
            self.max.y >= other.max.y && self.min.y <= other.min.y &&
            self.max.z >= other.max.z && self.min.z <= other.min.z
    }

    /// Returns whether the given point lies within this box, boundaries
    /// included.
    pub fn touching_point(&self, p: Vector3<S>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
            p.y >= self.min.y && p.y <= self.max.y &&
            p.z >= self.min.z && p.z <= self.max.z
    }

    /// Expands this box to contain the given point.
    pub fn expand_point(&mut self, p: Vector3<S>) {
        if p.x < self.min.x { self.min.x = p.x }
        if p.y < self.min.y { self.min.y = p.y }
        if p.z < self.min.z { self.min.z = p.z }
        if p.x > self.max.x { self.max.x = p.x }
        if p.y > self.max.y { self.max.y = p.y }
        if p.z > self.max.z { self.max.z = p.z }
    }

    /// Expands this box to contain the given box.
    pub fn expand(&mut self, other: &Aabb<S>) {
        self.expand_point(other.min);
        self.expand_point(other.max);
    }

    /// Translates this box by the given offset.
    pub fn translate(&mut self, dp: Vector3<S>) {
        self.min += dp;
        self.max += dp;
    }
}

impl<S> Aabb<S>
    where S: BaseFloat
{
    /// The empty box. Behaves well during expansion.
    pub fn empty() -> Aabb<S> {
        Aabb {
            min: Vector3::from_value(S::infinity()),
            max: Vector3::from_value(S::neg_infinity())
        }
    }

    /// A cube of width 2, centered around the origin.
    pub fn unit() -> Aabb<S> {
        Aabb {
            min: Vector3::from_value(-S::one()),
            max: Vector3::from_value(S::one())
        }
    }

    /// The infinitely large box.
    pub fn infinite() -> Aabb<S> {
        Aabb {
            min: Vector3::from_value(S::neg_infinity()),
            max: Vector3::from_value(S::infinity())
        }
    }

    /// The smallest box containing all of the given points. Empty if the
    /// iterator is empty.
    pub fn from_points<P>(points: P) -> Aabb<S>
        where P: IntoIterator<Item = Vector3<S>>
    {
        let mut aabb = Aabb::empty();
        for p in points {
            aabb.expand_point(p);
        }
        aabb
    }

    /// The smallest box enclosing all of the boxes in the given iterator.
    pub fn union<A>(aabbs: A) -> Aabb<S>
        where A: IntoIterator<Item = Aabb<S>>
    {
        let mut aabb = Aabb::empty();
        for other in aabbs {
            aabb.expand(&other);
        }
        aabb
    }

    /// Sets this box to its intersection with the other, or to the empty
    /// box if they are disjoint.
    pub fn intersect(&mut self, other: &Aabb<S>) {
        let min_x = if self.min.x > other.min.x { self.min.x } else { other.min.x };
        let min_y = if self.min.y > other.min.y { self.min.y } else { other.min.y };
        let min_z = if self.min.z > other.min.z { self.min.z } else { other.min.z };
        let max_x = if self.max.x < other.max.x { self.max.x } else { other.max.x };
        let max_y = if self.max.y < other.max.y { self.max.y } else { other.max.y };
        let max_z = if self.max.z < other.max.z { self.max.z } else { other.max.z };

        if max_x < min_x || max_y < min_y || max_z < min_z {
            *self = Aabb::empty();
        } else {
            self.min = Vector3::new(min_x, min_y, min_z);
            self.max = Vector3::new(max_x, max_y, max_z);
        }
    }

    /// Expands this box to contain an offset copy of itself, bounding
    /// everything the box covers while moving along `dp`.
    pub fn sweep(&mut self, dp: Vector3<S>) {
        if dp.x < S::zero() { self.min.x = self.min.x + dp.x } else { self.max.x = self.max.x + dp.x }
        if dp.y < S::zero() { self.min.y = self.min.y + dp.y } else { self.max.y = self.max.y + dp.y }
        if dp.z < S::zero() { self.min.z = self.min.z + dp.z } else { self.max.z = self.max.z + dp.z }
    }

    /// Returns the parametric time at which a ray starting at `p0` with
    /// displacement `dp` enters this box (or the exit time when starting
    /// inside), or positive infinity if the ray misses. A terminated ray
    /// only hits within `t <= 1`.
    ///
    /// Slab method. Axis-parallel rays produce 0/0 = NaN slab times,
    /// which are normalized to the matching infinity so the interval
    /// intersection stays correct.
    pub fn raytrace(&self, p0: Vector3<S>, dp: Vector3<S>, terminated: bool) -> S {
        let mut tx0 = (self.min.x - p0.x)/dp.x;
        let mut tx1 = (self.max.x - p0.x)/dp.x;
        let mut ty0 = (self.min.y - p0.y)/dp.y;
        let mut ty1 = (self.max.y - p0.y)/dp.y;
        let mut tz0 = (self.min.z - p0.z)/dp.z;
        let mut tz1 = (self.max.z - p0.z)/dp.z;

        if tx0.is_nan() { tx0 = S::neg_infinity() }
        if tx1.is_nan() { tx1 = S::infinity() }
        if ty0.is_nan() { ty0 = S::neg_infinity() }
        if ty1.is_nan() { ty1 = S::infinity() }
        if tz0.is_nan() { tz0 = S::neg_infinity() }
        if tz1.is_nan() { tz1 = S::infinity() }

        let mut tmin = tx0.min(tx1);
        let mut tmax = tx0.max(tx1);
        tmin = tmin.max(ty0.min(ty1));
        tmax = tmax.min(ty0.max(ty1));
        tmin = tmin.max(tz0.min(tz1));
        tmax = tmax.min(tz0.max(tz1));

        if tmax >= tmin && tmax >= S::zero() && (!terminated || tmin <= S::one()) {
            if tmin >= S::zero() { tmin } else { tmax }
        } else {
            S::infinity()
        }
    }

    /// Returns whether the given ray touches this box.
    pub fn touching_ray(&self, p0: Vector3<S>, dp: Vector3<S>, terminated: bool) -> bool {
        self.raytrace(p0, dp, terminated).is_finite()
    }

    /// Returns the surface area of this box.
    pub fn surface_area(&self) -> S {
        let d = self.max - self.min;
        (d.x*d.y + d.y*d.z + d.z*d.x)*(S::one() + S::one())
    }
}

impl Aabb<f32> {
    /// The smallest box that can contain the given edge.
    pub fn contain_edge(e: &Edge3) -> Aabb<f32> {
        Aabb::from_points(vec![e.a, e.b])
    }

    /// The smallest box that can contain the given triangle.
    pub fn contain_tri(t: &Tri3) -> Aabb<f32> {
        Aabb::from_points(vec![t.a, t.b, t.c])
    }

    /// Returns whether this box touches the given edge.
    pub fn touching_edge(&self, e: &Edge3) -> bool {
        self.touching_ray(e.a, e.b - e.a, true)
    }
}

impl Aabb<i32> {
    /// The empty integer box. Behaves well during expansion.
    pub fn empty_i() -> Aabb<i32> {
        Aabb {
            min: Vector3::from_value(i32::MAX),
            max: Vector3::from_value(i32::MIN)
        }
    }

    /// A grid of the given dimensions with its minimum corner at the
    /// origin. `max` is exclusive when used as cell bounds.
    pub fn grid(width: i32, height: i32, depth: i32) -> Aabb<i32> {
        Aabb {
            min: Vector3::new(0, 0, 0),
            max: Vector3::new(width, height, depth)
        }
    }
}
