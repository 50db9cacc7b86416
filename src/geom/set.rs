//! Aggregation of multiple geometries behind a single query interface.
//!
//! A set culls whole children by their bounding boxes before handing
//! the query down, so one broad test skips an entire mesh. Children
//! whose bounds went stale are updated before the set's own box is
//! rebuilt.

use std::cell::Cell;
use std::slice;

use ::cgmath::Vector3;

use super::aabb::Aabb;
use super::query::{Geometry, Isect, Query, Ray, Sweep};
use super::shape::ConvexShape;

pub struct GeoSet {
    geoms: Vec<Box<Geometry>>,
    bounds: Cell<Aabb>,
    bounds_dirty: Cell<bool>
}

impl GeoSet {
    pub fn new() -> GeoSet {
        GeoSet {
            geoms: Vec::new(),
            bounds: Cell::new(Aabb::empty()),
            bounds_dirty: Cell::new(true)
        }
    }

    pub fn add(&mut self, geom: Box<Geometry>) {
        self.geoms.push(geom);
        self.bounds_dirty.set(true);
    }

    pub fn clear(&mut self) {
        self.geoms.clear();
        self.bounds_dirty.set(true);
    }

    pub fn len(&self) -> usize {
        self.geoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geoms.is_empty()
    }
}

impl Geometry for GeoSet {
    fn ray<'a>(&'a self, p0: Vector3<f32>, dp: Vector3<f32>, terminated: bool) -> Box<Query<Ray> + 'a> {
        Box::new(SetQuery::new(&self.geoms, Box::new(move |geom: &'a Geometry| {
            if geom.bounds().touching_ray(p0, dp, terminated) {
                Some(geom.ray(p0, dp, terminated))
            } else {
                None
            }
        })))
    }

    fn isect<'a>(&'a self, shape: &'a ConvexShape) -> Box<Query<Isect> + 'a> {
        let shape_bounds = shape.bounds();
        Box::new(SetQuery::new(&self.geoms, Box::new(move |geom: &'a Geometry| {
            if geom.bounds().touching(&shape_bounds) {
                Some(geom.isect(shape))
            } else {
                None
            }
        })))
    }

    fn sweep<'a>(&'a self, shape: &'a ConvexShape, dp: Vector3<f32>) -> Box<Query<Sweep> + 'a> {
        let mut swept_bounds = shape.bounds();
        swept_bounds.sweep(dp);
        Box::new(SetQuery::new(&self.geoms, Box::new(move |geom: &'a Geometry| {
            if geom.bounds().touching(&swept_bounds) {
                Some(geom.sweep(shape, dp))
            } else {
                None
            }
        })))
    }

    fn bounds(&self) -> Aabb {
        if self.are_bounds_dirty() {
            self.update_bounds();
        }
        self.bounds.get()
    }

    fn are_bounds_dirty(&self) -> bool {
        self.bounds_dirty.get() || self.geoms.iter().any(|geom| geom.are_bounds_dirty())
    }

    fn mark_bounds_dirty(&self) {
        self.bounds_dirty.set(true);
        for geom in &self.geoms {
            geom.mark_bounds_dirty();
        }
    }

    fn update_bounds(&self) {
        let mut bounds = Aabb::empty();
        for geom in &self.geoms {
            if geom.are_bounds_dirty() {
                geom.update_bounds();
            }
            bounds.expand(&geom.bounds());
        }
        self.bounds.set(bounds);
        self.bounds_dirty.set(false);
    }
}

/// Chains the per-child queries produced by `make`, skipping children
/// it culled (`None`) and children whose queries are exhausted.
struct SetQuery<'a, R> {
    geoms: slice::Iter<'a, Box<Geometry>>,
    current: Option<Box<Query<R> + 'a>>,
    make: Box<Fn(&'a Geometry) -> Option<Box<Query<R> + 'a>> + 'a>
}

impl<'a, R> SetQuery<'a, R> {
    fn new(geoms: &'a [Box<Geometry>],
           make: Box<Fn(&'a Geometry) -> Option<Box<Query<R> + 'a>> + 'a>) -> SetQuery<'a, R>
    {
        let mut query = SetQuery {
            geoms: geoms.iter(),
            current: None,
            make
        };
        query.advance();
        query
    }

    fn advance(&mut self) {
        loop {
            let exhausted = match self.current {
                Some(ref query) => !query.has_next(),
                None => true
            };
            if !exhausted {
                return;
            }

            match self.geoms.next() {
                Some(geom) => self.current = (self.make)(&**geom),
                None => {
                    self.current = None;
                    return;
                }
            }
        }
    }
}

impl<'a, R> Query<R> for SetQuery<'a, R> {
    fn has_next(&self) -> bool {
        match self.current {
            Some(ref query) => query.has_next(),
            None => false
        }
    }

    fn next(&mut self, result: &mut R) -> bool {
        let hit = match self.current {
            Some(ref mut query) => query.next(result),
            None => return false
        };
        self.advance();
        hit
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use ::cgmath::prelude::*;
    use geom::mesh::GeoMesh;
    use geom::shape::Ellipsoid;

    fn floor_mesh(y: f32) -> GeoMesh {
        GeoMesh::from_indexed(
            vec![
                Vector3::new(-5.0, y, -5.0),
                Vector3::new(5.0, y, -5.0),
                Vector3::new(5.0, y, 5.0),
                Vector3::new(-5.0, y, 5.0)
            ],
            vec![[0, 2, 1], [0, 3, 2]]
        )
    }

    /// Wraps a geometry and counts how many candidates its queries
    /// actually produced, to observe whether a set culled it.
    struct Counting {
        mesh: GeoMesh,
        tested: Rc<Cell<usize>>
    }

    struct CountingQuery<'a, R> {
        inner: Box<Query<R> + 'a>,
        tested: Rc<Cell<usize>>
    }

    impl<'a, R> Query<R> for CountingQuery<'a, R> {
        fn has_next(&self) -> bool {
            self.inner.has_next()
        }

        fn next(&mut self, result: &mut R) -> bool {
            self.tested.set(self.tested.get() + 1);
            self.inner.next(result)
        }
    }

    impl Geometry for Counting {
        fn ray<'a>(&'a self, p0: Vector3<f32>, dp: Vector3<f32>, terminated: bool) -> Box<Query<Ray> + 'a> {
            Box::new(CountingQuery {
                inner: self.mesh.ray(p0, dp, terminated),
                tested: self.tested.clone()
            })
        }

        fn isect<'a>(&'a self, shape: &'a ConvexShape) -> Box<Query<Isect> + 'a> {
            Box::new(CountingQuery {
                inner: self.mesh.isect(shape),
                tested: self.tested.clone()
            })
        }

        fn sweep<'a>(&'a self, shape: &'a ConvexShape, dp: Vector3<f32>) -> Box<Query<Sweep> + 'a> {
            Box::new(CountingQuery {
                inner: self.mesh.sweep(shape, dp),
                tested: self.tested.clone()
            })
        }

        fn bounds(&self) -> Aabb {
            self.mesh.bounds()
        }
    }

    #[test]
    fn test_ray_reaches_across_children() {
        let mut set = GeoSet::new();
        set.add(Box::new(floor_mesh(0.0)));
        set.add(Box::new(floor_mesh(-2.0)));

        let result = set.ray_first(Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, -10.0, 0.0), true);
        assert!(result.hit());
        assert!((result.point.y - 0.0).abs() < 1e-5, "Upper floor should be hit first, got {:?}", result.point);
    }

    #[test]
    fn test_culled_child_is_never_queried() {
        let near = Rc::new(Cell::new(0));
        let far = Rc::new(Cell::new(0));

        let mut set = GeoSet::new();
        set.add(Box::new(Counting { mesh: floor_mesh(0.0), tested: near.clone() }));

        let mut far_mesh = floor_mesh(0.0);
        for vert in far_mesh.verts.iter_mut() {
            vert.x += 100.0;
        }
        far_mesh.mark_bounds_dirty();
        set.add(Box::new(Counting { mesh: far_mesh, tested: far.clone() }));

        let sphere = Ellipsoid::new(Vector3::new(0.0, 2.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let result = set.sweep_first(&sphere, Vector3::new(0.0, -2.0, 0.0));

        assert!(result.hit());
        assert!(near.get() > 0, "In-bounds child should have been tested");
        assert_eq!(far.get(), 0, "Out-of-bounds child should have been culled entirely");
    }

    #[test]
    fn test_exhausted_child_does_not_end_query() {
        // First child overlaps the sweep but contains no primitives;
        // the query must move on to the second child regardless.
        let mut set = GeoSet::new();
        set.add(Box::new(GeoMesh::from_indexed(Vec::new(), Vec::new())));
        set.add(Box::new(floor_mesh(0.0)));

        let sphere = Ellipsoid::new(Vector3::new(0.0, 3.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let result = set.sweep_first(&sphere, Vector3::new(0.0, -4.0, 0.0));
        assert!(result.hit(), "Empty first child must not end the whole set query");
    }

    #[test]
    fn test_bounds_union_and_dirty_propagation() {
        let mut set = GeoSet::new();
        set.add(Box::new(floor_mesh(0.0)));
        set.add(Box::new(floor_mesh(-2.0)));

        let bounds = set.bounds();
        assert_eq!(bounds.min, Vector3::new(-5.0, -2.0, -5.0));
        assert_eq!(bounds.max, Vector3::new(5.0, 0.0, 5.0));
        assert!(!set.are_bounds_dirty());

        set.mark_bounds_dirty();
        assert!(set.are_bounds_dirty());
        assert_eq!(set.bounds(), bounds);
        assert!(!set.are_bounds_dirty());
    }

    #[test]
    fn test_empty_set_misses() {
        let set = GeoSet::new();
        let sphere = Ellipsoid::new(Vector3::zero(), Vector3::new(1.0, 1.0, 1.0));

        assert!(!set.ray_first(Vector3::zero(), Vector3::new(0.0, -1.0, 0.0), false).hit());
        assert!(!set.isect_deepest(&sphere).hit());
        assert!(!set.sweep_first(&sphere, Vector3::new(1.0, 0.0, 0.0)).hit());
    }

    #[test]
    fn test_empty_set_bounds_are_empty() {
        let set = GeoSet::new();
        assert_eq!(set.bounds(), Aabb::empty());
    }
}
