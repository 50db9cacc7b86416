//! Incremental ray traversal through a unit voxel grid.
//!
//! Amanatides-Woo style: after clipping the ray against the whole grid,
//! the trace steps one voxel at a time along the dominant axis of the
//! accumulated slab times. The trace only enumerates voxels, hit
//! detection against their contents is up to the caller.

use std::f32::INFINITY;

use ::cgmath::Vector3;

use super::aabb::Aabb;

/// The 6 sides of a voxel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    X0, X1, Y0, Y1, Z0, Z1
}

impl Side {
    /// Returns which side of a voxel the given direction would hit if
    /// it started in the middle of the voxel.
    pub fn from_dir(dir: Vector3<f32>) -> Side {
        let mut max = dir.x.abs();
        let mut side = if dir.x > 0.0 { Side::X1 } else { Side::X0 };

        let max_y = dir.y.abs();
        if max_y > max {
            max = max_y;
            side = if dir.y > 0.0 { Side::Y1 } else { Side::Y0 };
        }

        let max_z = dir.z.abs();
        if max_z > max {
            side = if dir.z > 0.0 { Side::Z1 } else { Side::Z0 };
        }

        side
    }
}

/// A trace in progress. `side` and `time` describe the face through
/// which the voxel that the next call to `next` returns was entered.
pub struct VoxelTrace {
    /// Whether the ray touched the grid at all. When false the trace
    /// yields no voxels.
    pub hit: bool,
    bounds: Aabb<i32>,
    ray: Vector3<f32>,
    dir: Vector3<f32>,
    voxel: Vector3<i32>,
    side: Side,
    step: Vector3<i32>,
    t_max: Vector3<f32>,
    t_delta: Vector3<f32>
}

impl VoxelTrace {
    /// Sets up a trace through `bounds` (cell coordinates, max
    /// exclusive) along the ray `ray + t*dir`.
    pub fn new(bounds: Aabb<i32>, ray: Vector3<f32>, dir: Vector3<f32>) -> VoxelTrace {
        //Clip against the whole volume first.
        let mut tx0 = (bounds.min.x as f32 - ray.x)/dir.x;
        let mut tx1 = (bounds.max.x as f32 - ray.x)/dir.x;
        let mut ty0 = (bounds.min.y as f32 - ray.y)/dir.y;
        let mut ty1 = (bounds.max.y as f32 - ray.y)/dir.y;
        let mut tz0 = (bounds.min.z as f32 - ray.z)/dir.z;
        let mut tz1 = (bounds.max.z as f32 - ray.z)/dir.z;

        if tx0.is_nan() { tx0 = -INFINITY }
        if tx1.is_nan() { tx1 = INFINITY }
        if ty0.is_nan() { ty0 = -INFINITY }
        if ty1.is_nan() { ty1 = INFINITY }
        if tz0.is_nan() { tz0 = -INFINITY }
        if tz1.is_nan() { tz1 = INFINITY }

        let (t_min_x, min_side_x, t_max_x) =
            if tx0 < tx1 { (tx0, Side::X0, tx1) } else { (tx1, Side::X1, tx0) };
        let (t_min_y, min_side_y, t_max_y) =
            if ty0 < ty1 { (ty0, Side::Y0, ty1) } else { (ty1, Side::Y1, ty0) };
        let (t_min_z, min_side_z, t_max_z) =
            if tz0 < tz1 { (tz0, Side::Z0, tz1) } else { (tz1, Side::Z1, tz0) };

        //The entry face is on the axis entered last.
        let mut t_min = t_min_x;
        let mut start_side = min_side_x;
        if t_min_y > t_min {
            t_min = t_min_y;
            start_side = min_side_y;
        }
        if t_min_z > t_min {
            t_min = t_min_z;
            start_side = min_side_z;
        }

        let mut t_max = t_max_x;
        if t_max_y < t_max { t_max = t_max_y }
        if t_max_z < t_max { t_max = t_max_z }

        let hit = t_max >= t_min && t_max >= 0.0;
        let started_outside = t_min >= 0.0;
        let start = if started_outside { ray + dir*t_min } else { ray };

        let mut trace = VoxelTrace {
            hit,
            bounds,
            ray,
            dir,
            voxel: Vector3::new(0, 0, 0),
            side: start_side,
            step: Vector3::new(0, 0, 0),
            t_max: Vector3::new(INFINITY, INFINITY, INFINITY),
            t_delta: Vector3::new(INFINITY, INFINITY, INFINITY)
        };

        if hit {
            let mut voxel = Vector3::new(
                start.x.floor() as i32,
                start.y.floor() as i32,
                start.z.floor() as i32
            );

            //The entry point may land just outside due to rounding.
            if voxel.x < bounds.min.x { voxel.x = bounds.min.x }
            if voxel.y < bounds.min.y { voxel.y = bounds.min.y }
            if voxel.z < bounds.min.z { voxel.z = bounds.min.z }
            if voxel.x >= bounds.max.x { voxel.x = bounds.max.x - 1 }
            if voxel.y >= bounds.max.y { voxel.y = bounds.max.y - 1 }
            if voxel.z >= bounds.max.z { voxel.z = bounds.max.z - 1 }

            let step = Vector3::new(
                if dir.x >= 0.0 { 1 } else { -1 },
                if dir.y >= 0.0 { 1 } else { -1 },
                if dir.z >= 0.0 { 1 } else { -1 }
            );

            let next_x = if step.x >= 0 { (voxel.x + 1) as f32 - start.x } else { voxel.x as f32 - start.x };
            let next_y = if step.y >= 0 { (voxel.y + 1) as f32 - start.y } else { voxel.y as f32 - start.y };
            let next_z = if step.z >= 0 { (voxel.z + 1) as f32 - start.z } else { voxel.z as f32 - start.z };

            trace.voxel = voxel;
            trace.step = step;
            trace.t_max = Vector3::new(
                if dir.x != 0.0 { next_x/dir.x } else { INFINITY },
                if dir.y != 0.0 { next_y/dir.y } else { INFINITY },
                if dir.z != 0.0 { next_z/dir.z } else { INFINITY }
            );
            trace.t_delta = Vector3::new(
                step.x as f32/dir.x,
                step.y as f32/dir.y,
                step.z as f32/dir.z
            );
        }

        trace
    }

    /// Returns true if the trace has another voxel inside the grid.
    pub fn has_next(&self) -> bool {
        self.hit
            && self.voxel.x >= self.bounds.min.x
            && self.voxel.y >= self.bounds.min.y
            && self.voxel.z >= self.bounds.min.z
            && self.voxel.x < self.bounds.max.x
            && self.voxel.y < self.bounds.max.y
            && self.voxel.z < self.bounds.max.z
    }

    /// Returns T such that `ray + dir*T` lies on the face reported by
    /// `side`.
    pub fn time(&self) -> f32 {
        match self.side {
            Side::X0 => (self.voxel.x as f32 - self.ray.x)/self.dir.x,
            Side::X1 => (self.voxel.x as f32 - self.ray.x + 1.0)/self.dir.x,
            Side::Y0 => (self.voxel.y as f32 - self.ray.y)/self.dir.y,
            Side::Y1 => (self.voxel.y as f32 - self.ray.y + 1.0)/self.dir.y,
            Side::Z0 => (self.voxel.z as f32 - self.ray.z)/self.dir.z,
            Side::Z1 => (self.voxel.z as f32 - self.ray.z + 1.0)/self.dir.z
        }
    }

    /// Returns which voxel face the trace last passed through.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Steps the trace forward and returns the voxel it was on. The
    /// first call returns the first voxel the trace hit.
    pub fn next(&mut self) -> Vector3<i32> {
        let result = self.voxel;

        if self.t_max.x < self.t_max.y {
            if self.t_max.x < self.t_max.z {
                self.t_max.x += self.t_delta.x;
                self.voxel.x += self.step.x;
                self.side = if self.step.x > 0 { Side::X0 } else { Side::X1 };
            } else {
                self.t_max.z += self.t_delta.z;
                self.voxel.z += self.step.z;
                self.side = if self.step.z > 0 { Side::Z0 } else { Side::Z1 };
            }
        } else if self.t_max.y < self.t_max.z {
            self.t_max.y += self.t_delta.y;
            self.voxel.y += self.step.y;
            self.side = if self.step.y > 0 { Side::Y0 } else { Side::Y1 };
        } else {
            self.t_max.z += self.t_delta.z;
            self.voxel.z += self.step.z;
            self.side = if self.step.z > 0 { Side::Z0 } else { Side::Z1 };
        }

        result
    }
}
