//! Character controller that moves an ellipsoid actor through geometry.
//!
//! Each `step` accelerates the actor towards its desired move
//! direction, integrates, then resolves the result against the level:
//! re-acquire the ground below the feet, track what an airborne actor
//! is sliding on, and nudge the shape out of anything it overlaps.
//! Ground contact is sticky across small dips and steps up to
//! `climb_height`, so walking over stairs does not launch the actor.

use ::cgmath::Vector3;
use ::cgmath::prelude::*;

use geom::prim::Prim;
use geom::query::{Geometry, Isect, Query, Sweep};
use geom::shape::Ellipsoid;

/// What the actor is standing on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Ground {
    /// A flat imaginary floor, as assigned by `set_flat_ground`. Keeps
    /// the actor walking when stepped without any geometry.
    Virtual,
    /// An actual contacted primitive.
    Geom(Prim)
}

/// Removes the component of `v` going into the surface with normal `n`,
/// leaving velocity away from the surface untouched.
fn restrain(v: Vector3<f32>, n: Vector3<f32>) -> Vector3<f32> {
    if n.dot(v) < 0.0 {
        v - n*(v.dot(n)/n.magnitude2())
    } else {
        v
    }
}

pub struct ActorDriver {
    /// Collision volume of the actor. `shape.pos` is its position.
    pub shape: Ellipsoid,
    pub vel: Vector3<f32>,
    /// The current desired movement direction.
    pub move_dir: Vector3<f32>,

    /// Constant downward acceleration.
    pub gravity: f32,
    /// How high a steep obstacle may be and still be stepped over.
    pub climb_height: f32,
    /// Minimum y component of a surface normal that counts as walkable
    /// ground. See `set_max_ground_incline`.
    pub ground_normal_min_y: f32,
    /// How close to the ground the actor needs to be to count as
    /// touching it, as a fraction of the climb height.
    pub ground_threshold: f32,
    /// Exponential decay rate at which the actor settles onto ground it
    /// is hovering above or below.
    pub ground_float_decay: f32,
    /// Exponential decay rate at which the actor is pushed out of
    /// geometry it overlaps.
    pub intersection_decay: f32,
    /// Maximum movement speed.
    pub max_speed: f32,
    /// Acceleration while on the ground.
    pub acceleration: f32,
    /// Acceleration while airborne. Zero disables air control.
    pub air_acceleration: f32,
    /// Vertical speed assigned on jumping.
    pub jump_speed: f32,

    pub jump_callback: Option<Box<FnMut()>>,
    pub fall_callback: Option<Box<FnMut()>>,
    /// Called on landing with the velocity change the impact caused.
    pub land_callback: Option<Box<FnMut(Vector3<f32>)>>,

    ground: Option<Ground>,
    ground_normal: Vector3<f32>,
    slide: Option<Prim>,
    slide_normal: Vector3<f32>,
    apply_gravity: bool
}

impl ActorDriver {
    pub fn new() -> ActorDriver {
        ActorDriver {
            shape: Ellipsoid::new(Vector3::zero(), Vector3::new(0.5, 0.875, 0.5)),
            vel: Vector3::zero(),
            move_dir: Vector3::zero(),
            gravity: 9.80665,
            climb_height: 0.25,
            ground_normal_min_y: (46.0f32).to_radians().cos(),
            ground_threshold: 1.0/64.0,
            ground_float_decay: 32.0,
            intersection_decay: 256.0,
            max_speed: 3.0,
            acceleration: 16.0,
            air_acceleration: 4.0,
            jump_speed: 4.0,
            jump_callback: None,
            fall_callback: None,
            land_callback: None,
            ground: None,
            ground_normal: Vector3::new(0.0, 1.0, 0.0),
            slide: None,
            slide_normal: Vector3::new(0.0, 1.0, 0.0),
            apply_gravity: false
        }
    }

    /// Sets the maximum angle of surfaces the actor can walk up.
    ///
    /// Panics unless the angle, in radians, is positive.
    pub fn set_max_ground_incline(&mut self, angle: f32) {
        assert!(angle > 0.0, "Ground incline must be positive, got {}", angle);
        self.ground_normal_min_y = angle.cos();
    }

    /// Sets the horizontal and vertical radii of the collision volume.
    ///
    /// Panics unless both are positive.
    pub fn set_radii(&mut self, horizontal: f32, vertical: f32) {
        assert!(horizontal > 0.0 && vertical > 0.0,
            "Radii must be positive, got {} and {}", horizontal, vertical);
        self.shape.radii = Vector3::new(horizontal, vertical, horizontal);
    }

    pub fn h_radius(&self) -> f32 {
        self.shape.radii.x
    }

    pub fn v_radius(&self) -> f32 {
        self.shape.radii.y
    }

    /// Returns the position of the actor's feet.
    pub fn feet_pos(&self) -> Vector3<f32> {
        let mut feet = self.shape.pos;
        feet.y -= self.shape.radii.y;
        feet
    }

    /// Whether the actor is currently on walkable ground.
    pub fn on_ground(&self) -> bool {
        self.ground.is_some()
    }

    /// What the actor is standing on, if anything.
    pub fn ground(&self) -> Option<Ground> {
        self.ground
    }

    /// The current ground normal, or `None` when airborne.
    pub fn ground_normal(&self) -> Option<Vector3<f32>> {
        if self.on_ground() {
            Some(self.ground_normal)
        } else {
            None
        }
    }

    /// Whether the actor is sliding along a surface other than solid
    /// ground.
    pub fn is_sliding(&self) -> bool {
        self.slide.is_some()
    }

    pub fn slide(&self) -> Option<Prim> {
        self.slide
    }

    /// The normal of the last surface the actor slid along, or the
    /// ground normal while on the ground.
    pub fn slide_normal(&self) -> Vector3<f32> {
        if self.on_ground() {
            self.ground_normal
        } else {
            self.slide_normal
        }
    }

    /// Makes the actor jump. Only possible when standing on something.
    pub fn jump(&mut self) {
        if !self.on_ground() {
            return;
        }
        self.vel.y = self.jump_speed;
        self.ground = None;
        if let Some(ref mut callback) = self.jump_callback {
            callback();
        }
    }

    /// Puts the actor on a virtual, flat floor. It stays grounded there
    /// until it jumps, falls or is stepped with real geometry.
    pub fn set_flat_ground(&mut self) {
        self.ground = Some(Ground::Virtual);
        self.ground_normal = Vector3::new(0.0, 1.0, 0.0);
    }

    /// Makes the actor fall immediately.
    pub fn fall(&mut self) {
        self.ground = None;
        if let Some(ref mut callback) = self.fall_callback {
            callback();
        }
    }

    fn walkable(&self, normal: Vector3<f32>) -> bool {
        normal.y >= self.ground_normal_min_y
    }

    fn apply_acc(&mut self, desired_vel: Vector3<f32>, acc: f32) {
        if acc == 0.0 {
            return;
        }

        let dv = desired_vel - self.vel;
        let dv_len = dv.magnitude();

        if dv_len > acc {
            self.vel += dv*(acc/dv_len);
        } else {
            self.vel = desired_vel;
        }
    }

    /// Steps the actor's simulation forward by `dt` against the given
    /// geometry. Without geometry only acceleration, gravity and
    /// integration run; a virtual ground persists and keeps suppressing
    /// gravity.
    pub fn step(&mut self, geom: Option<&Geometry>, dt: f32) {
        let start_on_ground = self.on_ground();
        let start_vel = self.vel;

        let want_to_move = !self.move_dir.is_zero();
        let mut adj_move_dir = self.move_dir;

        if start_on_ground {
            if want_to_move {
                //Walk along the ground plane rather than into it.
                adj_move_dir.y = -self.ground_normal.dot(adj_move_dir)
                    *adj_move_dir.magnitude()/self.ground_normal.y;
                let move_speed = adj_move_dir.magnitude();
                if move_speed > 1.0 {
                    adj_move_dir /= move_speed;
                }
                adj_move_dir *= self.max_speed;
            }

            let acc = self.acceleration*dt;
            self.apply_acc(adj_move_dir, acc);
        } else if want_to_move {
            let move_speed = adj_move_dir.magnitude();
            if move_speed > 1.0 {
                adj_move_dir /= move_speed;
            }
            adj_move_dir *= self.max_speed;
            adj_move_dir.y = self.vel.y;

            let acc = self.air_acceleration*dt;
            self.apply_acc(adj_move_dir, acc);
        }

        if self.apply_gravity {
            self.vel.y -= self.gravity*dt;
        }

        //Trapezoidal integration.
        let avg_vel = (start_vel + self.vel)*0.5;
        self.shape.pos += avg_vel*dt;

        self.apply_gravity = true;

        if let Some(geom) = geom {
            self.ground = None;
            self.slide = None;

            let step = Vector3::new(0.0, -2.0*self.climb_height, 0.0);
            let mut raised = self.shape.clone();
            raised.pos.y += self.climb_height;

            if start_on_ground {
                //Sweep down from above the feet and keep the earliest
                //walkable contact as the new ground.
                let mut sweep = Sweep::new();
                {
                    let mut query = geom.sweep(&raised, step);
                    let mut current = Sweep::new();
                    while query.has_next() {
                        if query.next(&mut current)
                            && self.walkable(current.normal)
                            && current.time < sweep.time
                        {
                            sweep.set(&current);
                        }
                    }
                }

                if sweep.hit() {
                    //Signed distance to the ground, negative when the
                    //feet are below it.
                    let ground_dist = (sweep.time*2.0 - 1.0)*self.climb_height;
                    self.shape.pos.y -= ground_dist*(1.0 - 0.5f32.powf(dt*self.ground_float_decay));
                    self.apply_gravity = (sweep.time - 0.5)*2.0 > self.ground_threshold;

                    self.ground = sweep.prim.map(Ground::Geom);
                    self.ground_normal = sweep.normal;
                }
            } else {
                let sweep = geom.sweep_first(&raised, step);
                if sweep.hit() {
                    self.slide = sweep.prim;
                    self.slide_normal = sweep.normal;
                }
            }

            //Clip against the level.
            let shape = self.shape.clone();
            let mut nudge = Vector3::zero();
            let mut nudge_count = 0;
            {
                let mut query = geom.isect(&shape);
                let mut isect = Isect::new();
                while query.has_next() {
                    if !query.next(&mut isect) {
                        continue;
                    }

                    nudge += isect.point - isect.surface;
                    nudge_count += 1;

                    let height = isect.point.y - shape.pos.y + shape.radii.y;
                    if height > self.climb_height {
                        self.vel = restrain(self.vel, isect.normal);
                    }

                    if self.walkable(isect.normal)
                        && (self.ground.is_none() || isect.normal.y > self.ground_normal.y)
                    {
                        self.ground = isect.prim.map(Ground::Geom);
                        self.ground_normal = isect.normal;
                    }
                }
            }

            //Average the nudges so overlapping several surfaces at once
            //does not teleport the actor.
            if nudge_count > 0 {
                nudge /= nudge_count as f32;
            }
            self.shape.pos += nudge*(1.0 - 0.5f32.powf(dt*self.intersection_decay));
        } else if start_on_ground {
            //No geometry to stand on or fall through, stay put.
            self.apply_gravity = false;
        }

        let end_on_ground = self.on_ground();
        if end_on_ground {
            self.vel.y = restrain(self.vel, self.ground_normal).y;
        }

        if !start_on_ground && end_on_ground {
            let impact = self.vel - start_vel;
            if let Some(ref mut callback) = self.land_callback {
                callback(impact);
            }
        }

        if start_on_ground && !end_on_ground {
            if let Some(ref mut callback) = self.fall_callback {
                callback();
            }
        }
    }
}
