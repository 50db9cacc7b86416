extern crate walkabout;
#[macro_use] extern crate log;
extern crate simplelog;
extern crate chrono;
extern crate cgmath;

mod common;

use std::cell::Cell;
use std::rc::Rc;

use cgmath::Vector3;
use cgmath::prelude::*;

use walkabout::{ActorDriver, GeoMesh, GeoSet, Geometry};

const DT: f32 = 1.0/60.0;

/// Builds the test room: a floor with a 0.2 high platform starting at
/// z = 3, closed off by a wall at z = 7.
///
///         y
///         |          wall
///         |           |
///         |   ________|     y = 0.2
///   ______|__|        |     y = 0
///         |  z=3      z=7
fn build_room() -> GeoSet {
    let terrain = GeoMesh::from_indexed(
        vec![
            //Floor
            Vector3::new(-10.0, 0.0, -10.0),
            Vector3::new(10.0, 0.0, -10.0),
            Vector3::new(10.0, 0.0, 3.0),
            Vector3::new(-10.0, 0.0, 3.0),
            //Platform top
            Vector3::new(-10.0, 0.2, 3.0),
            Vector3::new(10.0, 0.2, 3.0),
            Vector3::new(10.0, 0.2, 10.0),
            Vector3::new(-10.0, 0.2, 10.0),
        ],
        vec![
            [0, 2, 1], [0, 3, 2], //Floor
            [4, 6, 5], [4, 7, 6], //Platform top
            [3, 4, 5], [3, 5, 2], //Platform front
        ]
    );

    let wall = GeoMesh::from_indexed(
        vec![
            Vector3::new(-10.0, 0.0, 7.0),
            Vector3::new(10.0, 0.0, 7.0),
            Vector3::new(10.0, 3.0, 7.0),
            Vector3::new(-10.0, 3.0, 7.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]]
    );

    let mut room = GeoSet::new();
    room.add(Box::new(terrain));
    room.add(Box::new(wall));
    room
}

#[cfg_attr(not(feature = "expensive_tests"), ignore)]
#[test]
/// Drops an actor into the room, walks it up the platform step and
/// against the wall, then jumps in place.
fn walking_test() {
    common::init_test_logging("walking-test");

    let room = build_room();

    //The whole room should be visible to a downward raycast.
    let ray = room.ray_first(Vector3::new(0.0, 5.0, 5.0), Vector3::new(0.0, -10.0, 0.0), true);
    assert!(ray.hit());
    assert!((ray.point.y - 0.2).abs() < 1e-5, "Raycast above the platform should hit its top");

    let landings = Rc::new(Cell::new(0));
    let landings_cb = landings.clone();

    let mut driver = ActorDriver::new();
    driver.shape.pos = Vector3::new(0.0, 1.5, -2.0);
    driver.land_callback = Some(Box::new(move |_| {
        landings_cb.set(landings_cb.get() + 1);
    }));

    //Phase 1: fall onto the floor.
    info!("Dropping actor from {:?}", driver.shape.pos);
    for _ in 0..300 {
        driver.step(Some(&room), DT);
        if driver.on_ground() {
            break;
        }
    }
    assert!(driver.on_ground(), "Actor should have landed on the floor");
    assert_eq!(landings.get(), 1);
    assert!(driver.feet_pos().y.abs() < 0.05,
        "Feet should rest on the floor, got {}", driver.feet_pos().y);

    //Phase 2: walk towards the wall, climbing the platform on the way.
    info!("Walking towards the wall from {:?}", driver.shape.pos);
    driver.move_dir = Vector3::new(0.0, 0.0, 1.0);
    for i in 0..600 {
        driver.step(Some(&room), DT);
        if i > 5 {
            assert!(driver.on_ground(),
                "Walking over the step must not lose ground contact (step {}, pos {:?})", i, driver.shape.pos);
        }
        assert!(driver.vel.magnitude() <= driver.max_speed + 0.1,
            "Speed {} exceeds the maximum", driver.vel.magnitude());
    }

    info!("Actor stopped at {:?}", driver.shape.pos);
    assert!(driver.shape.pos.z > 6.0, "Actor should have reached the wall, got {:?}", driver.shape.pos);
    assert!(driver.shape.pos.z < 6.9, "Wall should have blocked the actor, got {:?}", driver.shape.pos);
    assert!((driver.feet_pos().y - 0.2).abs() < 0.05,
        "Feet should rest on the platform, got {}", driver.feet_pos().y);

    let normal = driver.ground_normal().unwrap();
    assert!(normal.y > 0.99, "Platform top should be flat ground, got {:?}", normal);

    //Phase 3: jump in place and land again.
    driver.move_dir = Vector3::zero();
    driver.jump();
    assert!(!driver.on_ground(), "Jumping must leave the ground");

    let apex_start = driver.shape.pos.y;
    let mut apex = apex_start;
    for _ in 0..600 {
        driver.step(Some(&room), DT);
        if driver.shape.pos.y > apex {
            apex = driver.shape.pos.y;
        }
        if driver.on_ground() {
            break;
        }
    }

    info!("Jump reached {} and landed at {:?}", apex, driver.shape.pos);
    assert!(driver.on_ground(), "Actor should land again after jumping");
    assert_eq!(landings.get(), 2);
    assert!(apex > apex_start + 0.3, "Jump should have gained height, got {}", apex - apex_start);
    assert!((driver.feet_pos().y - 0.2).abs() < 0.05,
        "Feet should be back on the platform, got {}", driver.feet_pos().y);
}
