// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end behavior of the physics system through its public API.

use glam::{DVec2, DVec3};
use planar_physics::{
    AxisPlane, BodyAttr, BodyConfig, BodyType, ChassisSource, Endpoint, JointConfig, JointKindConfig, PhysicsError,
    PhysicsSystem, ShapeConfig, ShapeKind, SleepMode, SpringConfig, SpringKindConfig, VehicleConfig,
    VehicleControls, WorldSettings, FIXED_TIME_STEP,
};
use planar_scene::{EntityData, EntityId, SceneData, Transform};

fn scene_with(names: &[&str]) -> (SceneData, Vec<EntityId>) {
    let mut scene = SceneData::new();
    let ids = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let position = DVec3::new(i as f64 * 2.0, 0.0, 1.0);
            scene.add_entity(EntityData::new(*name).with_transform(Transform::from_position(position)))
        })
        .collect();
    (scene, ids)
}

fn system() -> PhysicsSystem {
    PhysicsSystem::new(&WorldSettings::default()).unwrap()
}

#[test]
fn test_projection_round_trip_every_plane() {
    let position = DVec3::new(3.25, -1.5, 8.0);
    for plane in [AxisPlane::XY, AxisPlane::XZ, AxisPlane::YZ] {
        let mut euler = DVec3::ZERO;
        euler[plane.normal_axis()] = 33.0;
        let (back, rotation) = plane.unproject(plane.project(position, euler), position);
        assert_eq!(back, position, "{plane:?}");
        assert!((rotation[plane.normal_axis()] - 33.0).abs() < 1e-9, "{plane:?}");
    }
}

#[test]
fn test_step_is_bounded_by_sub_step_cap() {
    let (mut scene, ids) = scene_with(&["Falling"]);
    let mut system = system();
    system.add_body(ids[0], BodyConfig::default(), &scene).unwrap();

    let report = system.update(1.0, &mut scene);
    assert_eq!(report.sub_steps, 10);
    assert!((report.simulated_time - 10.0 * FIXED_TIME_STEP).abs() < 1e-12);
    assert!(report.dropped_time > 0.0);

    let report = system.update(3.0 * FIXED_TIME_STEP, &mut scene);
    assert_eq!(report.sub_steps, 3);
    assert_eq!(report.dropped_time, 0.0);

    let report = system.update(0.0, &mut scene);
    assert_eq!(report.sub_steps, 0);
}

#[test]
fn test_joint_attached_once_in_any_order() {
    #[derive(Clone, Copy)]
    enum Step {
        BodyA,
        BodyB,
        Joint,
    }
    let orders = [
        [Step::Joint, Step::BodyA, Step::BodyB],
        [Step::Joint, Step::BodyB, Step::BodyA],
        [Step::BodyA, Step::Joint, Step::BodyB],
        [Step::BodyB, Step::Joint, Step::BodyA],
        [Step::BodyA, Step::BodyB, Step::Joint],
        [Step::BodyB, Step::BodyA, Step::Joint],
    ];

    for order in orders {
        let (scene, ids) = scene_with(&["A", "B"]);
        let mut system = system();
        let mut joint = None;
        for step in order {
            match step {
                Step::BodyA => {
                    system.add_body(ids[0], BodyConfig::default(), &scene).unwrap();
                }
                Step::BodyB => {
                    system.add_body(ids[1], BodyConfig::default(), &scene).unwrap();
                }
                Step::Joint => {
                    joint = Some(system.add_joint(ids[0], JointConfig::new(JointKindConfig::distance(), ids[1])));
                }
            }
        }
        let joint = system.joint(joint.unwrap()).unwrap();
        assert!(!joint.is_pending());
        assert!(joint.handle().is_some());
        assert_eq!(system.controller().world().joint_count(), 1);
    }
}

#[test]
fn test_static_body_mass_stays_zero() {
    let (scene, ids) = scene_with(&["Ground"]);
    let mut system = system();
    let body = system.add_body(ids[0], BodyConfig::of_type(BodyType::Static), &scene).unwrap();

    for mass in [0.0, 1.0, 250.0] {
        system.set_body_attr(ids[0], BodyAttr::Mass(mass)).unwrap();
        assert_eq!(system.controller().world().body(body).unwrap().effective_mass(), 0.0);
    }
}

#[test]
fn test_shape_toggle_leaves_single_attachment() {
    let (scene, ids) = scene_with(&["Box"]);
    let mut system = system();
    let body = system.add_body(ids[0], BodyConfig::default(), &scene).unwrap();
    let shape = system.add_shape(ids[0], ShapeConfig::rectangle()).unwrap();

    system.set_shape_enabled(ids[0], ShapeKind::Box, true).unwrap();
    system.set_shape_enabled(ids[0], ShapeKind::Box, false).unwrap();
    system.set_shape_enabled(ids[0], ShapeKind::Box, true).unwrap();
    assert_eq!(system.controller().world().body(body).unwrap().shapes(), &[shape]);
}

#[test]
fn test_invalid_bitmask_rejected_at_configuration() {
    let (_, ids) = scene_with(&["Box"]);
    let mut system = system();
    let config = ShapeConfig {
        collision_mask: "0101".to_string(),
        ..ShapeConfig::rectangle()
    };
    let err = system.add_shape(ids[0], config).unwrap_err();
    assert!(matches!(err, PhysicsError::InvalidBitmask(_)));
    assert!(system.shape(ids[0], ShapeKind::Box).is_none());
}

#[test]
fn test_vehicle_throttle_brake_reverse() {
    let (mut scene, ids) = scene_with(&["Car"]);
    let mut system = system();
    let config = VehicleConfig {
        chassis: ChassisSource::Standalone(BodyConfig::default()),
        ..Default::default()
    };
    let vehicle = system.add_vehicle(ids[0], config, &scene).unwrap();
    let back_wheel = |system: &PhysicsSystem| {
        let handle = system.vehicle(vehicle).unwrap().handle().unwrap();
        let back = &system.controller().world().vehicle(handle).unwrap().back;
        (back.engine_force, back.brake_force)
    };

    let mut drive = |system: &mut PhysicsSystem, velocity: DVec2, controls: VehicleControls| {
        system.set_body_attr(ids[0], BodyAttr::Velocity(velocity)).unwrap();
        system.set_vehicle_controls(vehicle, controls).unwrap();
        system.update(0.0, &mut scene);
    };

    let throttle = VehicleControls {
        throttle: true,
        ..Default::default()
    };
    let brake = VehicleControls {
        brake: true,
        ..Default::default()
    };

    drive(&mut system, DVec2::ZERO, throttle);
    assert_eq!(back_wheel(&system), (7.0, 0.0));

    drive(&mut system, DVec2::new(0.0, 0.05), brake);
    assert_eq!(back_wheel(&system), (-2.0, 0.0));

    drive(&mut system, DVec2::new(0.0, 0.5), brake);
    assert_eq!(back_wheel(&system), (0.0, 5.0));

    drive(&mut system, DVec2::ZERO, VehicleControls::default());
    assert_eq!(back_wheel(&system), (0.0, 0.0));
}

#[test]
fn test_dynamic_pull_keeps_out_of_plane_coordinate() {
    let (mut scene, ids) = scene_with(&["Falling"]);
    let settings = WorldSettings {
        axis_plane: AxisPlane::XZ,
        ..Default::default()
    };
    let mut system = PhysicsSystem::new(&settings).unwrap();
    system.add_body(ids[0], BodyConfig::default(), &scene).unwrap();

    system.update(0.5, &mut scene);
    let transform = scene.transform(&ids[0]).unwrap();
    assert_eq!(transform.position.y, 0.0);
    // Gravity pulls along -2D y, which is +Z in the XZ plane
    assert!(transform.position.z > 1.0);
}

#[test]
fn test_spring_attached_once_in_any_order() {
    let orders: [[usize; 3]; 6] = [[2, 0, 1], [2, 1, 0], [0, 2, 1], [1, 2, 0], [0, 1, 2], [1, 0, 2]];

    for order in orders {
        let (scene, ids) = scene_with(&["A", "B"]);
        let mut system = system();
        let mut spring = None;
        for step in order {
            match step {
                2 => spring = Some(system.add_spring(ids[0], SpringConfig::new(SpringKindConfig::linear(), ids[1]))),
                body => {
                    system.add_body(ids[body], BodyConfig::default(), &scene).unwrap();
                }
            }
        }
        let spring = system.spring(spring.unwrap()).unwrap();
        assert!(!spring.is_pending(), "{order:?}");
        assert!(spring.handle().is_some(), "{order:?}");
        assert_eq!(system.controller().world().spring_count(), 1, "{order:?}");
    }
}

#[test]
fn test_spring_endpoint_change_rebuilds() {
    let (scene, ids) = scene_with(&["A", "B", "C"]);
    let mut system = system();
    let bodies: Vec<_> = ids
        .iter()
        .map(|id| system.add_body(*id, BodyConfig::default(), &scene).unwrap())
        .collect();
    let id = system.add_spring(ids[0], SpringConfig::new(SpringKindConfig::linear(), ids[1]));
    let first = system.spring(id).unwrap().handle().unwrap();

    system.set_spring_endpoint(id, Endpoint::B, Some(ids[2])).unwrap();
    let second = system.spring(id).unwrap().handle().unwrap();
    assert_ne!(first, second);
    let world = system.controller().world();
    assert!(world.spring(first).is_none());
    assert_eq!(world.spring(second).unwrap().body_b, bodies[2]);
    assert_eq!(world.spring_count(), 1);
    assert!(system.registry().subscribers(ids[1]).is_empty());

    system.set_spring_endpoint(id, Endpoint::B, None).unwrap();
    assert!(system.spring(id).unwrap().is_pending());
    assert_eq!(system.controller().world().spring_count(), 0);
}

#[test]
fn test_sibling_vehicle_waits_for_chassis() {
    let (scene, ids) = scene_with(&["Car"]);
    let mut system = system();
    let vehicle = system.add_vehicle(ids[0], VehicleConfig::default(), &scene).unwrap();
    assert!(system.vehicle(vehicle).unwrap().handle().is_none());
    assert_eq!(system.controller().world().vehicle_count(), 0);

    let body = system.add_body(ids[0], BodyConfig::default(), &scene).unwrap();
    let binding = system.vehicle(vehicle).unwrap();
    assert_eq!(binding.chassis(), Some(body));
    assert!(binding.handle().is_some());
    assert!(!binding.owns_chassis());
    assert_eq!(system.controller().world().vehicle_count(), 1);

    system.remove_body(ids[0]).unwrap();
    assert!(system.vehicle(vehicle).unwrap().handle().is_none());
    assert_eq!(system.controller().world().vehicle_count(), 0);
}

fn anchored_chain(island_split: bool) -> Vec<DVec3> {
    let (mut scene, ids) = scene_with(&["Anchor", "Bob1", "Bob2"]);
    let settings = WorldSettings {
        island_split,
        solver_iterations: 20,
        ..Default::default()
    };
    let mut system = PhysicsSystem::new(&settings).unwrap();
    system.add_joint(ids[0], JointConfig::new(JointKindConfig::distance(), ids[1]));
    system.add_joint(ids[1], JointConfig::new(JointKindConfig::distance(), ids[2]));
    system.add_body(ids[0], BodyConfig::of_type(BodyType::Static), &scene).unwrap();
    system.add_body(ids[1], BodyConfig::default(), &scene).unwrap();
    system.add_body(ids[2], BodyConfig::default(), &scene).unwrap();

    for _ in 0..60 {
        system.update(FIXED_TIME_STEP, &mut scene);
    }
    ids.iter().map(|id| scene.transform(id).unwrap().position).collect()
}

#[test]
fn test_island_split_does_not_change_result() {
    let split = anchored_chain(true);
    assert_eq!(split, anchored_chain(false));
    assert!(split[2].y < 0.0);
}

#[test]
fn test_island_sleeping_waits_for_whole_island() {
    let (mut scene, ids) = scene_with(&["Restless", "Partner", "Loner"]);
    let settings = WorldSettings {
        gravity: DVec2::ZERO,
        sleep_mode: SleepMode::IslandSleeping,
        ..Default::default()
    };
    let mut system = PhysicsSystem::new(&settings).unwrap();
    let restless = BodyConfig {
        allow_sleep: false,
        ..Default::default()
    };
    system.add_body(ids[0], restless, &scene).unwrap();
    let partner = system.add_body(ids[1], BodyConfig::default(), &scene).unwrap();
    let loner = system.add_body(ids[2], BodyConfig::default(), &scene).unwrap();
    system.add_spring(ids[0], SpringConfig::new(SpringKindConfig::linear(), ids[1]));

    for _ in 0..120 {
        system.update(FIXED_TIME_STEP, &mut scene);
    }
    let world = system.controller().world();
    assert!(world.body(loner).unwrap().is_sleeping());
    assert!(!world.body(partner).unwrap().is_sleeping());
}

#[test]
fn test_axis_locks_hold_position() {
    let (mut scene, ids) = scene_with(&["LockedY", "LockedX"]);
    let mut system = system();
    system.controller_mut().set_gravity(DVec2::new(4.0, -9.81));
    let locked_y = BodyConfig {
        fixed_y: true,
        ..Default::default()
    };
    let locked_x = BodyConfig {
        fixed_x: true,
        ..Default::default()
    };
    system.add_body(ids[0], locked_y, &scene).unwrap();
    system.add_body(ids[1], locked_x, &scene).unwrap();

    system.update(0.1, &mut scene);
    let slider = scene.transform(&ids[0]).unwrap().position;
    assert_eq!(slider.y, 0.0);
    assert!(slider.x > 0.0);
    let faller = scene.transform(&ids[1]).unwrap().position;
    assert_eq!(faller.x, 2.0);
    assert!(faller.y < 0.0);
}

#[test]
fn test_disabled_body_keeps_dependents_attached() {
    let (mut scene, ids) = scene_with(&["Pivot", "Bob"]);
    let mut system = system();
    let pivot = system.add_body(ids[0], BodyConfig::of_type(BodyType::Static), &scene).unwrap();
    system.add_body(ids[1], BodyConfig::default(), &scene).unwrap();
    let joint = system.add_joint(ids[0], JointConfig::new(JointKindConfig::distance(), ids[1]));
    let handle = system.joint(joint).unwrap().handle();

    system.set_body_enabled(ids[0], false, &scene).unwrap();
    assert!(!system.controller().world().body(pivot).unwrap().in_world());
    assert_eq!(system.joint(joint).unwrap().handle(), handle);
    assert_eq!(system.controller().world().joint_count(), 1);

    // Without its pivot in the world the bob falls freely
    for _ in 0..30 {
        system.update(FIXED_TIME_STEP, &mut scene);
    }
    let bob = scene.transform(&ids[1]).unwrap().position;
    assert!((bob.x - 2.0).abs() < 1e-9);
    assert!(bob.y < -0.5);

    system.set_body_enabled(ids[0], true, &scene).unwrap();
    assert!(system.controller().world().body(pivot).unwrap().in_world());
    assert_eq!(system.joint(joint).unwrap().handle(), handle);
}

#[test]
fn test_inactive_entity_leaves_world() {
    let (mut scene, ids) = scene_with(&["Root", "Child", "Other"]);
    scene.set_parent(ids[1], Some(ids[0])).unwrap();
    let mut system = system();
    let body = system.add_body(ids[1], BodyConfig::default(), &scene).unwrap();
    let shape = system.add_shape(ids[1], ShapeConfig::circle()).unwrap();
    system.add_body(ids[2], BodyConfig::default(), &scene).unwrap();
    system.add_joint(ids[1], JointConfig::new(JointKindConfig::distance(), ids[2]));
    system.add_vehicle(ids[1], VehicleConfig::default(), &scene).unwrap();

    scene.set_active(ids[0], false).unwrap();
    system.update(0.0, &mut scene);
    let world = system.controller().world();
    assert!(!world.body(body).unwrap().in_world());
    assert!(world.body(body).unwrap().shapes().is_empty());
    assert_eq!(world.joint_count(), 0);
    assert_eq!(world.vehicle_count(), 0);

    scene.set_active(ids[0], true).unwrap();
    system.update(0.0, &mut scene);
    let world = system.controller().world();
    assert!(world.body(body).unwrap().in_world());
    assert_eq!(world.body(body).unwrap().shapes(), &[shape]);
    assert_eq!(world.joint_count(), 1);
    assert_eq!(world.vehicle_count(), 1);
}
