// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless demo: a box on a revolute pendulum and a small car.
//!
//! Usage: `planar_demo [settings.ron]`. Without an argument the default
//! world settings are used. Set `RUST_LOG` to adjust logging.

use glam::{DVec2, DVec3};
use planar_physics::{
    BodyConfig, BodyType, ChassisSource, JointConfig, JointKindConfig, PhysicsSystem, Result, ShapeConfig,
    VehicleConfig, VehicleControls, WorldSettings,
};
use planar_scene::{EntityData, SceneData, Transform};
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const FRAME_TIME: f64 = 1.0 / 50.0;
const FRAMES: u32 = 200;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,planar_physics=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting planar demo v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(std::env::args().nth(1).as_deref().map(Path::new)) {
        tracing::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

fn run(settings_path: Option<&Path>) -> Result<()> {
    let settings = match settings_path {
        Some(path) => WorldSettings::load(path)?,
        None => WorldSettings::default(),
    };

    let mut scene = SceneData::new();
    let mut spawn = |name: &str, x: f64, y: f64| {
        scene.add_entity(EntityData::new(name).with_transform(Transform::from_position(DVec3::new(x, y, 0.0))))
    };
    let pivot = spawn("Pivot", 0.0, 5.0);
    let bob = spawn("Bob", 2.0, 5.0);
    let car = spawn("Car", -4.0, 0.0);

    let mut system = PhysicsSystem::new(&settings)?;
    system.controller_mut().on_post_step(|report| {
        if report.dropped_time > 0.0 {
            tracing::warn!("Simulation fell behind by {:.3}s", report.dropped_time);
        }
    });

    // Joint first: it resolves once both bodies exist
    let mut joint = JointConfig::new(JointKindConfig::revolute(), bob);
    if let JointKindConfig::Revolute { local_pivot_b, .. } = &mut joint.kind {
        *local_pivot_b = DVec2::new(-2.0, 0.0);
    }
    system.add_joint(pivot, joint);

    system.add_shape(bob, ShapeConfig::rectangle())?;
    system.add_body(bob, BodyConfig::default(), &scene)?;
    system.add_body(pivot, BodyConfig::of_type(BodyType::Static), &scene)?;

    // Top-down car: no gravity on the chassis
    let chassis = BodyConfig {
        gravity_scale: 0.0,
        ..Default::default()
    };
    system.add_shape(car, ShapeConfig::rectangle())?;
    let vehicle = system.add_vehicle(
        car,
        VehicleConfig {
            chassis: ChassisSource::Standalone(chassis),
            ..Default::default()
        },
        &scene,
    )?;

    for frame in 0..FRAMES {
        let controls = VehicleControls {
            steering: if frame < FRAMES / 2 { 0.0 } else { 0.5 },
            throttle: frame < FRAMES * 3 / 4,
            brake: frame >= FRAMES * 3 / 4,
        };
        system.set_vehicle_controls(vehicle, controls)?;
        system.update(FRAME_TIME, &mut scene);
    }

    for (name, entity) in [("Bob", bob), ("Car", car)] {
        if let Some(transform) = scene.transform(&entity) {
            tracing::info!(
                "{} at ({:.3}, {:.3}, {:.3}), rotation {:.1} deg",
                name,
                transform.position.x,
                transform.position.y,
                transform.position.z,
                transform.rotation.z
            );
        }
    }
    tracing::info!("Simulated {:.2}s", system.controller().world().time());
    Ok(())
}
