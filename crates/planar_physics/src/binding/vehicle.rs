// SPDX-License-Identifier: MIT OR Apache-2.0
//! Top-down vehicle binding.
//!
//! The chassis is the body bound to the owning entity, either a sibling
//! body binding or one the vehicle creates for itself. The vehicle is built
//! when that body appears and rebuilt whenever it is replaced.

use super::body::BodyConfig;
use crate::engine::{BodyHandle, Vehicle, VehicleHandle, Wheel};
use crate::error::{PhysicsError, Result};
use crate::world::WorldController;
use glam::DVec2;
use planar_scene::EntityId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Back-wheel forward speed above which braking brakes instead of reversing
///
/// The comparison is signed: a car rolling backwards at any speed reverses.
pub const BRAKE_SPEED_THRESHOLD: f64 = 0.1;

/// Unique identifier for a vehicle binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub Uuid);

impl VehicleId {
    /// Create a new random vehicle ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VehicleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vehicle {}", self.0)
    }
}

/// Where the chassis body comes from
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ChassisSource {
    /// The body binding already on the owning entity
    #[default]
    Sibling,
    /// A body created for and torn down with the vehicle
    Standalone(BodyConfig),
}

/// Vehicle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Chassis source
    pub chassis: ChassisSource,
    /// Back wheel drive force under throttle
    pub engine_force: f64,
    /// Back wheel force when braking at low speed
    pub reverse_force: f64,
    /// Back wheel brake force
    pub brake_force: f64,
    /// Front wheel steering lock in degrees
    pub max_steer: f64,
    /// Front wheel offset on the chassis
    pub front_wheel_offset: DVec2,
    /// Front wheel side friction
    pub front_wheel_friction: f64,
    /// Back wheel offset on the chassis
    pub back_wheel_offset: DVec2,
    /// Back wheel side friction
    pub back_wheel_friction: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            chassis: ChassisSource::Sibling,
            engine_force: 7.0,
            reverse_force: -2.0,
            brake_force: 5.0,
            max_steer: 45.0,
            front_wheel_offset: DVec2::new(0.0, 1.0),
            front_wheel_friction: 4.0,
            back_wheel_offset: DVec2::new(0.0, -1.0),
            back_wheel_friction: 3.0,
        }
    }
}

/// Driver input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleControls {
    /// Steering in [-1, 1]
    pub steering: f64,
    /// Throttle pressed
    pub throttle: bool,
    /// Brake pressed
    pub brake: bool,
}

/// Runtime vehicle attribute change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleAttr {
    /// Drive force
    EngineForce(f64),
    /// Reverse force
    ReverseForce(f64),
    /// Brake force
    BrakeForce(f64),
    /// Steering lock in degrees
    MaxSteer(f64),
    /// Front wheel offset
    FrontWheelOffset(DVec2),
    /// Front wheel side friction
    FrontWheelFriction(f64),
    /// Back wheel offset
    BackWheelOffset(DVec2),
    /// Back wheel side friction
    BackWheelFriction(f64),
}

/// Binds a vehicle to the body of its owning entity
#[derive(Debug)]
pub struct VehicleBinding {
    id: VehicleId,
    owner: EntityId,
    config: VehicleConfig,
    controls: VehicleControls,
    chassis: Option<BodyHandle>,
    handle: Option<VehicleHandle>,
    enabled: bool,
}

impl VehicleBinding {
    pub(crate) fn new(id: VehicleId, owner: EntityId, config: VehicleConfig) -> Self {
        Self {
            id,
            owner,
            config,
            controls: VehicleControls::default(),
            chassis: None,
            handle: None,
            enabled: true,
        }
    }

    /// Binding ID
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// Entity whose body is the chassis
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Current configuration
    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    /// Current driver input
    pub fn controls(&self) -> VehicleControls {
        self.controls
    }

    /// Live vehicle handle, if built
    pub fn handle(&self) -> Option<VehicleHandle> {
        self.handle
    }

    /// Chassis body, if resolved
    pub fn chassis(&self) -> Option<BodyHandle> {
        self.chassis
    }

    /// Whether the binding is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the vehicle created its own chassis body
    pub fn owns_chassis(&self) -> bool {
        matches!(self.config.chassis, ChassisSource::Standalone(_))
    }

    pub(crate) fn set_controls(&mut self, controls: VehicleControls) {
        self.controls = VehicleControls {
            steering: controls.steering.clamp(-1.0, 1.0),
            ..controls
        };
    }

    pub(crate) fn set_chassis(&mut self, chassis: Option<BodyHandle>, controller: &mut WorldController) {
        self.chassis = chassis;
        if chassis.is_some() {
            self.rebuild(controller);
        } else {
            self.remove_from_world(controller);
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool, controller: &mut WorldController) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.rebuild(controller);
        } else {
            self.remove_from_world(controller);
        }
    }

    pub(crate) fn rebuild(&mut self, controller: &mut WorldController) {
        self.remove_from_world(controller);
        let Some(chassis) = self.chassis.filter(|_| self.enabled) else {
            return;
        };
        let config = &self.config;
        let front = Wheel::new(config.front_wheel_offset, config.front_wheel_friction);
        let back = Wheel::new(config.back_wheel_offset, config.back_wheel_friction);
        self.handle = Some(controller.world_mut().add_vehicle(Vehicle::new(chassis, front, back)));
        tracing::debug!("Built {} on {}", self.id, chassis);
    }

    pub(crate) fn remove_from_world(&mut self, controller: &mut WorldController) {
        if let Some(handle) = self.handle.take() {
            controller.world_mut().remove_vehicle(handle);
            tracing::debug!("Removed {} from world", self.id);
        }
    }

    pub(crate) fn apply(&mut self, attr: VehicleAttr, controller: &mut WorldController) -> Result<()> {
        match attr {
            VehicleAttr::EngineForce(v) => self.config.engine_force = v,
            VehicleAttr::ReverseForce(v) => self.config.reverse_force = v,
            VehicleAttr::BrakeForce(v) => {
                if v < 0.0 {
                    return Err(PhysicsError::InvalidSetting(format!("brake force must be >= 0, got {v}")));
                }
                self.config.brake_force = v;
            }
            VehicleAttr::MaxSteer(v) => self.config.max_steer = v,
            VehicleAttr::FrontWheelOffset(v) => self.config.front_wheel_offset = v,
            VehicleAttr::FrontWheelFriction(v) => self.config.front_wheel_friction = v,
            VehicleAttr::BackWheelOffset(v) => self.config.back_wheel_offset = v,
            VehicleAttr::BackWheelFriction(v) => self.config.back_wheel_friction = v,
        }

        let Some(vehicle) = self.handle.and_then(|h| controller.world_mut().vehicle_mut(h)) else {
            return Ok(());
        };
        match attr {
            VehicleAttr::FrontWheelOffset(v) => vehicle.front.local_position = v,
            VehicleAttr::FrontWheelFriction(v) => vehicle.front.side_friction = v,
            VehicleAttr::BackWheelOffset(v) => vehicle.back.local_position = v,
            VehicleAttr::BackWheelFriction(v) => vehicle.back.side_friction = v,
            // Read on every update
            _ => {}
        }
        Ok(())
    }

    /// Turn the current controls into wheel steering, engine and brake values
    pub(crate) fn update(&self, controller: &mut WorldController) {
        let Some(handle) = self.handle else {
            return;
        };
        let world = controller.world_mut();
        let Some(speed) = world
            .vehicle(handle)
            .and_then(|v| world.body(v.chassis).map(|chassis| v.back.speed(chassis)))
        else {
            return;
        };
        let config = &self.config;
        let controls = self.controls;
        let Some(vehicle) = world.vehicle_mut(handle) else {
            return;
        };

        vehicle.front.steer_value = controls.steering * config.max_steer.to_radians();

        let back = &mut vehicle.back;
        back.engine_force = if controls.throttle { config.engine_force } else { 0.0 };
        back.brake_force = 0.0;
        if controls.brake {
            if speed > BRAKE_SPEED_THRESHOLD {
                back.brake_force = config.brake_force;
            } else {
                back.engine_force = config.reverse_force;
            }
        }

        let chassis = vehicle.chassis;
        if controls.throttle || controls.brake {
            if let Some(body) = world.body_mut(chassis) {
                body.wake_up();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BodyType, RigidBody};
    use crate::settings::WorldSettings;

    fn setup(velocity: DVec2) -> (WorldController, VehicleBinding) {
        let mut controller = WorldController::new(&WorldSettings::default()).unwrap();
        let mut body = RigidBody::new(BodyType::Dynamic, 1.0);
        body.velocity = velocity;
        let chassis = controller.world_mut().create_body(body);
        let mut binding = VehicleBinding::new(VehicleId::new(), EntityId::new(), VehicleConfig::default());
        binding.set_chassis(Some(chassis), &mut controller);
        (controller, binding)
    }

    fn back_wheel(controller: &WorldController, binding: &VehicleBinding) -> Wheel {
        controller.world().vehicle(binding.handle().unwrap()).unwrap().back.clone()
    }

    #[test]
    fn test_throttle_drives_back_wheel() {
        let (mut controller, mut binding) = setup(DVec2::ZERO);
        binding.set_controls(VehicleControls {
            throttle: true,
            ..Default::default()
        });
        binding.update(&mut controller);
        let back = back_wheel(&controller, &binding);
        assert_eq!(back.engine_force, 7.0);
        assert_eq!(back.brake_force, 0.0);
    }

    #[test]
    fn test_brake_at_low_speed_reverses() {
        let (mut controller, mut binding) = setup(DVec2::new(0.0, 0.05));
        binding.set_controls(VehicleControls {
            brake: true,
            ..Default::default()
        });
        binding.update(&mut controller);
        let back = back_wheel(&controller, &binding);
        assert_eq!(back.engine_force, -2.0);
        assert_eq!(back.brake_force, 0.0);
    }

    #[test]
    fn test_brake_at_speed_brakes() {
        let (mut controller, mut binding) = setup(DVec2::new(0.0, 0.5));
        binding.set_controls(VehicleControls {
            brake: true,
            ..Default::default()
        });
        binding.update(&mut controller);
        let back = back_wheel(&controller, &binding);
        assert_eq!(back.engine_force, 0.0);
        assert_eq!(back.brake_force, 5.0);
    }

    #[test]
    fn test_steering_clamped_and_front_only() {
        let (mut controller, mut binding) = setup(DVec2::ZERO);
        binding.set_controls(VehicleControls {
            steering: 3.0,
            ..Default::default()
        });
        assert_eq!(binding.controls().steering, 1.0);
        binding.update(&mut controller);

        let vehicle = controller.world().vehicle(binding.handle().unwrap()).unwrap();
        assert!((vehicle.front.steer_value - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(vehicle.back.steer_value, 0.0);
    }

    #[test]
    fn test_wheel_attributes_mutate_live_vehicle() {
        let (mut controller, mut binding) = setup(DVec2::ZERO);
        let handle = binding.handle();
        binding.apply(VehicleAttr::BackWheelFriction(9.0), &mut controller).unwrap();
        binding.apply(VehicleAttr::FrontWheelOffset(DVec2::new(0.0, 2.0)), &mut controller).unwrap();
        assert_eq!(binding.handle(), handle);

        let vehicle = controller.world().vehicle(binding.handle().unwrap()).unwrap();
        assert_eq!(vehicle.back.side_friction, 9.0);
        assert_eq!(vehicle.front.local_position, DVec2::new(0.0, 2.0));
        assert!(binding.apply(VehicleAttr::BrakeForce(-1.0), &mut controller).is_err());
    }

    #[test]
    fn test_disable_removes_vehicle() {
        let (mut controller, mut binding) = setup(DVec2::ZERO);
        binding.set_enabled(false, &mut controller);
        assert_eq!(controller.world().vehicle_count(), 0);
        binding.set_enabled(true, &mut controller);
        assert_eq!(controller.world().vehicle_count(), 1);
    }
}
