// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rigid body binding.

use crate::engine::{BodyHandle, BodyType, RigidBody};
use crate::error::{PhysicsError, Result};
use crate::scene::SceneGraph;
use crate::world::WorldController;
use glam::DVec2;
use planar_scene::EntityId;
use serde::{Deserialize, Serialize};

/// Rigid body configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Motion class
    pub body_type: BodyType,
    /// Mass (ignored for static bodies)
    pub mass: f64,
    /// Initial linear velocity
    pub velocity: DVec2,
    /// Initial angular velocity in degrees per second
    pub angular_velocity: f64,
    /// Linear damping
    pub damping: f64,
    /// Angular damping
    pub angular_damping: f64,
    /// Multiplier on world gravity
    pub gravity_scale: f64,
    /// Lock movement along X
    pub fixed_x: bool,
    /// Lock movement along Y
    pub fixed_y: bool,
    /// Lock rotation
    pub fixed_rotation: bool,
    /// Allow the body to sleep
    pub allow_sleep: bool,
    /// Speed below which the body counts as idle
    pub sleep_speed_limit: f64,
    /// Idle seconds before sleeping
    pub sleep_time_limit: f64,
    /// Produce contact responses
    pub collision_response: bool,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            mass: 1.0,
            velocity: DVec2::ZERO,
            angular_velocity: 0.0,
            damping: 0.1,
            angular_damping: 0.1,
            gravity_scale: 1.0,
            fixed_x: false,
            fixed_y: false,
            fixed_rotation: false,
            allow_sleep: true,
            sleep_speed_limit: 0.2,
            sleep_time_limit: 1.0,
            collision_response: true,
        }
    }
}

impl BodyConfig {
    /// Config for a body of the given type with defaults elsewhere
    pub fn of_type(body_type: BodyType) -> Self {
        Self {
            body_type,
            ..Default::default()
        }
    }

    /// Mass the body is given: zero for static bodies
    pub fn effective_mass(&self) -> f64 {
        match self.body_type {
            BodyType::Static => 0.0,
            BodyType::Dynamic | BodyType::Kinematic => self.mass,
        }
    }

    fn build(&self) -> RigidBody {
        let mut body = RigidBody::new(self.body_type, self.effective_mass());
        body.velocity = self.velocity;
        body.angular_velocity = self.angular_velocity.to_radians();
        body.damping = self.damping;
        body.angular_damping = self.angular_damping;
        body.gravity_scale = self.gravity_scale;
        body.fixed_x = self.fixed_x;
        body.fixed_y = self.fixed_y;
        body.fixed_rotation = self.fixed_rotation;
        body.allow_sleep = self.allow_sleep;
        body.sleep_speed_limit = self.sleep_speed_limit;
        body.sleep_time_limit = self.sleep_time_limit;
        body.collision_response = self.collision_response;
        body
    }
}

fn validate_mass(mass: f64) -> Result<()> {
    if !mass.is_finite() || mass < 0.0 {
        return Err(PhysicsError::InvalidSetting(format!("mass must be >= 0, got {mass}")));
    }
    Ok(())
}

/// Runtime body attribute change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyAttr {
    /// Change motion class
    BodyType(BodyType),
    /// Change mass
    Mass(f64),
    /// Set linear velocity
    Velocity(DVec2),
    /// Set angular velocity (degrees per second)
    AngularVelocity(f64),
    /// Set linear damping
    Damping(f64),
    /// Set angular damping
    AngularDamping(f64),
    /// Set gravity multiplier
    GravityScale(f64),
    /// Lock X movement
    FixedX(bool),
    /// Lock Y movement
    FixedY(bool),
    /// Lock rotation
    FixedRotation(bool),
    /// Allow sleeping
    AllowSleep(bool),
    /// Idle speed threshold
    SleepSpeedLimit(f64),
    /// Idle time threshold
    SleepTimeLimit(f64),
    /// Contact response
    CollisionResponse(bool),
}

/// Binds one rigid body to a scene entity
#[derive(Debug)]
pub struct BodyBinding {
    entity: EntityId,
    config: BodyConfig,
    handle: BodyHandle,
    enabled: bool,
}

impl BodyBinding {
    /// Build the body and register it with the world at the entity's transform
    pub(crate) fn create(
        entity: EntityId,
        config: BodyConfig,
        controller: &mut WorldController,
        scene: &impl SceneGraph,
    ) -> Result<Self> {
        validate_mass(config.mass)?;
        let handle = controller.world_mut().create_body(config.build());
        if let Err(err) = controller.add_body(handle, entity, scene) {
            controller.world_mut().destroy_body(handle);
            return Err(err);
        }

        Ok(Self {
            entity,
            config,
            handle,
            enabled: true,
        })
    }

    /// Owning entity
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Current configuration
    pub fn config(&self) -> &BodyConfig {
        &self.config
    }

    /// Engine body handle
    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    /// Whether the body is in the world
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Add the body to or remove it from the world. The body itself is kept.
    pub(crate) fn set_enabled(
        &mut self,
        enabled: bool,
        controller: &mut WorldController,
        scene: &impl SceneGraph,
    ) -> Result<()> {
        if enabled == self.enabled {
            return Ok(());
        }
        if enabled {
            controller.add_body(self.handle, self.entity, scene)?;
        } else {
            controller.remove_body(self.handle);
        }
        self.enabled = enabled;
        Ok(())
    }

    /// Apply a runtime attribute change to the config and the live body
    pub(crate) fn apply(&mut self, attr: BodyAttr, controller: &mut WorldController) -> Result<()> {
        let mut recompute_mass = false;
        let mut reindex = false;

        match attr {
            BodyAttr::BodyType(body_type) => {
                self.config.body_type = body_type;
                recompute_mass = true;
                reindex = true;
            }
            BodyAttr::Mass(mass) => {
                validate_mass(mass)?;
                self.config.mass = mass;
                recompute_mass = true;
            }
            BodyAttr::Velocity(v) => self.config.velocity = v,
            BodyAttr::AngularVelocity(w) => self.config.angular_velocity = w,
            BodyAttr::Damping(d) => self.config.damping = d,
            BodyAttr::AngularDamping(d) => self.config.angular_damping = d,
            BodyAttr::GravityScale(s) => self.config.gravity_scale = s,
            BodyAttr::FixedX(b) => self.config.fixed_x = b,
            BodyAttr::FixedY(b) => self.config.fixed_y = b,
            BodyAttr::FixedRotation(b) => {
                self.config.fixed_rotation = b;
                recompute_mass = true;
            }
            BodyAttr::AllowSleep(b) => self.config.allow_sleep = b,
            BodyAttr::SleepSpeedLimit(v) => self.config.sleep_speed_limit = v,
            BodyAttr::SleepTimeLimit(v) => self.config.sleep_time_limit = v,
            BodyAttr::CollisionResponse(b) => self.config.collision_response = b,
        }

        let config = &self.config;
        let Some(body) = controller.world_mut().body_mut(self.handle) else {
            return Err(PhysicsError::BindingNotFound(format!("{} for entity {}", self.handle, self.entity)));
        };
        match attr {
            BodyAttr::BodyType(_) | BodyAttr::Mass(_) => {
                body.body_type = config.body_type;
                body.mass = config.effective_mass();
                body.wake_up();
            }
            BodyAttr::Velocity(v) => {
                body.velocity = v;
                body.wake_up();
            }
            BodyAttr::AngularVelocity(w) => {
                body.angular_velocity = w.to_radians();
                body.wake_up();
            }
            BodyAttr::Damping(d) => body.damping = d,
            BodyAttr::AngularDamping(d) => body.angular_damping = d,
            BodyAttr::GravityScale(s) => body.gravity_scale = s,
            BodyAttr::FixedX(b) => body.fixed_x = b,
            BodyAttr::FixedY(b) => body.fixed_y = b,
            BodyAttr::FixedRotation(b) => body.fixed_rotation = b,
            BodyAttr::AllowSleep(b) => {
                body.allow_sleep = b;
                if !b {
                    body.wake_up();
                }
            }
            BodyAttr::SleepSpeedLimit(v) => body.sleep_speed_limit = v,
            BodyAttr::SleepTimeLimit(v) => body.sleep_time_limit = v,
            BodyAttr::CollisionResponse(b) => body.collision_response = b,
        }

        if recompute_mass {
            controller.world_mut().update_mass_properties(self.handle);
        }
        if reindex {
            controller.reindex_body(self.handle);
        }
        Ok(())
    }

    /// Remove the body from the world and destroy it
    pub(crate) fn destroy(self, controller: &mut WorldController) {
        controller.remove_body(self.handle);
        controller.world_mut().destroy_body(self.handle);
        tracing::debug!("Destroyed {} of entity {}", self.handle, self.entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WorldSettings;
    use planar_scene::{EntityData, SceneData};

    fn setup() -> (WorldController, SceneData, EntityId) {
        let controller = WorldController::new(&WorldSettings::default()).unwrap();
        let mut scene = SceneData::new();
        let entity = scene.add_entity(EntityData::new("Body"));
        (controller, scene, entity)
    }

    #[test]
    fn test_static_mass_is_always_zero() {
        let (mut controller, scene, entity) = setup();
        let config = BodyConfig {
            body_type: BodyType::Static,
            mass: 50.0,
            ..Default::default()
        };
        let mut binding = BodyBinding::create(entity, config, &mut controller, &scene).unwrap();
        let mass = |c: &WorldController, h| c.world().body(h).map(RigidBody::effective_mass);

        assert_eq!(mass(&controller, binding.handle()), Some(0.0));
        binding.apply(BodyAttr::Mass(12.0), &mut controller).unwrap();
        assert_eq!(mass(&controller, binding.handle()), Some(0.0));
        assert_eq!(controller.world().body(binding.handle()).unwrap().mass, 0.0);

        binding.apply(BodyAttr::BodyType(BodyType::Dynamic), &mut controller).unwrap();
        assert!((mass(&controller, binding.handle()).unwrap() - 12.0).abs() < 1e-9);
        assert_eq!(controller.body_type_of(binding.handle()), Some(BodyType::Dynamic));
    }

    #[test]
    fn test_angular_velocity_is_converted_to_radians() {
        let (mut controller, scene, entity) = setup();
        let config = BodyConfig {
            angular_velocity: 180.0,
            ..Default::default()
        };
        let binding = BodyBinding::create(entity, config, &mut controller, &scene).unwrap();
        let w = controller.world().body(binding.handle()).unwrap().angular_velocity;
        assert!((w - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_enable_disable_keeps_body() {
        let (mut controller, scene, entity) = setup();
        let mut binding = BodyBinding::create(entity, BodyConfig::default(), &mut controller, &scene).unwrap();
        let handle = binding.handle();

        binding.set_enabled(false, &mut controller, &scene).unwrap();
        binding.set_enabled(false, &mut controller, &scene).unwrap();
        assert!(!controller.is_registered(handle));
        assert!(controller.world().body(handle).is_some());

        binding.set_enabled(true, &mut controller, &scene).unwrap();
        assert!(controller.is_registered(handle));
        assert!(controller.world().body(handle).unwrap().in_world());
    }

    #[test]
    fn test_create_for_missing_entity_leaves_nothing_behind() {
        let (mut controller, scene, _) = setup();
        let result = BodyBinding::create(EntityId::new(), BodyConfig::default(), &mut controller, &scene);
        assert!(matches!(result, Err(PhysicsError::EntityNotFound(_))));
        assert_eq!(controller.world().bodies_in_world().count(), 0);
    }

    #[test]
    fn test_create_rejects_invalid_mass() {
        let (mut controller, scene, entity) = setup();
        for mass in [-1.0, f64::NAN, f64::INFINITY] {
            let config = BodyConfig {
                mass,
                ..Default::default()
            };
            let result = BodyBinding::create(entity, config, &mut controller, &scene);
            assert!(matches!(result, Err(PhysicsError::InvalidSetting(_))), "{mass}");
        }
        assert_eq!(controller.world().bodies_in_world().count(), 0);
    }
}
