// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collision shape binding.

use crate::engine::{BodyHandle, Geometry, Shape, ShapeHandle, ShapeKind};
use crate::error::{PhysicsError, Result};
use crate::world::WorldController;
use glam::DVec2;
use planar_scene::EntityId;
use serde::{Deserialize, Serialize};

/// Width of collision group/mask strings
pub const BITMASK_WIDTH: usize = 8;

/// Parse an 8-character binary string such as `"00000101"` into a bitmask
pub fn parse_bitmask(value: &str) -> Result<u32> {
    if value.len() != BITMASK_WIDTH || !value.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(PhysicsError::InvalidBitmask(value.to_string()));
    }
    u32::from_str_radix(value, 2).map_err(|_| PhysicsError::InvalidBitmask(value.to_string()))
}

/// Collision shape configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Kind and size
    pub geometry: Geometry,
    /// Angle relative to the body, in degrees
    pub angle: f64,
    /// Offset from the body's center
    pub position: DVec2,
    /// Group bits, most significant first
    pub collision_group: String,
    /// Mask bits, most significant first
    pub collision_mask: String,
    /// Sensor shapes report overlaps without a response
    pub sensor: bool,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            angle: 0.0,
            position: DVec2::ZERO,
            collision_group: "00000001".to_string(),
            collision_mask: "00000001".to_string(),
            sensor: false,
        }
    }
}

impl ShapeConfig {
    /// Config with the given geometry and defaults elsewhere
    pub fn with_geometry(geometry: Geometry) -> Self {
        Self {
            geometry,
            ..Default::default()
        }
    }

    /// 1x1 box
    pub fn rectangle() -> Self {
        Self::with_geometry(Geometry::Box {
            width: 1.0,
            height: 1.0,
        })
    }

    /// Circle of radius 1
    pub fn circle() -> Self {
        Self::with_geometry(Geometry::Circle { radius: 1.0 })
    }

    /// Capsule of length 1 and radius 1
    pub fn capsule() -> Self {
        Self::with_geometry(Geometry::Capsule {
            length: 1.0,
            radius: 1.0,
        })
    }

    /// Half-plane
    pub fn plane() -> Self {
        Self::with_geometry(Geometry::Plane)
    }

    /// Geometry kind
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }
}

/// Runtime shape attribute change
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeAttr {
    /// Box width
    Width(f64),
    /// Box height
    Height(f64),
    /// Circle or capsule radius
    Radius(f64),
    /// Capsule length
    Length(f64),
    /// Local angle in degrees
    Angle(f64),
    /// Local offset
    Position(DVec2),
    /// Group bits
    CollisionGroup(String),
    /// Mask bits
    CollisionMask(String),
    /// Sensor flag
    Sensor(bool),
}

fn geometry_with(geometry: Geometry, attr: &ShapeAttr) -> Option<Geometry> {
    match (geometry, attr) {
        (Geometry::Box { height, .. }, ShapeAttr::Width(width)) => Some(Geometry::Box { width: *width, height }),
        (Geometry::Box { width, .. }, ShapeAttr::Height(height)) => Some(Geometry::Box { width, height: *height }),
        (Geometry::Circle { .. }, ShapeAttr::Radius(radius)) => Some(Geometry::Circle { radius: *radius }),
        (Geometry::Capsule { length, .. }, ShapeAttr::Radius(radius)) => Some(Geometry::Capsule {
            length,
            radius: *radius,
        }),
        (Geometry::Capsule { radius, .. }, ShapeAttr::Length(length)) => Some(Geometry::Capsule {
            length: *length,
            radius,
        }),
        _ => None,
    }
}

/// Binds one collision shape to a scene entity
#[derive(Debug)]
pub struct ShapeBinding {
    entity: EntityId,
    config: ShapeConfig,
    handle: ShapeHandle,
    enabled: bool,
}

impl ShapeBinding {
    /// Build the shape, attaching it to `body` when one exists
    pub(crate) fn create(
        entity: EntityId,
        config: ShapeConfig,
        controller: &mut WorldController,
        body: Option<BodyHandle>,
    ) -> Result<Self> {
        let collision_group = parse_bitmask(&config.collision_group)?;
        let collision_mask = parse_bitmask(&config.collision_mask)?;

        let mut shape = Shape::new(config.geometry);
        shape.local_position = config.position;
        shape.local_angle = config.angle.to_radians();
        shape.collision_group = collision_group;
        shape.collision_mask = collision_mask;
        shape.sensor = config.sensor;

        let handle = controller.world_mut().create_shape(shape);
        let binding = Self {
            entity,
            config,
            handle,
            enabled: true,
        };
        if let Some(body) = body {
            binding.attach(body, controller);
        }
        Ok(binding)
    }

    /// Owning entity
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Geometry kind
    pub fn kind(&self) -> ShapeKind {
        self.config.kind()
    }

    /// Current configuration
    pub fn config(&self) -> &ShapeConfig {
        &self.config
    }

    /// Engine shape handle
    pub fn handle(&self) -> ShapeHandle {
        self.handle
    }

    /// Whether the shape is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Attach to `body` if enabled. Attaching twice is a no-op.
    pub(crate) fn attach(&self, body: BodyHandle, controller: &mut WorldController) {
        if self.enabled && controller.world_mut().attach_shape(self.handle, body) {
            tracing::debug!("Attached {} shape of entity {} to {}", self.kind(), self.entity, body);
        }
    }

    /// Detach from the current body, if any
    pub(crate) fn detach(&self, controller: &mut WorldController) {
        if controller.world_mut().detach_shape(self.handle) {
            tracing::debug!("Detached {} shape of entity {}", self.kind(), self.entity);
        }
    }

    /// Enable (attaching to `body`) or disable (detaching)
    pub(crate) fn set_enabled(&mut self, enabled: bool, body: Option<BodyHandle>, controller: &mut WorldController) {
        self.enabled = enabled;
        if enabled {
            if let Some(body) = body {
                self.attach(body, controller);
            }
        } else {
            self.detach(controller);
        }
    }

    /// Apply a runtime attribute change. Invalid values leave the live shape untouched.
    pub(crate) fn apply(&mut self, attr: ShapeAttr, controller: &mut WorldController) -> Result<()> {
        let mut geometry_changed = false;
        match &attr {
            ShapeAttr::Width(_) | ShapeAttr::Height(_) | ShapeAttr::Radius(_) | ShapeAttr::Length(_) => {
                let geometry = geometry_with(self.config.geometry, &attr).ok_or_else(|| {
                    PhysicsError::InvalidSetting(format!("{attr:?} does not apply to a {} shape", self.kind()))
                })?;
                self.config.geometry = geometry;
                geometry_changed = true;
            }
            ShapeAttr::Angle(angle) => self.config.angle = *angle,
            ShapeAttr::Position(position) => {
                self.config.position = *position;
                geometry_changed = true;
            }
            ShapeAttr::CollisionGroup(group) => {
                parse_bitmask(group)?;
                self.config.collision_group = group.clone();
            }
            ShapeAttr::CollisionMask(mask) => {
                parse_bitmask(mask)?;
                self.config.collision_mask = mask.clone();
            }
            ShapeAttr::Sensor(sensor) => self.config.sensor = *sensor,
        }

        let config = &self.config;
        let Some(shape) = controller.world_mut().shape_mut(self.handle) else {
            return Err(PhysicsError::BindingNotFound(format!("{} shape of entity {}", config.kind(), self.entity)));
        };
        shape.geometry = config.geometry;
        shape.local_position = config.position;
        shape.local_angle = config.angle.to_radians();
        shape.collision_group = parse_bitmask(&config.collision_group)?;
        shape.collision_mask = parse_bitmask(&config.collision_mask)?;
        shape.sensor = config.sensor;
        let body = shape.body();

        if let (true, Some(body)) = (geometry_changed, body) {
            controller.world_mut().update_mass_properties(body);
        }
        Ok(())
    }

    /// Detach and destroy the shape
    pub(crate) fn destroy(self, controller: &mut WorldController) {
        controller.world_mut().destroy_shape(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BodyType, RigidBody};
    use crate::settings::WorldSettings;

    fn setup() -> (WorldController, BodyHandle) {
        let mut controller = WorldController::new(&WorldSettings::default()).unwrap();
        let body = controller.world_mut().create_body(RigidBody::new(BodyType::Dynamic, 2.0));
        (controller, body)
    }

    #[test]
    fn test_parse_bitmask() {
        assert_eq!(parse_bitmask("00000001").unwrap(), 1);
        assert_eq!(parse_bitmask("10000101").unwrap(), 0b1000_0101);
        assert!(matches!(parse_bitmask("0000001"), Err(PhysicsError::InvalidBitmask(_))));
        assert!(matches!(parse_bitmask("0000002x"), Err(PhysicsError::InvalidBitmask(_))));
        assert!(matches!(parse_bitmask("000000001"), Err(PhysicsError::InvalidBitmask(_))));
    }

    #[test]
    fn test_invalid_bitmask_fails_construction() {
        let (mut controller, body) = setup();
        let config = ShapeConfig {
            collision_mask: "11".to_string(),
            ..ShapeConfig::circle()
        };
        let result = ShapeBinding::create(EntityId::new(), config, &mut controller, Some(body));
        assert!(matches!(result, Err(PhysicsError::InvalidBitmask(_))));
        assert!(controller.world().body(body).unwrap().shapes().is_empty());
    }

    #[test]
    fn test_enable_disable_enable_single_attachment() {
        let (mut controller, body) = setup();
        let mut binding =
            ShapeBinding::create(EntityId::new(), ShapeConfig::rectangle(), &mut controller, Some(body)).unwrap();

        binding.set_enabled(true, Some(body), &mut controller);
        binding.set_enabled(false, Some(body), &mut controller);
        binding.set_enabled(false, Some(body), &mut controller);
        assert!(controller.world().body(body).unwrap().shapes().is_empty());

        binding.set_enabled(true, Some(body), &mut controller);
        binding.set_enabled(true, Some(body), &mut controller);
        assert_eq!(controller.world().body(body).unwrap().shapes(), &[binding.handle()]);
    }

    #[test]
    fn test_attribute_changes_mutate_live_shape() {
        let (mut controller, body) = setup();
        let mut binding =
            ShapeBinding::create(EntityId::new(), ShapeConfig::circle(), &mut controller, Some(body)).unwrap();
        let handle = binding.handle();
        let inertia_before = controller.world().body(body).unwrap().inertia();

        binding.apply(ShapeAttr::Radius(2.0), &mut controller).unwrap();
        binding.apply(ShapeAttr::Sensor(true), &mut controller).unwrap();
        binding.apply(ShapeAttr::CollisionGroup("00000110".to_string()), &mut controller).unwrap();

        let shape = controller.world().shape(handle).unwrap();
        assert_eq!(shape.geometry, Geometry::Circle { radius: 2.0 });
        assert!(shape.sensor);
        assert_eq!(shape.collision_group, 6);
        assert!(controller.world().body(body).unwrap().inertia() > inertia_before);
    }

    #[test]
    fn test_invalid_runtime_change_keeps_shape() {
        let (mut controller, body) = setup();
        let mut binding =
            ShapeBinding::create(EntityId::new(), ShapeConfig::circle(), &mut controller, Some(body)).unwrap();

        assert!(binding.apply(ShapeAttr::CollisionMask("abc".to_string()), &mut controller).is_err());
        assert!(binding.apply(ShapeAttr::Width(3.0), &mut controller).is_err());
        assert_eq!(binding.config().collision_mask, "00000001");
        assert_eq!(controller.world().shape(binding.handle()).unwrap().collision_mask, 1);
    }
}
