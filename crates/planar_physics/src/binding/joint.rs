// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-body joint binding (distance, prismatic, revolute).
//!
//! A joint exists in the world only while both endpoint bodies are known
//! and the binding is enabled. Endpoint changes always rebuild the joint;
//! every other parameter is written into the live joint, or just kept in
//! the config until the next build.

use crate::engine::{
    BodyHandle, DistanceJoint, Joint, JointHandle, JointKind, PrismaticJoint, RevoluteJoint,
    constraint::{DEFAULT_MAX_MOTOR_TORQUE, DEFAULT_RELAXATION, DEFAULT_STIFFNESS},
};
use crate::error::{PhysicsError, Result};
use crate::registry::Endpoint;
use crate::world::WorldController;
use glam::DVec2;
use planar_scene::EntityId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a joint binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JointId(pub Uuid);

impl JointId {
    /// Create a new random joint ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JointId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "joint {}", self.0)
    }
}

/// Kind-specific joint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JointKindConfig {
    /// Fixed distance between two anchors
    Distance {
        /// Anchor on body A
        local_anchor_a: DVec2,
        /// Anchor on body B
        local_anchor_b: DVec2,
        /// Target distance; measured at build time when absent
        distance: Option<f64>,
    },
    /// Slider along an axis of body A
    Prismatic {
        /// Anchor on body A
        local_anchor_a: DVec2,
        /// Anchor on body B
        local_anchor_b: DVec2,
        /// Slide axis in body A's frame
        local_axis_a: DVec2,
        /// Let the bodies rotate relative to each other
        disable_rotational_lock: bool,
    },
    /// Shared pivot
    Revolute {
        /// Pivot on body A
        local_pivot_a: DVec2,
        /// Pivot on body B
        local_pivot_b: DVec2,
        /// Apply angle limits
        limits_enabled: bool,
        /// Lower and upper limit in degrees
        limits: DVec2,
        /// Drive with the motor
        motor_enabled: bool,
        /// Motor speed in radians per second
        motor_speed: f64,
        /// Motor torque cap
        max_motor_torque: f64,
    },
}

impl JointKindConfig {
    /// Distance joint between the body centers
    pub fn distance() -> Self {
        JointKindConfig::Distance {
            local_anchor_a: DVec2::ZERO,
            local_anchor_b: DVec2::ZERO,
            distance: None,
        }
    }

    /// Prismatic joint along local X
    pub fn prismatic() -> Self {
        JointKindConfig::Prismatic {
            local_anchor_a: DVec2::ZERO,
            local_anchor_b: DVec2::ZERO,
            local_axis_a: DVec2::X,
            disable_rotational_lock: false,
        }
    }

    /// Revolute joint at the body centers, no limits, motor off
    pub fn revolute() -> Self {
        JointKindConfig::Revolute {
            local_pivot_a: DVec2::ZERO,
            local_pivot_b: DVec2::ZERO,
            limits_enabled: false,
            limits: DVec2::ZERO,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_torque: DEFAULT_MAX_MOTOR_TORQUE,
        }
    }
}

/// Joint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointConfig {
    /// Entity of body A; the owning entity when absent
    pub entity_a: Option<EntityId>,
    /// Entity of body B
    pub entity_b: Option<EntityId>,
    /// Kind-specific parameters
    pub kind: JointKindConfig,
    /// Whether the connected bodies may collide
    pub collide_connected: bool,
    /// Constraint stiffness
    pub stiffness: f64,
    /// Constraint relaxation
    pub relaxation: f64,
}

impl Default for JointConfig {
    fn default() -> Self {
        Self {
            entity_a: None,
            entity_b: None,
            kind: JointKindConfig::distance(),
            collide_connected: true,
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
        }
    }
}

impl JointConfig {
    /// Joint of `kind` connecting the owner to `other`
    pub fn new(kind: JointKindConfig, other: EntityId) -> Self {
        Self {
            entity_b: Some(other),
            kind,
            ..Default::default()
        }
    }
}

/// Runtime joint attribute change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointAttr {
    /// Constraint stiffness
    Stiffness(f64),
    /// Constraint relaxation
    Relaxation(f64),
    /// Whether connected bodies collide
    CollideConnected(bool),
    /// Anchor or pivot on body A
    LocalAnchorA(DVec2),
    /// Anchor or pivot on body B
    LocalAnchorB(DVec2),
    /// Distance joint target; `None` re-measures
    Distance(Option<f64>),
    /// Prismatic slide axis
    LocalAxisA(DVec2),
    /// Prismatic rotational freedom
    DisableRotationalLock(bool),
    /// Revolute limits on or off
    LimitsEnabled(bool),
    /// Revolute limits in degrees
    Limits(DVec2),
    /// Revolute motor on or off
    MotorEnabled(bool),
    /// Revolute motor speed
    MotorSpeed(f64),
    /// Revolute motor torque cap
    MaxMotorTorque(f64),
}

/// Binds one joint between two entities' bodies
#[derive(Debug)]
pub struct JointBinding {
    id: JointId,
    owner: EntityId,
    config: JointConfig,
    body_a: Option<BodyHandle>,
    body_b: Option<BodyHandle>,
    handle: Option<JointHandle>,
    enabled: bool,
}

impl JointBinding {
    pub(crate) fn new(id: JointId, owner: EntityId, config: JointConfig) -> Self {
        Self {
            id,
            owner,
            config,
            body_a: None,
            body_b: None,
            handle: None,
            enabled: true,
        }
    }

    /// Binding ID
    pub fn id(&self) -> JointId {
        self.id
    }

    /// Entity that owns the binding
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Current configuration
    pub fn config(&self) -> &JointConfig {
        &self.config
    }

    /// Live joint handle, if built
    pub fn handle(&self) -> Option<JointHandle> {
        self.handle
    }

    /// Whether the binding is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check if the joint is waiting on an endpoint
    pub fn is_pending(&self) -> bool {
        self.body_a.is_none() || self.body_b.is_none()
    }

    /// Entity an endpoint resolves against
    pub fn endpoint_entity(&self, endpoint: Endpoint) -> Option<EntityId> {
        match endpoint {
            Endpoint::A => Some(self.config.entity_a.unwrap_or(self.owner)),
            Endpoint::B => self.config.entity_b,
        }
    }

    pub(crate) fn set_endpoint_entity(&mut self, endpoint: Endpoint, entity: Option<EntityId>) {
        match endpoint {
            Endpoint::A => self.config.entity_a = entity,
            Endpoint::B => self.config.entity_b = entity,
        }
    }

    /// Store (or clear) an endpoint body and rebuild or tear down accordingly
    pub(crate) fn set_endpoint_body(
        &mut self,
        endpoint: Endpoint,
        body: Option<BodyHandle>,
        controller: &mut WorldController,
    ) {
        match endpoint {
            Endpoint::A => self.body_a = body,
            Endpoint::B => self.body_b = body,
        }
        if body.is_some() {
            self.rebuild(controller);
        } else {
            self.remove_from_world(controller);
        }
    }

    /// Enable or disable. Disabling removes the joint from the world at once.
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

    /// Destroy any live joint and build a fresh one if both endpoints are known
    pub(crate) fn rebuild(&mut self, controller: &mut WorldController) {
        self.remove_from_world(controller);
        if !self.enabled {
            return;
        }
        let (Some(body_a), Some(body_b)) = (self.body_a, self.body_b) else {
            return;
        };
        let world = controller.world_mut();
        let (Some(a), Some(b)) = (world.body(body_a), world.body(body_b)) else {
            tracing::warn!("{} endpoints refer to missing bodies", self.id);
            return;
        };

        let kind = match &self.config.kind {
            JointKindConfig::Distance {
                local_anchor_a,
                local_anchor_b,
                distance,
            } => JointKind::Distance(DistanceJoint::new(a, b, *local_anchor_a, *local_anchor_b, *distance)),
            JointKindConfig::Prismatic {
                local_anchor_a,
                local_anchor_b,
                local_axis_a,
                disable_rotational_lock,
            } => JointKind::Prismatic(PrismaticJoint::new(
                a,
                b,
                *local_anchor_a,
                *local_anchor_b,
                *local_axis_a,
                !disable_rotational_lock,
            )),
            JointKindConfig::Revolute {
                local_pivot_a,
                local_pivot_b,
                limits_enabled,
                limits,
                motor_enabled,
                motor_speed,
                max_motor_torque,
            } => {
                let mut joint = RevoluteJoint::new(*local_pivot_a, *local_pivot_b);
                if *limits_enabled {
                    joint.set_limits(limits.x.to_radians(), limits.y.to_radians());
                }
                if *motor_enabled {
                    joint.enable_motor();
                }
                joint.set_motor_speed(*motor_speed);
                joint.set_max_motor_torque(*max_motor_torque);
                JointKind::Revolute(joint)
            }
        };

        let mut joint = Joint::new(body_a, body_b, kind);
        joint.collide_connected = self.config.collide_connected;
        joint.stiffness = self.config.stiffness;
        joint.relaxation = self.config.relaxation;

        let handle = world.add_joint(joint);
        self.handle = Some(handle);
        tracing::debug!("Built {} between {} and {}", self.id, body_a, body_b);
    }

    pub(crate) fn remove_from_world(&mut self, controller: &mut WorldController) {
        if let Some(handle) = self.handle.take() {
            controller.world_mut().remove_joint(handle);
            tracing::debug!("Removed {} from world", self.id);
        }
    }

    /// Apply a non-structural change to the config and the live joint
    pub(crate) fn apply(&mut self, attr: JointAttr, controller: &mut WorldController) -> Result<()> {
        let mismatch = || PhysicsError::InvalidSetting(format!("{attr:?} does not apply to this joint kind"));

        match (attr, &mut self.config.kind) {
            (JointAttr::Stiffness(v), _) => self.config.stiffness = v,
            (JointAttr::Relaxation(v), _) => self.config.relaxation = v,
            (JointAttr::CollideConnected(v), _) => self.config.collide_connected = v,
            (JointAttr::LocalAnchorA(v), JointKindConfig::Distance { local_anchor_a, .. })
            | (JointAttr::LocalAnchorA(v), JointKindConfig::Prismatic { local_anchor_a, .. })
            | (JointAttr::LocalAnchorA(v), JointKindConfig::Revolute { local_pivot_a: local_anchor_a, .. }) => {
                *local_anchor_a = v;
            }
            (JointAttr::LocalAnchorB(v), JointKindConfig::Distance { local_anchor_b, .. })
            | (JointAttr::LocalAnchorB(v), JointKindConfig::Prismatic { local_anchor_b, .. })
            | (JointAttr::LocalAnchorB(v), JointKindConfig::Revolute { local_pivot_b: local_anchor_b, .. }) => {
                *local_anchor_b = v;
            }
            (JointAttr::Distance(v), JointKindConfig::Distance { distance, .. }) => *distance = v,
            (JointAttr::LocalAxisA(v), JointKindConfig::Prismatic { local_axis_a, .. }) => *local_axis_a = v,
            (JointAttr::DisableRotationalLock(v), JointKindConfig::Prismatic { disable_rotational_lock, .. }) => {
                *disable_rotational_lock = v;
            }
            (JointAttr::LimitsEnabled(v), JointKindConfig::Revolute { limits_enabled, .. }) => *limits_enabled = v,
            (JointAttr::Limits(v), JointKindConfig::Revolute { limits, .. }) => *limits = v,
            (JointAttr::MotorEnabled(v), JointKindConfig::Revolute { motor_enabled, .. }) => *motor_enabled = v,
            (JointAttr::MotorSpeed(v), JointKindConfig::Revolute { motor_speed, .. }) => *motor_speed = v,
            (JointAttr::MaxMotorTorque(v), JointKindConfig::Revolute { max_motor_torque, .. }) => {
                *max_motor_torque = v;
            }
            _ => return Err(mismatch()),
        }

        let Some(handle) = self.handle else {
            return Ok(());
        };
        // Re-measuring and re-locking depend on the current poses
        if matches!(attr, JointAttr::Distance(None) | JointAttr::DisableRotationalLock(_)) {
            self.rebuild(controller);
            return Ok(());
        }
        let world = controller.world_mut();
        let Some(joint) = world.joint_mut(handle) else {
            return Ok(());
        };

        match attr {
            JointAttr::Stiffness(v) => joint.stiffness = v,
            JointAttr::Relaxation(v) => joint.relaxation = v,
            JointAttr::CollideConnected(v) => joint.collide_connected = v,
            JointAttr::LocalAnchorA(v) => match &mut joint.kind {
                JointKind::Distance(j) => j.local_anchor_a = v,
                JointKind::Prismatic(j) => j.local_anchor_a = v,
                JointKind::Revolute(j) => j.local_pivot_a = v,
            },
            JointAttr::LocalAnchorB(v) => match &mut joint.kind {
                JointKind::Distance(j) => j.local_anchor_b = v,
                JointKind::Prismatic(j) => j.local_anchor_b = v,
                JointKind::Revolute(j) => j.local_pivot_b = v,
            },
            JointAttr::Distance(v) => {
                if let (JointKind::Distance(j), Some(distance)) = (&mut joint.kind, v) {
                    j.distance = distance;
                }
            }
            JointAttr::LocalAxisA(v) => {
                if let JointKind::Prismatic(j) = &mut joint.kind {
                    j.local_axis_a = v;
                }
            }
            JointAttr::DisableRotationalLock(_) => {}
            JointAttr::LimitsEnabled(_) | JointAttr::Limits(_) => {
                if let (JointKind::Revolute(j), JointKindConfig::Revolute { limits_enabled, limits, .. }) =
                    (&mut joint.kind, &self.config.kind)
                {
                    if *limits_enabled {
                        j.set_limits(limits.x.to_radians(), limits.y.to_radians());
                    } else {
                        j.clear_limits();
                    }
                }
            }
            JointAttr::MotorEnabled(v) => {
                if let JointKind::Revolute(j) = &mut joint.kind {
                    if v {
                        j.enable_motor();
                    } else {
                        j.disable_motor();
                    }
                }
            }
            JointAttr::MotorSpeed(v) => {
                if let JointKind::Revolute(j) = &mut joint.kind {
                    j.set_motor_speed(v);
                }
            }
            JointAttr::MaxMotorTorque(v) => {
                if let JointKind::Revolute(j) = &mut joint.kind {
                    j.set_max_motor_torque(v);
                }
            }
        }
        Ok(())
    }
}
