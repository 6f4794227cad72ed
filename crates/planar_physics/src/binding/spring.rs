// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-body spring binding (linear and rotational).
//!
//! Follows the same endpoint protocol as joints. Anchors may be given in
//! world space; they are converted to body-local coordinates whenever the
//! spring is built or an anchor changes.

use crate::engine::{BodyHandle, LinearSpring, RigidBody, RotationalSpring, Spring, SpringHandle, SpringKind};
use crate::error::{PhysicsError, Result};
use crate::registry::Endpoint;
use crate::world::WorldController;
use glam::DVec2;
use planar_scene::EntityId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a spring binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpringId(pub Uuid);

impl SpringId {
    /// Create a new random spring ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpringId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SpringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "spring {}", self.0)
    }
}

/// Coordinate space of a configured anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnchorSpace {
    /// Relative to the body
    #[default]
    Local,
    /// Simulation-plane coordinates
    World,
}

impl AnchorSpace {
    fn to_local(self, body: &RigidBody, anchor: DVec2) -> DVec2 {
        match self {
            AnchorSpace::Local => anchor,
            AnchorSpace::World => body.point_to_local(anchor),
        }
    }
}

/// Kind-specific spring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpringKindConfig {
    /// Spring along the line between two anchors
    Linear {
        /// Anchor on body A
        anchor_a: DVec2,
        /// Space of `anchor_a`
        anchor_a_space: AnchorSpace,
        /// Anchor on body B
        anchor_b: DVec2,
        /// Space of `anchor_b`
        anchor_b_space: AnchorSpace,
        /// Rest length; measured at build time when not positive
        rest_length: f64,
    },
    /// Torsion spring on the relative angle
    Rotational {
        /// Rest angle in degrees; measured at build time when absent
        rest_angle: Option<f64>,
    },
}

impl SpringKindConfig {
    /// Linear spring between the body centers with a measured rest length
    pub fn linear() -> Self {
        SpringKindConfig::Linear {
            anchor_a: DVec2::ZERO,
            anchor_a_space: AnchorSpace::Local,
            anchor_b: DVec2::ZERO,
            anchor_b_space: AnchorSpace::Local,
            rest_length: 0.0,
        }
    }

    /// Rotational spring with a measured rest angle
    pub fn rotational() -> Self {
        SpringKindConfig::Rotational { rest_angle: None }
    }
}

/// Spring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    /// Entity of body A; the owning entity when absent
    pub entity_a: Option<EntityId>,
    /// Entity of body B
    pub entity_b: Option<EntityId>,
    /// Kind-specific parameters
    pub kind: SpringKindConfig,
    /// Spring constant
    pub stiffness: f64,
    /// Damping coefficient
    pub damping: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            entity_a: None,
            entity_b: None,
            kind: SpringKindConfig::linear(),
            stiffness: 100.0,
            damping: 1.0,
        }
    }
}

impl SpringConfig {
    /// Spring of `kind` connecting the owner to `other`
    pub fn new(kind: SpringKindConfig, other: EntityId) -> Self {
        Self {
            entity_b: Some(other),
            kind,
            ..Default::default()
        }
    }
}

/// Runtime spring attribute change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpringAttr {
    /// Spring constant
    Stiffness(f64),
    /// Damping coefficient
    Damping(f64),
    /// Anchor on body A
    AnchorA(DVec2),
    /// Space of the A anchor
    AnchorASpace(AnchorSpace),
    /// Anchor on body B
    AnchorB(DVec2),
    /// Space of the B anchor
    AnchorBSpace(AnchorSpace),
    /// Rest length; not positive re-measures
    RestLength(f64),
    /// Rest angle in degrees; `None` re-measures
    RestAngle(Option<f64>),
}

/// Binds one spring between two entities' bodies
#[derive(Debug)]
pub struct SpringBinding {
    id: SpringId,
    owner: EntityId,
    config: SpringConfig,
    body_a: Option<BodyHandle>,
    body_b: Option<BodyHandle>,
    handle: Option<SpringHandle>,
    enabled: bool,
}

impl SpringBinding {
    pub(crate) fn new(id: SpringId, owner: EntityId, config: SpringConfig) -> Self {
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
    pub fn id(&self) -> SpringId {
        self.id
    }

    /// Entity that owns the binding
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Current configuration
    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    /// Live spring handle, if built
    pub fn handle(&self) -> Option<SpringHandle> {
        self.handle
    }

    /// Whether the binding is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check if the spring is waiting on an endpoint
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
            SpringKindConfig::Linear {
                anchor_a,
                anchor_a_space,
                anchor_b,
                anchor_b_space,
                rest_length,
            } => SpringKind::Linear(LinearSpring::new(
                a,
                b,
                anchor_a_space.to_local(a, *anchor_a),
                anchor_b_space.to_local(b, *anchor_b),
                (*rest_length > 0.0).then_some(*rest_length),
            )),
            SpringKindConfig::Rotational { rest_angle } => {
                SpringKind::Rotational(RotationalSpring::new(a, b, rest_angle.map(f64::to_radians)))
            }
        };

        let mut spring = Spring::new(body_a, body_b, kind);
        spring.stiffness = self.config.stiffness;
        spring.damping = self.config.damping;
        self.handle = Some(world.add_spring(spring));
        tracing::debug!("Built {} between {} and {}", self.id, body_a, body_b);
    }

    pub(crate) fn remove_from_world(&mut self, controller: &mut WorldController) {
        if let Some(handle) = self.handle.take() {
            controller.world_mut().remove_spring(handle);
            tracing::debug!("Removed {} from world", self.id);
        }
    }

    /// Apply a change to the config and, when built, the live spring
    pub(crate) fn apply(&mut self, attr: SpringAttr, controller: &mut WorldController) -> Result<()> {
        match (attr, &mut self.config.kind) {
            (SpringAttr::Stiffness(v), _) => self.config.stiffness = v,
            (SpringAttr::Damping(v), _) => self.config.damping = v,
            (SpringAttr::AnchorA(v), SpringKindConfig::Linear { anchor_a, .. }) => *anchor_a = v,
            (SpringAttr::AnchorASpace(v), SpringKindConfig::Linear { anchor_a_space, .. }) => *anchor_a_space = v,
            (SpringAttr::AnchorB(v), SpringKindConfig::Linear { anchor_b, .. }) => *anchor_b = v,
            (SpringAttr::AnchorBSpace(v), SpringKindConfig::Linear { anchor_b_space, .. }) => *anchor_b_space = v,
            (SpringAttr::RestLength(v), SpringKindConfig::Linear { rest_length, .. }) => *rest_length = v,
            (SpringAttr::RestAngle(v), SpringKindConfig::Rotational { rest_angle }) => *rest_angle = v,
            _ => {
                return Err(PhysicsError::InvalidSetting(format!(
                    "{attr:?} does not apply to this spring kind"
                )))
            }
        }

        let (Some(handle), Some(body_a), Some(body_b)) = (self.handle, self.body_a, self.body_b) else {
            return Ok(());
        };
        let world = controller.world_mut();
        let (Some(a), Some(b)) = (world.body(body_a).cloned(), world.body(body_b).cloned()) else {
            return Ok(());
        };
        let Some(spring) = world.spring_mut(handle) else {
            return Ok(());
        };

        match (&mut spring.kind, &self.config.kind) {
            (
                SpringKind::Linear(live),
                SpringKindConfig::Linear {
                    anchor_a,
                    anchor_a_space,
                    anchor_b,
                    anchor_b_space,
                    rest_length,
                },
            ) => match attr {
                SpringAttr::AnchorA(_) | SpringAttr::AnchorASpace(_) => {
                    live.local_anchor_a = anchor_a_space.to_local(&a, *anchor_a);
                }
                SpringAttr::AnchorB(_) | SpringAttr::AnchorBSpace(_) => {
                    live.local_anchor_b = anchor_b_space.to_local(&b, *anchor_b);
                }
                SpringAttr::RestLength(_) => {
                    live.rest_length = LinearSpring::new(
                        &a,
                        &b,
                        live.local_anchor_a,
                        live.local_anchor_b,
                        (*rest_length > 0.0).then_some(*rest_length),
                    )
                    .rest_length;
                }
                _ => {}
            },
            (SpringKind::Rotational(live), SpringKindConfig::Rotational { rest_angle }) => {
                if let SpringAttr::RestAngle(_) = attr {
                    *live = RotationalSpring::new(&a, &b, rest_angle.map(f64::to_radians));
                }
            }
            _ => {}
        }
        spring.stiffness = self.config.stiffness;
        spring.damping = self.config.damping;
        Ok(())
    }
}
