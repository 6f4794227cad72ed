// SPDX-License-Identifier: MIT OR Apache-2.0
//! Damped springs between two bodies.

use super::body::{BodyHandle, RigidBody};
use glam::DVec2;

/// Handle of a spring stored in the engine world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpringHandle(pub(crate) u64);

/// Pulls two anchor points towards a rest length
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSpring {
    /// Anchor on body A, body-local
    pub local_anchor_a: DVec2,
    /// Anchor on body B, body-local
    pub local_anchor_b: DVec2,
    /// Distance at which the spring exerts no force
    pub rest_length: f64,
}

impl LinearSpring {
    /// Create a linear spring. A `rest_length` of `None` uses the current anchor distance.
    pub fn new(
        a: &RigidBody,
        b: &RigidBody,
        local_anchor_a: DVec2,
        local_anchor_b: DVec2,
        rest_length: Option<f64>,
    ) -> Self {
        let rest_length = rest_length
            .unwrap_or_else(|| b.point_to_world(local_anchor_b).distance(a.point_to_world(local_anchor_a)));
        Self {
            local_anchor_a,
            local_anchor_b,
            rest_length,
        }
    }
}

/// Pulls the relative angle of two bodies towards a rest angle
#[derive(Debug, Clone, PartialEq)]
pub struct RotationalSpring {
    /// Relative angle (radians) at which the spring exerts no torque
    pub rest_angle: f64,
}

impl RotationalSpring {
    /// Create a rotational spring. A `rest_angle` of `None` uses the current relative angle.
    pub fn new(a: &RigidBody, b: &RigidBody, rest_angle: Option<f64>) -> Self {
        Self {
            rest_angle: rest_angle.unwrap_or(b.angle - a.angle),
        }
    }
}

/// Spring kinds
#[derive(Debug, Clone, PartialEq)]
pub enum SpringKind {
    /// Translational spring
    Linear(LinearSpring),
    /// Angular spring
    Rotational(RotationalSpring),
}

/// A spring between two bodies
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    /// First body
    pub body_a: BodyHandle,
    /// Second body
    pub body_b: BodyHandle,
    /// Kind-specific data
    pub kind: SpringKind,
    /// Spring constant
    pub stiffness: f64,
    /// Damping constant
    pub damping: f64,
}

impl Spring {
    /// Create a spring with default stiffness and damping
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, kind: SpringKind) -> Self {
        Self {
            body_a,
            body_b,
            kind,
            stiffness: 100.0,
            damping: 1.0,
        }
    }

    /// Forces and torques the spring exerts on both bodies
    pub(crate) fn forces(&self, a: &RigidBody, b: &RigidBody) -> SpringForces {
        match &self.kind {
            SpringKind::Linear(spring) => {
                let ri = a.vector_to_world(spring.local_anchor_a);
                let rj = b.vector_to_world(spring.local_anchor_b);
                let delta = (b.position + rj) - (a.position + ri);
                let length = delta.length();
                if length <= f64::EPSILON {
                    return SpringForces::default();
                }
                let direction = delta / length;
                let relative_velocity = (b.velocity + b.angular_velocity * rj.perp())
                    - (a.velocity + a.angular_velocity * ri.perp());

                let magnitude =
                    -self.stiffness * (length - spring.rest_length) - self.damping * relative_velocity.dot(direction);
                let force = direction * magnitude;

                SpringForces {
                    force_a: -force,
                    torque_a: -ri.perp_dot(force),
                    force_b: force,
                    torque_b: rj.perp_dot(force),
                }
            }
            SpringKind::Rotational(spring) => {
                let angle = b.angle - a.angle;
                let torque = -self.stiffness * (angle - spring.rest_angle)
                    - self.damping * (b.angular_velocity - a.angular_velocity);
                SpringForces {
                    torque_a: -torque,
                    torque_b: torque,
                    ..Default::default()
                }
            }
        }
    }
}

/// Spring output for one sub-step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct SpringForces {
    pub force_a: DVec2,
    pub torque_a: f64,
    pub force_b: DVec2,
    pub torque_b: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretched_spring_pulls_bodies_together() {
        let a = RigidBody::default();
        let mut b = RigidBody::default();
        b.position = DVec2::new(2.0, 0.0);

        let linear = LinearSpring::new(&a, &b, DVec2::ZERO, DVec2::ZERO, Some(1.0));
        let spring = Spring::new(BodyHandle(1), BodyHandle(2), SpringKind::Linear(linear));

        let forces = spring.forces(&a, &b);
        assert!(forces.force_a.x > 0.0);
        assert!(forces.force_b.x < 0.0);
        assert!((forces.force_a.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rest_values_measured_when_absent() {
        let a = RigidBody::default();
        let mut b = RigidBody::default();
        b.position = DVec2::new(0.0, 3.0);
        b.angle = 0.25;

        let linear = LinearSpring::new(&a, &b, DVec2::ZERO, DVec2::ZERO, None);
        assert!((linear.rest_length - 3.0).abs() < 1e-12);
        let rotational = RotationalSpring::new(&a, &b, None);
        assert!((rotational.rest_angle - 0.25).abs() < 1e-12);
    }
}
