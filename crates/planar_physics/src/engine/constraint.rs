// SPDX-License-Identifier: MIT OR Apache-2.0
//! Joints and the solver equations they produce.

use super::body::{BodyHandle, RigidBody};
use glam::{DVec2, DVec3};

/// Default constraint stiffness
pub const DEFAULT_STIFFNESS: f64 = 1e6;
/// Default constraint relaxation, in sub-steps
pub const DEFAULT_RELAXATION: f64 = 4.0;
/// Default maximum revolute motor torque
pub const DEFAULT_MAX_MOTOR_TORQUE: f64 = 1e6;

/// Handle of a joint stored in the engine world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointHandle(pub(crate) u64);

/// One scalar velocity constraint between two bodies.
///
/// The jacobians pack `(linear.x, linear.y, angular)`. `body_b` may be absent,
/// in which case the equation acts against the static world.
#[derive(Debug, Clone)]
pub(crate) struct Equation {
    pub body_a: BodyHandle,
    pub body_b: Option<BodyHandle>,
    pub jacobian_a: DVec3,
    pub jacobian_b: DVec3,
    /// Position error `G q`
    pub error: f64,
    /// Desired value of `G W`
    pub target_velocity: f64,
    pub min_force: f64,
    pub max_force: f64,
    pub stiffness: f64,
    pub relaxation: f64,
}

impl Equation {
    pub fn new(body_a: BodyHandle, body_b: Option<BodyHandle>, jacobian_a: DVec3, jacobian_b: DVec3) -> Self {
        Self {
            body_a,
            body_b,
            jacobian_a,
            jacobian_b,
            error: 0.0,
            target_velocity: 0.0,
            min_force: -f64::MAX,
            max_force: f64::MAX,
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
        }
    }

    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error;
        self
    }

    pub fn with_bounds(mut self, min_force: f64, max_force: f64) -> Self {
        self.min_force = min_force;
        self.max_force = max_force;
        self
    }

    pub fn with_spook(mut self, stiffness: f64, relaxation: f64) -> Self {
        self.stiffness = stiffness;
        self.relaxation = relaxation;
        self
    }
}

/// Point-to-point constraint along `axis` between two anchored points
fn point_equation(a: &Anchored, b: &Anchored, axis: DVec2) -> (DVec3, DVec3) {
    (
        DVec3::new(-axis.x, -axis.y, -a.r.perp_dot(axis)),
        DVec3::new(axis.x, axis.y, b.r.perp_dot(axis)),
    )
}

/// World-space offset and point of a body-local anchor
struct Anchored {
    r: DVec2,
    point: DVec2,
}

impl Anchored {
    fn new(body: &RigidBody, local: DVec2) -> Self {
        let r = body.vector_to_world(local);
        Self {
            r,
            point: body.position + r,
        }
    }
}

/// Keeps two anchor points at a fixed distance
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceJoint {
    /// Anchor on body A, body-local
    pub local_anchor_a: DVec2,
    /// Anchor on body B, body-local
    pub local_anchor_b: DVec2,
    /// Target distance
    pub distance: f64,
    /// Maximum constraint force
    pub max_force: f64,
}

impl DistanceJoint {
    /// Create a distance joint. When `distance` is `None` the current distance
    /// between the world anchors is used.
    pub fn new(
        a: &RigidBody,
        b: &RigidBody,
        local_anchor_a: DVec2,
        local_anchor_b: DVec2,
        distance: Option<f64>,
    ) -> Self {
        let distance =
            distance.unwrap_or_else(|| b.point_to_world(local_anchor_b).distance(a.point_to_world(local_anchor_a)));
        Self {
            local_anchor_a,
            local_anchor_b,
            distance,
            max_force: f64::MAX,
        }
    }
}

/// Pins two bodies together at a pivot, with optional limits and motor
#[derive(Debug, Clone, PartialEq)]
pub struct RevoluteJoint {
    /// Pivot on body A, body-local
    pub local_pivot_a: DVec2,
    /// Pivot on body B, body-local
    pub local_pivot_b: DVec2,
    lower_limit: Option<f64>,
    upper_limit: Option<f64>,
    motor_enabled: bool,
    motor_speed: f64,
    max_motor_torque: f64,
}

impl RevoluteJoint {
    /// Create a revolute joint without limits or motor
    pub fn new(local_pivot_a: DVec2, local_pivot_b: DVec2) -> Self {
        Self {
            local_pivot_a,
            local_pivot_b,
            lower_limit: None,
            upper_limit: None,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_torque: DEFAULT_MAX_MOTOR_TORQUE,
        }
    }

    /// Limit the relative angle (radians) to `[lower, upper]`
    pub fn set_limits(&mut self, lower: f64, upper: f64) {
        self.lower_limit = Some(lower);
        self.upper_limit = Some(upper);
    }

    /// Remove both angle limits
    pub fn clear_limits(&mut self) {
        self.lower_limit = None;
        self.upper_limit = None;
    }

    /// Current limits, if enabled
    pub fn limits(&self) -> (Option<f64>, Option<f64>) {
        (self.lower_limit, self.upper_limit)
    }

    /// Enable the velocity motor
    pub fn enable_motor(&mut self) {
        self.motor_enabled = true;
    }

    /// Disable the velocity motor
    pub fn disable_motor(&mut self) {
        self.motor_enabled = false;
    }

    /// Check if the motor is enabled
    pub fn motor_enabled(&self) -> bool {
        self.motor_enabled
    }

    /// Target relative angular speed of B with respect to A
    pub fn set_motor_speed(&mut self, speed: f64) {
        self.motor_speed = speed;
    }

    /// Current motor speed
    pub fn motor_speed(&self) -> f64 {
        self.motor_speed
    }

    /// Cap on the motor torque
    pub fn set_max_motor_torque(&mut self, torque: f64) {
        self.max_motor_torque = torque.abs();
    }
}

/// Lets body B slide along an axis fixed in body A
#[derive(Debug, Clone, PartialEq)]
pub struct PrismaticJoint {
    /// Anchor on body A, body-local
    pub local_anchor_a: DVec2,
    /// Anchor on body B, body-local
    pub local_anchor_b: DVec2,
    /// Slide axis in body A's frame
    pub local_axis_a: DVec2,
    /// Keep the relative angle at its build-time value
    pub rotational_lock: bool,
    reference_angle: f64,
}

impl PrismaticJoint {
    /// Create a prismatic joint; the current relative angle becomes the locked angle
    pub fn new(
        a: &RigidBody,
        b: &RigidBody,
        local_anchor_a: DVec2,
        local_anchor_b: DVec2,
        local_axis_a: DVec2,
        rotational_lock: bool,
    ) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            local_axis_a,
            rotational_lock,
            reference_angle: b.angle - a.angle,
        }
    }
}

/// Joint kinds
#[derive(Debug, Clone, PartialEq)]
pub enum JointKind {
    /// Fixed distance between anchors
    Distance(DistanceJoint),
    /// Shared pivot
    Revolute(RevoluteJoint),
    /// Slider
    Prismatic(PrismaticJoint),
}

/// A constraint between two bodies
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// First body
    pub body_a: BodyHandle,
    /// Second body
    pub body_b: BodyHandle,
    /// Kind-specific data
    pub kind: JointKind,
    /// Whether the connected bodies may still collide
    pub collide_connected: bool,
    /// Constraint stiffness
    pub stiffness: f64,
    /// Constraint relaxation
    pub relaxation: f64,
}

impl Joint {
    /// Create a joint with default stiffness and relaxation
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, kind: JointKind) -> Self {
        Self {
            body_a,
            body_b,
            kind,
            collide_connected: true,
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
        }
    }

    /// Build the solver equations for the current body poses
    pub(crate) fn equations(&self, a: &RigidBody, b: &RigidBody) -> Vec<Equation> {
        let eq = |(ja, jb): (DVec3, DVec3)| {
            Equation::new(self.body_a, Some(self.body_b), ja, jb).with_spook(self.stiffness, self.relaxation)
        };
        let relative_angle = b.angle - a.angle;

        match &self.kind {
            JointKind::Distance(joint) => {
                let pa = Anchored::new(a, joint.local_anchor_a);
                let pb = Anchored::new(b, joint.local_anchor_b);
                let delta = pb.point - pa.point;
                let length = delta.length();
                let normal = if length > f64::EPSILON { delta / length } else { DVec2::Y };
                vec![eq(point_equation(&pa, &pb, normal))
                    .with_error(length - joint.distance)
                    .with_bounds(-joint.max_force, joint.max_force)]
            }
            JointKind::Revolute(joint) => {
                let pa = Anchored::new(a, joint.local_pivot_a);
                let pb = Anchored::new(b, joint.local_pivot_b);
                let delta = pb.point - pa.point;
                let mut equations = vec![
                    eq(point_equation(&pa, &pb, DVec2::X)).with_error(delta.x),
                    eq(point_equation(&pa, &pb, DVec2::Y)).with_error(delta.y),
                ];

                let rotational = (DVec3::new(0.0, 0.0, -1.0), DVec3::new(0.0, 0.0, 1.0));
                if let Some(upper) = joint.upper_limit {
                    if relative_angle > upper {
                        equations.push(eq(rotational).with_error(relative_angle - upper).with_bounds(-f64::MAX, 0.0));
                    }
                }
                if let Some(lower) = joint.lower_limit {
                    if relative_angle < lower {
                        equations.push(eq(rotational).with_error(relative_angle - lower).with_bounds(0.0, f64::MAX));
                    }
                }
                if joint.motor_enabled {
                    let mut motor = eq(rotational).with_bounds(-joint.max_motor_torque, joint.max_motor_torque);
                    motor.target_velocity = joint.motor_speed;
                    equations.push(motor);
                }
                equations
            }
            JointKind::Prismatic(joint) => {
                let pa = Anchored::new(a, joint.local_anchor_a);
                let pb = Anchored::new(b, joint.local_anchor_b);
                let gap = pb.point - pa.point;
                let axis = a.vector_to_world(joint.local_axis_a).normalize_or_zero();
                let t = axis.perp();

                let ja = DVec3::new(-t.x, -t.y, -pa.r.perp_dot(t) + t.perp_dot(gap));
                let jb = DVec3::new(t.x, t.y, pb.r.perp_dot(t));
                let mut equations = vec![eq((ja, jb)).with_error(t.dot(gap))];

                if joint.rotational_lock {
                    let rotational = (DVec3::new(0.0, 0.0, -1.0), DVec3::new(0.0, 0.0, 1.0));
                    equations.push(eq(rotational).with_error(relative_angle - joint.reference_angle));
                }
                equations
            }
        }
    }
}
