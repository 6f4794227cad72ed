// SPDX-License-Identifier: MIT OR Apache-2.0
//! Top-down vehicle: a chassis body with a front and a back wheel.

use super::body::{BodyHandle, RigidBody};
use super::constraint::Equation;
use glam::{DVec2, DVec3};

/// Handle of a vehicle stored in the engine world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleHandle(pub(crate) u64);

/// A wheel contact on the chassis
#[derive(Debug, Clone, PartialEq)]
pub struct Wheel {
    /// Contact point in chassis space
    pub local_position: DVec2,
    /// Rolling direction in chassis space
    pub local_forward: DVec2,
    /// Maximum lateral friction force
    pub side_friction: f64,
    /// Drive force along the rolling direction
    pub engine_force: f64,
    /// Maximum braking force
    pub brake_force: f64,
    /// Steering angle in radians
    pub steer_value: f64,
}

impl Wheel {
    /// Create a wheel at `local_position` rolling along chassis +Y
    pub fn new(local_position: DVec2, side_friction: f64) -> Self {
        Self {
            local_position,
            local_forward: DVec2::Y,
            side_friction,
            engine_force: 0.0,
            brake_force: 0.0,
            steer_value: 0.0,
        }
    }

    /// Rolling direction in chassis space after steering
    pub fn steered_forward(&self) -> DVec2 {
        DVec2::from_angle(self.steer_value).rotate(self.local_forward)
    }

    /// Signed speed of the contact point along the unsteered forward direction
    pub fn speed(&self, chassis: &RigidBody) -> f64 {
        let forward = chassis.vector_to_world(self.local_forward);
        let point = chassis.point_to_world(self.local_position);
        chassis.velocity_at_world_point(point).dot(forward)
    }

    /// Push the drive force onto the chassis
    pub(crate) fn apply_engine_force(&self, chassis: &mut RigidBody) {
        if self.engine_force != 0.0 {
            chassis.apply_force_local(self.steered_forward() * self.engine_force, self.local_position);
        }
    }

    /// Forward (braking) and side (grip) equations against the ground
    pub(crate) fn equations(&self, handle: BodyHandle, chassis: &RigidBody) -> [Equation; 2] {
        let r = chassis.vector_to_world(self.local_position);
        let forward = chassis.vector_to_world(self.steered_forward()).normalize_or_zero();
        let side = forward.perp();

        let along = |t: DVec2| DVec3::new(t.x, t.y, r.perp_dot(t));
        [
            Equation::new(handle, None, along(forward), DVec3::ZERO).with_bounds(-self.brake_force, self.brake_force),
            Equation::new(handle, None, along(side), DVec3::ZERO).with_bounds(-self.side_friction, self.side_friction),
        ]
    }
}

/// A chassis with a steerable front wheel and a driven back wheel
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Chassis body
    pub chassis: BodyHandle,
    /// Steered wheel
    pub front: Wheel,
    /// Driven wheel
    pub back: Wheel,
}

impl Vehicle {
    /// Create a vehicle on `chassis`
    pub fn new(chassis: BodyHandle, front: Wheel, back: Wheel) -> Self {
        Self { chassis, front, back }
    }

    pub(crate) fn wheels(&self) -> [&Wheel; 2] {
        [&self.front, &self.back]
    }
}
