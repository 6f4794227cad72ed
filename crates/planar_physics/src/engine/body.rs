// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rigid body state.

use super::shape::ShapeHandle;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Handle of a body stored in the engine world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u64);

impl BodyHandle {
    /// Get the raw handle value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Body motion class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyType {
    /// Immovable, infinite mass
    Static,
    /// Moved by the solver
    #[default]
    Dynamic,
    /// Moved by the scene
    Kinematic,
}

/// Sleep state of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SleepState {
    /// Simulated normally
    #[default]
    Awake,
    /// Below the speed limit, counting idle time
    Sleepy,
    /// Frozen until woken
    Sleeping,
}

/// A 2D rigid body
#[derive(Debug, Clone)]
pub struct RigidBody {
    /// Motion class
    pub body_type: BodyType,
    /// Configured mass
    pub mass: f64,
    /// Position of the center of mass
    pub position: DVec2,
    /// Angle in radians
    pub angle: f64,
    /// Linear velocity
    pub velocity: DVec2,
    /// Angular velocity in radians per second
    pub angular_velocity: f64,
    /// Linear damping, fraction of velocity lost per second
    pub damping: f64,
    /// Angular damping, fraction of angular velocity lost per second
    pub angular_damping: f64,
    /// Multiplier on world gravity
    pub gravity_scale: f64,
    /// Lock movement along X
    pub fixed_x: bool,
    /// Lock movement along Y
    pub fixed_y: bool,
    /// Lock rotation
    pub fixed_rotation: bool,
    /// Whether the body may fall asleep
    pub allow_sleep: bool,
    /// Speed below which the body counts as idle
    pub sleep_speed_limit: f64,
    /// Idle seconds before the body falls asleep
    pub sleep_time_limit: f64,
    /// Whether contacts with this body produce a response
    pub collision_response: bool,

    pub(crate) inv_mass: f64,
    pub(crate) inertia: f64,
    pub(crate) inv_inertia: f64,
    pub(crate) force: DVec2,
    pub(crate) torque: f64,
    pub(crate) sleep_state: SleepState,
    pub(crate) idle_time: f64,
    pub(crate) shapes: Vec<ShapeHandle>,
    pub(crate) in_world: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(BodyType::Dynamic, 1.0)
    }
}

impl RigidBody {
    /// Create a body at the origin. Mass properties are derived once shapes are attached.
    pub fn new(body_type: BodyType, mass: f64) -> Self {
        let mut body = Self {
            body_type,
            mass,
            position: DVec2::ZERO,
            angle: 0.0,
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
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            force: DVec2::ZERO,
            torque: 0.0,
            sleep_state: SleepState::Awake,
            idle_time: 0.0,
            shapes: Vec::new(),
            in_world: false,
        };
        body.inv_mass = if body.is_dynamic() && mass > 0.0 { 1.0 / mass } else { 0.0 };
        body
    }

    /// Check if the solver moves this body
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Mass as seen by the solver. Zero for static and kinematic bodies.
    pub fn effective_mass(&self) -> f64 {
        if self.inv_mass > 0.0 {
            1.0 / self.inv_mass
        } else {
            0.0
        }
    }

    /// Inverse mass
    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Moment of inertia about the center of mass
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Inverse moment of inertia
    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    /// Shapes attached to this body
    pub fn shapes(&self) -> &[ShapeHandle] {
        &self.shapes
    }

    /// Current sleep state
    pub fn sleep_state(&self) -> SleepState {
        self.sleep_state
    }

    /// Check if the body is sleeping
    pub fn is_sleeping(&self) -> bool {
        self.sleep_state == SleepState::Sleeping
    }

    /// Check if the body currently participates in simulation
    pub fn in_world(&self) -> bool {
        self.in_world
    }

    /// Accumulated force for the current sub-step
    pub fn force(&self) -> DVec2 {
        self.force
    }

    /// Wake the body up
    pub fn wake_up(&mut self) {
        if self.sleep_state != SleepState::Awake {
            tracing::trace!("Waking body");
        }
        self.sleep_state = SleepState::Awake;
        self.idle_time = 0.0;
    }

    /// Put the body to sleep, clearing its motion
    pub fn sleep(&mut self) {
        self.sleep_state = SleepState::Sleeping;
        self.velocity = DVec2::ZERO;
        self.angular_velocity = 0.0;
        self.force = DVec2::ZERO;
        self.torque = 0.0;
    }

    /// Rotate a body-local vector into world orientation
    pub fn vector_to_world(&self, local: DVec2) -> DVec2 {
        DVec2::from_angle(self.angle).rotate(local)
    }

    /// Rotate a world vector into body orientation
    pub fn vector_to_local(&self, world: DVec2) -> DVec2 {
        DVec2::from_angle(-self.angle).rotate(world)
    }

    /// Transform a body-local point into world space
    pub fn point_to_world(&self, local: DVec2) -> DVec2 {
        self.position + self.vector_to_world(local)
    }

    /// Transform a world point into body-local space
    pub fn point_to_local(&self, world: DVec2) -> DVec2 {
        self.vector_to_local(world - self.position)
    }

    /// Velocity of a world point rigidly attached to the body
    pub fn velocity_at_world_point(&self, world: DVec2) -> DVec2 {
        let r = world - self.position;
        self.velocity + self.angular_velocity * r.perp()
    }

    /// Apply a force at the center of mass
    pub fn apply_force(&mut self, force: DVec2) {
        self.force += force;
    }

    /// Apply a torque
    pub fn apply_torque(&mut self, torque: f64) {
        self.torque += torque;
    }

    /// Apply a world-space force at a world-space point
    pub fn apply_force_at(&mut self, force: DVec2, world_point: DVec2) {
        let r = world_point - self.position;
        self.force += force;
        self.torque += r.perp_dot(force);
    }

    /// Apply a body-local force at a body-local point
    pub fn apply_force_local(&mut self, local_force: DVec2, local_point: DVec2) {
        let force = self.vector_to_world(local_force);
        let point = self.point_to_world(local_point);
        self.apply_force_at(force, point);
    }

    /// Clear accumulated forces
    pub fn clear_forces(&mut self) {
        self.force = DVec2::ZERO;
        self.torque = 0.0;
    }

    /// Per-axis inverse mass used by the solver, honoring axis locks and sleep
    pub(crate) fn solver_inv_mass(&self) -> DVec2 {
        if !self.is_dynamic() || self.is_sleeping() {
            return DVec2::ZERO;
        }
        DVec2::new(
            if self.fixed_x { 0.0 } else { self.inv_mass },
            if self.fixed_y { 0.0 } else { self.inv_mass },
        )
    }

    /// Inverse inertia used by the solver
    pub(crate) fn solver_inv_inertia(&self) -> f64 {
        if !self.is_dynamic() || self.is_sleeping() {
            0.0
        } else {
            self.inv_inertia
        }
    }

    /// Apply damping over `dt` seconds
    pub(crate) fn apply_damping(&mut self, dt: f64) {
        self.velocity *= (1.0 - self.damping).powf(dt);
        self.angular_velocity *= (1.0 - self.angular_damping).powf(dt);
    }

    /// Advance the sleep timer. Returns true when the body is ready to sleep.
    pub(crate) fn sleep_tick(&mut self, dt: f64) -> bool {
        if !self.allow_sleep || self.is_sleeping() {
            return false;
        }
        let speed_squared = self.velocity.length_squared() + self.angular_velocity * self.angular_velocity;
        if speed_squared >= self.sleep_speed_limit * self.sleep_speed_limit {
            self.sleep_state = SleepState::Awake;
            self.idle_time = 0.0;
            return false;
        }
        self.sleep_state = SleepState::Sleepy;
        self.idle_time += dt;
        self.idle_time > self.sleep_time_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_static_and_kinematic_have_no_inverse_mass() {
        assert_eq!(RigidBody::new(BodyType::Static, 5.0).inv_mass(), 0.0);
        assert_eq!(RigidBody::new(BodyType::Kinematic, 5.0).inv_mass(), 0.0);
        assert_eq!(RigidBody::new(BodyType::Dynamic, 4.0).inv_mass(), 0.25);
    }

    #[test]
    fn test_point_transforms() {
        let mut body = RigidBody::default();
        body.position = DVec2::new(1.0, 2.0);
        body.angle = std::f64::consts::FRAC_PI_2;

        let world = body.point_to_world(DVec2::new(1.0, 0.0));
        assert!(approx_eq(world, DVec2::new(1.0, 3.0)));
        assert!(approx_eq(body.point_to_local(world), DVec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_velocity_at_point_includes_rotation() {
        let mut body = RigidBody::default();
        body.angular_velocity = 2.0;
        let v = body.velocity_at_world_point(DVec2::new(1.0, 0.0));
        assert!(approx_eq(v, DVec2::new(0.0, 2.0)));
    }

    #[test]
    fn test_off_center_force_produces_torque() {
        let mut body = RigidBody::default();
        body.apply_force_at(DVec2::new(0.0, 1.0), DVec2::new(2.0, 0.0));
        assert_eq!(body.force(), DVec2::new(0.0, 1.0));
        assert!((body.torque - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sleep_tick_requires_idle_time() {
        let mut body = RigidBody::default();
        body.sleep_time_limit = 0.5;
        assert!(!body.sleep_tick(0.3));
        assert_eq!(body.sleep_state(), SleepState::Sleepy);
        assert!(body.sleep_tick(0.3));

        body.velocity = DVec2::new(1.0, 0.0);
        assert!(!body.sleep_tick(0.3));
        assert_eq!(body.sleep_state(), SleepState::Awake);
    }
}
