// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimal 2D rigid-body engine.
//!
//! The engine stores bodies, shapes, joints, springs and vehicles behind
//! integer handles and advances them with a fixed-step integrator:
//! - Gravity, spring and wheel forces
//! - Exponential damping
//! - Gauss-Seidel solve of joint and wheel equations, optionally per island
//! - Semi-implicit Euler integration honoring axis locks
//! - Body and island sleeping
//!
//! There is no contact generation. Shapes contribute mass properties,
//! bounding boxes and collision filters only.

pub mod body;
pub mod constraint;
pub mod shape;
pub mod solver;
pub mod spring;
pub mod vehicle;

pub use body::{BodyHandle, BodyType, RigidBody, SleepState};
pub use constraint::{DistanceJoint, Joint, JointHandle, JointKind, PrismaticJoint, RevoluteJoint};
pub use shape::{Aabb, Geometry, Shape, ShapeHandle, ShapeKind};
pub use solver::{SolveStats, SolverConfig};
pub use spring::{LinearSpring, RotationalSpring, Spring, SpringHandle, SpringKind};
pub use vehicle::{Vehicle, VehicleHandle, Wheel};

use constraint::Equation;
use glam::DVec2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tolerance when comparing accumulated time against the fixed step
const STEP_EPSILON: f64 = 1e-9;

/// How bodies fall asleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SleepMode {
    /// Bodies never sleep
    #[default]
    NoSleeping,
    /// Each body sleeps on its own
    BodySleeping,
    /// Connected bodies sleep together
    IslandSleeping,
}

/// Result of advancing the world by a wall-clock interval
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    /// Fixed sub-steps performed
    pub sub_steps: u32,
    /// Backlog discarded because the sub-step cap was hit
    pub dropped_time: f64,
    /// Leftover time as a fraction of the fixed step
    pub interpolation: f64,
}

/// The simulation world
#[derive(Debug)]
pub struct World {
    /// Gravity acceleration
    pub gravity: DVec2,
    /// Solver configuration
    pub solver: SolverConfig,
    /// Sleep policy
    pub sleep_mode: SleepMode,
    /// Solve each island separately
    pub island_split: bool,
    /// Friction used for contacts without a material
    pub default_friction: f64,

    bodies: IndexMap<BodyHandle, RigidBody>,
    shapes: IndexMap<ShapeHandle, Shape>,
    joints: IndexMap<JointHandle, Joint>,
    springs: IndexMap<SpringHandle, Spring>,
    vehicles: IndexMap<VehicleHandle, Vehicle>,
    next_handle: u64,
    accumulator: f64,
    time: f64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world with default gravity
    pub fn new() -> Self {
        Self {
            gravity: DVec2::new(0.0, -9.8),
            solver: SolverConfig::default(),
            sleep_mode: SleepMode::NoSleeping,
            island_split: true,
            default_friction: 0.3,
            bodies: IndexMap::new(),
            shapes: IndexMap::new(),
            joints: IndexMap::new(),
            springs: IndexMap::new(),
            vehicles: IndexMap::new(),
            next_handle: 1,
            accumulator: 0.0,
            time: 0.0,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    /// Total simulated time
    pub fn time(&self) -> f64 {
        self.time
    }

    // ---- bodies ----

    /// Store a body. It does not take part in simulation until [`World::add_body`].
    pub fn create_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.next_id());
        self.bodies.insert(handle, body);
        self.update_mass_properties(handle);
        handle
    }

    /// Destroy a body, detaching its shapes
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let body = self.bodies.shift_remove(&handle)?;
        for shape in &body.shapes {
            if let Some(shape) = self.shapes.get_mut(shape) {
                shape.body = None;
            }
        }
        Some(body)
    }

    /// Put a body into the simulation. Returns false if it already was.
    pub fn add_body(&mut self, handle: BodyHandle) -> bool {
        match self.bodies.get_mut(&handle) {
            Some(body) if !body.in_world => {
                body.in_world = true;
                body.wake_up();
                true
            }
            _ => false,
        }
    }

    /// Take a body out of the simulation without destroying it
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        match self.bodies.get_mut(&handle) {
            Some(body) if body.in_world => {
                body.in_world = false;
                true
            }
            _ => false,
        }
    }

    /// Get a body
    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(&handle)
    }

    /// Get a mutable body
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(&handle)
    }

    /// Iterate over bodies currently in the simulation
    pub fn bodies_in_world(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter().filter(|(_, b)| b.in_world).map(|(h, b)| (*h, b))
    }

    /// Recompute mass, inertia and their inverses from the attached shapes
    pub fn update_mass_properties(&mut self, handle: BodyHandle) {
        let Some(body) = self.bodies.get(&handle) else {
            return;
        };

        let (inv_mass, inertia) = if body.is_dynamic() {
            let count = body.shapes.len();
            let mut inertia = 0.0;
            if !body.fixed_rotation && count > 0 {
                let share = body.mass / count as f64;
                for shape in body.shapes.iter().filter_map(|s| self.shapes.get(s)) {
                    inertia += shape.geometry.moment_of_inertia(share)
                        + share * shape.local_position.length_squared();
                }
            }
            let inv_mass = if body.mass > 0.0 { 1.0 / body.mass } else { 0.0 };
            (inv_mass, inertia)
        } else {
            (0.0, 0.0)
        };

        if let Some(body) = self.bodies.get_mut(&handle) {
            body.inv_mass = inv_mass;
            body.inertia = inertia;
            body.inv_inertia = if inertia > 0.0 { 1.0 / inertia } else { 0.0 };
        }
    }

    /// World-space bounds of a body and its shapes
    pub fn body_aabb(&self, handle: BodyHandle) -> Option<Aabb> {
        let body = self.bodies.get(&handle)?;
        let aabb = body
            .shapes
            .iter()
            .filter_map(|s| self.shapes.get(s))
            .map(|s| s.world_aabb(body.position, body.angle))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Aabb::from_point(body.position));
        Some(aabb)
    }

    // ---- shapes ----

    /// Store a detached shape
    pub fn create_shape(&mut self, mut shape: Shape) -> ShapeHandle {
        shape.body = None;
        let handle = ShapeHandle(self.next_id());
        self.shapes.insert(handle, shape);
        handle
    }

    /// Destroy a shape, detaching it first
    pub fn destroy_shape(&mut self, handle: ShapeHandle) -> Option<Shape> {
        self.detach_shape(handle);
        self.shapes.shift_remove(&handle)
    }

    /// Get a shape
    pub fn shape(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(&handle)
    }

    /// Get a mutable shape. Call [`World::update_mass_properties`] after geometry changes.
    pub fn shape_mut(&mut self, handle: ShapeHandle) -> Option<&mut Shape> {
        self.shapes.get_mut(&handle)
    }

    /// Attach a shape to a body. Attaching to the current body is a no-op;
    /// attaching to another body moves the shape.
    pub fn attach_shape(&mut self, handle: ShapeHandle, body: BodyHandle) -> bool {
        let current = match self.shapes.get(&handle) {
            Some(shape) => shape.body,
            None => return false,
        };
        if current == Some(body) || !self.bodies.contains_key(&body) {
            return false;
        }
        if current.is_some() {
            self.detach_shape(handle);
        }

        if let Some(shape) = self.shapes.get_mut(&handle) {
            shape.body = Some(body);
        }
        if let Some(b) = self.bodies.get_mut(&body) {
            b.shapes.push(handle);
        }
        self.update_mass_properties(body);
        true
    }

    /// Detach a shape from its body. Detaching an unattached shape is a no-op.
    pub fn detach_shape(&mut self, handle: ShapeHandle) -> bool {
        let Some(body) = self.shapes.get_mut(&handle).and_then(|s| s.body.take()) else {
            return false;
        };
        if let Some(b) = self.bodies.get_mut(&body) {
            b.shapes.retain(|s| *s != handle);
        }
        self.update_mass_properties(body);
        true
    }

    // ---- joints, springs, vehicles ----

    /// Add a joint to the simulation
    pub fn add_joint(&mut self, joint: Joint) -> JointHandle {
        let handle = JointHandle(self.next_id());
        self.joints.insert(handle, joint);
        handle
    }

    /// Remove a joint from the simulation
    pub fn remove_joint(&mut self, handle: JointHandle) -> Option<Joint> {
        self.joints.shift_remove(&handle)
    }

    /// Get a joint
    pub fn joint(&self, handle: JointHandle) -> Option<&Joint> {
        self.joints.get(&handle)
    }

    /// Get a mutable joint
    pub fn joint_mut(&mut self, handle: JointHandle) -> Option<&mut Joint> {
        self.joints.get_mut(&handle)
    }

    /// Number of joints in the simulation
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Add a spring to the simulation
    pub fn add_spring(&mut self, spring: Spring) -> SpringHandle {
        let handle = SpringHandle(self.next_id());
        self.springs.insert(handle, spring);
        handle
    }

    /// Remove a spring from the simulation
    pub fn remove_spring(&mut self, handle: SpringHandle) -> Option<Spring> {
        self.springs.shift_remove(&handle)
    }

    /// Get a spring
    pub fn spring(&self, handle: SpringHandle) -> Option<&Spring> {
        self.springs.get(&handle)
    }

    /// Get a mutable spring
    pub fn spring_mut(&mut self, handle: SpringHandle) -> Option<&mut Spring> {
        self.springs.get_mut(&handle)
    }

    /// Number of springs in the simulation
    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    /// Add a vehicle to the simulation
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> VehicleHandle {
        let handle = VehicleHandle(self.next_id());
        self.vehicles.insert(handle, vehicle);
        handle
    }

    /// Remove a vehicle from the simulation
    pub fn remove_vehicle(&mut self, handle: VehicleHandle) -> Option<Vehicle> {
        self.vehicles.shift_remove(&handle)
    }

    /// Get a vehicle
    pub fn vehicle(&self, handle: VehicleHandle) -> Option<&Vehicle> {
        self.vehicles.get(&handle)
    }

    /// Get a mutable vehicle
    pub fn vehicle_mut(&mut self, handle: VehicleHandle) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(&handle)
    }

    /// Number of vehicles in the simulation
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    // ---- stepping ----

    /// Advance by `elapsed` wall-clock seconds using fixed sub-steps of `fixed_dt`,
    /// at most `max_sub_steps` of them. Backlog beyond the cap is discarded.
    pub fn step(&mut self, fixed_dt: f64, elapsed: f64, max_sub_steps: u32) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if elapsed > 0.0 {
            self.accumulator += elapsed;
        }

        while self.accumulator + STEP_EPSILON >= fixed_dt {
            if outcome.sub_steps >= max_sub_steps {
                outcome.dropped_time = self.accumulator;
                self.accumulator = 0.0;
                break;
            }
            self.internal_step(fixed_dt);
            self.accumulator = (self.accumulator - fixed_dt).max(0.0);
            outcome.sub_steps += 1;
        }

        outcome.interpolation = self.accumulator / fixed_dt;
        outcome
    }

    /// One fixed sub-step
    pub fn internal_step(&mut self, h: f64) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if body.in_world && body.is_dynamic() && !body.is_sleeping() {
                body.force += gravity * body.mass * body.gravity_scale;
            }
        }

        for spring in self.springs.values() {
            let (Some(a), Some(b)) = (self.bodies.get(&spring.body_a), self.bodies.get(&spring.body_b)) else {
                continue;
            };
            if !(a.in_world && b.in_world) {
                continue;
            }
            let forces = spring.forces(a, b);
            if let Some(a) = self.bodies.get_mut(&spring.body_a) {
                a.apply_force(forces.force_a);
                a.apply_torque(forces.torque_a);
            }
            if let Some(b) = self.bodies.get_mut(&spring.body_b) {
                b.apply_force(forces.force_b);
                b.apply_torque(forces.torque_b);
            }
        }

        for vehicle in self.vehicles.values() {
            if let Some(chassis) = self.bodies.get_mut(&vehicle.chassis).filter(|b| b.in_world) {
                for wheel in vehicle.wheels() {
                    wheel.apply_engine_force(chassis);
                }
            }
        }

        for body in self.bodies.values_mut() {
            if body.in_world && body.is_dynamic() {
                body.apply_damping(h);
            }
        }

        let equations = self.collect_equations();
        let islands = if self.island_split || self.sleep_mode == SleepMode::IslandSleeping {
            self.islands()
        } else {
            HashMap::new()
        };

        if self.island_split && !islands.is_empty() {
            let mut groups: IndexMap<BodyHandle, Vec<Equation>> = IndexMap::new();
            for eq in equations {
                // Static and kinematic bodies are not island nodes; key by the dynamic endpoint
                let root = islands
                    .get(&eq.body_a)
                    .or_else(|| eq.body_b.and_then(|b| islands.get(&b)))
                    .copied()
                    .unwrap_or(eq.body_a);
                groups.entry(root).or_default().push(eq);
            }
            for group in groups.values() {
                let stats = solver::solve(&self.solver, h, group, &mut self.bodies);
                self.log_solve(stats, group.len());
            }
        } else {
            let stats = solver::solve(&self.solver, h, &equations, &mut self.bodies);
            self.log_solve(stats, equations.len());
        }

        self.integrate(h);
        self.time += h;
        self.update_sleep(h, &islands);
    }

    fn log_solve(&self, stats: SolveStats, equations: usize) {
        if self.solver.tolerance > 0.0 && !stats.converged {
            tracing::trace!("Solver did not converge: {} equations, {} iterations", equations, stats.iterations);
        }
    }

    fn collect_equations(&self) -> Vec<Equation> {
        let mut equations = Vec::new();
        let in_world = |handle: &BodyHandle| self.bodies.get(handle).filter(|b| b.in_world);

        for joint in self.joints.values() {
            if let (Some(a), Some(b)) = (in_world(&joint.body_a), in_world(&joint.body_b)) {
                equations.extend(joint.equations(a, b));
            }
        }
        for vehicle in self.vehicles.values() {
            if let Some(chassis) = in_world(&vehicle.chassis) {
                for wheel in vehicle.wheels() {
                    equations.extend(wheel.equations(vehicle.chassis, chassis));
                }
            }
        }
        equations
    }

    fn integrate(&mut self, h: f64) {
        for body in self.bodies.values_mut() {
            if !body.in_world || body.is_sleeping() || body.body_type == BodyType::Static {
                body.clear_forces();
                continue;
            }

            if body.is_dynamic() {
                let inv_mass = body.solver_inv_mass();
                body.velocity += body.force * inv_mass * h;
                body.angular_velocity += body.torque * body.inv_inertia * h;
                if body.fixed_x {
                    body.velocity.x = 0.0;
                }
                if body.fixed_y {
                    body.velocity.y = 0.0;
                }
                if body.fixed_rotation {
                    body.angular_velocity = 0.0;
                }
            }

            body.position += body.velocity * h;
            body.angle += body.angular_velocity * h;
            body.clear_forces();
        }
    }

    /// Map each dynamic body in the simulation to its island root.
    /// Bodies are connected through joints and springs; static and kinematic bodies do not connect islands.
    fn islands(&self) -> HashMap<BodyHandle, BodyHandle> {
        let mut parent: HashMap<BodyHandle, BodyHandle> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.in_world && b.is_dynamic())
            .map(|(h, _)| (*h, *h))
            .collect();

        fn find(parent: &mut HashMap<BodyHandle, BodyHandle>, mut node: BodyHandle) -> BodyHandle {
            while let Some(&next) = parent.get(&node) {
                if next == node {
                    break;
                }
                let grandparent = parent.get(&next).copied().unwrap_or(next);
                parent.insert(node, grandparent);
                node = next;
            }
            node
        }

        let links = self
            .joints
            .values()
            .map(|j| (j.body_a, j.body_b))
            .chain(self.springs.values().map(|s| (s.body_a, s.body_b)));
        for (a, b) in links {
            if parent.contains_key(&a) && parent.contains_key(&b) {
                let root_a = find(&mut parent, a);
                let root_b = find(&mut parent, b);
                if root_a != root_b {
                    parent.insert(root_a, root_b);
                }
            }
        }

        let nodes: Vec<BodyHandle> = parent.keys().copied().collect();
        nodes.into_iter().map(|n| (n, find(&mut parent, n))).collect()
    }

    fn update_sleep(&mut self, h: f64, islands: &HashMap<BodyHandle, BodyHandle>) {
        match self.sleep_mode {
            SleepMode::NoSleeping => {}
            SleepMode::BodySleeping => {
                for body in self.bodies.values_mut() {
                    if body.in_world && body.is_dynamic() && body.sleep_tick(h) {
                        body.sleep();
                    }
                }
            }
            SleepMode::IslandSleeping => {
                // An island sleeps only when every member is ready to
                let mut ready: HashMap<BodyHandle, bool> = HashMap::new();
                for (handle, body) in self.bodies.iter_mut() {
                    if !(body.in_world && body.is_dynamic()) {
                        continue;
                    }
                    let wants_sleep = body.is_sleeping() || body.sleep_tick(h);
                    let root = islands.get(handle).copied().unwrap_or(*handle);
                    let entry = ready.entry(root).or_insert(true);
                    *entry = *entry && wants_sleep;
                }
                for (handle, body) in self.bodies.iter_mut() {
                    let root = islands.get(handle).copied().unwrap_or(*handle);
                    if ready.get(&root).copied().unwrap_or(false) && !body.is_sleeping() {
                        body.sleep();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_body(body_type: BodyType) -> (World, BodyHandle) {
        let mut world = World::new();
        let handle = world.create_body(RigidBody::new(body_type, 1.0));
        world.add_body(handle);
        (world, handle)
    }

    #[test]
    fn test_step_respects_sub_step_cap() {
        let (mut world, _) = world_with_body(BodyType::Dynamic);
        let outcome = world.step(1.0 / 60.0, 1.0, 10);
        assert_eq!(outcome.sub_steps, 10);
        assert!((outcome.dropped_time - (1.0 - 10.0 / 60.0)).abs() < 1e-9);
        assert!((world.time() - 10.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_time_carries_over() {
        let (mut world, _) = world_with_body(BodyType::Dynamic);
        assert_eq!(world.step(1.0 / 60.0, 1.0 / 120.0, 10).sub_steps, 0);
        assert_eq!(world.step(1.0 / 60.0, 1.0 / 120.0, 10).sub_steps, 1);
    }

    #[test]
    fn test_gravity_moves_dynamic_only() {
        let (mut world, dynamic) = world_with_body(BodyType::Dynamic);
        let fixed = world.create_body(RigidBody::new(BodyType::Static, 0.0));
        world.add_body(fixed);

        world.step(1.0 / 60.0, 0.5, 100);
        assert!(world.body(dynamic).unwrap().position.y < 0.0);
        assert_eq!(world.body(fixed).unwrap().position, DVec2::ZERO);
    }

    #[test]
    fn test_removed_body_is_not_simulated() {
        let (mut world, handle) = world_with_body(BodyType::Dynamic);
        assert!(world.remove_body(handle));
        assert!(!world.remove_body(handle));
        world.step(1.0 / 60.0, 0.5, 100);
        assert_eq!(world.body(handle).unwrap().position, DVec2::ZERO);
    }

    #[test]
    fn test_attach_is_idempotent_and_updates_mass() {
        let (mut world, body) = world_with_body(BodyType::Dynamic);
        let shape = world.create_shape(Shape::new(Geometry::Circle { radius: 2.0 }));

        assert!(world.attach_shape(shape, body));
        assert!(!world.attach_shape(shape, body));
        assert_eq!(world.body(body).unwrap().shapes().len(), 1);
        assert!((world.body(body).unwrap().inertia() - 2.0).abs() < 1e-12);

        assert!(world.detach_shape(shape));
        assert!(!world.detach_shape(shape));
        assert!(world.body(body).unwrap().shapes().is_empty());
        assert_eq!(world.body(body).unwrap().inertia(), 0.0);
    }

    #[test]
    fn test_static_body_has_zero_effective_mass() {
        let mut world = World::new();
        let handle = world.create_body(RigidBody::new(BodyType::Static, 10.0));
        assert_eq!(world.body(handle).unwrap().effective_mass(), 0.0);
    }

    #[test]
    fn test_distance_joint_holds_pendulum() {
        let mut world = World::new();
        let anchor = world.create_body(RigidBody::new(BodyType::Static, 0.0));
        let mut bob = RigidBody::new(BodyType::Dynamic, 1.0);
        bob.position = DVec2::new(2.0, 0.0);
        bob.damping = 0.0;
        let bob = world.create_body(bob);
        world.add_body(anchor);
        world.add_body(bob);

        let kind = {
            let a = world.body(anchor).unwrap();
            let b = world.body(bob).unwrap();
            JointKind::Distance(DistanceJoint::new(a, b, DVec2::ZERO, DVec2::ZERO, None))
        };
        world.add_joint(Joint::new(anchor, bob, kind));
        world.solver.iterations = 20;

        for _ in 0..120 {
            world.step(1.0 / 60.0, 1.0 / 60.0, 10);
        }
        let length = world.body(bob).unwrap().position.length();
        assert!((length - 2.0).abs() < 0.1, "length {length}");
    }

    #[test]
    fn test_body_sleeping() {
        let (mut world, handle) = world_with_body(BodyType::Dynamic);
        world.gravity = DVec2::ZERO;
        world.sleep_mode = SleepMode::BodySleeping;
        world.step(1.0 / 60.0, 1.5, 200);
        assert!(world.body(handle).unwrap().is_sleeping());
    }

    fn anchored_chain(island_split: bool) -> Vec<DVec2> {
        let mut world = World::new();
        world.island_split = island_split;
        world.solver.iterations = 20;
        let anchor = world.create_body(RigidBody::new(BodyType::Static, 0.0));
        world.add_body(anchor);

        let mut links = vec![anchor];
        for x in [1.0, 2.0] {
            let mut bob = RigidBody::new(BodyType::Dynamic, 1.0);
            bob.position = DVec2::new(x, 0.0);
            let bob = world.create_body(bob);
            world.add_body(bob);
            links.push(bob);
        }
        for pair in links.windows(2) {
            let kind = {
                let a = world.body(pair[0]).unwrap();
                let b = world.body(pair[1]).unwrap();
                JointKind::Distance(DistanceJoint::new(a, b, DVec2::ZERO, DVec2::ZERO, None))
            };
            world.add_joint(Joint::new(pair[0], pair[1], kind));
        }

        for _ in 0..60 {
            world.internal_step(1.0 / 60.0);
        }
        links.iter().map(|h| world.body(*h).unwrap().position).collect()
    }

    #[test]
    fn test_island_split_matches_single_solve() {
        assert_eq!(anchored_chain(true), anchored_chain(false));
    }

    #[test]
    fn test_island_sleeps_only_when_every_member_is_idle() {
        let mut world = World::new();
        world.gravity = DVec2::ZERO;
        world.sleep_mode = SleepMode::IslandSleeping;

        let mut restless = RigidBody::new(BodyType::Dynamic, 1.0);
        restless.allow_sleep = false;
        let restless = world.create_body(restless);
        let mut partner = RigidBody::new(BodyType::Dynamic, 1.0);
        partner.position = DVec2::new(1.0, 0.0);
        let partner = world.create_body(partner);
        let mut loner = RigidBody::new(BodyType::Dynamic, 1.0);
        loner.position = DVec2::new(5.0, 0.0);
        let loner = world.create_body(loner);
        for handle in [restless, partner, loner] {
            world.add_body(handle);
        }

        let kind = {
            let a = world.body(restless).unwrap();
            let b = world.body(partner).unwrap();
            SpringKind::Linear(LinearSpring::new(a, b, DVec2::ZERO, DVec2::ZERO, None))
        };
        world.add_spring(Spring::new(restless, partner, kind));

        world.step(1.0 / 60.0, 1.5, 200);
        assert!(world.body(loner).unwrap().is_sleeping());
        assert!(!world.body(partner).unwrap().is_sleeping());
        assert!(!world.body(restless).unwrap().is_sleeping());

        world.sleep_mode = SleepMode::BodySleeping;
        world.step(1.0 / 60.0, 1.5, 200);
        assert!(world.body(partner).unwrap().is_sleeping());
    }

    #[test]
    fn test_axis_locks_zero_locked_velocity() {
        let mut world = World::new();
        world.gravity = DVec2::new(3.0, -10.0);
        let mut body = RigidBody::new(BodyType::Dynamic, 1.0);
        body.fixed_y = true;
        let locked_y = world.create_body(body);
        let mut body = RigidBody::new(BodyType::Dynamic, 1.0);
        body.fixed_x = true;
        let locked_x = world.create_body(body);
        world.add_body(locked_y);
        world.add_body(locked_x);

        world.step(1.0 / 60.0, 0.5, 100);
        let body = world.body(locked_y).unwrap();
        assert_eq!(body.position.y, 0.0);
        assert!(body.position.x > 0.0);
        let body = world.body(locked_x).unwrap();
        assert_eq!(body.position.x, 0.0);
        assert!(body.position.y < 0.0);
    }
}
