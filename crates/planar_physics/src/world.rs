// SPDX-License-Identifier: MIT OR Apache-2.0
//! World controller: owns the engine world and keeps it in sync with the scene.
//!
//! Every frame [`WorldController::step`] runs three phases in order:
//! 1. Kinematic push: scene transforms are projected onto kinematic bodies
//! 2. Fixed-step integration with at most `max_sub_steps` sub-steps of 1/60 s
//! 3. Dynamic pull: dynamic body poses are written back onto their entities
//!
//! Static bodies are placed once when registered and never resynced.

use crate::axis::{AxisPlane, PlanarPose};
use crate::debug::{aabb_outline, DebugLine};
use crate::engine::{BodyHandle, BodyType, SleepMode, World};
use crate::error::{PhysicsError, Result};
use crate::scene::SceneGraph;
use crate::settings::{validate_tolerance, WorldSettings};
use glam::DVec2;
use indexmap::{IndexMap, IndexSet};
use planar_scene::EntityId;

/// Fixed simulation sub-step
pub const FIXED_TIME_STEP: f64 = 1.0 / 60.0;

/// What one call to [`WorldController::step`] did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Fixed sub-steps performed
    pub sub_steps: u32,
    /// Simulated time advanced
    pub simulated_time: f64,
    /// Backlog discarded because the sub-step cap was hit
    pub dropped_time: f64,
    /// Leftover time as a fraction of a sub-step
    pub interpolation: f64,
}

type PostStepHook = Box<dyn FnMut(&StepReport) + Send>;

/// Registered bodies indexed by type and owner
#[derive(Debug, Default)]
struct BodyIndex {
    owners: IndexMap<BodyHandle, EntityId>,
    statics: IndexSet<BodyHandle>,
    dynamics: IndexSet<BodyHandle>,
    kinematics: IndexSet<BodyHandle>,
}

impl BodyIndex {
    fn set_for(&mut self, body_type: BodyType) -> &mut IndexSet<BodyHandle> {
        match body_type {
            BodyType::Static => &mut self.statics,
            BodyType::Dynamic => &mut self.dynamics,
            BodyType::Kinematic => &mut self.kinematics,
        }
    }

    fn get(&self, body_type: BodyType) -> &IndexSet<BodyHandle> {
        match body_type {
            BodyType::Static => &self.statics,
            BodyType::Dynamic => &self.dynamics,
            BodyType::Kinematic => &self.kinematics,
        }
    }

    fn type_of(&self, body: BodyHandle) -> Option<BodyType> {
        [BodyType::Static, BodyType::Dynamic, BodyType::Kinematic]
            .into_iter()
            .find(|t| self.get(*t).contains(&body))
    }

    fn remove(&mut self, body: BodyHandle) -> bool {
        self.statics.shift_remove(&body);
        self.dynamics.shift_remove(&body);
        self.kinematics.shift_remove(&body);
        self.owners.shift_remove(&body).is_some()
    }
}

/// Owns the simulation world and synchronizes it with the scene
pub struct WorldController {
    world: World,
    axis_plane: AxisPlane,
    max_sub_steps: u32,
    debug_draw: bool,
    index: BodyIndex,
    post_step: Vec<PostStepHook>,
    debug_lines: Vec<DebugLine>,
}

impl std::fmt::Debug for WorldController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldController")
            .field("axis_plane", &self.axis_plane)
            .field("max_sub_steps", &self.max_sub_steps)
            .field("bodies", &self.index.owners.len())
            .field("post_step_hooks", &self.post_step.len())
            .finish_non_exhaustive()
    }
}

impl WorldController {
    /// Create a world from settings
    pub fn new(settings: &WorldSettings) -> Result<Self> {
        settings.validate()?;

        let mut world = World::new();
        world.gravity = settings.gravity;
        world.solver.iterations = settings.solver_iterations;
        world.solver.tolerance = settings.solver_tolerance;
        world.sleep_mode = settings.sleep_mode;
        world.island_split = settings.island_split;
        world.default_friction = settings.default_friction;

        tracing::info!(
            "Physics world created: plane {:?}, gravity {}, {} max sub-steps",
            settings.axis_plane,
            settings.gravity,
            settings.max_sub_steps
        );

        Ok(Self {
            world,
            axis_plane: settings.axis_plane,
            max_sub_steps: settings.max_sub_steps,
            debug_draw: settings.debug_draw,
            index: BodyIndex::default(),
            post_step: Vec::new(),
            debug_lines: Vec::new(),
        })
    }

    /// Snapshot of the live configuration
    pub fn settings(&self) -> WorldSettings {
        WorldSettings {
            gravity: self.world.gravity,
            axis_plane: self.axis_plane,
            max_sub_steps: self.max_sub_steps,
            solver_iterations: self.world.solver.iterations,
            solver_tolerance: self.world.solver.tolerance,
            sleep_mode: self.world.sleep_mode,
            island_split: self.world.island_split,
            default_friction: self.world.default_friction,
            debug_draw: self.debug_draw,
            ..Default::default()
        }
    }

    /// Plane the simulation runs in
    pub fn axis_plane(&self) -> AxisPlane {
        self.axis_plane
    }

    /// Read access to the engine world
    pub fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // ---- live configuration ----

    /// Change gravity
    pub fn set_gravity(&mut self, gravity: DVec2) {
        self.world.gravity = gravity;
    }

    /// Change the sleep policy. Leaving a sleeping mode wakes every body.
    pub fn set_sleep_mode(&mut self, mode: SleepMode) {
        self.world.sleep_mode = mode;
        if mode == SleepMode::NoSleeping {
            for handle in self.index.owners.keys().copied().collect::<Vec<_>>() {
                if let Some(body) = self.world.body_mut(handle) {
                    body.wake_up();
                }
            }
        }
    }

    /// Change solver iterations
    pub fn set_solver_iterations(&mut self, iterations: u32) {
        self.world.solver.iterations = iterations;
    }

    /// Change solver tolerance
    pub fn set_solver_tolerance(&mut self, tolerance: f64) -> Result<()> {
        validate_tolerance(tolerance)?;
        self.world.solver.tolerance = tolerance;
        Ok(())
    }

    /// Toggle per-island solving
    pub fn set_island_split(&mut self, island_split: bool) {
        self.world.island_split = island_split;
    }

    /// Change default friction
    pub fn set_default_friction(&mut self, friction: f64) {
        self.world.default_friction = friction;
    }

    /// Change the sub-step cap
    pub fn set_max_sub_steps(&mut self, max_sub_steps: u32) -> Result<()> {
        if max_sub_steps == 0 {
            return Err(PhysicsError::InvalidSetting("max_sub_steps must be at least 1".to_string()));
        }
        self.max_sub_steps = max_sub_steps;
        Ok(())
    }

    /// Toggle debug drawing
    pub fn set_debug_draw(&mut self, debug_draw: bool) {
        self.debug_draw = debug_draw;
        if !debug_draw {
            self.debug_lines.clear();
        }
    }

    // ---- body registration ----

    /// Register a body for `entity`, placing it at the entity's projected transform.
    ///
    /// Registering an already registered body does nothing.
    pub fn add_body(&mut self, body: BodyHandle, entity: EntityId, scene: &impl SceneGraph) -> Result<()> {
        if self.index.owners.contains_key(&body) {
            tracing::debug!("{} already registered for entity {}", body, entity);
            return Ok(());
        }
        let transform = scene.world_transform(entity).ok_or(PhysicsError::EntityNotFound(entity))?;
        let pose = self.axis_plane.project(transform.position, transform.rotation);

        let Some(rigid_body) = self.world.body_mut(body) else {
            return Err(PhysicsError::BindingNotFound(format!("{body} for entity {entity}")));
        };
        rigid_body.position = pose.position;
        rigid_body.angle = pose.angle;
        let body_type = rigid_body.body_type;

        self.world.add_body(body);
        self.index.owners.insert(body, entity);
        self.index.set_for(body_type).insert(body);
        tracing::debug!("Registered {:?} {} for entity {}", body_type, body, entity);
        Ok(())
    }

    /// Unregister a body. Unknown bodies are ignored.
    pub fn remove_body(&mut self, body: BodyHandle) {
        if self.index.remove(body) {
            self.world.remove_body(body);
            tracing::debug!("Unregistered {}", body);
        }
    }

    /// Move a registered body to the index of its current type
    pub(crate) fn reindex_body(&mut self, body: BodyHandle) {
        let Some(entity) = self.index.owners.get(&body).copied() else {
            return;
        };
        let Some(body_type) = self.world.body(body).map(|b| b.body_type) else {
            return;
        };
        self.index.remove(body);
        self.index.owners.insert(body, entity);
        self.index.set_for(body_type).insert(body);
    }

    /// Check whether a body is registered
    pub fn is_registered(&self, body: BodyHandle) -> bool {
        self.index.owners.contains_key(&body)
    }

    /// Registered type of a body
    pub fn body_type_of(&self, body: BodyHandle) -> Option<BodyType> {
        self.index.type_of(body)
    }

    /// Registered bodies of one type
    pub fn bodies_of_type(&self, body_type: BodyType) -> impl Iterator<Item = BodyHandle> + '_ {
        self.index.get(body_type).iter().copied()
    }

    /// Entity that owns a registered body
    pub fn entity_of(&self, body: BodyHandle) -> Option<EntityId> {
        self.index.owners.get(&body).copied()
    }

    // ---- stepping ----

    /// Register a hook called after every [`WorldController::step`]
    pub fn on_post_step(&mut self, hook: impl FnMut(&StepReport) + Send + 'static) {
        self.post_step.push(Box::new(hook));
    }

    /// Debug lines recorded by the last step
    pub fn debug_lines(&self) -> &[DebugLine] {
        &self.debug_lines
    }

    /// Advance the simulation by `dt` wall-clock seconds
    pub fn step(&mut self, dt: f64, scene: &mut impl SceneGraph) -> StepReport {
        self.push_kinematic(scene);

        let outcome = self.world.step(FIXED_TIME_STEP, dt, self.max_sub_steps);
        if outcome.dropped_time > 0.0 {
            tracing::debug!(
                "Sub-step cap {} reached, dropping {:.4}s of backlog",
                self.max_sub_steps,
                outcome.dropped_time
            );
        }

        self.pull_dynamic(scene);

        let report = StepReport {
            sub_steps: outcome.sub_steps,
            simulated_time: f64::from(outcome.sub_steps) * FIXED_TIME_STEP,
            dropped_time: outcome.dropped_time,
            interpolation: outcome.interpolation,
        };
        tracing::trace!("Stepped {} sub-steps ({:.4}s)", report.sub_steps, report.simulated_time);

        self.debug_lines.clear();
        if self.debug_draw {
            self.record_debug_lines();
        }

        for hook in &mut self.post_step {
            hook(&report);
        }
        report
    }

    fn push_kinematic(&mut self, scene: &impl SceneGraph) {
        for body in self.index.kinematics.iter().copied() {
            let Some(entity) = self.index.owners.get(&body).copied() else {
                continue;
            };
            let Some(transform) = scene.world_transform(entity) else {
                tracing::trace!("Kinematic entity {} has no transform", entity);
                continue;
            };
            let pose = self.axis_plane.project(transform.position, transform.rotation);
            if let Some(rigid_body) = self.world.body_mut(body) {
                rigid_body.position = pose.position;
                rigid_body.angle = pose.angle;
            }
        }
    }

    fn pull_dynamic(&self, scene: &mut impl SceneGraph) {
        for body in self.index.dynamics.iter().copied() {
            let (Some(entity), Some(rigid_body)) = (self.index.owners.get(&body), self.world.body(body)) else {
                continue;
            };
            let Some(current) = scene.world_transform(*entity) else {
                continue;
            };
            let pose = PlanarPose {
                position: rigid_body.position,
                angle: rigid_body.angle,
            };
            let (position, rotation) = self.axis_plane.unproject(pose, current.position);
            scene.set_world_pose(*entity, position, rotation);
        }
    }

    fn record_debug_lines(&mut self) {
        for body in self.index.owners.keys() {
            if let Some(aabb) = self.world.body_aabb(*body) {
                self.debug_lines.extend(aabb_outline(&aabb));
            }
        }
    }
}
