// SPDX-License-Identifier: MIT OR Apache-2.0
//! Physics system: owns the world controller and every binding.
//!
//! All lifecycle calls go through [`PhysicsSystem`]. Creating a body publishes
//! it to the [`BodyRegistry`] and the joints, springs and vehicles waiting on
//! it are resolved before the call returns, so a half-attached joint is never
//! visible to [`PhysicsSystem::update`].

use crate::binding::{
    BodyAttr, BodyBinding, BodyConfig, ChassisSource, JointAttr, JointBinding, JointConfig, JointId, ShapeAttr,
    ShapeBinding, ShapeConfig, SpringAttr, SpringBinding, SpringConfig, SpringId, VehicleAttr, VehicleBinding,
    VehicleConfig, VehicleControls, VehicleId,
};
use crate::engine::{BodyHandle, ShapeHandle, ShapeKind};
use crate::error::{PhysicsError, Result};
use crate::registry::{BodyRegistry, Dependent, Endpoint};
use crate::scene::SceneGraph;
use crate::settings::WorldSettings;
use crate::world::{StepReport, WorldController};
use indexmap::{IndexMap, IndexSet};
use planar_scene::EntityId;

/// Shared endpoint handling of joints and springs
trait TwoBodyBinding {
    fn endpoint_entity(&self, endpoint: Endpoint) -> Option<EntityId>;
    fn set_endpoint_entity(&mut self, endpoint: Endpoint, entity: Option<EntityId>);
    fn set_endpoint_body(&mut self, endpoint: Endpoint, body: Option<BodyHandle>, controller: &mut WorldController);
}

macro_rules! impl_two_body {
    ($binding:ty) => {
        impl TwoBodyBinding for $binding {
            fn endpoint_entity(&self, endpoint: Endpoint) -> Option<EntityId> {
                <$binding>::endpoint_entity(self, endpoint)
            }

            fn set_endpoint_entity(&mut self, endpoint: Endpoint, entity: Option<EntityId>) {
                <$binding>::set_endpoint_entity(self, endpoint, entity)
            }

            fn set_endpoint_body(
                &mut self,
                endpoint: Endpoint,
                body: Option<BodyHandle>,
                controller: &mut WorldController,
            ) {
                <$binding>::set_endpoint_body(self, endpoint, body, controller)
            }
        }
    };
}

impl_two_body!(JointBinding);
impl_two_body!(SpringBinding);

/// Subscribe an endpoint to its entity's body, resolving it at once when the body exists
fn resolve_endpoint(
    binding: &mut impl TwoBodyBinding,
    endpoint: Endpoint,
    dependent: Dependent,
    registry: &mut BodyRegistry,
    controller: &mut WorldController,
) {
    let Some(entity) = binding.endpoint_entity(endpoint) else {
        return;
    };
    if let Some(body) = registry.subscribe(entity, dependent) {
        binding.set_endpoint_body(endpoint, Some(body), controller);
    }
}

/// Point an endpoint at another entity, rebuilding from scratch
fn retarget_endpoint(
    binding: &mut impl TwoBodyBinding,
    endpoint: Endpoint,
    entity: Option<EntityId>,
    dependent: Dependent,
    registry: &mut BodyRegistry,
    controller: &mut WorldController,
) {
    if let Some(old) = binding.endpoint_entity(endpoint) {
        registry.unsubscribe(old, dependent);
    }
    binding.set_endpoint_entity(endpoint, entity);
    let body = binding
        .endpoint_entity(endpoint)
        .and_then(|entity| registry.subscribe(entity, dependent));
    binding.set_endpoint_body(endpoint, body, controller);
}

fn unsubscribe_endpoints(
    binding: &impl TwoBodyBinding,
    dependent: impl Fn(Endpoint) -> Dependent,
    registry: &mut BodyRegistry,
) {
    for endpoint in [Endpoint::A, Endpoint::B] {
        if let Some(entity) = binding.endpoint_entity(endpoint) {
            registry.unsubscribe(entity, dependent(endpoint));
        }
    }
}

fn shape_binding_mut(
    shapes: &mut IndexMap<EntityId, IndexMap<ShapeKind, ShapeBinding>>,
    entity: EntityId,
    kind: ShapeKind,
) -> Result<&mut ShapeBinding> {
    shapes
        .get_mut(&entity)
        .and_then(|shapes| shapes.get_mut(&kind))
        .ok_or_else(|| PhysicsError::BindingNotFound(format!("{kind} shape on entity {entity}")))
}

fn missing_body(entity: EntityId) -> PhysicsError {
    PhysicsError::BindingNotFound(format!("body on entity {entity}"))
}

/// Coordinates the world controller, the body registry and all bindings
#[derive(Debug)]
pub struct PhysicsSystem {
    controller: WorldController,
    registry: BodyRegistry,
    bodies: IndexMap<EntityId, BodyBinding>,
    shapes: IndexMap<EntityId, IndexMap<ShapeKind, ShapeBinding>>,
    joints: IndexMap<JointId, JointBinding>,
    springs: IndexMap<SpringId, SpringBinding>,
    vehicles: IndexMap<VehicleId, VehicleBinding>,
    inactive: IndexSet<EntityId>,
}

impl PhysicsSystem {
    /// Create a system with an empty world
    pub fn new(settings: &WorldSettings) -> Result<Self> {
        Ok(Self {
            controller: WorldController::new(settings)?,
            registry: BodyRegistry::new(),
            bodies: IndexMap::new(),
            shapes: IndexMap::new(),
            joints: IndexMap::new(),
            springs: IndexMap::new(),
            vehicles: IndexMap::new(),
            inactive: IndexSet::new(),
        })
    }

    /// World controller
    pub fn controller(&self) -> &WorldController {
        &self.controller
    }

    /// Mutable world controller, for live settings and post-step hooks
    pub fn controller_mut(&mut self) -> &mut WorldController {
        &mut self.controller
    }

    /// Body-ready registry
    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    /// Follow scene activity, run vehicle controls, then step the world
    pub fn update(&mut self, dt: f64, scene: &mut impl SceneGraph) -> StepReport {
        self.sync_active(&*scene);
        for vehicle in self.vehicles.values() {
            vehicle.update(&mut self.controller);
        }
        self.controller.step(dt, scene)
    }

    fn notify(&mut self, dependents: Vec<Dependent>, body: Option<BodyHandle>) {
        let controller = &mut self.controller;
        for dependent in dependents {
            match dependent {
                Dependent::Joint(id, endpoint) => {
                    if let Some(joint) = self.joints.get_mut(&id) {
                        joint.set_endpoint_body(endpoint, body, controller);
                    }
                }
                Dependent::Spring(id, endpoint) => {
                    if let Some(spring) = self.springs.get_mut(&id) {
                        spring.set_endpoint_body(endpoint, body, controller);
                    }
                }
                Dependent::Vehicle(id) => {
                    if let Some(vehicle) = self.vehicles.get_mut(&id) {
                        vehicle.set_chassis(body, controller);
                    }
                }
            }
        }
    }

    // ---- bodies ----

    /// Create the body of `entity`, attach its shapes and resolve everything waiting on it
    pub fn add_body(&mut self, entity: EntityId, config: BodyConfig, scene: &impl SceneGraph) -> Result<BodyHandle> {
        if self.bodies.contains_key(&entity) {
            return Err(PhysicsError::DuplicateBinding(format!("body on entity {entity}")));
        }
        let binding = BodyBinding::create(entity, config, &mut self.controller, scene)?;
        let handle = binding.handle();
        if let Some(shapes) = self.shapes.get(&entity) {
            for shape in shapes.values() {
                shape.attach(handle, &mut self.controller);
            }
        }
        self.bodies.insert(entity, binding);

        let dependents = self.registry.publish(entity, handle);
        self.notify(dependents, Some(handle));
        tracing::debug!("Body {} ready for entity {}", handle, entity);
        Ok(handle)
    }

    /// Tear down the body of `entity`. Dependents fall back to pending.
    pub fn remove_body(&mut self, entity: EntityId) -> Result<()> {
        let binding = self
            .bodies
            .shift_remove(&entity)
            .ok_or_else(|| missing_body(entity))?;
        if let Some(shapes) = self.shapes.get(&entity) {
            for shape in shapes.values() {
                shape.detach(&mut self.controller);
            }
        }
        let dependents = self.registry.retract(entity);
        self.notify(dependents, None);
        binding.destroy(&mut self.controller);
        Ok(())
    }

    /// Add the body of `entity` to or remove it from the world
    pub fn set_body_enabled(&mut self, entity: EntityId, enabled: bool, scene: &impl SceneGraph) -> Result<()> {
        let binding = self.bodies.get_mut(&entity).ok_or_else(|| missing_body(entity))?;
        binding.set_enabled(enabled, &mut self.controller, scene)
    }

    /// Change a body attribute
    pub fn set_body_attr(&mut self, entity: EntityId, attr: BodyAttr) -> Result<()> {
        let binding = self.bodies.get_mut(&entity).ok_or_else(|| missing_body(entity))?;
        binding.apply(attr, &mut self.controller)
    }

    /// Body binding of an entity
    pub fn body(&self, entity: EntityId) -> Option<&BodyBinding> {
        self.bodies.get(&entity)
    }

    // ---- shapes ----

    /// Add a shape to `entity`, attaching it when the entity has a body
    pub fn add_shape(&mut self, entity: EntityId, config: ShapeConfig) -> Result<ShapeHandle> {
        let kind = config.kind();
        if self.shape(entity, kind).is_some() {
            return Err(PhysicsError::DuplicateBinding(format!("{kind} shape on entity {entity}")));
        }
        let body = self.bodies.get(&entity).map(BodyBinding::handle);
        let binding = ShapeBinding::create(entity, config, &mut self.controller, body)?;
        let handle = binding.handle();
        self.shapes.entry(entity).or_default().insert(kind, binding);
        Ok(handle)
    }

    /// Detach and destroy a shape
    pub fn remove_shape(&mut self, entity: EntityId, kind: ShapeKind) -> Result<()> {
        let shapes = self
            .shapes
            .get_mut(&entity)
            .ok_or_else(|| PhysicsError::BindingNotFound(format!("{kind} shape on entity {entity}")))?;
        let binding = shapes
            .shift_remove(&kind)
            .ok_or_else(|| PhysicsError::BindingNotFound(format!("{kind} shape on entity {entity}")))?;
        if shapes.is_empty() {
            self.shapes.shift_remove(&entity);
        }
        binding.destroy(&mut self.controller);
        Ok(())
    }

    /// Attach or detach a shape without destroying it
    pub fn set_shape_enabled(&mut self, entity: EntityId, kind: ShapeKind, enabled: bool) -> Result<()> {
        let body = self.bodies.get(&entity).map(BodyBinding::handle);
        let binding = shape_binding_mut(&mut self.shapes, entity, kind)?;
        binding.set_enabled(enabled, body, &mut self.controller);
        Ok(())
    }

    /// Change a shape attribute
    pub fn set_shape_attr(&mut self, entity: EntityId, kind: ShapeKind, attr: ShapeAttr) -> Result<()> {
        let binding = shape_binding_mut(&mut self.shapes, entity, kind)?;
        binding.apply(attr, &mut self.controller)
    }

    /// Shape binding of one kind on an entity
    pub fn shape(&self, entity: EntityId, kind: ShapeKind) -> Option<&ShapeBinding> {
        self.shapes.get(&entity).and_then(|shapes| shapes.get(&kind))
    }

    /// All shape bindings on an entity
    pub fn shapes(&self, entity: EntityId) -> impl Iterator<Item = &ShapeBinding> {
        self.shapes.get(&entity).into_iter().flat_map(|shapes| shapes.values())
    }

    // ---- joints ----

    /// Add a joint owned by `owner`. It is built as soon as both endpoint bodies exist.
    pub fn add_joint(&mut self, owner: EntityId, config: JointConfig) -> JointId {
        let id = JointId::new();
        let binding = self.joints.entry(id).or_insert(JointBinding::new(id, owner, config));
        for endpoint in [Endpoint::A, Endpoint::B] {
            resolve_endpoint(
                binding,
                endpoint,
                Dependent::Joint(id, endpoint),
                &mut self.registry,
                &mut self.controller,
            );
        }
        id
    }

    /// Remove a joint binding and its joint
    pub fn remove_joint(&mut self, id: JointId) -> Result<()> {
        let mut binding = self
            .joints
            .shift_remove(&id)
            .ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        unsubscribe_endpoints(&binding, |endpoint| Dependent::Joint(id, endpoint), &mut self.registry);
        binding.remove_from_world(&mut self.controller);
        Ok(())
    }

    /// Enable or disable a joint
    pub fn set_joint_enabled(&mut self, id: JointId, enabled: bool) -> Result<()> {
        let binding = self.joints.get_mut(&id).ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        binding.set_enabled(enabled, &mut self.controller);
        Ok(())
    }

    /// Change a joint parameter
    pub fn set_joint_attr(&mut self, id: JointId, attr: JointAttr) -> Result<()> {
        let binding = self.joints.get_mut(&id).ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        binding.apply(attr, &mut self.controller)
    }

    /// Point a joint endpoint at another entity. For endpoint A, `None` means the owner.
    pub fn set_joint_endpoint(&mut self, id: JointId, endpoint: Endpoint, entity: Option<EntityId>) -> Result<()> {
        let binding = self.joints.get_mut(&id).ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        retarget_endpoint(
            binding,
            endpoint,
            entity,
            Dependent::Joint(id, endpoint),
            &mut self.registry,
            &mut self.controller,
        );
        Ok(())
    }

    /// Joint binding by ID
    pub fn joint(&self, id: JointId) -> Option<&JointBinding> {
        self.joints.get(&id)
    }

    // ---- springs ----

    /// Add a spring owned by `owner`. It is built as soon as both endpoint bodies exist.
    pub fn add_spring(&mut self, owner: EntityId, config: SpringConfig) -> SpringId {
        let id = SpringId::new();
        let binding = self.springs.entry(id).or_insert(SpringBinding::new(id, owner, config));
        for endpoint in [Endpoint::A, Endpoint::B] {
            resolve_endpoint(
                binding,
                endpoint,
                Dependent::Spring(id, endpoint),
                &mut self.registry,
                &mut self.controller,
            );
        }
        id
    }

    /// Remove a spring binding and its spring
    pub fn remove_spring(&mut self, id: SpringId) -> Result<()> {
        let mut binding = self
            .springs
            .shift_remove(&id)
            .ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        unsubscribe_endpoints(&binding, |endpoint| Dependent::Spring(id, endpoint), &mut self.registry);
        binding.remove_from_world(&mut self.controller);
        Ok(())
    }

    /// Enable or disable a spring
    pub fn set_spring_enabled(&mut self, id: SpringId, enabled: bool) -> Result<()> {
        let binding = self.springs.get_mut(&id).ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        binding.set_enabled(enabled, &mut self.controller);
        Ok(())
    }

    /// Change a spring parameter
    pub fn set_spring_attr(&mut self, id: SpringId, attr: SpringAttr) -> Result<()> {
        let binding = self.springs.get_mut(&id).ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        binding.apply(attr, &mut self.controller)
    }

    /// Point a spring endpoint at another entity. For endpoint A, `None` means the owner.
    pub fn set_spring_endpoint(&mut self, id: SpringId, endpoint: Endpoint, entity: Option<EntityId>) -> Result<()> {
        let binding = self.springs.get_mut(&id).ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        retarget_endpoint(
            binding,
            endpoint,
            entity,
            Dependent::Spring(id, endpoint),
            &mut self.registry,
            &mut self.controller,
        );
        Ok(())
    }

    /// Spring binding by ID
    pub fn spring(&self, id: SpringId) -> Option<&SpringBinding> {
        self.springs.get(&id)
    }

    // ---- vehicles ----

    /// Add a vehicle on `owner`. A standalone chassis creates the owner's body here.
    pub fn add_vehicle(
        &mut self,
        owner: EntityId,
        config: VehicleConfig,
        scene: &impl SceneGraph,
    ) -> Result<VehicleId> {
        if let ChassisSource::Standalone(body_config) = &config.chassis {
            self.add_body(owner, body_config.clone(), scene)?;
        }

        let id = VehicleId::new();
        let mut binding = VehicleBinding::new(id, owner, config);
        if let Some(chassis) = self.registry.subscribe(owner, Dependent::Vehicle(id)) {
            binding.set_chassis(Some(chassis), &mut self.controller);
        }
        self.vehicles.insert(id, binding);
        Ok(id)
    }

    /// Remove a vehicle, and its chassis body when the vehicle created it
    pub fn remove_vehicle(&mut self, id: VehicleId) -> Result<()> {
        let mut binding = self
            .vehicles
            .shift_remove(&id)
            .ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        self.registry.unsubscribe(binding.owner(), Dependent::Vehicle(id));
        binding.remove_from_world(&mut self.controller);
        if binding.owns_chassis() && self.bodies.contains_key(&binding.owner()) {
            self.remove_body(binding.owner())?;
        }
        Ok(())
    }

    /// Enable or disable a vehicle
    pub fn set_vehicle_enabled(&mut self, id: VehicleId, enabled: bool) -> Result<()> {
        let binding = self.vehicles.get_mut(&id).ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        binding.set_enabled(enabled, &mut self.controller);
        Ok(())
    }

    /// Change a vehicle parameter
    pub fn set_vehicle_attr(&mut self, id: VehicleId, attr: VehicleAttr) -> Result<()> {
        let binding = self.vehicles.get_mut(&id).ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        binding.apply(attr, &mut self.controller)
    }

    /// Set driver input, applied on the next update
    pub fn set_vehicle_controls(&mut self, id: VehicleId, controls: VehicleControls) -> Result<()> {
        let binding = self.vehicles.get_mut(&id).ok_or_else(|| PhysicsError::BindingNotFound(id.to_string()))?;
        binding.set_controls(controls);
        Ok(())
    }

    /// Vehicle binding by ID
    pub fn vehicle(&self, id: VehicleId) -> Option<&VehicleBinding> {
        self.vehicles.get(&id)
    }

    // ---- entities ----

    /// Match every owner's bindings to the scene's enable state. Only entities
    /// whose state changed since the last sync are touched.
    pub fn sync_active(&mut self, scene: &impl SceneGraph) {
        let owners: IndexSet<EntityId> = self
            .bodies
            .keys()
            .chain(self.shapes.keys())
            .copied()
            .chain(self.joints.values().map(JointBinding::owner))
            .chain(self.springs.values().map(SpringBinding::owner))
            .chain(self.vehicles.values().map(VehicleBinding::owner))
            .collect();
        for entity in owners {
            let active = scene.is_active(entity);
            if active != self.inactive.contains(&entity) {
                continue;
            }
            if let Err(err) = self.set_entity_active(entity, active, scene) {
                tracing::warn!("Failed to follow activity of entity {}: {}", entity, err);
            }
        }
    }

    /// Enable or disable every binding owned by `entity`
    pub fn set_entity_active(&mut self, entity: EntityId, active: bool, scene: &impl SceneGraph) -> Result<()> {
        if active {
            self.inactive.shift_remove(&entity);
        } else {
            self.inactive.insert(entity);
        }

        if self.bodies.contains_key(&entity) {
            self.set_body_enabled(entity, active, scene)?;
        }
        let kinds: Vec<ShapeKind> = self
            .shapes
            .get(&entity)
            .map(|shapes| shapes.keys().copied().collect())
            .unwrap_or_default();
        for kind in kinds {
            self.set_shape_enabled(entity, kind, active)?;
        }

        let controller = &mut self.controller;
        for joint in self.joints.values_mut().filter(|j| j.owner() == entity) {
            joint.set_enabled(active, controller);
        }
        for spring in self.springs.values_mut().filter(|s| s.owner() == entity) {
            spring.set_enabled(active, controller);
        }
        for vehicle in self.vehicles.values_mut().filter(|v| v.owner() == entity) {
            vehicle.set_enabled(active, controller);
        }
        tracing::debug!("Entity {} {}", entity, if active { "activated" } else { "deactivated" });
        Ok(())
    }

    /// Tear down every binding owned by an entity
    pub fn remove_entity(&mut self, entity: EntityId) {
        let vehicles: Vec<VehicleId> = self
            .vehicles
            .values()
            .filter(|v| v.owner() == entity)
            .map(VehicleBinding::id)
            .collect();
        for id in vehicles {
            if let Err(err) = self.remove_vehicle(id) {
                tracing::warn!("Failed to remove {}: {}", id, err);
            }
        }
        let joints: Vec<JointId> = self
            .joints
            .values()
            .filter(|j| j.owner() == entity)
            .map(JointBinding::id)
            .collect();
        for id in joints {
            if let Err(err) = self.remove_joint(id) {
                tracing::warn!("Failed to remove {}: {}", id, err);
            }
        }
        let springs: Vec<SpringId> = self
            .springs
            .values()
            .filter(|s| s.owner() == entity)
            .map(SpringBinding::id)
            .collect();
        for id in springs {
            if let Err(err) = self.remove_spring(id) {
                tracing::warn!("Failed to remove {}: {}", id, err);
            }
        }
        if self.bodies.contains_key(&entity) {
            if let Err(err) = self.remove_body(entity) {
                tracing::warn!("Failed to remove body of entity {}: {}", entity, err);
            }
        }
        if let Some(shapes) = self.shapes.shift_remove(&entity) {
            for shape in shapes.into_values() {
                shape.destroy(&mut self.controller);
            }
        }
        self.inactive.shift_remove(&entity);
        tracing::debug!("Removed physics bindings of entity {}", entity);
    }
}
