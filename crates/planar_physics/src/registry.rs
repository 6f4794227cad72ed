// SPDX-License-Identifier: MIT OR Apache-2.0
//! Body-ready dependency registry.
//!
//! Maps each entity to the body currently bound to it and to the bindings
//! waiting on that body. Publishing records the body and hands back the
//! waiting bindings; subscribing after a body was published replays it
//! immediately, so construction order never matters.

use crate::binding::{JointId, SpringId, VehicleId};
use crate::engine::BodyHandle;
use planar_scene::EntityId;
use std::collections::HashMap;

/// Which end of a two-body binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// First body
    A,
    /// Second body
    B,
}

/// A binding that depends on an entity's body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependent {
    /// Joint endpoint
    Joint(JointId, Endpoint),
    /// Spring endpoint
    Spring(SpringId, Endpoint),
    /// Vehicle chassis
    Vehicle(VehicleId),
}

/// Entity to body resolution with replayed notifications
#[derive(Debug, Default)]
pub struct BodyRegistry {
    ready: HashMap<EntityId, BodyHandle>,
    subscribers: HashMap<EntityId, Vec<Dependent>>,
}

impl BodyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Body currently published for an entity
    pub fn body(&self, entity: EntityId) -> Option<BodyHandle> {
        self.ready.get(&entity).copied()
    }

    /// Bindings waiting on an entity
    pub fn subscribers(&self, entity: EntityId) -> &[Dependent] {
        self.subscribers.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Follow an entity's body. Returns the body if one is already published.
    /// Subscribing twice is a no-op.
    pub fn subscribe(&mut self, entity: EntityId, dependent: Dependent) -> Option<BodyHandle> {
        let list = self.subscribers.entry(entity).or_default();
        if !list.contains(&dependent) {
            list.push(dependent);
        }
        self.body(entity)
    }

    /// Stop following an entity's body
    pub fn unsubscribe(&mut self, entity: EntityId, dependent: Dependent) {
        if let Some(list) = self.subscribers.get_mut(&entity) {
            list.retain(|d| *d != dependent);
            if list.is_empty() {
                self.subscribers.remove(&entity);
            }
        }
    }

    /// Record a new body for an entity and return the bindings to notify
    pub fn publish(&mut self, entity: EntityId, body: BodyHandle) -> Vec<Dependent> {
        if let Some(previous) = self.ready.insert(entity, body) {
            if previous != body {
                tracing::debug!("Entity {} body replaced: {} -> {}", entity, previous, body);
            }
        }
        self.subscribers(entity).to_vec()
    }

    /// Forget an entity's body and return the bindings that depended on it
    pub fn retract(&mut self, entity: EntityId) -> Vec<Dependent> {
        if self.ready.remove(&entity).is_none() {
            return Vec::new();
        }
        self.subscribers(entity).to_vec()
    }
}
