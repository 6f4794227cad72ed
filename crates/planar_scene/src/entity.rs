// SPDX-License-Identifier: MIT OR Apache-2.0
//! Entity identity and per-entity data.

use crate::transform::Transform;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for entities in a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity data stored in the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityData {
    /// Entity name
    pub name: String,
    /// Whether the entity itself is enabled
    pub active: bool,
    /// World-space transform
    pub transform: Transform,
    /// Parent entity (if any)
    pub parent: Option<EntityId>,
    /// Child entities
    pub children: Vec<EntityId>,
}

impl Default for EntityData {
    fn default() -> Self {
        Self {
            name: "Entity".to_string(),
            active: true,
            transform: Transform::default(),
            parent: None,
            children: Vec::new(),
        }
    }
}

impl EntityData {
    /// Create a new entity with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style transform setter
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}
