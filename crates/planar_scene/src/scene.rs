// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene storage and persistence.

use crate::entity::{EntityData, EntityId};
use crate::transform::Transform;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Scene errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// Entity is not part of the scene
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Re-parenting would make an entity its own ancestor
    #[error("Parenting {child} under {parent} would create a cycle")]
    HierarchyCycle {
        /// Entity being re-parented
        child: EntityId,
        /// Requested parent
        parent: EntityId,
    },

    /// File system error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// RON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),

    /// RON deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] ron::error::SpannedError),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;

/// Scene data containing all entities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneData {
    /// All entities in the scene
    pub entities: IndexMap<EntityId, EntityData>,
}

impl SceneData {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity to the scene
    pub fn add_entity(&mut self, data: EntityData) -> EntityId {
        let id = EntityId::new();
        self.entities.insert(id, data);
        id
    }

    /// Get an entity by ID
    pub fn get(&self, id: &EntityId) -> Option<&EntityData> {
        self.entities.get(id)
    }

    /// Get a mutable reference to an entity by ID
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut EntityData> {
        self.entities.get_mut(id)
    }

    /// Check whether the scene contains an entity
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of entities in the scene
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the scene has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Remove an entity from the scene.
    ///
    /// Children are kept and become roots.
    pub fn remove(&mut self, id: &EntityId) -> Option<EntityData> {
        let data = self.entities.shift_remove(id)?;

        if let Some(parent) = data.parent {
            if let Some(parent_data) = self.entities.get_mut(&parent) {
                parent_data.children.retain(|c| c != id);
            }
        }
        for child in &data.children {
            if let Some(child_data) = self.entities.get_mut(child) {
                child_data.parent = None;
            }
        }

        Some(data)
    }

    /// Get all root entities (no parent)
    pub fn root_entities(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, data)| data.parent.is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Attach `child` under `parent`, or detach it when `parent` is `None`
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> Result<()> {
        if !self.contains(&child) {
            return Err(SceneError::EntityNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.contains(&parent) {
                return Err(SceneError::EntityNotFound(parent));
            }
            // Walk up from the new parent; meeting the child means a cycle
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == child {
                    return Err(SceneError::HierarchyCycle { child, parent });
                }
                cursor = self.entities.get(&current).and_then(|d| d.parent);
            }
        }

        let old_parent = self.entities.get(&child).and_then(|d| d.parent);
        if let Some(old) = old_parent {
            if let Some(old_data) = self.entities.get_mut(&old) {
                old_data.children.retain(|c| *c != child);
            }
        }
        if let Some(parent) = parent {
            if let Some(parent_data) = self.entities.get_mut(&parent) {
                parent_data.children.push(child);
            }
        }
        if let Some(child_data) = self.entities.get_mut(&child) {
            child_data.parent = parent;
        }
        Ok(())
    }

    /// Enable or disable a single entity
    pub fn set_active(&mut self, id: EntityId, active: bool) -> Result<()> {
        let data = self.entities.get_mut(&id).ok_or(SceneError::EntityNotFound(id))?;
        data.active = active;
        Ok(())
    }

    /// An entity is enabled in the hierarchy when it and all its ancestors are active
    pub fn is_active_in_hierarchy(&self, id: &EntityId) -> bool {
        let mut cursor = Some(*id);
        while let Some(current) = cursor {
            match self.entities.get(&current) {
                Some(data) if data.active => cursor = data.parent,
                _ => return false,
            }
        }
        true
    }

    /// World-space transform of an entity
    pub fn transform(&self, id: &EntityId) -> Option<&Transform> {
        self.entities.get(id).map(|d| &d.transform)
    }

    /// Overwrite the world-space transform of an entity
    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> Result<()> {
        let data = self.entities.get_mut(&id).ok_or(SceneError::EntityNotFound(id))?;
        data.transform = transform;
        Ok(())
    }

    /// Serialize the scene to a RON string
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Deserialize a scene from a RON string
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Save the scene to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!("Saved scene with {} entities to {:?}", self.len(), path);
        Ok(())
    }

    /// Load a scene from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scene = Self::from_ron(&content)?;
        tracing::info!("Loaded scene with {} entities from {:?}", scene.len(), path);
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_add_and_remove_entity() {
        let mut scene = SceneData::new();
        let id = scene.add_entity(EntityData::new("Box"));
        assert!(scene.contains(&id));
        assert_eq!(scene.get(&id).map(|d| d.name.as_str()), Some("Box"));

        let removed = scene.remove(&id);
        assert!(removed.is_some());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_parenting_and_cycles() {
        let mut scene = SceneData::new();
        let root = scene.add_entity(EntityData::new("Root"));
        let child = scene.add_entity(EntityData::new("Child"));

        scene.set_parent(child, Some(root)).unwrap();
        assert_eq!(scene.get(&child).unwrap().parent, Some(root));
        assert_eq!(scene.get(&root).unwrap().children, vec![child]);
        assert_eq!(scene.root_entities(), vec![root]);

        let err = scene.set_parent(root, Some(child)).unwrap_err();
        assert!(matches!(err, SceneError::HierarchyCycle { .. }));

        scene.remove(&root);
        assert_eq!(scene.get(&child).unwrap().parent, None);
    }

    #[test]
    fn test_hierarchical_activation() {
        let mut scene = SceneData::new();
        let root = scene.add_entity(EntityData::new("Root"));
        let child = scene.add_entity(EntityData::new("Child"));
        scene.set_parent(child, Some(root)).unwrap();

        assert!(scene.is_active_in_hierarchy(&child));
        scene.set_active(root, false).unwrap();
        assert!(!scene.is_active_in_hierarchy(&child));
        assert!(scene.get(&child).unwrap().active);
    }

    #[test]
    fn test_set_transform_missing_entity() {
        let mut scene = SceneData::new();
        let err = scene.set_transform(EntityId::new(), Transform::default()).unwrap_err();
        assert!(matches!(err, SceneError::EntityNotFound(_)));
    }

    #[test]
    fn test_serialization() {
        let mut scene = SceneData::new();
        let id = scene.add_entity(
            EntityData::new("Crate").with_transform(Transform::from_position(DVec3::new(1.0, 2.0, 3.0))),
        );

        let ron_str = scene.to_ron().unwrap();
        let loaded = SceneData::from_ron(&ron_str).unwrap();
        assert_eq!(loaded.transform(&id).map(|t| t.position), Some(DVec3::new(1.0, 2.0, 3.0)));
    }
}
