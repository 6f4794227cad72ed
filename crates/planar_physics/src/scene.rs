// SPDX-License-Identifier: MIT OR Apache-2.0
//! Access to the host scene graph.

use glam::DVec3;
use planar_scene::{EntityId, SceneData, Transform};

/// What the physics binding needs from a scene graph
pub trait SceneGraph {
    /// Current world-space transform of an entity
    fn world_transform(&self, entity: EntityId) -> Option<Transform>;

    /// Overwrite an entity's world-space position and Euler rotation (degrees).
    /// Returns false when the entity does not exist.
    fn set_world_pose(&mut self, entity: EntityId, position: DVec3, rotation: DVec3) -> bool;

    /// Whether the entity and all its ancestors are enabled. Missing entities are inactive.
    fn is_active(&self, entity: EntityId) -> bool;
}

impl SceneGraph for SceneData {
    fn world_transform(&self, entity: EntityId) -> Option<Transform> {
        self.transform(&entity).copied()
    }

    fn set_world_pose(&mut self, entity: EntityId, position: DVec3, rotation: DVec3) -> bool {
        match self.get_mut(&entity) {
            Some(data) => {
                data.transform.position = position;
                data.transform.rotation = rotation;
                true
            }
            None => false,
        }
    }

    fn is_active(&self, entity: EntityId) -> bool {
        self.is_active_in_hierarchy(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planar_scene::EntityData;

    #[test]
    fn test_scene_data_pose_keeps_scale() {
        let mut scene = SceneData::new();
        let mut data = EntityData::new("Scaled");
        data.transform.scale = DVec3::splat(2.0);
        let id = scene.add_entity(data);

        assert!(scene.set_world_pose(id, DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.0, 0.0, 45.0)));
        let transform = scene.world_transform(id).unwrap();
        assert_eq!(transform.position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.rotation.z, 45.0);
        assert_eq!(transform.scale, DVec3::splat(2.0));

        assert!(!scene.set_world_pose(EntityId::new(), DVec3::ZERO, DVec3::ZERO));
    }

    #[test]
    fn test_activity_follows_parent() {
        let mut scene = SceneData::new();
        let parent = scene.add_entity(EntityData::new("Parent"));
        let child = scene.add_entity(EntityData::new("Child"));
        scene.set_parent(child, Some(parent)).unwrap();

        assert!(SceneGraph::is_active(&scene, child));
        scene.set_active(parent, false).unwrap();
        assert!(!SceneGraph::is_active(&scene, child));
        assert!(!SceneGraph::is_active(&scene, EntityId::new()));
    }
}
