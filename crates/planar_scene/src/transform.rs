// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transform component data.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// World-space transform of an entity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Transform {
    /// Position (x, y, z)
    pub position: DVec3,
    /// Rotation in euler angles (degrees)
    pub rotation: DVec3,
    /// Scale
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

impl Transform {
    /// Create a transform at the given position
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder-style rotation setter (degrees)
    pub fn with_rotation(mut self, rotation: DVec3) -> Self {
        self.rotation = rotation;
        self
    }
}
