// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error type for the physics binding layer.

use planar_scene::EntityId;
use thiserror::Error;

/// Physics binding errors
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Collision group/mask string is not exactly eight `0`/`1` characters
    #[error("Invalid collision bitmask {0:?}: expected 8 characters of '0' or '1'")]
    InvalidBitmask(String),

    /// Entity does not exist in the scene
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// No binding of the requested kind exists
    #[error("Binding not found: {0}")]
    BindingNotFound(String),

    /// A binding of this kind already exists on the entity
    #[error("Duplicate binding: {0}")]
    DuplicateBinding(String),

    /// A configuration value is out of range or does not apply
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// File system error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// RON deserialization error
    #[error("Settings parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("Settings serialization error: {0}")]
    RonSerialize(#[from] ron::Error),
}

/// Result type for physics binding operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
