// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene graph for `planar`.
//!
//! This crate is the host side of the physics binding:
//! - Entities with stable UUID identifiers
//! - World-space transforms (position, Euler rotation in degrees, scale)
//! - Active flags with hierarchical activation
//! - RON persistence for whole scenes
//!
//! The physics crate reads transforms from here for scene-driven bodies and
//! writes simulation results back for solver-driven ones.

pub mod entity;
pub mod scene;
pub mod transform;

pub use entity::{EntityData, EntityId};
pub use scene::{SceneData, SceneError};
pub use transform::Transform;
