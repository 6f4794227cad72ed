// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-entity bindings between scene entities and engine objects.
//!
//! Bindings own their engine objects by handle and reach the engine only
//! through the [`WorldController`](crate::world::WorldController). They are
//! created and driven by [`PhysicsSystem`](crate::system::PhysicsSystem).

pub mod body;
pub mod joint;
pub mod shape;
pub mod spring;
pub mod vehicle;

pub use body::{BodyAttr, BodyBinding, BodyConfig};
pub use joint::{JointAttr, JointBinding, JointConfig, JointId, JointKindConfig};
pub use shape::{parse_bitmask, ShapeAttr, ShapeBinding, ShapeConfig};
pub use spring::{AnchorSpace, SpringAttr, SpringBinding, SpringConfig, SpringId, SpringKindConfig};
pub use vehicle::{ChassisSource, VehicleAttr, VehicleBinding, VehicleConfig, VehicleControls, VehicleId};
