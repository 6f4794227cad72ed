// SPDX-License-Identifier: MIT OR Apache-2.0
//! 2D rigid-body physics bound to the `planar` scene graph.
//!
//! Scene entities carry 3D transforms; the simulation runs in one of the
//! XY, XZ or YZ planes. This crate provides:
//! - Projection between scene transforms and the simulation plane
//! - A fixed-step world with a bounded catch-up budget
//! - Body, shape, joint, spring and vehicle bindings per entity
//! - Lazy resolution of two-body constraints whose bodies appear in any order
//!
//! ## Architecture
//!
//! [`PhysicsSystem`] owns the [`WorldController`], which in turn owns the
//! engine [`World`](engine::World). Bindings hold engine handles only. Every
//! frame, [`PhysicsSystem::update`] applies vehicle controls, pushes
//! kinematic entity transforms into the world, steps it and pulls dynamic
//! body poses back onto the scene.
//!
//! Contacts are not generated. Shapes contribute mass properties, bounding
//! boxes and collision filters.

pub mod axis;
pub mod binding;
pub mod debug;
pub mod engine;
pub mod error;
pub mod registry;
pub mod scene;
pub mod settings;
pub mod system;
pub mod world;

pub use axis::{AxisPlane, PlanarPose};
pub use binding::{
    AnchorSpace, BodyAttr, BodyConfig, ChassisSource, JointAttr, JointConfig, JointId, JointKindConfig, ShapeAttr,
    ShapeConfig, SpringAttr, SpringConfig, SpringId, SpringKindConfig, VehicleAttr, VehicleConfig, VehicleControls,
    VehicleId,
};
pub use debug::DebugLine;
pub use engine::{BodyHandle, BodyType, Geometry, ShapeKind, SleepMode};
pub use error::{PhysicsError, Result};
pub use registry::Endpoint;
pub use scene::SceneGraph;
pub use settings::WorldSettings;
pub use system::PhysicsSystem;
pub use world::{StepReport, WorldController, FIXED_TIME_STEP};
