// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mapping between 3D scene transforms and the 2D simulation plane.
//!
//! | Plane | 2D position | 2D angle          |
//! |-------|-------------|-------------------|
//! | `XY`  | `(x, y)`    | rotation about Z  |
//! | `XZ`  | `(x, -z)`   | rotation about Y  |
//! | `YZ`  | `(-z, y)`   | rotation about X  |
//!
//! The out-of-plane coordinate is not simulated. [`AxisPlane::unproject`]
//! copies it from a reference position, normally the entity's current one.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// The 2D subspace of the scene the simulation runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AxisPlane {
    /// Simulate in the XY plane
    #[default]
    XY,
    /// Simulate in the XZ plane (ground plane for Y-up scenes)
    XZ,
    /// Simulate in the YZ plane
    YZ,
}

/// Position and angle of a body in the simulation plane
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanarPose {
    /// 2D position
    pub position: DVec2,
    /// Angle in radians
    pub angle: f64,
}

impl AxisPlane {
    /// Project a scene position onto the plane
    pub fn project_point(self, position: DVec3) -> DVec2 {
        match self {
            AxisPlane::XY => DVec2::new(position.x, position.y),
            AxisPlane::XZ => DVec2::new(position.x, -position.z),
            AxisPlane::YZ => DVec2::new(-position.z, position.y),
        }
    }

    /// Project a scene position and Euler rotation (degrees) onto the plane
    pub fn project(self, position: DVec3, euler_degrees: DVec3) -> PlanarPose {
        let angle_degrees = match self {
            AxisPlane::XY => euler_degrees.z,
            AxisPlane::XZ => euler_degrees.y,
            AxisPlane::YZ => euler_degrees.x,
        };
        PlanarPose {
            position: self.project_point(position),
            angle: angle_degrees.to_radians(),
        }
    }

    /// Map a planar pose back into the scene.
    ///
    /// Returns the position and Euler rotation (degrees). The out-of-plane
    /// coordinate comes from `reference`; rotations about in-plane axes are zero.
    pub fn unproject(self, pose: PlanarPose, reference: DVec3) -> (DVec3, DVec3) {
        let p = pose.position;
        let degrees = pose.angle.to_degrees();
        match self {
            AxisPlane::XY => (DVec3::new(p.x, p.y, reference.z), DVec3::new(0.0, 0.0, degrees)),
            AxisPlane::XZ => (DVec3::new(p.x, reference.y, -p.y), DVec3::new(0.0, degrees, 0.0)),
            AxisPlane::YZ => (DVec3::new(reference.x, p.y, -p.x), DVec3::new(degrees, 0.0, 0.0)),
        }
    }

    /// Index of the scene axis that is not simulated
    pub fn normal_axis(self) -> usize {
        match self {
            AxisPlane::XY => 2,
            AxisPlane::XZ => 1,
            AxisPlane::YZ => 0,
        }
    }
}
