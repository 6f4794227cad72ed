// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collision shapes and bounding boxes.

use super::body::BodyHandle;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Half extent used for the unbounded sides of a plane
const PLANE_EXTENT: f64 = 1e7;

/// Handle of a shape stored in the engine world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(pub(crate) u64);

impl ShapeHandle {
    /// Get the raw handle value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Geometry kind of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Axis-aligned box in body space
    Box,
    /// Circle
    Circle,
    /// Capsule along the local X axis
    Capsule,
    /// Infinite half-plane with its normal along local +Y
    Plane,
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShapeKind::Box => "box",
            ShapeKind::Circle => "circle",
            ShapeKind::Capsule => "capsule",
            ShapeKind::Plane => "plane",
        };
        f.write_str(name)
    }
}

/// Kind-specific shape geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Box of the given size
    Box {
        /// Extent along local X
        width: f64,
        /// Extent along local Y
        height: f64,
    },
    /// Circle
    Circle {
        /// Radius
        radius: f64,
    },
    /// Capsule
    Capsule {
        /// Distance between the two cap centers
        length: f64,
        /// Cap radius
        radius: f64,
    },
    /// Half-plane
    Plane,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::Box {
            width: 1.0,
            height: 1.0,
        }
    }
}

impl Geometry {
    /// Geometry kind
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Box { .. } => ShapeKind::Box,
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Capsule { .. } => ShapeKind::Capsule,
            Geometry::Plane => ShapeKind::Plane,
        }
    }

    /// Moment of inertia about the shape's own center for the given mass
    pub fn moment_of_inertia(&self, mass: f64) -> f64 {
        match *self {
            Geometry::Box { width, height } => mass * (width * width + height * height) / 12.0,
            Geometry::Circle { radius } => mass * radius * radius / 2.0,
            Geometry::Capsule { length, radius } => {
                let w = length + radius;
                let h = radius * 2.0;
                mass * (h * h + w * w) / 12.0
            }
            Geometry::Plane => 0.0,
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub lower: DVec2,
    /// Maximum corner
    pub upper: DVec2,
}

impl Aabb {
    /// Box containing a single point
    pub fn from_point(point: DVec2) -> Self {
        Self {
            lower: point,
            upper: point,
        }
    }

    /// Box containing all points
    pub fn from_points(points: &[DVec2]) -> Self {
        let mut aabb = Self::from_point(points.first().copied().unwrap_or(DVec2::ZERO));
        for &p in points.iter().skip(1) {
            aabb.lower = aabb.lower.min(p);
            aabb.upper = aabb.upper.max(p);
        }
        aabb
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    /// Corners in counter-clockwise order starting at the lower one
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.lower,
            DVec2::new(self.upper.x, self.lower.y),
            self.upper,
            DVec2::new(self.lower.x, self.upper.y),
        ]
    }
}

/// A collision shape
#[derive(Debug, Clone)]
pub struct Shape {
    /// Geometry
    pub geometry: Geometry,
    /// Offset from the body's center of mass
    pub local_position: DVec2,
    /// Angle relative to the body, in radians
    pub local_angle: f64,
    /// Groups this shape belongs to
    pub collision_group: u32,
    /// Groups this shape collides with
    pub collision_mask: u32,
    /// Report overlaps without a contact response
    pub sensor: bool,
    pub(crate) body: Option<BodyHandle>,
}

impl Shape {
    /// Create a shape with default filtering
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            local_position: DVec2::ZERO,
            local_angle: 0.0,
            collision_group: 1,
            collision_mask: 1,
            sensor: false,
            body: None,
        }
    }

    /// Body this shape is attached to
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Geometry kind
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    /// World-space bounds for a body at `body_position` / `body_angle`
    pub fn world_aabb(&self, body_position: DVec2, body_angle: f64) -> Aabb {
        let position = body_position + DVec2::from_angle(body_angle).rotate(self.local_position);
        let angle = body_angle + self.local_angle;
        let rotation = DVec2::from_angle(angle);

        match self.geometry {
            Geometry::Box { width, height } => {
                let hw = width / 2.0;
                let hh = height / 2.0;
                let corners = [
                    DVec2::new(-hw, -hh),
                    DVec2::new(hw, -hh),
                    DVec2::new(hw, hh),
                    DVec2::new(-hw, hh),
                ]
                .map(|c| position + rotation.rotate(c));
                Aabb::from_points(&corners)
            }
            Geometry::Circle { radius } => Aabb {
                lower: position - DVec2::splat(radius),
                upper: position + DVec2::splat(radius),
            },
            Geometry::Capsule { length, radius } => {
                let half = rotation.rotate(DVec2::new(length / 2.0, 0.0));
                let segment = Aabb::from_points(&[position - half, position + half]);
                Aabb {
                    lower: segment.lower - DVec2::splat(radius),
                    upper: segment.upper + DVec2::splat(radius),
                }
            }
            Geometry::Plane => {
                let mut aabb = Aabb {
                    lower: DVec2::splat(-PLANE_EXTENT),
                    upper: DVec2::splat(PLANE_EXTENT),
                };
                let a = angle.rem_euclid(TAU);
                if a == 0.0 {
                    aabb.upper.y = position.y;
                } else if a == FRAC_PI_2 {
                    aabb.lower.x = position.x;
                } else if a == PI {
                    aabb.lower.y = position.y;
                } else if a == 3.0 * FRAC_PI_2 {
                    aabb.upper.x = position.x;
                }
                aabb
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moment_of_inertia() {
        let box_shape = Geometry::Box { width: 2.0, height: 4.0 };
        assert!((box_shape.moment_of_inertia(3.0) - 5.0).abs() < 1e-12);

        let circle = Geometry::Circle { radius: 2.0 };
        assert!((circle.moment_of_inertia(1.0) - 2.0).abs() < 1e-12);

        let capsule = Geometry::Capsule { length: 1.0, radius: 1.0 };
        assert!((capsule.moment_of_inertia(12.0) - 8.0).abs() < 1e-12);

        assert_eq!(Geometry::Plane.moment_of_inertia(10.0), 0.0);
    }

    #[test]
    fn test_rotated_box_aabb() {
        let shape = Shape::new(Geometry::Box { width: 2.0, height: 2.0 });
        let aabb = shape.world_aabb(DVec2::new(1.0, 0.0), std::f64::consts::FRAC_PI_4);
        let half_diagonal = 2f64.sqrt();
        assert!((aabb.upper.x - (1.0 + half_diagonal)).abs() < 1e-9);
        assert!((aabb.lower.y + half_diagonal).abs() < 1e-9);
    }

    #[test]
    fn test_plane_aabb_is_half_open() {
        let shape = Shape::new(Geometry::Plane);
        let aabb = shape.world_aabb(DVec2::new(0.0, -3.0), 0.0);
        assert_eq!(aabb.upper.y, -3.0);
        assert_eq!(aabb.lower.y, -PLANE_EXTENT);
    }
}
