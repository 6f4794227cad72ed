// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debug line output.

use crate::engine::Aabb;
use glam::{DVec2, DVec3};

/// Color of body bounding boxes
pub const AABB_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Debug line for visualization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    /// Start point
    pub start: DVec3,
    /// End point
    pub end: DVec3,
    /// RGBA color
    pub color: [f32; 4],
}

/// Outline of an AABB as four segments in the simulation plane at z = 0
pub fn aabb_outline(aabb: &Aabb) -> [DebugLine; 4] {
    let corners = aabb.corners();
    let lift = |p: DVec2| DVec3::new(p.x, p.y, 0.0);
    std::array::from_fn(|i| DebugLine {
        start: lift(corners[i]),
        end: lift(corners[(i + 1) % 4]),
        color: AABB_COLOR,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_is_closed() {
        let aabb = Aabb {
            lower: DVec2::new(-1.0, -2.0),
            upper: DVec2::new(3.0, 4.0),
        };
        let lines = aabb_outline(&aabb);
        for i in 0..4 {
            assert_eq!(lines[i].end, lines[(i + 1) % 4].start);
            assert_eq!(lines[i].start.z, 0.0);
        }
        assert_eq!(lines[0].start, DVec3::new(-1.0, -2.0, 0.0));
        assert_eq!(lines[1].start, DVec3::new(3.0, -2.0, 0.0));
    }
}
