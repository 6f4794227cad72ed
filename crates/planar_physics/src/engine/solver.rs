// SPDX-License-Identifier: MIT OR Apache-2.0
//! Iterative Gauss-Seidel solver for velocity equations.
//!
//! Equations are regularized with SPOOK parameters derived from stiffness
//! and relaxation. Solving stops after the configured iterations or once
//! the summed impulse change per iteration drops to the tolerance.

use super::body::{BodyHandle, RigidBody};
use super::constraint::Equation;
use glam::{DVec2, DVec3};
use indexmap::IndexMap;

/// Solver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Maximum Gauss-Seidel iterations
    pub iterations: u32,
    /// Stop when the mean impulse change per equation falls to this value
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            tolerance: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SolverBody {
    inv_mass: DVec2,
    inv_inertia: f64,
    velocity: DVec3,
    force: DVec3,
    delta: DVec3,
}

impl SolverBody {
    fn from_body(body: &RigidBody) -> Self {
        Self {
            inv_mass: body.solver_inv_mass(),
            inv_inertia: body.solver_inv_inertia(),
            velocity: DVec3::new(body.velocity.x, body.velocity.y, body.angular_velocity),
            force: DVec3::new(body.force.x, body.force.y, body.torque),
            delta: DVec3::ZERO,
        }
    }

    fn inv_mass_matrix(&self) -> DVec3 {
        DVec3::new(self.inv_mass.x, self.inv_mass.y, self.inv_inertia)
    }
}

struct Row {
    a: usize,
    b: Option<usize>,
    ja: DVec3,
    jb: DVec3,
    rhs: f64,
    inv_c: f64,
    eps: f64,
    min_impulse: f64,
    max_impulse: f64,
    lambda: f64,
}

/// Outcome of one solve
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolveStats {
    /// Iterations actually run
    pub iterations: u32,
    /// Whether the tolerance was reached before the iteration cap
    pub converged: bool,
}

/// Solve `equations` for one sub-step of length `h`, writing velocity corrections
/// back into `bodies`. Equations referring to missing bodies are skipped.
pub(crate) fn solve(
    config: &SolverConfig,
    h: f64,
    equations: &[Equation],
    bodies: &mut IndexMap<BodyHandle, RigidBody>,
) -> SolveStats {
    if equations.is_empty() {
        return SolveStats {
            iterations: 0,
            converged: true,
        };
    }

    let mut slots: Vec<(BodyHandle, SolverBody)> = Vec::new();
    let slot_of = |handle: BodyHandle, slots: &mut Vec<(BodyHandle, SolverBody)>| -> Option<usize> {
        if let Some(i) = slots.iter().position(|(h, _)| *h == handle) {
            return Some(i);
        }
        let body = bodies.get(&handle).filter(|b| b.in_world)?;
        slots.push((handle, SolverBody::from_body(body)));
        Some(slots.len() - 1)
    };

    let mut rows = Vec::with_capacity(equations.len());
    for eq in equations {
        let Some(a) = slot_of(eq.body_a, &mut slots) else {
            continue;
        };
        let b = match eq.body_b {
            Some(handle) => match slot_of(handle, &mut slots) {
                Some(index) => Some(index),
                None => continue,
            },
            None => None,
        };

        let d = eq.relaxation;
        let k = eq.stiffness;
        let spook_a = 4.0 / (h * (1.0 + 4.0 * d));
        let spook_b = (4.0 * d) / (1.0 + 4.0 * d);
        let eps = 4.0 / (h * h * k * (1.0 + 4.0 * d));

        let body_a = slots[a].1;
        let mut gw = eq.jacobian_a.dot(body_a.velocity);
        let mut gimf = eq.jacobian_a.dot(body_a.force * body_a.inv_mass_matrix());
        let mut gimgt = eq.jacobian_a.dot(eq.jacobian_a * body_a.inv_mass_matrix());
        if let Some(b) = b {
            let body_b = slots[b].1;
            gw += eq.jacobian_b.dot(body_b.velocity);
            gimf += eq.jacobian_b.dot(body_b.force * body_b.inv_mass_matrix());
            gimgt += eq.jacobian_b.dot(eq.jacobian_b * body_b.inv_mass_matrix());
        }
        gw -= eq.target_velocity;

        let denominator = gimgt + eps;
        let inv_c = if denominator.is_finite() && denominator > 0.0 { 1.0 / denominator } else { 0.0 };

        rows.push(Row {
            a,
            b,
            ja: eq.jacobian_a,
            jb: eq.jacobian_b,
            rhs: -eq.error * spook_a - gw * spook_b - gimf * h,
            inv_c,
            eps,
            min_impulse: eq.min_force * h,
            max_impulse: eq.max_force * h,
            lambda: 0.0,
        });
    }

    let threshold = config.tolerance * rows.len() as f64;
    let mut stats = SolveStats::default();
    for _ in 0..config.iterations {
        stats.iterations += 1;
        let mut total = 0.0;
        for row in &mut rows {
            let mut gw_lambda = row.ja.dot(slots[row.a].1.delta);
            if let Some(b) = row.b {
                gw_lambda += row.jb.dot(slots[b].1.delta);
            }

            let delta = row.inv_c * (row.rhs - gw_lambda - row.eps * row.lambda);
            let lambda = (row.lambda + delta).clamp(row.min_impulse, row.max_impulse);
            let delta = lambda - row.lambda;
            row.lambda = lambda;

            let body_a = &mut slots[row.a].1;
            body_a.delta += row.ja * body_a.inv_mass_matrix() * delta;
            if let Some(b) = row.b {
                let body_b = &mut slots[b].1;
                body_b.delta += row.jb * body_b.inv_mass_matrix() * delta;
            }
            total += delta.abs();
        }
        if total <= threshold {
            stats.converged = true;
            break;
        }
    }

    for (handle, slot) in &slots {
        if let Some(body) = bodies.get_mut(handle) {
            body.velocity += DVec2::new(slot.delta.x, slot.delta.y);
            body.angular_velocity += slot.delta.z;
        }
    }

    if !stats.converged {
        tracing::trace!("Solver stopped after {} iterations without reaching tolerance", stats.iterations);
    }
    stats
}
