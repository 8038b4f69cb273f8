//! All leaf balances solved as one nonlinear system
//!
//! Unknowns are the leaf temperatures (K); equation `i` is the residual of
//! leaf `i` with its foliage term evaluated at the current iterate rather than
//! a frozen snapshot. The Jacobian is assembled analytically: the diagonal
//! carries each leaf's own slope, the off-diagonal entries the long-wave
//! coupling to the neighbouring leaves.

use super::config::{SolverConfig, SolverMode};
use super::newton::{NewtonFailure, NewtonSolver, NonlinearSystem};
use super::problem::{Coupling, LeafProblem, Neighbour};
use super::report::{ConvergenceStatus, SolveReport};
use crate::error::{Result, ThermalError};
use crate::physics::leaf_energy::{pairwise_coupling_derivative, Ambient};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

pub(crate) struct CanopySystem<'a> {
    problems: &'a [LeafProblem],
    ambient: Ambient,
}

impl<'a> CanopySystem<'a> {
    pub fn new(problems: &'a [LeafProblem], ambient: Ambient) -> Self {
        Self { problems, ambient }
    }
}

impl NonlinearSystem for CanopySystem<'_> {
    fn dimension(&self) -> usize {
        self.problems.len()
    }

    fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
        let temps = x.as_slice();
        DVector::from_iterator(
            self.problems.len(),
            self.problems.iter().map(|problem| {
                problem
                    .balance(temps, self.ambient)
                    .residual(temps[problem.index])
            }),
        )
    }

    fn jacobian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let temps = x.as_slice();
        let n = self.problems.len();
        let mut jacobian = DMatrix::zeros(n, n);
        for problem in self.problems {
            let i = problem.index;
            let t_i = temps[i];
            jacobian[(i, i)] += problem.balance(temps, self.ambient).residual_slope(t_i);
            match &problem.coupling {
                // k·σ·T⁴ is the pairwise term of a single self-pair with view factor −k
                Coupling::Lumped { k_leaves } => {
                    jacobian[(i, i)] += pairwise_coupling_derivative(-k_leaves, t_i);
                }
                Coupling::Pairwise(neighbours) => {
                    for (neighbour, view_factor) in neighbours {
                        if let Neighbour::Leaf(j) = *neighbour {
                            jacobian[(i, j)] +=
                                pairwise_coupling_derivative(*view_factor, temps[j]);
                        }
                    }
                }
            }
        }
        jacobian
    }
}

/// Newton solve of every leaf at once. `temperatures` (K) holds the seeds on
/// entry and the solution on success.
pub(crate) fn solve(
    config: &SolverConfig,
    problems: &[LeafProblem],
    ambient: Ambient,
    temperatures: &mut Vec<f64>,
) -> Result<SolveReport> {
    let system = CanopySystem::new(problems, ambient);
    debug!(leaves = system.dimension(), "assembling simultaneous leaf system");

    let newton = NewtonSolver::new(config.residual_tolerance, config.newton_max_iter);
    let solution = newton
        .solve(&system, DVector::from_column_slice(temperatures))
        .map_err(|failure| match failure {
            NewtonFailure::Singular { iteration } => ThermalError::SingularJacobian { iteration },
            NewtonFailure::NotConverged {
                iterations,
                residual_norm,
            } => ThermalError::SystemSolveFailed {
                iterations,
                residual_norm,
            },
        })?;

    info!(
        iterations = solution.iterations,
        "simultaneous leaf system converged"
    );
    *temperatures = solution.x.as_slice().to_vec();
    Ok(SolveReport {
        mode: SolverMode::Simultaneous,
        status: ConvergenceStatus::Converged,
        iterations: solution.iterations,
        error_trace: solution.residual_norms,
        final_step: 1.0,
    })
}
