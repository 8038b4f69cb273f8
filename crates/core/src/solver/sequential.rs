//! Relaxed fixed-point iteration over per-leaf scalar root finds
//!
//! Each sweep freezes the current temperatures, solves every leaf's balance
//! independently against that snapshot, then moves each leaf a fraction
//! `step` of the way toward its new root. Whenever the configured
//! [`StallRule`] reports a stall the step is halved, down to `min_step`.

use super::config::{SolverConfig, SolverMode};
use super::problem::LeafProblem;
use super::report::{ConvergenceStatus, SolveReport};
use super::root_finding::ScalarRootFinder;
use crate::error::{Result, ThermalError};
use crate::physics::leaf_energy::Ambient;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Solve one leaf against a frozen snapshot (K)
fn solve_leaf(
    finder: &ScalarRootFinder,
    problem: &LeafProblem,
    snapshot: &[f64],
    ambient: Ambient,
) -> Result<f64> {
    let balance = problem.balance(snapshot, ambient);
    finder
        .solve(|t| balance.residual(t), snapshot[problem.index])
        .map_err(|failure| ThermalError::RootFindingFailed {
            element: problem.id,
            residual: failure.residual,
            evaluations: failure.evaluations,
        })
}

/// One sweep: new root of every leaf, in leaf order
fn sweep(
    config: &SolverConfig,
    finder: &ScalarRootFinder,
    problems: &[LeafProblem],
    snapshot: &[f64],
    ambient: Ambient,
) -> Result<Vec<f64>> {
    if config.parallel {
        problems
            .par_iter()
            .map(|problem| solve_leaf(finder, problem, snapshot, ambient))
            .collect()
    } else {
        problems
            .iter()
            .map(|problem| solve_leaf(finder, problem, snapshot, ambient))
            .collect()
    }
}

/// Iterate to a joint fixed point. `temperatures` (K) holds the seeds on
/// entry and the final estimate on return.
pub(crate) fn solve(
    config: &SolverConfig,
    problems: &[LeafProblem],
    ambient: Ambient,
    temperatures: &mut Vec<f64>,
) -> Result<SolveReport> {
    let finder = ScalarRootFinder::new(config.residual_tolerance, config.max_evaluations);
    let mut step = config.t_step;
    let mut error_trace = Vec::with_capacity(config.max_iter);

    if problems.is_empty() {
        return Ok(SolveReport {
            mode: SolverMode::Sequential,
            status: ConvergenceStatus::Converged,
            iterations: 0,
            error_trace,
            final_step: step,
        });
    }

    for iteration in 1..=config.max_iter {
        let t_new = sweep(config, &finder, problems, temperatures, ambient)?;
        let t_error = temperatures
            .iter()
            .zip(&t_new)
            .map(|(old, new)| (new - old).abs())
            .fold(0.0, f64::max);
        error_trace.push(t_error);
        debug!(iteration, t_error, step, "leaf sweep");

        if t_error < config.t_error_crit {
            *temperatures = t_new;
            info!(iterations = iteration, t_error, "leaf temperatures converged");
            return Ok(SolveReport {
                mode: SolverMode::Sequential,
                status: ConvergenceStatus::Converged,
                iterations: iteration,
                error_trace,
                final_step: step,
            });
        }

        if let [.., before, last] = error_trace.as_slice() {
            if config.stall_rule.is_stalled(*before, *last, config.t_error_crit) {
                step = (step * 0.5).max(config.min_step);
                debug!(iteration, step, "stall detected, damping relaxation");
            }
        }

        for (t, target) in temperatures.iter_mut().zip(&t_new) {
            *t += step * (target - *t);
        }
    }

    let t_error = error_trace.last().copied().unwrap_or_default();
    warn!(
        max_iter = config.max_iter,
        t_error, "leaf temperatures did not converge, keeping last relaxed estimate"
    );
    Ok(SolveReport {
        mode: SolverMode::Sequential,
        status: ConvergenceStatus::IterationExhausted,
        iterations: config.max_iter,
        error_trace,
        final_step: step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::Celsius;
    use crate::solver::config::StallRule;
    use crate::solver::problem::Coupling;
    use approx::assert_abs_diff_eq;

    fn ambient() -> Ambient {
        Ambient::new(Celsius::new(25.0), Celsius::new(10.0), Celsius::new(25.0))
    }

    fn leaf(index: usize, ei: f64, k_leaves: f64) -> LeafProblem {
        LeafProblem {
            id: u32::try_from(index).unwrap() + 1,
            index,
            ei,
            k_sky: 1.0,
            k_soil: 1.0,
            gbh: 1.5,
            e: 0.0,
            coupling: Coupling::Lumped { k_leaves },
        }
    }

    #[test]
    fn test_empty_canopy_converges_immediately() {
        let mut temps = Vec::new();
        let report = solve(&SolverConfig::default(), &[], ambient(), &mut temps).unwrap();
        assert!(report.converged());
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn test_uncoupled_leaves_converge_to_their_roots() {
        // Without foliage coupling every sweep finds the same roots, so the
        // relaxed change halves each sweep.
        let config = SolverConfig {
            t_error_crit: 1.0,
            ..SolverConfig::default()
        };
        let problems = [leaf(0, 0.0, 0.0), leaf(1, 800.0, 0.0)];
        let amb = ambient();
        let mut temps = vec![*amb.t_air; 2];
        let report = solve(&config, &problems, amb, &mut temps).unwrap();
        assert!(report.converged());
        for (problem, t) in problems.iter().zip(&temps) {
            let residual = problem.balance(&temps, amb).residual(*t);
            assert_abs_diff_eq!(residual, 0.0, epsilon = config.residual_tolerance);
        }
        assert!(temps[1] > temps[0]);
    }

    #[test]
    fn test_exhaustion_is_flagged_not_raised() {
        let config = SolverConfig {
            max_iter: 2,
            t_error_crit: 1.0e-9,
            ..SolverConfig::default()
        };
        let problems = [leaf(0, 1000.0, 0.5)];
        let amb = ambient();
        let mut temps = vec![*amb.t_air];
        let report = solve(&config, &problems, amb, &mut temps).unwrap();
        assert_eq!(report.status, ConvergenceStatus::IterationExhausted);
        assert_eq!(report.iterations, 2);
        assert_eq!(report.error_trace.len(), 2);
        assert!(temps[0] > *amb.t_air);
    }

    #[test]
    fn test_absolute_difference_rule_collapses_the_step() {
        let problems = [LeafProblem {
            k_sky: 0.5,
            k_soil: 0.5,
            ..leaf(0, 600.0, 1.0)
        }];
        let amb = ambient();
        let run = |stall_rule| {
            let config = SolverConfig {
                stall_rule,
                ..SolverConfig::default()
            };
            let mut temps = vec![*amb.t_air];
            solve(&config, &problems, amb, &mut temps).unwrap()
        };

        let relaxed = run(StallRule::NoProgress);
        assert!(relaxed.converged());
        assert_eq!(relaxed.final_step, 0.5);

        let collapsed = run(StallRule::AbsoluteDifference);
        assert_eq!(collapsed.final_step, 0.01);
        assert!(collapsed.iterations > relaxed.iterations);
        for pair in collapsed.error_trace.windows(2) {
            assert!(pair[1] <= pair[0], "{:?}", collapsed.error_trace);
        }
    }

    #[test]
    fn test_serial_and_parallel_sweeps_agree() {
        let problems: Vec<_> = (0..16)
            .map(|i| leaf(i, 50.0 * i as f64, 0.3))
            .collect();
        let amb = ambient();
        let run = |parallel| {
            let config = SolverConfig {
                parallel,
                ..SolverConfig::default()
            };
            let mut temps = vec![*amb.t_air; problems.len()];
            let report = solve(&config, &problems, amb, &mut temps).unwrap();
            (temps, report)
        };
        assert_eq!(run(true), run(false));
    }
}
