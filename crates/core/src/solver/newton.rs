//! Damped Newton iteration for square nonlinear systems
//!
//! Each step solves `J(x)·δ = −F(x)` by LU factorization and backtracks the
//! step length until the max-norm of the residual decreases.

use nalgebra::{DMatrix, DVector};

/// Smallest step fraction tried by the backtracking line search
const MIN_DAMPING: f64 = 1.0 / 1024.0;

/// A square system `F(x) = 0` with an assembled Jacobian
pub trait NonlinearSystem {
    fn dimension(&self) -> usize;

    fn residual(&self, x: &DVector<f64>) -> DVector<f64>;

    fn jacobian(&self, x: &DVector<f64>) -> DMatrix<f64>;
}

/// Converged Newton iterate
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonSolution {
    pub x: DVector<f64>,
    pub iterations: usize,
    /// Max-norm of the residual, starting with the seed
    pub residual_norms: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NewtonFailure {
    Singular { iteration: usize },
    NotConverged { iterations: usize, residual_norm: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolver {
    pub tolerance: f64,
    pub max_iter: usize,
}

impl NewtonSolver {
    pub fn new(tolerance: f64, max_iter: usize) -> Self {
        Self {
            tolerance,
            max_iter,
        }
    }

    /// Iterate from `seed` until the max-norm of the residual is within `tolerance`.
    ///
    /// # Errors
    /// [`NewtonFailure::Singular`] when the Jacobian cannot be factorized,
    /// [`NewtonFailure::NotConverged`] when the iteration cap is reached or the
    /// line search cannot reduce the residual.
    pub fn solve<S: NonlinearSystem>(
        &self,
        system: &S,
        seed: DVector<f64>,
    ) -> Result<NewtonSolution, NewtonFailure> {
        let mut x = seed;
        let mut fx = system.residual(&x);
        let mut norm = fx.amax();
        let mut residual_norms = vec![norm];

        for iteration in 1..=self.max_iter {
            if norm <= self.tolerance {
                return Ok(NewtonSolution {
                    x,
                    iterations: iteration - 1,
                    residual_norms,
                });
            }

            let delta = system
                .jacobian(&x)
                .lu()
                .solve(&(-&fx))
                .ok_or(NewtonFailure::Singular { iteration })?;

            let mut damping = 1.0;
            loop {
                let trial = &x + &delta * damping;
                let f_trial = system.residual(&trial);
                let trial_norm = f_trial.amax();
                if trial_norm.is_finite() && trial_norm < norm {
                    x = trial;
                    fx = f_trial;
                    norm = trial_norm;
                    break;
                }
                if damping <= MIN_DAMPING {
                    return Err(NewtonFailure::NotConverged {
                        iterations: iteration,
                        residual_norm: norm,
                    });
                }
                damping *= 0.5;
            }
            residual_norms.push(norm);
        }

        if norm <= self.tolerance {
            Ok(NewtonSolution {
                x,
                iterations: self.max_iter,
                residual_norms,
            })
        } else {
            Err(NewtonFailure::NotConverged {
                iterations: self.max_iter,
                residual_norm: norm,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// x² + y² = 4, x = y
    struct Circle;

    impl NonlinearSystem for Circle {
        fn dimension(&self) -> usize {
            2
        }

        fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
            DVector::from_vec(vec![x[0] * x[0] + x[1] * x[1] - 4.0, x[0] - x[1]])
        }

        fn jacobian(&self, x: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_row_slice(2, 2, &[2.0 * x[0], 2.0 * x[1], 1.0, -1.0])
        }
    }

    #[test]
    fn test_converges_on_circle() {
        let solver = NewtonSolver::new(1e-12, 50);
        let solution = solver
            .solve(&Circle, DVector::from_vec(vec![1.0, 3.0]))
            .unwrap();
        assert_abs_diff_eq!(solution.x[0], 2.0_f64.sqrt(), epsilon = 1e-10);
        assert_abs_diff_eq!(solution.x[1], 2.0_f64.sqrt(), epsilon = 1e-10);
        assert!(solution.iterations > 0);
        assert_eq!(solution.residual_norms.len(), solution.iterations + 1);
    }

    /// f(x) = x with a Jacobian of the wrong sign: every step moves uphill
    struct Uphill;

    impl NonlinearSystem for Uphill {
        fn dimension(&self) -> usize {
            1
        }

        fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
            x.clone()
        }

        fn jacobian(&self, _x: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_element(1, 1, -1.0)
        }
    }

    #[test]
    fn test_line_search_rejects_steps_that_grow_the_residual() {
        let solver = NewtonSolver::new(1e-12, 50);
        let failure = solver
            .solve(&Uphill, DVector::from_element(1, 1.0))
            .unwrap_err();
        assert_eq!(
            failure,
            NewtonFailure::NotConverged {
                iterations: 1,
                residual_norm: 1.0
            }
        );
    }

    #[test]
    fn test_singular_jacobian_is_reported() {
        let solver = NewtonSolver::new(1e-12, 50);
        let failure = solver
            .solve(&Circle, DVector::from_vec(vec![0.0, 0.0]))
            .unwrap_err();
        assert_eq!(failure, NewtonFailure::Singular { iteration: 1 });
    }
}
