//! Derivative-free scalar root finding
//!
//! The energy-balance residuals are smooth and strictly monotone in the
//! element temperature over the physical range, so a bracket is found by
//! marching from the seed in the direction of decreasing |residual| with
//! doubling steps, then refined with Brent's method (inverse quadratic
//! interpolation safeguarded by bisection).
//!
//! # References
//! - Brent, R.P. (1973) "Algorithms for Minimization without Derivatives", ch. 4

/// Why a root find gave up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootFailure {
    /// Best abscissa seen
    pub best: f64,
    /// Residual at `best`
    pub residual: f64,
    pub evaluations: usize,
}

/// Bracketing + Brent root finder for `f(x) = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarRootFinder {
    /// Accept `x` once `|f(x)|` is at or below this value
    pub tolerance: f64,
    pub max_evaluations: usize,
    /// First probe distance from the seed
    pub initial_step: f64,
    /// The search never evaluates below this abscissa (1 K for temperatures)
    pub lower_bound: f64,
}

/// `f` wrapped with an evaluation counter and best-so-far tracking
struct Counted<F> {
    f: F,
    evaluations: usize,
    best: (f64, f64),
}

impl<F: Fn(f64) -> f64> Counted<F> {
    fn call(&mut self, x: f64) -> f64 {
        self.evaluations += 1;
        let fx = (self.f)(x);
        if fx.is_finite() && (fx.abs() < self.best.1.abs() || !self.best.1.is_finite()) {
            self.best = (x, fx);
        }
        fx
    }

    fn failure(&self) -> RootFailure {
        RootFailure {
            best: self.best.0,
            residual: self.best.1,
            evaluations: self.evaluations,
        }
    }
}

impl ScalarRootFinder {
    pub fn new(tolerance: f64, max_evaluations: usize) -> Self {
        Self {
            tolerance,
            max_evaluations,
            initial_step: 1.0,
            lower_bound: 1.0,
        }
    }

    /// Find `x` with `|f(x)| <= tolerance`, starting from `seed`
    ///
    /// # Errors
    /// [`RootFailure`] with the best point seen when no sign change is found
    /// or the evaluation budget runs out.
    pub fn solve(&self, f: impl Fn(f64) -> f64, seed: f64) -> Result<f64, RootFailure> {
        let mut counted = Counted {
            f,
            evaluations: 0,
            best: (seed, f64::NAN),
        };
        if !seed.is_finite() {
            return Err(counted.failure());
        }

        let seed = seed.max(self.lower_bound);
        let f0 = counted.call(seed);
        if !f0.is_finite() {
            return Err(counted.failure());
        }
        if f0.abs() <= self.tolerance {
            return Ok(seed);
        }

        let ((a, fa), (b, fb)) = self.bracket(&mut counted, seed, f0)?;
        self.brent(&mut counted, a, fa, b, fb)
    }

    /// March away from `seed` until the residual changes sign
    fn bracket<F: Fn(f64) -> f64>(
        &self,
        counted: &mut Counted<F>,
        seed: f64,
        f0: f64,
    ) -> Result<((f64, f64), (f64, f64)), RootFailure> {
        let probe = seed + self.initial_step;
        let f1 = counted.call(probe);
        if !f1.is_finite() {
            return Err(counted.failure());
        }
        if f0 * f1 <= 0.0 {
            return Ok(((seed, f0), (probe, f1)));
        }

        let (direction, mut x_prev, mut f_prev) = if f1.abs() < f0.abs() {
            (1.0, probe, f1)
        } else {
            (-1.0, seed, f0)
        };
        let mut step = self.initial_step;
        while counted.evaluations < self.max_evaluations {
            step *= 2.0;
            let x = (x_prev + direction * step).max(self.lower_bound);
            let fx = counted.call(x);
            if !fx.is_finite() {
                return Err(counted.failure());
            }
            if f_prev * fx <= 0.0 {
                return Ok(((x_prev, f_prev), (x, fx)));
            }
            if x <= self.lower_bound {
                break;
            }
            x_prev = x;
            f_prev = fx;
        }
        Err(counted.failure())
    }

    /// Brent refinement of a sign-changing bracket `[a, b]`
    fn brent<F: Fn(f64) -> f64>(
        &self,
        counted: &mut Counted<F>,
        mut a: f64,
        mut fa: f64,
        mut b: f64,
        mut fb: f64,
    ) -> Result<f64, RootFailure> {
        let mut c = b;
        let mut fc = fb;
        let mut d = b - a;
        let mut e = d;

        while counted.evaluations < self.max_evaluations {
            if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            if fb.abs() <= self.tolerance {
                return Ok(b);
            }
            let tol1 = 2.0 * f64::EPSILON * b.abs();
            let xm = 0.5 * (c - b);
            if xm.abs() <= tol1 {
                // Bracket collapsed to machine precision without reaching tolerance
                return Err(counted.failure());
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q) = if a == c {
                    (2.0 * xm * s, 1.0 - s)
                } else {
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                        (q - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * xm * q - (tol1 * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b += if d.abs() > tol1 { d } else { tol1.copysign(xm) };
            fb = counted.call(b);
            if !fb.is_finite() {
                return Err(counted.failure());
            }
        }
        Err(counted.failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_polynomial_root() {
        let finder = ScalarRootFinder::new(1e-12, 200);
        let root = finder.solve(|x| x * x - 2.0, 1.0).unwrap();
        assert_abs_diff_eq!(root, 2.0_f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn test_marches_downward_from_a_high_seed() {
        let finder = ScalarRootFinder::new(1e-9, 200);
        // Decreasing function with root at 280 K, seeded far above
        let root = finder.solve(|t| 280.0 - t, 400.0).unwrap();
        assert_abs_diff_eq!(root, 280.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stefan_boltzmann_like_residual() {
        let finder = ScalarRootFinder::new(1e-6, 200);
        let f = |t: f64| 900.0 - 1.92 * 5.670373e-8 * t.powi(4) - 1.5 * (t - 298.15);
        let root = finder.solve(f, 293.15).unwrap();
        assert!(f(root).abs() <= 1e-6);
    }

    #[test]
    fn test_seed_already_at_root() {
        let finder = ScalarRootFinder::new(1e-6, 10);
        assert_eq!(finder.solve(|t| 300.0 - t, 300.0), Ok(300.0));
    }

    #[test]
    fn test_no_sign_change_fails_with_best_estimate() {
        let finder = ScalarRootFinder::new(1e-6, 50);
        let failure = finder.solve(|x| x * x + 1.0, 5.0).unwrap_err();
        assert!(failure.evaluations <= 50);
        assert!(failure.residual >= 1.0);
    }

    #[test]
    fn test_nan_residual_fails() {
        let finder = ScalarRootFinder::new(1e-6, 50);
        assert!(finder.solve(|_| f64::NAN, 300.0).is_err());
        assert!(finder.solve(|t| 300.0 - t, f64::NAN).is_err());
    }
}
