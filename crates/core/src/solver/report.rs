//! Outcome of a leaf-temperature solve

use super::config::SolverMode;
use crate::core_types::units::Celsius;
use serde::{Deserialize, Serialize};

/// Terminal state of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Largest per-leaf change fell below `t_error_crit` (or Newton reached tolerance)
    Converged,
    /// `max_iter` sweeps ran out; temperatures are the last relaxed estimate
    IterationExhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub mode: SolverMode,
    pub status: ConvergenceStatus,
    /// Sweeps (sequential) or Newton steps (simultaneous)
    pub iterations: usize,
    /// Per-iteration max leaf change (°C), or Newton residual norms (W m⁻²)
    pub error_trace: Vec<f64>,
    /// Relaxation step in use when the solve stopped
    pub final_step: f64,
}

impl SolveReport {
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

/// Result of one full time step: soil temperature plus the leaf solve report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub t_soil: Celsius,
    pub report: SolveReport,
}
