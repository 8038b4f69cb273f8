//! Solver configuration
//!
//! Named options of the canopy thermal solver. The legacy boolean switches
//! `solo` and `simple_ff` map onto [`SolverMode`] and [`LongwaveModel`]; see
//! [`SolverConfig::from_flags`].

use crate::physics::boundary_layer::LengthUnit;
use serde::{Deserialize, Serialize};

/// How leaf temperatures are coupled during a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverMode {
    /// Relaxed fixed-point sweeps, one scalar root find per leaf (`solo = true`)
    #[default]
    Sequential,
    /// One Newton solve over all leaf temperatures at once (`solo = false`)
    Simultaneous,
}

/// Long-wave exchange with neighbouring foliage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LongwaveModel {
    /// `k_leaves · σ · T_prev⁴` (`simple_ff = true`)
    #[default]
    Lumped,
    /// Signed pairwise view factors from `vis_a_vis` (`simple_ff = false`)
    Pairwise,
}

/// Source of the soil surface temperature for a time step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SoilModel {
    /// Solve the soil energy balance
    #[default]
    EnergyBalance,
    /// Air temperature plus the hour-of-day offset table
    Forced,
    /// Take `T_soil_prior` from the forcing unchanged
    Prescribed,
}

/// When a sequential solve counts as stalled and halves its relaxation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StallRule {
    /// Consecutive largest changes differ by less than `t_error_crit`.
    ///
    /// Near convergence this keeps halving until `min_step`, so a canopy with
    /// foliage coupling usually ends on [`super::ConvergenceStatus::IterationExhausted`]
    /// with a best estimate close to the fixed point.
    #[default]
    AbsoluteDifference,
    /// The largest leaf change did not shrink from one sweep to the next
    NoProgress,
}

impl StallRule {
    pub fn is_stalled(self, before: f64, last: f64, t_error_crit: f64) -> bool {
        match self {
            Self::NoProgress => last >= before,
            Self::AbsoluteDifference => (last - before).abs() < t_error_crit,
        }
    }
}

/// Configuration of [`super::CanopyThermalSolver`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub mode: SolverMode,
    pub longwave: LongwaveModel,
    /// Sequential mode: sweep cap
    pub max_iter: usize,
    /// Sequential mode: convergence threshold on the largest leaf change (°C)
    pub t_error_crit: f64,
    /// Sequential mode: initial under-relaxation step
    pub t_step: f64,
    /// Sequential mode: floor of the adaptive relaxation step
    pub min_step: f64,
    /// Sequential mode: stall detection driving the step halving
    pub stall_rule: StallRule,
    /// Residual tolerance of the root finders (W m⁻²)
    pub residual_tolerance: f64,
    /// Evaluation budget of the scalar root finder, per element
    pub max_evaluations: usize,
    /// Simultaneous mode: Newton iteration cap
    pub newton_max_iter: usize,
    /// Solve the leaves of a sweep on the rayon thread pool
    pub parallel: bool,
    pub soil_model: SoilModel,
    /// Unit of leaf `Length`
    pub length_unit: LengthUnit,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            mode: SolverMode::Sequential,
            longwave: LongwaveModel::Lumped,
            max_iter: 100,
            t_error_crit: 0.01,
            t_step: 0.5,
            min_step: 0.01,
            stall_rule: StallRule::AbsoluteDifference,
            residual_tolerance: 1.0e-6,
            max_evaluations: 200,
            newton_max_iter: 50,
            parallel: true,
            soil_model: SoilModel::EnergyBalance,
            length_unit: LengthUnit::Centimeters,
        }
    }
}

impl SolverConfig {
    /// Defaults with the legacy `solo` / `simple_ff` switches applied
    pub fn from_flags(solo: bool, simple_ff: bool) -> Self {
        Self {
            mode: if solo {
                SolverMode::Sequential
            } else {
                SolverMode::Simultaneous
            },
            longwave: if simple_ff {
                LongwaveModel::Lumped
            } else {
                LongwaveModel::Pairwise
            },
            ..Self::default()
        }
    }
}
