//! Canopy thermal solver
//!
//! Drives every leaf energy balance of an [`ElementStore`] to a joint
//! solution, either by relaxed fixed-point sweeps ([`SolverMode::Sequential`])
//! or as one Newton system ([`SolverMode::Simultaneous`]), and supplies the
//! soil temperature those balances see.
//!
//! # Example
//!
//! ```
//! use canopy_thermal_core::canopy::ElementStore;
//! use canopy_thermal_core::core_types::element::{LabelConvention, LeafDefaults};
//! use canopy_thermal_core::core_types::meteo::MeteoForcing;
//! use canopy_thermal_core::core_types::units::{Celsius, KiloPascals, Percent};
//! use canopy_thermal_core::solver::{CanopyThermalSolver, SolverConfig};
//!
//! let mut store =
//!     ElementStore::from_labels([(1, "L1"), (2, "other")], &LabelConvention::default());
//! store.initialize(&LeafDefaults::default());
//! let forcing =
//!     MeteoForcing::new(Celsius::new(25.0), KiloPascals::new(101.3), Percent::new(50.0));
//!
//! let solver = CanopyThermalSolver::new(SolverConfig::default());
//! let outcome = solver.step(&mut store, &forcing).unwrap();
//! // Exhausting `max_iter` still stores the best estimate; check the flag.
//! assert!(outcome.report.iterations <= solver.config().max_iter);
//! if !outcome.report.converged() {
//!     println!("best estimate after {} sweeps", outcome.report.iterations);
//! }
//! ```

mod config;
mod newton;
mod problem;
mod report;
mod root_finding;
mod sequential;
mod simultaneous;

pub use config::{LongwaveModel, SoilModel, SolverConfig, SolverMode, StallRule};
pub use newton::{NewtonFailure, NewtonSolution, NewtonSolver, NonlinearSystem};
pub use report::{ConvergenceStatus, SolveReport, StepOutcome};
pub use root_finding::{RootFailure, ScalarRootFinder};

use crate::canopy::ElementStore;
use crate::core_types::element::ElementKind;
use crate::core_types::meteo::MeteoForcing;
use crate::core_types::units::{Celsius, Kelvin};
use crate::error::{Result, ThermalError};
use crate::physics::leaf_energy::Ambient;
use crate::physics::soil_energy::{forced_soil_temperature, SoilEnergyBalance};
use problem::prepare_leaves;
use tracing::debug;

/// Thermal solver for one canopy, configured once and reused across steps
#[derive(Debug, Clone, Default)]
pub struct CanopyThermalSolver {
    config: SolverConfig,
}

impl CanopyThermalSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve all leaf temperatures for fixed air, sky and soil temperatures.
    ///
    /// Leaves are seeded at their current `Tlc` (air temperature when absent)
    /// and the result is written back to `Tlc`. Leaf attributes must have been
    /// initialized; see [`ElementStore::initialize`].
    ///
    /// Exhausting `max_iter` in sequential mode is not an error: the last
    /// relaxed estimate is stored and the report carries
    /// [`ConvergenceStatus::IterationExhausted`].
    ///
    /// # Errors
    /// `MissingAttribute` for uninitialized leaves (or missing `vis_a_vis` when
    /// pairwise exchange is in use), `RootFindingFailed` for a leaf whose
    /// balance has no reachable root, and the Newton failures of the
    /// simultaneous mode.
    pub fn solve_leaves(
        &self,
        store: &mut ElementStore,
        forcing: &MeteoForcing,
        t_soil: Celsius,
    ) -> Result<SolveReport> {
        let ambient = Ambient::new(forcing.t_air, forcing.t_sky_eff, t_soil);
        let ids = store.leaf_ids();
        let longwave = match self.config.mode {
            SolverMode::Sequential => self.config.longwave,
            SolverMode::Simultaneous => LongwaveModel::Pairwise,
        };
        let problems = prepare_leaves(store, &ids, ambient, longwave)?;

        let mut temperatures = ids
            .iter()
            .map(|&id| -> Result<f64> {
                let tlc = store.leaf(id)?.tlc.unwrap_or(forcing.t_air.value());
                Ok(tlc + Celsius::KELVIN_OFFSET)
            })
            .collect::<Result<Vec<f64>>>()?;

        debug!(
            leaves = ids.len(),
            mode = ?self.config.mode,
            longwave = ?longwave,
            "solving leaf temperatures"
        );
        let report = match self.config.mode {
            SolverMode::Sequential => {
                sequential::solve(&self.config, &problems, ambient, &mut temperatures)?
            }
            SolverMode::Simultaneous => {
                simultaneous::solve(&self.config, &problems, ambient, &mut temperatures)?
            }
        };

        store.write_leaf_temperatures(
            ids.into_iter()
                .zip(temperatures.iter().map(|t| t - Celsius::KELVIN_OFFSET)),
        )?;
        Ok(report)
    }

    /// Solve the soil energy balance and store the result in `Tsoil`.
    ///
    /// The soil sees the current mean leaf temperature (air temperature for a
    /// canopy without leaves) and is seeded at its previous `Tsoil`.
    ///
    /// # Errors
    /// `NoSoilElement` when the store has no soil, `RootFindingFailed` when
    /// the balance cannot be driven to tolerance.
    pub fn solve_soil(&self, store: &mut ElementStore, forcing: &MeteoForcing) -> Result<Celsius> {
        let soil_id = store.soil_id().ok_or(ThermalError::NoSoilElement)?;
        let (ei, seed) = match store.get(soil_id).map(|element| &element.kind) {
            Some(ElementKind::Soil(soil)) => (
                soil.ei.unwrap_or_default(),
                soil.tsoil.unwrap_or(forcing.t_air.value()),
            ),
            _ => return Err(ThermalError::NoSoilElement),
        };
        let t_leaf_mean = store
            .mean_leaf_temperature()
            .unwrap_or(forcing.t_air.value());

        let balance = SoilEnergyBalance {
            ei,
            t_air: forcing.t_air.to_kelvin(),
            t_sky: forcing.t_sky_eff.to_kelvin(),
            t_leaf_mean: Celsius::new(t_leaf_mean).to_kelvin(),
            hs: forcing.hs,
            pa: forcing.pa,
        };
        let finder =
            ScalarRootFinder::new(self.config.residual_tolerance, self.config.max_evaluations);
        let root = finder
            .solve(|t| balance.residual(t), seed + Celsius::KELVIN_OFFSET)
            .map_err(|failure| ThermalError::RootFindingFailed {
                element: soil_id,
                residual: failure.residual,
                evaluations: failure.evaluations,
            })?;

        let t_soil = Kelvin::new(root).to_celsius();
        debug!(element = soil_id, %t_soil, "soil temperature solved");
        store.write_soil_temperature(t_soil);
        Ok(t_soil)
    }

    /// Soil temperature for this step according to [`SolverConfig::soil_model`].
    ///
    /// The value is written to the soil element when the canopy has one.
    ///
    /// # Errors
    /// The forced model needs `forcing.hour` (`MissingMeteoField("hour")`,
    /// `InvalidHour`); the energy-balance model fails as [`Self::solve_soil`].
    pub fn soil_temperature(
        &self,
        store: &mut ElementStore,
        forcing: &MeteoForcing,
    ) -> Result<Celsius> {
        let t_soil = match self.config.soil_model {
            SoilModel::EnergyBalance => return self.solve_soil(store, forcing),
            SoilModel::Forced => {
                let hour = forcing.hour.ok_or(ThermalError::MissingMeteoField("hour"))?;
                forced_soil_temperature(forcing.t_air, hour)?
            }
            SoilModel::Prescribed => forcing.t_soil_prior,
        };
        store.write_soil_temperature(t_soil);
        Ok(t_soil)
    }

    /// One time step: boundary-layer conductances, soil, then leaves.
    ///
    /// # Errors
    /// Any error of [`Self::soil_temperature`] or [`Self::solve_leaves`].
    pub fn step(&self, store: &mut ElementStore, forcing: &MeteoForcing) -> Result<StepOutcome> {
        let updated = store.assign_boundary_layer_conductance(self.config.length_unit);
        debug!(updated, "boundary-layer conductances assigned");

        let t_soil = self.soil_temperature(store, forcing)?;
        let report = self.solve_leaves(store, forcing, t_soil)?;
        Ok(StepOutcome { t_soil, report })
    }
}
