//! Canopy Thermal Core Library
//!
//! Steady-state thermal structure of a plant canopy: the temperature of every
//! leaf and of a lumped soil surface, obtained by solving coupled
//! energy-balance equations (absorbed short-wave radiation, long-wave exchange
//! with sky, soil and neighbouring foliage, convection to air and latent heat
//! of transpiration) once per time step.
//!
//! ## Layout
//!
//! - [`canopy`]: the element store owning all per-element state
//! - [`physics`]: boundary-layer conductance and the leaf/soil residual equations
//! - [`solver`]: sequential fixed-point and simultaneous Newton solvers, soil models
//! - [`core_types`]: elements, meteorological forcing, typed units
//!
//! Geometry, radiative transfer, stomatal conductance and transpiration are
//! computed elsewhere and arrive as element attributes.

pub mod canopy;
pub mod core_types;
pub mod error;
pub mod physics;
pub mod solver;

pub use canopy::ElementStore;
pub use core_types::{
    Attribute, Celsius, Element, ElementId, ElementKind, Kelvin, KiloPascals, LabelConvention,
    LeafDefaults, MeteoForcing, MeteoRecord, MetersPerSecond, Percent, ViewFactors,
};
pub use error::{Result, ThermalError};
pub use solver::{
    CanopyThermalSolver, ConvergenceStatus, LongwaveModel, SoilModel, SolveReport, SolverConfig,
    SolverMode, StallRule, StepOutcome,
};
