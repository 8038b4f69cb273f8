//! Canopy energy-balance physics
//!
//! Pure functions and equation structs: boundary-layer conductance, leaf and
//! soil residuals, psychrometrics, sky temperature and irradiance units. No
//! function here mutates the element store.

pub mod boundary_layer;
pub mod constants;
pub mod irradiance;
pub mod leaf_energy;
pub mod psychrometrics;
pub mod sky;
pub mod soil_energy;

pub use boundary_layer::{boundary_layer_conductance, LengthUnit, MIN_WIND_SPEED};
pub use irradiance::{ppfd_to_global, IrradianceUnit};
pub use leaf_energy::{
    lumped_foliage_irradiance, pairwise_coupling_derivative, pairwise_foliage_irradiance,
    Ambient, EnergyFluxes, LeafEnergyBalance,
};
pub use psychrometrics::{saturated_vapor_pressure, vapor_pressure_deficit};
pub use sky::effective_sky_temperature;
pub use soil_energy::{forced_soil_temperature, SoilEnergyBalance, FORCED_SOIL_OFFSETS};
