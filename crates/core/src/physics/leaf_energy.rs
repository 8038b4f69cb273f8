//! Steady-state energy balance of a single leaf
//!
//! # Physics Implementation
//!
//! ```text
//! E_SW     = a_glob · Ei / 2.208
//! ΔE_LW    = e_leaf·(k_sky·e_sky·σ·T_sky⁴ + e_leaf·E_leaves + k_soil·e_soil·σ·T_soil⁴) − 2·e_leaf·σ·T⁴
//! E_Y      = −λ·E
//! E_H      = −gbH·(T − T_air)
//! residual = E_SW + ΔE_LW + E_Y + E_H
//! ```
//!
//! `E_leaves` is the long-wave irradiance received from neighbouring foliage.
//! It comes either from the lumped `k_leaves` approximation or from the exact
//! pairwise sum over signed view factors; see [`lumped_foliage_irradiance`] and
//! [`pairwise_foliage_irradiance`]. All temperatures are Kelvin.
//!
//! # References
//! - Albasha et al. (2019) "`HydroShoot`: a functional-structural plant model"
//! - Nobel, P.S. (2009) "Physicochemical and Environmental Plant Physiology"

use super::constants::{A_GLOB, E_LEAF, E_SKY, E_SOIL, LAMBDA, STEFAN_BOLTZMANN};
use super::irradiance::ppfd_to_global;
use crate::core_types::units::{Celsius, Kelvin};

/// Air, sky and soil temperatures seen by every element in one solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ambient {
    pub t_air: Kelvin,
    pub t_sky: Kelvin,
    pub t_soil: Kelvin,
}

impl Ambient {
    pub fn new(t_air: Celsius, t_sky: Celsius, t_soil: Celsius) -> Self {
        Self {
            t_air: t_air.to_kelvin(),
            t_sky: t_sky.to_kelvin(),
            t_soil: t_soil.to_kelvin(),
        }
    }
}

/// Component fluxes of an energy balance (W m⁻², positive into the surface)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyFluxes {
    pub shortwave: f64,
    pub longwave: f64,
    pub latent: f64,
    pub sensible: f64,
}

impl EnergyFluxes {
    /// Net flux, the residual driven to zero by the solver
    pub fn total(&self) -> f64 {
        self.shortwave + self.longwave + self.latent + self.sensible
    }
}

/// Lumped foliage irradiance: the leaf's own previous temperature stands in
/// for its neighbours
#[inline]
pub fn lumped_foliage_irradiance(k_leaves: f64, t_proxy: f64) -> f64 {
    k_leaves * STEFAN_BOLTZMANN * t_proxy.powi(4)
}

/// Exact foliage irradiance from `(signed view factor, neighbour temperature K)` pairs.
///
/// View factors toward occluding neighbours are negative, hence the sign flip.
pub fn pairwise_foliage_irradiance(pairs: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    -STEFAN_BOLTZMANN
        * pairs
            .into_iter()
            .map(|(view_factor, t_neighbour)| view_factor * t_neighbour.powi(4))
            .sum::<f64>()
}

/// Derivative of a leaf residual with respect to one neighbour's temperature
/// under the pairwise foliage term
#[inline]
pub fn pairwise_coupling_derivative(view_factor: f64, t_neighbour: f64) -> f64 {
    -E_LEAF * E_LEAF * STEFAN_BOLTZMANN * view_factor * 4.0 * t_neighbour.powi(3)
}

/// Fixed inputs of one leaf's energy balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafEnergyBalance {
    /// Incident PPFD (µmol m⁻² s⁻¹)
    pub ei: f64,
    pub k_sky: f64,
    pub k_soil: f64,
    /// Boundary-layer conductance to heat (W m⁻² K⁻¹)
    pub gbh: f64,
    /// Transpiration (mol m⁻² s⁻¹)
    pub e: f64,
    /// Long-wave irradiance from neighbouring foliage, `E_leaves` (W m⁻²)
    pub foliage_irradiance: f64,
    pub ambient: Ambient,
}

impl LeafEnergyBalance {
    /// Component fluxes at leaf temperature `t_leaf` (K)
    pub fn fluxes(&self, t_leaf: f64) -> EnergyFluxes {
        let sky = self.k_sky * E_SKY * STEFAN_BOLTZMANN * self.ambient.t_sky.pow4();
        let soil = self.k_soil * E_SOIL * STEFAN_BOLTZMANN * self.ambient.t_soil.pow4();
        EnergyFluxes {
            shortwave: A_GLOB * ppfd_to_global(self.ei),
            longwave: E_LEAF * (sky + E_LEAF * self.foliage_irradiance + soil)
                - 2.0 * E_LEAF * STEFAN_BOLTZMANN * t_leaf.powi(4),
            latent: -LAMBDA * self.e,
            sensible: -self.gbh * (t_leaf - *self.ambient.t_air),
        }
    }

    /// Net energy flux (W m⁻²) at leaf temperature `t_leaf` (K)
    #[inline]
    pub fn residual(&self, t_leaf: f64) -> f64 {
        self.fluxes(t_leaf).total()
    }

    /// ∂residual/∂T at fixed foliage irradiance
    #[inline]
    pub fn residual_slope(&self, t_leaf: f64) -> f64 {
        -8.0 * E_LEAF * STEFAN_BOLTZMANN * t_leaf.powi(3) - self.gbh
    }
}
