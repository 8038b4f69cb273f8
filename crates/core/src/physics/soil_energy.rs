//! Energy balance of the lumped soil surface
//!
//! ```text
//! E_SW     = (1 − albedo)·Ei / 2.208
//! ΔE_LW    = e_soil·σ·(e_sky·T_sky⁴ + e_leaf·T_leaf_mean⁴ − T_soil⁴)
//! E_Y      = −λ·g_M·VPD(T_air, T_soil, hs) / P_atm
//! E_H      = −g_H·Cp·(T_soil − T_air)
//! ```
//!
//! No heat is lost to deeper soil layers. The fixed-offset alternative used when
//! radiative inputs are unavailable is [`forced_soil_temperature`].
//!
//! # References
//! - Bailey, B.N. (2016) Agric. For. Meteorol. 218-219: 146-160 (`g_M`, `g_H`)

use super::constants::{
    CP_AIR, E_LEAF, E_SKY, E_SOIL, LAMBDA, SOIL_ALBEDO, SOIL_G_H, SOIL_G_M, STEFAN_BOLTZMANN,
};
use super::irradiance::ppfd_to_global;
use super::leaf_energy::EnergyFluxes;
use super::psychrometrics::vapor_pressure_deficit;
use crate::core_types::units::{Celsius, Kelvin, KiloPascals, Percent};
use crate::error::{Result, ThermalError};

/// Soil-minus-air temperature offset (°C) by local hour of day
pub const FORCED_SOIL_OFFSETS: [f64; 24] = [
    3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 10.0, 15.0, 20.0, 20.0, 20.0, 20.0, 20.0, 15.0, 6.0,
    5.0, 4.0, 3.0, 3.0, 3.0, 3.0, 3.0,
];

/// Fixed inputs of the soil energy balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilEnergyBalance {
    /// Incident PPFD on the soil (µmol m⁻² s⁻¹)
    pub ei: f64,
    pub t_air: Kelvin,
    pub t_sky: Kelvin,
    /// Arithmetic mean of the current leaf temperatures
    pub t_leaf_mean: Kelvin,
    pub hs: Percent,
    pub pa: KiloPascals,
}

impl SoilEnergyBalance {
    /// Component fluxes at soil temperature `t_soil` (K)
    pub fn fluxes(&self, t_soil: f64) -> EnergyFluxes {
        let vpd = vapor_pressure_deficit(
            *self.t_air.to_celsius(),
            t_soil - Celsius::KELVIN_OFFSET,
            *self.hs,
        );
        EnergyFluxes {
            shortwave: (1.0 - SOIL_ALBEDO) * ppfd_to_global(self.ei),
            longwave: E_SOIL
                * STEFAN_BOLTZMANN
                * (E_SKY * self.t_sky.pow4() + E_LEAF * self.t_leaf_mean.pow4() - t_soil.powi(4)),
            latent: -LAMBDA * SOIL_G_M * vpd / *self.pa,
            sensible: -SOIL_G_H * CP_AIR * (t_soil - *self.t_air),
        }
    }

    /// Net energy flux (W m⁻²) at soil temperature `t_soil` (K)
    #[inline]
    pub fn residual(&self, t_soil: f64) -> f64 {
        self.fluxes(t_soil).total()
    }

    /// Temperature at which the soil long-wave exchange alone balances
    pub fn radiative_equilibrium(&self) -> Kelvin {
        Kelvin::new((E_SKY * self.t_sky.pow4() + E_LEAF * self.t_leaf_mean.pow4()).powf(0.25))
    }
}

/// Soil temperature from air temperature plus a fixed diurnal offset
///
/// # Errors
/// `InvalidHour` when `hour` is outside 0..=23.
pub fn forced_soil_temperature(t_air: Celsius, hour: u8) -> Result<Celsius> {
    let offset = FORCED_SOIL_OFFSETS
        .get(usize::from(hour))
        .ok_or(ThermalError::InvalidHour(hour))?;
    Ok(t_air + *offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scenario() -> SoilEnergyBalance {
        SoilEnergyBalance {
            ei: 0.0,
            t_air: Celsius::new(25.0).to_kelvin(),
            t_sky: Celsius::new(10.0).to_kelvin(),
            t_leaf_mean: Celsius::new(25.0).to_kelvin(),
            hs: Percent::new(50.0),
            pa: KiloPascals::new(101.3),
        }
    }

    #[test]
    fn test_sensible_term_vanishes_at_air_temperature() {
        let soil = scenario();
        let fluxes = soil.fluxes(*soil.t_air);
        assert_abs_diff_eq!(fluxes.sensible, 0.0, epsilon = 1e-12);
        assert!(fluxes.latent < 0.0, "unsaturated air must evaporate");
        assert!(fluxes.longwave > 0.0);
    }

    #[test]
    fn test_shortwave_uses_albedo() {
        let soil = SoilEnergyBalance {
            ei: 2208.0,
            ..scenario()
        };
        assert_abs_diff_eq!(soil.fluxes(300.0).shortwave, 750.0, epsilon = 1e-9);
    }

    #[test]
    fn test_radiative_equilibrium_exceeds_air() {
        let soil = scenario();
        assert!(soil.radiative_equilibrium() > soil.t_air);
        assert!(soil.residual(*soil.radiative_equilibrium()) < 0.0);
    }

    #[test]
    fn test_forced_table() {
        let t_air = Celsius::new(18.0);
        assert_eq!(forced_soil_temperature(t_air, 0).unwrap(), Celsius::new(21.0));
        assert_eq!(forced_soil_temperature(t_air, 12).unwrap(), Celsius::new(38.0));
        assert_eq!(forced_soil_temperature(t_air, 23).unwrap(), Celsius::new(21.0));
        assert_eq!(
            forced_soil_temperature(t_air, 24),
            Err(ThermalError::InvalidHour(24))
        );
    }
}
