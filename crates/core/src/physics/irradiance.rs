//! Irradiance unit conventions
//!
//! Radiative-transfer collaborators deliver irradiance either as global
//! radiation, PAR energy flux or photosynthetic photon flux density. The
//! energy balance works in PPFD and converts back to a global-equivalent flux
//! with the PAR fraction (0.48) and the PAR photon ratio (4.6 µmol J⁻¹).

use super::constants::{PAR_FRACTION, PAR_PHOTON_RATIO};
use crate::error::{Result, ThermalError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// PPFD (µmol m⁻² s⁻¹) per W m⁻² of global radiation
pub const PPFD_PER_GLOBAL: f64 = PAR_FRACTION * PAR_PHOTON_RATIO;

/// Supported irradiance conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrradianceUnit {
    /// Global radiation, W m⁻²
    #[serde(rename = "Rg_Watt/m2")]
    GlobalWatts,
    /// PAR energy flux, W m⁻²
    #[serde(rename = "RgPAR_Watt/m2")]
    ParWatts,
    /// Photosynthetic photon flux density, µmol m⁻² s⁻¹
    #[serde(rename = "PPFD_umol/m2/s")]
    Ppfd,
}

impl IrradianceUnit {
    /// Convert a value in this unit to PPFD (µmol m⁻² s⁻¹)
    pub fn to_ppfd(self, value: f64) -> f64 {
        match self {
            Self::GlobalWatts => value * PPFD_PER_GLOBAL,
            Self::ParWatts => value * PAR_PHOTON_RATIO,
            Self::Ppfd => value,
        }
    }
}

impl FromStr for IrradianceUnit {
    type Err = ThermalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Rg_Watt/m2" => Ok(Self::GlobalWatts),
            "RgPAR_Watt/m2" => Ok(Self::ParWatts),
            "PPFD_umol/m2/s" => Ok(Self::Ppfd),
            other => Err(ThermalError::UnknownIrradianceUnit(other.to_string())),
        }
    }
}

/// Global-equivalent shortwave flux (W m⁻²) of an incident PPFD
#[inline]
pub fn ppfd_to_global(ppfd: f64) -> f64 {
    ppfd / PPFD_PER_GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_conversion_factor() {
        assert_relative_eq!(PPFD_PER_GLOBAL, 2.208, max_relative = 1e-12);
        assert_relative_eq!(ppfd_to_global(2208.0), 1000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_units_parse_and_convert() {
        let rg: IrradianceUnit = "Rg_Watt/m2".parse().unwrap();
        assert_relative_eq!(rg.to_ppfd(1000.0), 2208.0, max_relative = 1e-12);
        let par: IrradianceUnit = "RgPAR_Watt/m2".parse().unwrap();
        assert_relative_eq!(par.to_ppfd(100.0), 460.0, max_relative = 1e-12);
        let ppfd: IrradianceUnit = "PPFD_umol/m2/s".parse().unwrap();
        assert_eq!(ppfd.to_ppfd(1500.0), 1500.0);
    }

    #[test]
    fn test_unknown_unit_is_an_input_error() {
        let err = "lux".parse::<IrradianceUnit>().unwrap_err();
        assert_eq!(err, ThermalError::UnknownIrradianceUnit("lux".to_string()));
    }
}
