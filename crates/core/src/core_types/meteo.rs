//! Meteorological forcing for one time step
//!
//! `MeteoRecord` mirrors a raw forcing row where any column may be missing.
//! `MeteoForcing` is the validated form the solver consumes: air temperature,
//! pressure and humidity are required, the rest have documented fallbacks.

use crate::core_types::units::{Celsius, KiloPascals, MetersPerSecond, Percent};
use crate::error::{Result, ThermalError};
use crate::physics::sky::effective_sky_temperature;
use serde::{Deserialize, Serialize};

/// Raw meteorological row, as delivered by the forcing collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeteoRecord {
    /// Air temperature (°C)
    #[serde(rename = "Tac")]
    pub tac: Option<f64>,
    /// Atmospheric pressure (kPa)
    #[serde(rename = "Pa")]
    pub pa: Option<f64>,
    /// Relative humidity (%)
    pub hs: Option<f64>,
    /// Wind speed (m s⁻¹)
    pub u: Option<f64>,
    /// Effective sky temperature (°C)
    #[serde(rename = "T_sky_eff")]
    pub t_sky_eff: Option<f64>,
    /// Soil temperature from the previous step (°C)
    #[serde(rename = "T_soil")]
    pub t_soil: Option<f64>,
    /// Local hour of day, 0-23
    pub hour: Option<u8>,
}

/// Validated forcing for one time step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeteoForcing {
    pub t_air: Celsius,
    pub t_sky_eff: Celsius,
    pub t_soil_prior: Celsius,
    pub pa: KiloPascals,
    pub hs: Percent,
    /// Wind above the canopy. Not read by the solver: each leaf carries its
    /// own `u`, which is what drives `gbH`.
    pub u: MetersPerSecond,
    pub hour: Option<u8>,
}

impl MeteoForcing {
    /// Forcing with the sky temperature derived from air temperature and humidity
    pub fn new(t_air: Celsius, pa: KiloPascals, hs: Percent) -> Self {
        Self {
            t_air,
            t_sky_eff: effective_sky_temperature(t_air, hs),
            t_soil_prior: t_air,
            pa,
            hs,
            u: MetersPerSecond::default(),
            hour: None,
        }
    }

    pub fn with_sky_temperature(mut self, t_sky_eff: Celsius) -> Self {
        self.t_sky_eff = t_sky_eff;
        self
    }

    pub fn with_soil_temperature(mut self, t_soil: Celsius) -> Self {
        self.t_soil_prior = t_soil;
        self
    }

    pub fn with_wind(mut self, u: MetersPerSecond) -> Self {
        self.u = u;
        self
    }

    pub fn with_hour(mut self, hour: u8) -> Self {
        self.hour = Some(hour);
        self
    }
}

impl TryFrom<&MeteoRecord> for MeteoForcing {
    type Error = ThermalError;

    fn try_from(record: &MeteoRecord) -> Result<Self> {
        let t_air = record.tac.ok_or(ThermalError::MissingMeteoField("Tac"))?;
        let pa = record.pa.ok_or(ThermalError::MissingMeteoField("Pa"))?;
        let hs = record.hs.ok_or(ThermalError::MissingMeteoField("hs"))?;
        if pa <= 0.0 || !pa.is_finite() {
            return Err(ThermalError::InvalidMeteoValue { field: "Pa", value: pa });
        }

        let mut forcing = MeteoForcing::new(
            celsius_field("Tac", t_air)?,
            KiloPascals::new(pa),
            Percent::new(hs),
        );
        if let Some(t_sky) = record.t_sky_eff {
            forcing = forcing.with_sky_temperature(celsius_field("T_sky_eff", t_sky)?);
        }
        if let Some(t_soil) = record.t_soil {
            forcing = forcing.with_soil_temperature(celsius_field("T_soil", t_soil)?);
        }
        if let Some(u) = record.u {
            forcing = forcing.with_wind(MetersPerSecond::new(u));
        }
        forcing.hour = record.hour;
        Ok(forcing)
    }
}

fn celsius_field(field: &'static str, value: f64) -> Result<Celsius> {
    if value.is_finite() && value >= Celsius::ABSOLUTE_ZERO.value() {
        Ok(Celsius::new(value))
    } else {
        Err(ThermalError::InvalidMeteoValue { field, value })
    }
}
