//! Boundary-layer conductance to heat for flat leaves
//!
//! ```text
//! l_w  = 0.72 · L                    (downwind leaf width, m)
//! d_bl = 4 · sqrt(l_w / u) / 1000    (boundary-layer thickness, m)
//! gbH  = 2 · k_air / d_bl            (both faces, W m⁻² K⁻¹)
//! ```
//!
//! Wind speed is floored at [`MIN_WIND_SPEED`] so still air produces a large but
//! finite boundary layer rather than a division by zero.
//!
//! # References
//! - Nobel, P.S. (2009) "Physicochemical and Environmental Plant Physiology", p. 337

use super::constants::AIR_THERMAL_CONDUCTIVITY;
use crate::error::{Result, ThermalError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Wind floor applied before the boundary-layer formula (m s⁻¹)
pub const MIN_WIND_SPEED: f64 = 1.0e-3;

/// Ratio of downwind leaf width to characteristic length
const DOWNWIND_WIDTH_RATIO: f64 = 0.72;

/// Unit of the scene geometry, hence of leaf `Length`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "mm")]
    Millimeters,
    #[default]
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "m")]
    Meters,
}

impl LengthUnit {
    /// Multiplier converting this unit to meters
    pub const fn to_meters(self) -> f64 {
        match self {
            Self::Millimeters => 1.0e-3,
            Self::Centimeters => 1.0e-2,
            Self::Meters => 1.0,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = ThermalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mm" => Ok(Self::Millimeters),
            "cm" => Ok(Self::Centimeters),
            "m" => Ok(Self::Meters),
            other => Err(ThermalError::UnknownLengthUnit(other.to_string())),
        }
    }
}

/// Boundary-layer conductance to heat (W m⁻² K⁻¹)
///
/// # Arguments
/// * `length_m` - Leaf characteristic length in meters
/// * `wind_speed` - Local wind speed (m s⁻¹), floored at [`MIN_WIND_SPEED`]
#[inline]
pub fn boundary_layer_conductance(length_m: f64, wind_speed: f64) -> f64 {
    let l_w = length_m * DOWNWIND_WIDTH_RATIO;
    let d_bl = 4.0 * (l_w / wind_speed.max(MIN_WIND_SPEED)).sqrt() / 1000.0;
    2.0 * AIR_THERMAL_CONDUCTIVITY / d_bl
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_value() {
        // 10 cm leaf in 1 m/s wind: d_bl = 4·sqrt(0.072)/1000
        let gbh = boundary_layer_conductance(0.1, 1.0);
        let expected = 0.052 / (4.0 * 0.072_f64.sqrt() / 1000.0);
        assert_relative_eq!(gbh, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_wind_is_finite() {
        let gbh = boundary_layer_conductance(0.1, 0.0);
        assert!(gbh.is_finite() && gbh > 0.0, "gbH = {gbh}");
        assert_eq!(gbh, boundary_layer_conductance(0.1, MIN_WIND_SPEED));
    }

    #[test]
    fn test_conductance_grows_with_wind_and_shrinks_with_size() {
        assert!(boundary_layer_conductance(0.1, 4.0) > boundary_layer_conductance(0.1, 1.0));
        assert!(boundary_layer_conductance(0.2, 1.0) < boundary_layer_conductance(0.1, 1.0));
    }

    #[test]
    fn test_length_units() {
        assert_eq!("mm".parse::<LengthUnit>().unwrap().to_meters(), 1.0e-3);
        assert_eq!("cm".parse::<LengthUnit>().unwrap().to_meters(), 1.0e-2);
        assert_eq!("m".parse::<LengthUnit>().unwrap().to_meters(), 1.0);
        assert!(matches!(
            "inch".parse::<LengthUnit>(),
            Err(ThermalError::UnknownLengthUnit(u)) if u == "inch"
        ));
    }
}
