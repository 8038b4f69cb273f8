//! Vapour pressure helpers (Tetens form, kPa)

/// Saturated vapour pressure (kPa) at `temp_c` (°C)
#[inline]
pub fn saturated_vapor_pressure(temp_c: f64) -> f64 {
    0.611 * (17.27 * temp_c / (237.3 + temp_c)).exp()
}

/// Vapour-pressure deficit (kPa) between an evaporating surface and the air
///
/// # Arguments
/// * `t_air` - Air temperature (°C)
/// * `t_surface` - Surface temperature (°C)
/// * `rh` - Air relative humidity (%)
#[inline]
pub fn vapor_pressure_deficit(t_air: f64, t_surface: f64, rh: f64) -> f64 {
    saturated_vapor_pressure(t_surface) - saturated_vapor_pressure(t_air) * rh / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_saturation_at_known_points() {
        assert_abs_diff_eq!(saturated_vapor_pressure(0.0), 0.611, epsilon = 1e-12);
        assert_abs_diff_eq!(saturated_vapor_pressure(25.0), 3.168, epsilon = 2e-3);
    }

    #[test]
    fn test_deficit_vanishes_in_saturated_isothermal_air() {
        assert_abs_diff_eq!(vapor_pressure_deficit(20.0, 20.0, 100.0), 0.0, epsilon = 1e-12);
        let warm = vapor_pressure_deficit(20.0, 25.0, 50.0);
        assert!(warm > vapor_pressure_deficit(20.0, 20.0, 50.0));
    }
}
