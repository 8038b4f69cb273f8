//! Effective sky temperature for long-wave exchange
//!
//! Used when the forcing does not carry a measured `T_sky_eff`. Clear-sky
//! emissivity correlates with humidity; the sky is then treated as a grey body
//! at air temperature:
//!
//! ```text
//! ε_sky = clamp(0.65 + 0.002 · hs, 0.6, 0.98)
//! T_sky = T_air · ε_sky^(1/4)
//! ```

use crate::core_types::units::{Celsius, Percent};

/// Clear-sky emissivity from relative humidity (%)
#[inline]
pub fn clear_sky_emissivity(hs: Percent) -> f64 {
    (0.65 + 0.002 * *hs).clamp(0.6, 0.98)
}

/// Effective radiative temperature of a clear sky
pub fn effective_sky_temperature(t_air: Celsius, hs: Percent) -> Celsius {
    let t_sky_k = *t_air.to_kelvin() * clear_sky_emissivity(hs).powf(0.25);
    Celsius::new(t_sky_k - Celsius::KELVIN_OFFSET)
}
