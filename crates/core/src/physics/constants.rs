//! Spectrometric and energy-balance constants shared by leaf and soil equations

/// Stefan-Boltzmann constant (W m⁻² K⁻⁴)
pub const STEFAN_BOLTZMANN: f64 = 5.670373e-8;

/// Leaf absorptance to global radiation (dimensionless)
pub const A_GLOB: f64 = 0.6;

/// Leaf emissivity (dimensionless)
pub const E_LEAF: f64 = 0.96;

/// Sky emissivity (dimensionless)
pub const E_SKY: f64 = 1.0;

/// Soil emissivity (dimensionless)
pub const E_SOIL: f64 = 0.95;

/// Latent heat of vaporization (J mol⁻¹)
pub const LAMBDA: f64 = 44.0e3;

/// Isobaric molar heat capacity of air (J mol⁻¹ K⁻¹)
pub const CP_AIR: f64 = 29.07;

/// Bare-soil shortwave albedo
pub const SOIL_ALBEDO: f64 = 0.25;

/// Soil surface conductance to water vapour (mol m⁻² s⁻¹), Bailey (2016)
pub const SOIL_G_M: f64 = 0.06;

/// Soil surface conductance to heat (mol m⁻² s⁻¹), Bailey (2016)
pub const SOIL_G_H: f64 = 0.5;

/// Thermal conductivity of air (W m⁻¹ K⁻¹), Nobel (2009)
pub const AIR_THERMAL_CONDUCTIVITY: f64 = 0.026;

/// Fraction of global radiation in the PAR band
pub const PAR_FRACTION: f64 = 0.48;

/// Photon-to-energy ratio of PAR (µmol J⁻¹)
pub const PAR_PHOTON_RATIO: f64 = 4.6;
