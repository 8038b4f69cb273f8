//! Errors raised by the canopy thermal core
//!
//! Outer non-convergence of the fixed-point iteration is deliberately absent:
//! it is reported through [`crate::solver::ConvergenceStatus`] instead.

use crate::core_types::element::{Attribute, ElementId};

/// Errors that can occur while preparing or solving a canopy energy balance
#[derive(Debug, Clone, PartialEq)]
pub enum ThermalError {
    /// Leaf length unit other than `mm`, `cm` or `m`
    UnknownLengthUnit(String),
    /// Irradiance convention other than `Rg_Watt/m2`, `RgPAR_Watt/m2`, `PPFD_umol/m2/s`
    UnknownIrradianceUnit(String),
    /// Required meteorological column absent from the forcing record
    MissingMeteoField(&'static str),
    /// Meteorological value outside its physical domain
    InvalidMeteoValue { field: &'static str, value: f64 },
    /// Hour of day outside 0..=23
    InvalidHour(u8),
    /// No element with this id in the store
    UnknownElement(ElementId),
    /// The store holds no soil element but a soil solve was requested
    NoSoilElement,
    /// An attribute needed by the solve was never supplied
    MissingAttribute {
        element: ElementId,
        attribute: Attribute,
    },
    /// The scalar root finder could not drive this element's residual to tolerance
    RootFindingFailed {
        element: ElementId,
        residual: f64,
        evaluations: usize,
    },
    /// Newton iteration of the simultaneous mode did not reach tolerance
    SystemSolveFailed {
        iterations: usize,
        residual_norm: f64,
    },
    /// Jacobian of the simultaneous system could not be factorized
    SingularJacobian { iteration: usize },
}

impl std::fmt::Display for ThermalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThermalError::UnknownLengthUnit(unit) => {
                write!(f, "Unknown length unit '{unit}' (expected mm, cm or m)")
            }
            ThermalError::UnknownIrradianceUnit(unit) => write!(
                f,
                "Unknown irradiance unit '{unit}' (expected Rg_Watt/m2, RgPAR_Watt/m2 or PPFD_umol/m2/s)"
            ),
            ThermalError::MissingMeteoField(field) => {
                write!(f, "Missing meteorological field: {field}")
            }
            ThermalError::InvalidMeteoValue { field, value } => {
                write!(f, "Invalid meteorological value for {field}: {value}")
            }
            ThermalError::InvalidHour(hour) => write!(f, "Hour of day out of range: {hour}"),
            ThermalError::UnknownElement(id) => write!(f, "Unknown element id {id}"),
            ThermalError::NoSoilElement => write!(f, "Canopy has no soil element"),
            ThermalError::MissingAttribute { element, attribute } => {
                write!(f, "Element {element} has no '{attribute}' attribute")
            }
            ThermalError::RootFindingFailed {
                element,
                residual,
                evaluations,
            } => write!(
                f,
                "Energy balance of element {element} did not converge after {evaluations} evaluations (residual {residual:.3e} W/m²)"
            ),
            ThermalError::SystemSolveFailed {
                iterations,
                residual_norm,
            } => write!(
                f,
                "Simultaneous leaf system did not converge after {iterations} Newton iterations (residual norm {residual_norm:.3e} W/m²)"
            ),
            ThermalError::SingularJacobian { iteration } => {
                write!(f, "Singular Jacobian at Newton iteration {iteration}")
            }
        }
    }
}

impl std::error::Error for ThermalError {}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ThermalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_failure_names_element() {
        let err = ThermalError::RootFindingFailed {
            element: 42,
            residual: 3.5,
            evaluations: 200,
        };
        let msg = err.to_string();
        assert!(msg.contains("element 42"), "{msg}");
        assert!(msg.contains("200 evaluations"), "{msg}");
    }

    #[test]
    fn test_missing_attribute_message() {
        let err = ThermalError::MissingAttribute {
            element: 3,
            attribute: Attribute::VisAVis,
        };
        assert_eq!(err.to_string(), "Element 3 has no 'vis_a_vis' attribute");
    }
}
