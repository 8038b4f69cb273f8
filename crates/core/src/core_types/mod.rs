//! Core types: canopy elements, meteorological forcing and physical units

pub mod element;
pub mod meteo;
pub mod units;

pub use element::{
    Attribute, Element, ElementId, ElementKind, LabelConvention, LeafAttributes, LeafDefaults,
    SoilAttributes, ViewFactors,
};
pub use meteo::{MeteoForcing, MeteoRecord};
pub use units::*;
