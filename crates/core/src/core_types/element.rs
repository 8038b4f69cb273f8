//! Canopy elements: leaves, the lumped soil surface and radiative obstructions
//!
//! Each element is a node of the (read-only) plant topology. The variant
//! decides which attributes exist, so a soil element can never be asked for a
//! transpiration flux and a leaf can never be mistaken for the soil.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a node in the plant topology
pub type ElementId = u32;

/// Upper bound for every view-factor weight (two-sided exchange bookkeeping)
pub const MAX_VIEW_FACTOR: f64 = 2.0;

/// Named per-element attributes, used for column access on the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    /// Leaf temperature (°C)
    Tlc,
    /// Soil surface temperature (°C)
    Tsoil,
    /// Incident irradiance (µmol m⁻² s⁻¹)
    Ei,
    /// Sky view-factor weight
    KSky,
    /// Soil view-factor weight
    KSoil,
    /// Neighbouring-foliage view-factor weight
    KLeaves,
    /// Local wind speed (m s⁻¹)
    U,
    /// Transpiration flux (mol m⁻² s⁻¹)
    E,
    /// Boundary-layer conductance to heat (W m⁻² K⁻¹)
    GbH,
    /// Leaf characteristic length, in scene units
    Length,
    /// Pairwise signed view factors to other elements
    VisAVis,
}

impl Attribute {
    /// Attribute name as used by the topology collaborators
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tlc => "Tlc",
            Self::Tsoil => "Tsoil",
            Self::Ei => "Ei",
            Self::KSky => "k_sky",
            Self::KSoil => "k_soil",
            Self::KLeaves => "k_leaves",
            Self::U => "u",
            Self::E => "E",
            Self::GbH => "gbH",
            Self::Length => "Length",
            Self::VisAVis => "vis_a_vis",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sky, soil and foliage weights of the long-wave exchange.
///
/// The three weights sum to ~2 because both leaf faces exchange radiation.
/// Every weight is clamped to `[0, 2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewFactors {
    pub k_sky: f64,
    pub k_soil: f64,
    pub k_leaves: f64,
}

impl ViewFactors {
    /// Build from sky and soil weights, deriving `k_leaves = 2 - k_sky - k_soil`
    pub fn new(k_sky: f64, k_soil: f64) -> Self {
        let k_sky = k_sky.clamp(0.0, MAX_VIEW_FACTOR);
        let k_soil = k_soil.clamp(0.0, MAX_VIEW_FACTOR);
        Self {
            k_sky,
            k_soil,
            k_leaves: (MAX_VIEW_FACTOR - k_sky - k_soil).clamp(0.0, MAX_VIEW_FACTOR),
        }
    }

    /// Build from all three weights as supplied by a radiative-transfer engine
    pub fn with_leaves(k_sky: f64, k_soil: f64, k_leaves: f64) -> Self {
        Self {
            k_sky: k_sky.clamp(0.0, MAX_VIEW_FACTOR),
            k_soil: k_soil.clamp(0.0, MAX_VIEW_FACTOR),
            k_leaves: k_leaves.clamp(0.0, MAX_VIEW_FACTOR),
        }
    }

    pub fn sum(&self) -> f64 {
        self.k_sky + self.k_soil + self.k_leaves
    }
}

/// Values given to leaf attributes that are absent at initialization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafDefaults {
    /// Leaf temperature (°C)
    pub tlc: f64,
    /// Incident irradiance (µmol m⁻² s⁻¹)
    pub ei: f64,
    /// Wind speed (m s⁻¹)
    pub u: f64,
    /// Transpiration (mol m⁻² s⁻¹)
    pub e: f64,
    pub k_soil: f64,
    pub k_sky: f64,
    /// Boundary-layer conductance (W m⁻² K⁻¹)
    pub gbh: f64,
}

impl Default for LeafDefaults {
    fn default() -> Self {
        Self {
            tlc: 20.0,
            ei: 0.0,
            u: 0.0,
            e: 0.0,
            k_soil: 0.5,
            k_sky: 0.5,
            gbh: 1.5,
        }
    }
}

/// Per-leaf state. `None` means "not yet supplied by any collaborator".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeafAttributes {
    pub tlc: Option<f64>,
    pub ei: Option<f64>,
    pub u: Option<f64>,
    pub e: Option<f64>,
    pub k_sky: Option<f64>,
    pub k_soil: Option<f64>,
    pub k_leaves: Option<f64>,
    pub gbh: Option<f64>,
    /// Characteristic length from the geometry, in scene units
    pub length: Option<f64>,
    /// Signed view factors to neighbouring elements (exact long-wave mode)
    pub vis_a_vis: Option<BTreeMap<ElementId, f64>>,
}

impl LeafAttributes {
    /// Fill absent attributes from `defaults`; present values are kept.
    ///
    /// `k_leaves` is derived from the (possibly just defaulted) sky and soil
    /// weights. All three weights end up clamped to `[0, 2]`.
    pub fn initialize(&mut self, defaults: &LeafDefaults) {
        self.tlc.get_or_insert(defaults.tlc);
        self.ei.get_or_insert(defaults.ei);
        self.u.get_or_insert(defaults.u);
        self.e.get_or_insert(defaults.e);
        let k_soil = *self.k_soil.get_or_insert(defaults.k_soil);
        let k_sky = *self.k_sky.get_or_insert(defaults.k_sky);
        let k_leaves = *self.k_leaves.get_or_insert(MAX_VIEW_FACTOR - k_sky - k_soil);
        let clamped = ViewFactors::with_leaves(k_sky, k_soil, k_leaves);
        self.set_view_factors(clamped);
        self.gbh.get_or_insert(defaults.gbh);
    }

    pub fn set_view_factors(&mut self, factors: ViewFactors) {
        self.k_sky = Some(factors.k_sky);
        self.k_soil = Some(factors.k_soil);
        self.k_leaves = Some(factors.k_leaves);
    }

    pub(crate) fn get(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::Tlc => self.tlc,
            Attribute::Ei => self.ei,
            Attribute::KSky => self.k_sky,
            Attribute::KSoil => self.k_soil,
            Attribute::KLeaves => self.k_leaves,
            Attribute::U => self.u,
            Attribute::E => self.e,
            Attribute::GbH => self.gbh,
            Attribute::Length => self.length,
            Attribute::Tsoil | Attribute::VisAVis => None,
        }
    }
}

/// State of the lumped soil surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilAttributes {
    /// Soil surface temperature (°C), `None` before the first soil solve
    pub tsoil: Option<f64>,
    /// Incident irradiance (µmol m⁻² s⁻¹)
    pub ei: Option<f64>,
}

/// Element variant with the attributes relevant to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    Leaf(LeafAttributes),
    Soil(SoilAttributes),
    /// Scene background object: occludes and emits but carries no balance
    Obstruction,
}

/// A node of the canopy graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub label: String,
    pub kind: ElementKind,
}

impl Element {
    pub fn leaf(id: ElementId, label: impl Into<String>, attributes: LeafAttributes) -> Self {
        Self {
            id,
            label: label.into(),
            kind: ElementKind::Leaf(attributes),
        }
    }

    pub fn soil(id: ElementId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            kind: ElementKind::Soil(SoilAttributes::default()),
        }
    }

    pub fn obstruction(id: ElementId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            kind: ElementKind::Obstruction,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ElementKind::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&LeafAttributes> {
        match &self.kind {
            ElementKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafAttributes> {
        match &mut self.kind {
            ElementKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_soil_mut(&mut self) -> Option<&mut SoilAttributes> {
        match &mut self.kind {
            ElementKind::Soil(soil) => Some(soil),
            _ => None,
        }
    }

    /// Scalar attribute lookup by name
    pub fn get(&self, attribute: Attribute) -> Option<f64> {
        match &self.kind {
            ElementKind::Leaf(leaf) => leaf.get(attribute),
            ElementKind::Soil(soil) => match attribute {
                Attribute::Tsoil => soil.tsoil,
                Attribute::Ei => soil.ei,
                _ => None,
            },
            ElementKind::Obstruction => None,
        }
    }

    /// Current surface temperature (°C): `Tlc` for leaves, `Tsoil` for soil
    pub fn temperature(&self) -> Option<f64> {
        match &self.kind {
            ElementKind::Leaf(leaf) => leaf.tlc,
            ElementKind::Soil(soil) => soil.tsoil,
            ElementKind::Obstruction => None,
        }
    }
}

/// Label prefixes used by topology collaborators to tag element kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConvention {
    pub leaf_prefix: String,
    pub soil_prefix: String,
}

impl Default for LabelConvention {
    fn default() -> Self {
        Self {
            leaf_prefix: "L".to_string(),
            soil_prefix: "other".to_string(),
        }
    }
}

impl LabelConvention {
    /// Classify a label once; everything downstream dispatches on the variant
    pub fn classify(&self, id: ElementId, label: &str) -> Element {
        if label.starts_with(&self.leaf_prefix) {
            Element::leaf(id, label, LeafAttributes::default())
        } else if label.starts_with(&self.soil_prefix) {
            Element::soil(id, label)
        } else {
            Element::obstruction(id, label)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_fills_documented_defaults() {
        let mut leaf = LeafAttributes::default();
        leaf.initialize(&LeafDefaults::default());

        assert_eq!(leaf.tlc, Some(20.0));
        assert_eq!(leaf.ei, Some(0.0));
        assert_eq!(leaf.u, Some(0.0));
        assert_eq!(leaf.e, Some(0.0));
        assert_eq!(leaf.k_sky, Some(0.5));
        assert_eq!(leaf.k_soil, Some(0.5));
        assert_eq!(leaf.k_leaves, Some(1.0));
        assert_eq!(leaf.gbh, Some(1.5));
    }

    #[test]
    fn test_initialize_keeps_present_values() {
        let mut leaf = LeafAttributes {
            tlc: Some(31.0),
            k_sky: Some(1.2),
            ..LeafAttributes::default()
        };
        leaf.initialize(&LeafDefaults::default());
        let once = leaf.clone();
        leaf.initialize(&LeafDefaults::default());

        assert_eq!(leaf, once, "initialization must be idempotent");
        assert_eq!(leaf.tlc, Some(31.0));
        assert_eq!(leaf.k_sky, Some(1.2));
        assert!((leaf.k_leaves.unwrap_or_default() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_view_factors_are_clamped() {
        let vf = ViewFactors::new(2.5, -0.3);
        assert_eq!(vf.k_sky, 2.0);
        assert_eq!(vf.k_soil, 0.0);
        assert_eq!(vf.k_leaves, 0.0);

        let vf = ViewFactors::new(0.4, 0.6);
        assert!((vf.sum() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_label_convention() {
        let convention = LabelConvention::default();
        assert!(convention.classify(1, "L12").is_leaf());
        assert!(matches!(
            convention.classify(2, "other").kind,
            ElementKind::Soil(_)
        ));
        assert!(matches!(
            convention.classify(3, "in3").kind,
            ElementKind::Obstruction
        ));
    }

    #[test]
    fn test_attribute_lookup_respects_variant() {
        let soil = Element::soil(7, "other");
        assert_eq!(soil.get(Attribute::E), None);
        let mut leaf = Element::leaf(1, "L1", LeafAttributes::default());
        if let Some(attrs) = leaf.as_leaf_mut() {
            attrs.e = Some(0.002);
        }
        assert_eq!(leaf.get(Attribute::E), Some(0.002));
        assert_eq!(Attribute::KLeaves.to_string(), "k_leaves");
    }
}
