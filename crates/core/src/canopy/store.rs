//! The element store: single owner of all per-element canopy state
//!
//! Elements are keyed by id in a `BTreeMap`, so every iteration (leaf sweeps,
//! column access, leaf-temperature means) runs in ascending id order and
//! floating-point reductions are reproducible run to run.

use crate::core_types::element::{
    Attribute, Element, ElementId, ElementKind, LabelConvention, LeafAttributes, LeafDefaults,
    ViewFactors,
};
use crate::core_types::units::Celsius;
use crate::error::{Result, ThermalError};
use crate::physics::boundary_layer::{boundary_layer_conductance, LengthUnit};
use crate::physics::irradiance::IrradianceUnit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Mapping from element id to element state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementStore {
    elements: BTreeMap<ElementId, Element>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(id, label)` pairs of the plant topology
    pub fn from_labels<'a>(
        labels: impl IntoIterator<Item = (ElementId, &'a str)>,
        convention: &LabelConvention,
    ) -> Self {
        labels
            .into_iter()
            .map(|(id, label)| convention.classify(id, label))
            .collect()
    }

    /// Insert an element, replacing any element with the same id
    pub fn insert(&mut self, element: Element) -> Option<Element> {
        self.elements.insert(element.id, element)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Leaf attributes of `id`
    ///
    /// # Errors
    /// `UnknownElement` if `id` is absent or is not a leaf.
    pub fn leaf(&self, id: ElementId) -> Result<&LeafAttributes> {
        self.elements
            .get(&id)
            .and_then(Element::as_leaf)
            .ok_or(ThermalError::UnknownElement(id))
    }

    /// # Errors
    /// `UnknownElement` if `id` is absent or is not a leaf.
    pub fn leaf_mut(&mut self, id: ElementId) -> Result<&mut LeafAttributes> {
        self.elements
            .get_mut(&id)
            .and_then(Element::as_leaf_mut)
            .ok_or(ThermalError::UnknownElement(id))
    }

    /// Ids of all leaves, ascending
    pub fn leaf_ids(&self) -> Vec<ElementId> {
        self.elements
            .values()
            .filter(|element| element.is_leaf())
            .map(|element| element.id)
            .collect()
    }

    /// Id of the (first) soil element
    pub fn soil_id(&self) -> Option<ElementId> {
        self.elements
            .values()
            .find(|element| matches!(element.kind, ElementKind::Soil(_)))
            .map(|element| element.id)
    }

    /// Column access: every element carrying `attribute`, by id
    pub fn column(&self, attribute: Attribute) -> BTreeMap<ElementId, f64> {
        self.elements
            .values()
            .filter_map(|element| element.get(attribute).map(|value| (element.id, value)))
            .collect()
    }

    /// Fill absent leaf attributes with `defaults`. Idempotent.
    pub fn initialize(&mut self, defaults: &LeafDefaults) {
        for leaf in self.elements.values_mut().filter_map(Element::as_leaf_mut) {
            leaf.initialize(defaults);
        }
    }

    /// Store view factors delivered by the radiative-transfer collaborator
    ///
    /// # Errors
    /// `UnknownElement` if `id` is not a leaf.
    pub fn set_view_factors(&mut self, id: ElementId, factors: ViewFactors) -> Result<()> {
        self.leaf_mut(id)?.set_view_factors(factors);
        Ok(())
    }

    /// Incident irradiance (µmol m⁻² s⁻¹) on a leaf or the soil
    ///
    /// # Errors
    /// `UnknownElement` for an absent id, `MissingAttribute` for an obstruction.
    pub fn set_irradiance(&mut self, id: ElementId, ei: f64) -> Result<()> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(ThermalError::UnknownElement(id))?;
        match &mut element.kind {
            ElementKind::Leaf(leaf) => leaf.ei = Some(ei),
            ElementKind::Soil(soil) => soil.ei = Some(ei),
            ElementKind::Obstruction => {
                return Err(ThermalError::MissingAttribute {
                    element: id,
                    attribute: Attribute::Ei,
                })
            }
        }
        Ok(())
    }

    /// Incident irradiance in one of the radiative-transfer conventions
    /// (`Rg_Watt/m2`, `RgPAR_Watt/m2`, `PPFD_umol/m2/s`), stored as PPFD.
    ///
    /// # Errors
    /// `UnknownIrradianceUnit` for any other convention, then as
    /// [`Self::set_irradiance`].
    pub fn set_irradiance_in(&mut self, id: ElementId, value: f64, unit: &str) -> Result<()> {
        let unit: IrradianceUnit = unit.parse()?;
        self.set_irradiance(id, unit.to_ppfd(value))
    }

    /// Recompute `gbH` for every leaf that carries a `Length`.
    ///
    /// Leaves without a length keep their current conductance. Returns the
    /// number of leaves updated.
    pub fn assign_boundary_layer_conductance(&mut self, unit: LengthUnit) -> usize {
        let to_meters = unit.to_meters();
        let mut updated = 0;
        for element in self.elements.values_mut() {
            let id = element.id;
            let Some(leaf) = element.as_leaf_mut() else {
                continue;
            };
            match leaf.length {
                Some(length) => {
                    let u = leaf.u.unwrap_or_default();
                    leaf.gbh = Some(boundary_layer_conductance(length * to_meters, u));
                    updated += 1;
                }
                None => debug!(element = id, "leaf has no Length, keeping gbH"),
            }
        }
        updated
    }

    /// Arithmetic mean of the current leaf temperatures (°C)
    pub fn mean_leaf_temperature(&self) -> Option<f64> {
        let temps = self.column(Attribute::Tlc);
        if temps.is_empty() {
            None
        } else {
            Some(temps.values().sum::<f64>() / temps.len() as f64)
        }
    }

    /// Overwrite leaf temperatures (°C) in place
    ///
    /// # Errors
    /// `UnknownElement` at the first id that is not a leaf; earlier writes stay.
    pub fn write_leaf_temperatures(
        &mut self,
        temperatures: impl IntoIterator<Item = (ElementId, f64)>,
    ) -> Result<()> {
        for (id, t) in temperatures {
            self.leaf_mut(id)?.tlc = Some(t);
        }
        Ok(())
    }

    /// Overwrite the soil temperature, if the canopy has a soil element
    pub fn write_soil_temperature(&mut self, t_soil: Celsius) -> bool {
        let soil = self
            .elements
            .values_mut()
            .find_map(Element::as_soil_mut);
        match soil {
            Some(soil) => {
                soil.tsoil = Some(t_soil.value());
                true
            }
            None => false,
        }
    }
}

impl FromIterator<Element> for ElementStore {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().map(|element| (element.id, element)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_canopy() -> ElementStore {
        ElementStore::from_labels(
            [(1, "L1"), (2, "L2"), (3, "in3"), (4, "other"), (5, "L5")],
            &LabelConvention::default(),
        )
    }

    #[test]
    fn test_leaf_ids_and_soil() {
        let store = small_canopy();
        assert_eq!(store.len(), 5);
        assert_eq!(store.leaf_ids(), vec![1, 2, 5]);
        assert_eq!(store.soil_id(), Some(4));
    }

    #[test]
    fn test_initialize_is_idempotent_and_keeps_values() {
        let mut store = small_canopy();
        store.leaf_mut(2).unwrap().tlc = Some(27.5);
        store.initialize(&LeafDefaults::default());
        let once = store.clone();
        store.initialize(&LeafDefaults::default());

        assert_eq!(store, once);
        let tlc = store.column(Attribute::Tlc);
        assert_eq!(tlc.len(), 3);
        assert_eq!(tlc[&1], 20.0);
        assert_eq!(tlc[&2], 27.5);
        let gbh: Vec<f64> = store.column(Attribute::GbH).into_values().collect();
        assert_eq!(gbh, vec![1.5; 3]);
    }

    #[test]
    fn test_boundary_layer_assignment_skips_leaves_without_length() {
        let mut store = small_canopy();
        store.initialize(&LeafDefaults::default());
        {
            let leaf = store.leaf_mut(1).unwrap();
            leaf.length = Some(10.0);
            leaf.u = Some(1.0);
        }
        let updated = store.assign_boundary_layer_conductance(LengthUnit::Centimeters);

        assert_eq!(updated, 1);
        let gbh = store.column(Attribute::GbH);
        assert!((gbh[&1] - boundary_layer_conductance(0.1, 1.0)).abs() < 1e-12);
        assert_eq!(gbh[&2], 1.5);
    }

    #[test]
    fn test_non_leaf_access_is_rejected() {
        let mut store = small_canopy();
        assert_eq!(store.leaf(4).unwrap_err(), ThermalError::UnknownElement(4));
        assert!(store.set_view_factors(3, ViewFactors::new(1.0, 0.5)).is_err());
        assert!(store.set_irradiance(3, 100.0).is_err());
        assert!(store.set_irradiance(4, 100.0).is_ok());
        assert_eq!(store.column(Attribute::Ei).get(&4), Some(&100.0));
    }

    #[test]
    fn test_irradiance_conventions_are_stored_as_ppfd() {
        let mut store = small_canopy();
        store.set_irradiance_in(1, 1000.0, "Rg_Watt/m2").unwrap();
        store.set_irradiance_in(2, 100.0, "RgPAR_Watt/m2").unwrap();
        store.set_irradiance_in(4, 1500.0, "PPFD_umol/m2/s").unwrap();

        let ei = store.column(Attribute::Ei);
        assert!((ei[&1] - 2208.0).abs() < 1e-9);
        assert!((ei[&2] - 460.0).abs() < 1e-9);
        assert_eq!(ei[&4], 1500.0);
    }

    #[test]
    fn test_unknown_irradiance_convention_leaves_store_untouched() {
        let mut store = small_canopy();
        let err = store.set_irradiance_in(1, 500.0, "W/m2").unwrap_err();
        assert_eq!(err, ThermalError::UnknownIrradianceUnit("W/m2".to_string()));
        assert!(store.column(Attribute::Ei).is_empty());
    }

    #[test]
    fn test_mean_and_write_back() {
        let mut store = small_canopy();
        assert_eq!(store.mean_leaf_temperature(), None);
        store.initialize(&LeafDefaults::default());
        store
            .write_leaf_temperatures([(1, 10.0), (2, 20.0), (5, 30.0)])
            .unwrap();
        assert_eq!(store.mean_leaf_temperature(), Some(20.0));
        assert!(store.write_soil_temperature(Celsius::new(33.0)));
        assert_eq!(store.column(Attribute::Tsoil)[&4], 33.0);
    }
}
