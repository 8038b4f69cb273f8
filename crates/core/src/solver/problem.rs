//! Per-leaf inputs gathered from the element store once per solve

use super::config::LongwaveModel;
use crate::canopy::ElementStore;
use crate::core_types::element::{Attribute, ElementId, ElementKind, LeafAttributes};
use crate::error::{Result, ThermalError};
use crate::physics::leaf_energy::{
    lumped_foliage_irradiance, pairwise_foliage_irradiance, Ambient, LeafEnergyBalance,
};
use rustc_hash::FxHashMap;

/// Where a neighbour's temperature comes from during a solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Neighbour {
    /// Another leaf, by position in the leaf vector
    Leaf(usize),
    /// Soil or obstruction, held at a fixed temperature (K)
    Fixed(f64),
}

/// Foliage long-wave coupling of one leaf
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Coupling {
    Lumped { k_leaves: f64 },
    Pairwise(Vec<(Neighbour, f64)>),
}

/// Fixed inputs of one leaf for the duration of a solve
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LeafProblem {
    pub id: ElementId,
    pub index: usize,
    pub ei: f64,
    pub k_sky: f64,
    pub k_soil: f64,
    pub gbh: f64,
    pub e: f64,
    pub coupling: Coupling,
}

fn required(leaf: &LeafAttributes, id: ElementId, attribute: Attribute) -> Result<f64> {
    leaf.get(attribute).ok_or(ThermalError::MissingAttribute {
        element: id,
        attribute,
    })
}

impl LeafProblem {
    /// Energy balance of this leaf against a frozen temperature snapshot (K)
    pub fn balance(&self, snapshot: &[f64], ambient: Ambient) -> LeafEnergyBalance {
        let foliage_irradiance = match &self.coupling {
            Coupling::Lumped { k_leaves } => {
                lumped_foliage_irradiance(*k_leaves, snapshot[self.index])
            }
            Coupling::Pairwise(neighbours) => pairwise_foliage_irradiance(
                neighbours
                    .iter()
                    .map(|(neighbour, view_factor)| {
                        (*view_factor, neighbour.temperature(snapshot))
                    }),
            ),
        };
        LeafEnergyBalance {
            ei: self.ei,
            k_sky: self.k_sky,
            k_soil: self.k_soil,
            gbh: self.gbh,
            e: self.e,
            foliage_irradiance,
            ambient,
        }
    }
}

impl Neighbour {
    #[inline]
    pub fn temperature(self, snapshot: &[f64]) -> f64 {
        match self {
            Neighbour::Leaf(index) => snapshot[index],
            Neighbour::Fixed(t) => t,
        }
    }
}

/// Gather the leaf problems of `ids`, in order
pub(crate) fn prepare_leaves(
    store: &ElementStore,
    ids: &[ElementId],
    ambient: Ambient,
    longwave: LongwaveModel,
) -> Result<Vec<LeafProblem>> {
    let index_of: FxHashMap<ElementId, usize> =
        ids.iter().enumerate().map(|(index, id)| (*id, index)).collect();

    ids.iter()
        .enumerate()
        .map(|(index, &id)| -> Result<LeafProblem> {
            let leaf = store.leaf(id)?;
            let coupling = match longwave {
                LongwaveModel::Lumped => Coupling::Lumped {
                    k_leaves: required(leaf, id, Attribute::KLeaves)?,
                },
                LongwaveModel::Pairwise => {
                    let vis_a_vis = leaf.vis_a_vis.as_ref().ok_or(ThermalError::MissingAttribute {
                        element: id,
                        attribute: Attribute::VisAVis,
                    })?;
                    let neighbours = vis_a_vis
                        .iter()
                        .map(|(&other, &view_factor)| {
                            resolve_neighbour(store, &index_of, ambient, other)
                                .map(|neighbour| (neighbour, view_factor))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Coupling::Pairwise(neighbours)
                }
            };
            Ok(LeafProblem {
                id,
                index,
                ei: required(leaf, id, Attribute::Ei)?,
                k_sky: required(leaf, id, Attribute::KSky)?,
                k_soil: required(leaf, id, Attribute::KSoil)?,
                gbh: required(leaf, id, Attribute::GbH)?,
                e: required(leaf, id, Attribute::E)?,
                coupling,
            })
        })
        .collect()
}

fn resolve_neighbour(
    store: &ElementStore,
    index_of: &FxHashMap<ElementId, usize>,
    ambient: Ambient,
    other: ElementId,
) -> Result<Neighbour> {
    if let Some(&index) = index_of.get(&other) {
        return Ok(Neighbour::Leaf(index));
    }
    let element = store.get(other).ok_or(ThermalError::UnknownElement(other))?;
    Ok(match element.kind {
        ElementKind::Soil(_) => Neighbour::Fixed(*ambient.t_soil),
        ElementKind::Obstruction | ElementKind::Leaf(_) => Neighbour::Fixed(*ambient.t_air),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::element::{LabelConvention, LeafDefaults};
    use crate::core_types::units::Celsius;
    use std::collections::BTreeMap;

    fn ambient() -> Ambient {
        Ambient::new(Celsius::new(25.0), Celsius::new(10.0), Celsius::new(30.0))
    }

    fn store() -> ElementStore {
        let mut store = ElementStore::from_labels(
            [(1, "L1"), (2, "L2"), (3, "other"), (4, "in4")],
            &LabelConvention::default(),
        );
        store.initialize(&LeafDefaults::default());
        store
    }

    #[test]
    fn test_lumped_preparation() {
        let store = store();
        let problems = prepare_leaves(&store, &[1, 2], ambient(), LongwaveModel::Lumped).unwrap();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[1].id, 2);
        assert_eq!(problems[1].index, 1);
        assert_eq!(problems[0].coupling, Coupling::Lumped { k_leaves: 1.0 });
    }

    #[test]
    fn test_pairwise_requires_vis_a_vis() {
        let store = store();
        let err = prepare_leaves(&store, &[1, 2], ambient(), LongwaveModel::Pairwise).unwrap_err();
        assert_eq!(
            err,
            ThermalError::MissingAttribute {
                element: 1,
                attribute: Attribute::VisAVis
            }
        );
    }

    #[test]
    fn test_pairwise_neighbours_resolve_by_kind() {
        let mut store = store();
        for id in [1, 2] {
            store.leaf_mut(id).unwrap().vis_a_vis =
                Some(BTreeMap::from([(1, -0.1), (2, -0.2), (3, -0.3), (4, -0.4)]));
        }
        let amb = ambient();
        let problems = prepare_leaves(&store, &[1, 2], amb, LongwaveModel::Pairwise).unwrap();
        let Coupling::Pairwise(neighbours) = &problems[0].coupling else {
            panic!("expected pairwise coupling");
        };
        assert_eq!(
            neighbours,
            &vec![
                (Neighbour::Leaf(0), -0.1),
                (Neighbour::Leaf(1), -0.2),
                (Neighbour::Fixed(*amb.t_soil), -0.3),
                (Neighbour::Fixed(*amb.t_air), -0.4),
            ]
        );
    }

    #[test]
    fn test_unknown_neighbour_is_rejected() {
        let mut store = store();
        store.leaf_mut(1).unwrap().vis_a_vis = Some(BTreeMap::from([(99, -0.5)]));
        store.leaf_mut(2).unwrap().vis_a_vis = Some(BTreeMap::new());
        let err = prepare_leaves(&store, &[1, 2], ambient(), LongwaveModel::Pairwise).unwrap_err();
        assert_eq!(err, ThermalError::UnknownElement(99));
    }
}
