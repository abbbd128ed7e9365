//! Frozen variation set.

use std::collections::HashMap;

use cutflow_core::{SelectionObject, Variation};

/// Immutable set of variations known to a job.
///
/// Produced by [`crate::VariationBroadcaster::fix`] and shared by reference
/// counting with every consumer.
#[derive(Debug, Clone)]
pub struct VariationCatalog {
    nominal: Variation,
    all: Vec<Variation>,
    all_kinematic: Vec<Variation>,
    kinematic: HashMap<SelectionObject, Vec<Variation>>,
    weight: HashMap<SelectionObject, Vec<Variation>>,
    disabled: Vec<SelectionObject>,
}

impl VariationCatalog {
    pub(crate) fn new(
        all: Vec<Variation>,
        all_kinematic: Vec<Variation>,
        kinematic: HashMap<SelectionObject, Vec<Variation>>,
        weight: HashMap<SelectionObject, Vec<Variation>>,
        disabled: Vec<SelectionObject>,
    ) -> Self {
        Self {
            nominal: Variation::nominal(),
            all,
            all_kinematic,
            kinematic,
            weight,
            disabled,
        }
    }

    pub fn nominal(&self) -> &Variation {
        &self.nominal
    }

    /// Every variation ever inserted, kinematic or weight.
    pub fn all(&self) -> &[Variation] {
        &self.all
    }

    /// Union of the per-object kinematic lists: nominal first, then
    /// variations affecting only the missing transverse energy, then by name.
    pub fn all_kinematic(&self) -> &[Variation] {
        &self.all_kinematic
    }

    /// Kinematic variations of `object`, nominal last.
    pub fn kinematic(&self, object: SelectionObject) -> &[Variation] {
        self.kinematic.get(&object).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Weight variations of `object`, nominal last.
    pub fn weight(&self, object: SelectionObject) -> &[Variation] {
        self.weight.get(&object).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_weights(&self) -> impl Iterator<Item = &Variation> {
        self.all
            .iter()
            .filter(|v| self.weight.values().any(|list| list.contains(*v)))
    }

    pub fn contains(&self, variation: &Variation) -> bool {
        self.all.contains(variation)
    }

    pub fn is_kinematic(&self, variation: &Variation) -> bool {
        self.all_kinematic.contains(variation)
    }

    /// True for a non-nominal variation listed for missing transverse energy.
    pub fn affects_only_met(&self, variation: &Variation) -> bool {
        !variation.is_nominal() && self.kinematic(SelectionObject::MissingEt).contains(variation)
    }

    /// Whether variations of `object` are evaluated in this job.
    pub fn processes(&self, object: SelectionObject) -> bool {
        !self.disabled.contains(&object)
    }
}
