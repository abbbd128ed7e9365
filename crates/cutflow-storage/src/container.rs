//! Per-variation element collections.

use std::sync::Arc;

use cutflow_core::{
    Collection, CutflowError, ObjectMatcher, Result, Value, ValueKind, Variation,
};
use tracing::debug;

use crate::cache::VariantCache;
use crate::group::VariationGroup;
use crate::sharing::{self, OutputUnit};
use crate::variable::VariableOptions;

/// One per-element attribute written for a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub kind: ValueKind,
    pub save_variations: bool,
}

/// A named collection stored once per variation.
///
/// Branches describe which element fields are written out. They can only be
/// added before the first fill.
#[derive(Debug, Clone)]
pub struct ContainerStore {
    name: String,
    options: VariableOptions,
    common: bool,
    group: Option<String>,
    branches: Vec<Branch>,
    broadcast: Vec<String>,
    collections: VariantCache<Collection>,
}

impl ContainerStore {
    pub(crate) fn new(name: &str, options: VariableOptions, common: bool) -> Self {
        Self {
            name: name.to_string(),
            options,
            common,
            group: None,
            branches: Vec::new(),
            broadcast: Vec::new(),
            collections: VariantCache::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> VariableOptions {
        self.options
    }

    pub fn is_common(&self) -> bool {
        self.common
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub(crate) fn set_group(&mut self, group: &str) -> Result<()> {
        if let Some(existing) = &self.group {
            return Err(CutflowError::Config(format!(
                "container '{}' already belongs to group '{}'",
                self.name, existing
            )));
        }
        self.group = Some(group.to_string());
        Ok(())
    }

    pub(crate) fn add_branch(&mut self, name: &str, kind: ValueKind, save_variations: bool) -> Result<()> {
        if !self.collections.is_empty() {
            return Err(CutflowError::Locked {
                name: format!("{}.{}", self.name, name),
            });
        }
        if self.branches.iter().any(|b| b.name == name) {
            return Err(CutflowError::DuplicateName {
                kind: "branch",
                name: name.to_string(),
                scope: self.name.clone(),
            });
        }
        self.branches.push(Branch {
            name: name.to_string(),
            kind,
            save_variations,
        });
        Ok(())
    }

    pub(crate) fn broadcast_to_all_outputs(&mut self, branch: &str) {
        if !self.broadcast.iter().any(|b| b == branch) {
            self.broadcast.push(branch.to_string());
        }
    }

    pub fn is_broadcast(&self, branch: &str) -> bool {
        self.broadcast.iter().any(|b| b == branch)
    }

    fn storage_variation(&self, variation: &Variation) -> Variation {
        if self.common {
            Variation::nominal()
        } else {
            variation.clone()
        }
    }

    /// Stores `collection` for `variation`.
    ///
    /// For a grouped container filled under a variation that does not affect
    /// the group, the nominal collection of the same event must already be
    /// stored and must hold the same objects in the same order.
    pub(crate) fn fill(
        &mut self,
        variation: &Variation,
        collection: Collection,
        generation: u64,
        group: Option<&VariationGroup>,
        matcher: &dyn ObjectMatcher,
    ) -> Result<()> {
        let target = self.storage_variation(variation);
        if let Some(group) = group {
            if !target.is_nominal() && !group.is_affected_by(&target) {
                self.check_against_nominal(&target, &collection, generation, group, matcher)?;
            }
        }
        self.collections.set(&target, collection, generation);
        Ok(())
    }

    fn check_against_nominal(
        &self,
        variation: &Variation,
        collection: &Collection,
        generation: u64,
        group: &VariationGroup,
        matcher: &dyn ObjectMatcher,
    ) -> Result<()> {
        let Some(nominal) = self.collections.get(&Variation::nominal(), generation) else {
            return Err(CutflowError::Consistency(format!(
                "nominal '{}' of group '{}' was not filled before variation '{}'",
                self.name,
                group.name(),
                variation
            )));
        };
        if Arc::ptr_eq(nominal, collection) {
            return Ok(());
        }
        if nominal.len() != collection.len() {
            return Err(CutflowError::Consistency(format!(
                "'{}' has {} elements under '{}' but {} in nominal",
                self.name,
                collection.len(),
                variation,
                nominal.len()
            )));
        }
        for (index, (expected, found)) in nominal.iter().zip(collection.iter()).enumerate() {
            if !matcher.same_object(expected, found, true) {
                return Err(CutflowError::Consistency(format!(
                    "element {} of '{}' under '{}' differs from nominal",
                    index, self.name, variation
                )));
            }
        }
        debug!(container = %self.name, variation = %variation, "shared with nominal");
        Ok(())
    }

    pub(crate) fn collection(&self, variation: &Variation, generation: u64) -> Result<&Collection> {
        self.collections
            .get(&self.storage_variation(variation), generation)
            .ok_or_else(|| CutflowError::Unset {
                name: self.name.clone(),
                variation: variation.to_string(),
            })
    }

    /// Reads `field` of element `index`. `Ok(None)` when the index is out
    /// of range or the element has no such field.
    pub(crate) fn element_field(
        &self,
        variation: &Variation,
        generation: u64,
        index: usize,
        field: &str,
    ) -> Result<Option<Value>> {
        let collection = self.collection(variation, generation)?;
        Ok(collection.get(index).and_then(|element| element.field(field)))
    }

    /// Branches written to `unit`.
    pub fn branches_for(
        &self,
        group: Option<&VariationGroup>,
        unit: &OutputUnit,
    ) -> Vec<&Branch> {
        self.branches
            .iter()
            .filter(|branch| {
                self.options.save_tree
                    && sharing::writes_to(
                        group,
                        self.is_broadcast(&branch.name),
                        branch.save_variations && self.options.save_variations,
                        unit,
                    )
            })
            .collect()
    }
}
