//! Named, typed per-event value cells.

use cutflow_core::{CutflowError, Result, Value, ValueKind, Variation};
use tracing::trace;

use crate::cache::VariantCache;

/// Output options of a variable or container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableOptions {
    /// Written to the per-variation output trees.
    pub save_tree: bool,
    /// Written to the summary histograms.
    pub save_histos: bool,
    /// Holds a distinct value per variation. When false only nominal
    /// writes are kept and every variation reads the nominal value.
    pub save_variations: bool,
}

impl Default for VariableOptions {
    fn default() -> Self {
        Self {
            save_tree: true,
            save_histos: false,
            save_variations: true,
        }
    }
}

impl VariableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kept in memory for cuts only.
    pub fn transient() -> Self {
        Self {
            save_tree: false,
            save_histos: false,
            save_variations: true,
        }
    }

    pub fn with_histos(mut self) -> Self {
        self.save_histos = true;
        self
    }

    pub fn nominal_only(mut self) -> Self {
        self.save_variations = false;
        self
    }
}

/// A named, typed value slot with one cached value per variation.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    kind: ValueKind,
    options: VariableOptions,
    common: bool,
    group: Option<String>,
    broadcast: bool,
    values: VariantCache<Value>,
}

impl Variable {
    pub(crate) fn new(name: &str, kind: ValueKind, options: VariableOptions, common: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            options,
            common,
            group: None,
            broadcast: false,
            values: VariantCache::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn options(&self) -> VariableOptions {
        self.options
    }

    /// Lives in the shared scope and holds a single value for all variations.
    pub fn is_common(&self) -> bool {
        self.common
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Written to every output unit regardless of its group.
    pub fn is_broadcast(&self) -> bool {
        self.broadcast
    }

    pub(crate) fn set_group(&mut self, group: &str) -> Result<()> {
        if let Some(existing) = &self.group {
            return Err(CutflowError::Config(format!(
                "variable '{}' already belongs to group '{}'",
                self.name, existing
            )));
        }
        self.group = Some(group.to_string());
        Ok(())
    }

    pub(crate) fn set_broadcast(&mut self) {
        self.broadcast = true;
    }

    fn storage_variation(&self, variation: &Variation) -> Variation {
        if self.common || !self.options.save_variations {
            Variation::nominal()
        } else {
            variation.clone()
        }
    }

    pub(crate) fn write(&mut self, variation: &Variation, value: Value, generation: u64) -> Result<()> {
        value.ensure_kind(&self.name, self.kind)?;
        if !self.common && !self.options.save_variations && !variation.is_nominal() {
            trace!(variable = %self.name, variation = %variation, "nominal-only write skipped");
            return Ok(());
        }
        let target = self.storage_variation(variation);
        self.values.set(&target, value, generation);
        Ok(())
    }

    pub(crate) fn read(&self, variation: &Variation, generation: u64) -> Result<&Value> {
        let target = self.storage_variation(variation);
        self.values
            .get(&target, generation)
            .ok_or_else(|| CutflowError::Unset {
                name: self.name.clone(),
                variation: variation.to_string(),
            })
    }

    pub(crate) fn is_set(&self, variation: &Variation, generation: u64) -> bool {
        self.values.is_valid(&self.storage_variation(variation), generation)
    }
}
