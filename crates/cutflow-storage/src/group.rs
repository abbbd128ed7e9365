//! Named groups of variables scoped to one object type.

use std::sync::Arc;

use cutflow_core::{SelectionObject, Variation};
use cutflow_systematics::VariationCatalog;

/// Tags variables and containers that only change under the kinematic
/// variations of one object type.
#[derive(Debug, Clone)]
pub struct VariationGroup {
    name: String,
    object: SelectionObject,
    catalog: Arc<VariationCatalog>,
}

impl VariationGroup {
    pub(crate) fn new(name: &str, object: SelectionObject, catalog: Arc<VariationCatalog>) -> Self {
        Self {
            name: name.to_string(),
            object,
            catalog,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> SelectionObject {
        self.object
    }

    /// Whether `variation` changes the content of this group.
    ///
    /// Nominal only counts when it is the sole kinematic variation of the
    /// object.
    pub fn is_affected_by(&self, variation: &Variation) -> bool {
        let kinematic = self.catalog.kinematic(self.object);
        (!variation.is_nominal() || kinematic.len() == 1) && kinematic.contains(variation)
    }
}
