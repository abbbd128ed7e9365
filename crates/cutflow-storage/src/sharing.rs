//! Which output unit an entry is written to.
//!
//! Entries insensitive to a unit's variation are written once into the
//! unit of their own group and referenced from every other unit. Entries
//! marked as broadcast are written everywhere.

use cutflow_core::Variation;

use crate::group::VariationGroup;

/// An output stream: one variation, optionally dedicated to one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    pub name: String,
    pub variation: Variation,
    pub group: Option<String>,
}

impl OutputUnit {
    pub fn new(name: impl Into<String>, variation: Variation) -> Self {
        Self {
            name: name.into(),
            variation,
            group: None,
        }
    }

    /// A unit dedicated to the entries of `group`.
    pub fn for_group(name: impl Into<String>, variation: Variation, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variation,
            group: Some(group.into()),
        }
    }
}

/// Decides whether an entry belongs in `unit`.
///
/// Entries without variations only go to nominal units. Otherwise an entry
/// is written when it has no group, when the unit belongs to its group,
/// when its group is affected by the unit's variation and it is not
/// broadcast, or when it is broadcast to a unit of another group.
pub fn writes_to(
    group: Option<&VariationGroup>,
    broadcast: bool,
    save_variations: bool,
    unit: &OutputUnit,
) -> bool {
    if !save_variations && !unit.variation.is_nominal() {
        return false;
    }
    let Some(group) = group else {
        return true;
    };
    let same_group = unit.group.as_deref() == Some(group.name());
    same_group
        || (group.is_affected_by(&unit.variation) && !broadcast)
        || (!same_group && broadcast)
}
