//! Event cleaning cuts shared by every analysis.

use cutflow_core::{CutKind, CutflowError, Result};
use cutflow_cuts::{AnalysisConfigBuilder, Relation};
use cutflow_storage::RegistryDirectory;

/// Variable, kind and required value of each standard cleaning cut, in
/// evaluation order.
pub const STANDARD_CUTS: [(&str, CutKind, i64); 7] = [
    ("PassGRL", CutKind::Char, 1),
    ("passLArTile", CutKind::Char, 1),
    ("Trigger", CutKind::Char, 1),
    ("HasVtx", CutKind::Char, 1),
    ("BadJet", CutKind::Int, 0),
    ("CosmicMuon", CutKind::Int, 0),
    ("BadMuon", CutKind::Int, 0),
];

/// Adds the [`STANDARD_CUTS`] to `builder` as skimming standard cuts, each
/// named after its variable.
///
/// # Errors
///
/// [`CutflowError::UnknownVariable`] when one of the variables is not
/// visible from the builder's scope.
pub fn add_standard_cuts(
    builder: &mut AnalysisConfigBuilder,
    directory: &RegistryDirectory,
) -> Result<()> {
    for (name, kind, required) in STANDARD_CUTS {
        let handle = directory
            .resolve_variable(builder.scope(), name)
            .ok_or_else(|| CutflowError::UnknownVariable(name.to_string()))?;
        let mut cut = builder.new_skimming_cut(name, kind);
        cut.initialize(directory, handle, required, Relation::Equal)?;
        builder.add_standard_cut(cut)?;
    }
    Ok(())
}
