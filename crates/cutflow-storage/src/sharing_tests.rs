//! Tests for the output sharing rule.

use std::sync::Arc;

use cutflow_config::SystematicsConfig;
use cutflow_core::{SelectionObject, ValueKind, Variation};
use cutflow_systematics::{VariationBroadcaster, VariationCatalog};

use crate::sharing::{writes_to, OutputUnit};
use crate::{RegistryDirectory, ScopeRef, VariableOptions, VariationGroup};

fn jes() -> Variation {
    Variation::new("JET_JES__1up")
}

fn catalog() -> Arc<VariationCatalog> {
    let mut broadcaster = VariationBroadcaster::new(SystematicsConfig::default());
    broadcaster.insert_kinematic(&jes(), SelectionObject::Jet).unwrap();
    broadcaster.fix().unwrap()
}

// ============================================================================
// Group relevance
// ============================================================================

#[test]
fn test_group_affected_by_own_variations() {
    let jets = VariationGroup::new("Jets", SelectionObject::Jet, catalog());
    assert!(jets.is_affected_by(&jes()));
    assert!(!jets.is_affected_by(&Variation::nominal()));
    assert!(!jets.is_affected_by(&Variation::new("MUON_ID__1up")));
}

#[test]
fn test_nominal_only_object_affected_by_nominal() {
    let muons = VariationGroup::new("Muons", SelectionObject::Muon, catalog());
    assert!(muons.is_affected_by(&Variation::nominal()));
    assert!(!muons.is_affected_by(&jes()));
}

// ============================================================================
// Sharing rule
// ============================================================================

#[test]
fn test_ungrouped_entries_go_everywhere() {
    let unit = OutputUnit::new("JES", jes());
    assert!(writes_to(None, false, true, &unit));
    assert!(!writes_to(None, false, false, &unit));
    assert!(writes_to(None, false, false, &OutputUnit::new("Nominal", Variation::nominal())));
}

#[test]
fn test_grouped_entry_rule() {
    let muons = VariationGroup::new("Muons", SelectionObject::Muon, catalog());
    let own_unit = OutputUnit::for_group("MuonTree", Variation::nominal(), "Muons");
    let jes_unit = OutputUnit::new("JES", jes());
    let nominal_unit = OutputUnit::new("Nominal", Variation::nominal());

    // own group unit always
    assert!(writes_to(Some(&muons), false, true, &own_unit));
    assert!(writes_to(Some(&muons), true, true, &own_unit));
    // unaffected variation of another unit: only when broadcast
    assert!(!writes_to(Some(&muons), false, true, &jes_unit));
    assert!(writes_to(Some(&muons), true, true, &jes_unit));
    // affected (nominal is the only muon variation)
    assert!(writes_to(Some(&muons), false, true, &nominal_unit));
}

#[test]
fn test_affected_broadcast_entry_still_written() {
    let jets = VariationGroup::new("Jets", SelectionObject::Jet, catalog());
    let jes_unit = OutputUnit::new("JES", jes());
    assert!(writes_to(Some(&jets), false, true, &jes_unit));
    assert!(writes_to(Some(&jets), true, true, &jes_unit));
}

// ============================================================================
// Directory output selection
// ============================================================================

#[test]
fn test_variables_for_output_unit() {
    let mut directory = RegistryDirectory::new(catalog());
    let scope = ScopeRef::from(directory.open_scope("Stop0L").unwrap());
    directory.create_group("Muons", SelectionObject::Muon).unwrap();

    directory
        .register_variable(ScopeRef::Shared, "RunNumber", ValueKind::Int, VariableOptions::default())
        .unwrap();
    directory
        .register_variable(scope, "Met", ValueKind::Float, VariableOptions::default())
        .unwrap();
    directory
        .register_variable(scope, "CutMask", ValueKind::Int, VariableOptions::transient())
        .unwrap();
    let mu_pt = directory
        .register_variable(scope, "LeadMuonPt", ValueKind::Float, VariableOptions::default())
        .unwrap();
    let mu_flag = directory
        .register_variable(scope, "PassMuonTrigger", ValueKind::Char, VariableOptions::default())
        .unwrap();
    directory.assign_variable_group(mu_pt, "Muons").unwrap();
    directory.assign_variable_group(mu_flag, "Muons").unwrap();
    directory.broadcast_variable(mu_flag).unwrap();
    directory.lock();

    let names = |unit: &OutputUnit| -> Vec<String> {
        directory
            .variables_for(scope, unit)
            .iter()
            .map(|v| v.name().to_string())
            .collect()
    };

    assert_eq!(
        names(&OutputUnit::new("JES", jes())),
        vec!["RunNumber", "Met", "PassMuonTrigger"]
    );
    assert_eq!(
        names(&OutputUnit::for_group("MuonTree", Variation::nominal(), "Muons")),
        vec!["RunNumber", "Met", "LeadMuonPt", "PassMuonTrigger"]
    );
}

#[test]
fn test_branches_for_output_unit() {
    let mut directory = RegistryDirectory::new(catalog());
    directory.create_group("Muons", SelectionObject::Muon).unwrap();
    let muons = directory
        .register_container(ScopeRef::Shared, "Muons", VariableOptions::default())
        .unwrap();
    directory.assign_container_group(muons, "Muons").unwrap();
    directory.add_branch(muons, "pt", ValueKind::Float, true).unwrap();
    directory.add_branch(muons, "signal", ValueKind::Char, true).unwrap();
    directory.add_branch(muons, "truthType", ValueKind::Int, false).unwrap();
    directory.broadcast_branch(muons, "signal").unwrap();

    let jes_branches: Vec<&str> = directory
        .branches_for(muons, &OutputUnit::new("JES", jes()))
        .unwrap()
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(jes_branches, vec!["signal"]);

    let own: Vec<&str> = directory
        .branches_for(muons, &OutputUnit::for_group("MuonTree", Variation::nominal(), "Muons"))
        .unwrap()
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(own, vec!["pt", "signal", "truthType"]);
}
