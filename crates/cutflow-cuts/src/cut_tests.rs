//! Tests for cut binding and evaluation.

use std::sync::Arc;

use cutflow_config::SystematicsConfig;
use cutflow_core::{CutKind, CutflowError, ElementRef, Value, ValueKind, Variation};
use cutflow_storage::{ContainerHandle, RegistryDirectory, ScopeRef, VariableHandle, VariableOptions};
use cutflow_systematics::VariationBroadcaster;
use cutflow_test::{collection, particle, TestParticle};

use crate::{Combine, Cut, EvalContext, Relation, Threshold};

// ============================================================================
// Fixtures
// ============================================================================

struct Fixture {
    directory: RegistryDirectory,
    scope: ScopeRef,
    n_jets: VariableHandle,
    met: VariableHandle,
    flag: VariableHandle,
    muons: ContainerHandle,
}

fn fixture() -> Fixture {
    let catalog = VariationBroadcaster::new(SystematicsConfig::default())
        .fix()
        .unwrap();
    let mut directory = RegistryDirectory::new(catalog);
    let scope = ScopeRef::from(directory.open_scope("Stop0L").unwrap());
    let options = VariableOptions::default();
    let n_jets = directory
        .register_variable(scope, "N_Jets", ValueKind::Int, options)
        .unwrap();
    let met = directory
        .register_variable(scope, "MetTST", ValueKind::Float, options)
        .unwrap();
    let flag = directory
        .register_variable(ScopeRef::Shared, "PassGRL", ValueKind::Char, options)
        .unwrap();
    let muons = directory.register_container(scope, "Muon", options).unwrap();
    directory.add_branch(muons, "pt", ValueKind::Float, true).unwrap();
    directory.lock();
    Fixture {
        directory,
        scope,
        n_jets,
        met,
        flag,
        muons,
    }
}

impl Fixture {
    fn event(&mut self, n_jets: i64, met: f64, flag: bool) {
        let nominal = Variation::nominal();
        let number = self.directory.event().number + 1;
        self.directory.begin_event(number, false);
        self.directory
            .write(self.n_jets, &nominal, Value::Int(n_jets))
            .unwrap();
        self.directory
            .write(self.met, &nominal, Value::Float(met))
            .unwrap();
        self.directory.write_shared(self.flag, Value::from(flag)).unwrap();
    }

    fn cut(&self, kind: CutKind, target: &str, condition: &str) -> Cut {
        let mut cut = Cut::new(format!("{} {}", target, condition), kind, true);
        cut.initialize_from_str(&self.directory, self.scope, target, condition)
            .unwrap();
        cut
    }

    fn passes(&self, cut: &Cut, monitor: bool) -> bool {
        let nominal = Variation::nominal();
        cut.apply(&EvalContext::new(&self.directory, &nominal), monitor)
    }
}

// ============================================================================
// String-bound cuts
// ============================================================================

#[test]
fn test_int_cut_from_string() {
    let mut fx = fixture();
    let cut = fx.cut(CutKind::Int, "N_Jets", ">=2");

    fx.event(1, 0.0, true);
    assert!(!fx.passes(&cut, false));
    fx.event(2, 0.0, true);
    assert!(fx.passes(&cut, false));
    fx.event(3, 0.0, true);
    assert!(fx.passes(&cut, false));
}

#[test]
fn test_char_cut_from_string() {
    let mut fx = fixture();
    let cut = fx.cut(CutKind::Char, "PassGRL", "==1");

    fx.event(0, 0.0, true);
    assert!(fx.passes(&cut, false));
    fx.event(0, 0.0, false);
    assert!(!fx.passes(&cut, false));
}

#[test]
fn test_element_cut_reads_indexed_field() {
    let mut fx = fixture();
    let cut = fx.cut(CutKind::PartFloat, "Muon pt[0]", ">=50000");

    fx.event(0, 0.0, true);
    fx.directory
        .fill(
            fx.muons,
            &Variation::nominal(),
            collection(&[particle(60_000.0, 0.3), particle(10_000.0, 1.2)]),
        )
        .unwrap();
    assert!(fx.passes(&cut, false));

    fx.event(0, 0.0, true);
    fx.directory
        .fill(fx.muons, &Variation::nominal(), collection(&[particle(40_000.0, 0.1)]))
        .unwrap();
    assert!(!fx.passes(&cut, false));

    fx.event(0, 0.0, true);
    fx.directory
        .fill(fx.muons, &Variation::nominal(), collection(&[]))
        .unwrap();
    assert!(!fx.passes(&cut, false));
}

#[test]
fn test_element_cut_only_reads_its_element() {
    let mut fx = fixture();
    let cut = fx.cut(CutKind::PartFloat, "Muon pt[1]", ">20000");

    let first = Arc::new(TestParticle::new(60_000.0, 0.3));
    let second = Arc::new(TestParticle::new(30_000.0, 0.3));
    let elements: [ElementRef; 2] = [first.clone(), second.clone()];
    fx.event(0, 0.0, true);
    fx.directory
        .fill(
            fx.muons,
            &Variation::nominal(),
            collection(&elements),
        )
        .unwrap();

    assert!(fx.passes(&cut, false));
    assert_eq!(first.read_count(), 0);
    assert_eq!(second.read_count(), 1);
}

// ============================================================================
// Canonicalization compatibility
// ============================================================================

#[test]
fn test_float_inclusive_relation_is_strict() {
    let mut fx = fixture();
    let at_least = fx.cut(CutKind::Float, "MetTST", ">=50");
    let at_most = fx.cut(CutKind::Float, "MetTST", "<=2.5");

    fx.event(0, 50.0, true);
    assert!(!fx.passes(&at_least, false));
    fx.event(0, 50.1, true);
    assert!(fx.passes(&at_least, false));
    fx.event(0, 2.5, true);
    assert!(!fx.passes(&at_most, false));
    fx.event(0, 2.4, true);
    assert!(fx.passes(&at_most, false));
}

#[test]
fn test_int_inclusive_relation_is_inclusive() {
    let mut fx = fixture();
    let at_most = fx.cut(CutKind::Int, "N_Jets", "<=2");
    assert_eq!(at_most.leaf().map(|(_, r, t)| (r, t)), Some((Relation::Less, Threshold::Int(3))));

    fx.event(2, 0.0, true);
    assert!(fx.passes(&at_most, false));
    fx.event(3, 0.0, true);
    assert!(!fx.passes(&at_most, false));
}

#[test]
fn test_code_bound_cut_keeps_relation() {
    let mut fx = fixture();
    let mut cut = Cut::new("MET >= 50", CutKind::Float, true);
    cut.initialize(&fx.directory, fx.met, 50.0, Relation::GreaterEqual)
        .unwrap();

    fx.event(0, 50.0, true);
    assert!(fx.passes(&cut, false));
}

// ============================================================================
// Combination
// ============================================================================

#[test]
fn test_combined_cuts_follow_boolean_logic() {
    let mut fx = fixture();
    for (n_jets, met) in [(1, 10.0), (1, 60.0), (3, 10.0), (3, 60.0)] {
        fx.event(n_jets, met, true);
        let jets = fx.passes(&fx.cut(CutKind::Int, "N_Jets", ">=2"), false);
        let high_met = fx.passes(&fx.cut(CutKind::Float, "MetTST", ">50"), false);

        let and = fx
            .cut(CutKind::Int, "N_Jets", ">=2")
            .combine(fx.cut(CutKind::Float, "MetTST", ">50"), Combine::And);
        let or = fx
            .cut(CutKind::Int, "N_Jets", ">=2")
            .combine(fx.cut(CutKind::Float, "MetTST", ">50"), Combine::Or);

        assert_eq!(fx.passes(&and, false), jets && high_met);
        assert_eq!(fx.passes(&or, false), jets || high_met);
    }
}

#[test]
fn test_combined_cut_name_and_flags() {
    let fx = fixture();
    let monitor_only = {
        let mut cut = Cut::new("MET", CutKind::Float, false);
        cut.initialize_from_str(&fx.directory, fx.scope, "MetTST", ">50")
            .unwrap();
        cut
    };
    let combined = fx
        .cut(CutKind::Int, "N_Jets", ">=2")
        .combine(monitor_only, Combine::Or);
    assert_eq!(combined.name(), "N_Jets >=2 || MET");
    assert!(combined.is_skimming());
    assert!(combined.is_initialized());
    assert!(combined.leaf().is_none());

    let pending = Cut::new("pending", CutKind::Int, true);
    let half = fx.cut(CutKind::Int, "N_Jets", ">=2").combine(pending, Combine::And);
    assert!(!half.is_initialized());
}

#[test]
fn test_mixed_skimming_operands_are_all_evaluated() {
    let mut fx = fixture();
    let monitor_only = {
        let mut cut = Cut::new("MET", CutKind::Float, false);
        cut.initialize_from_str(&fx.directory, fx.scope, "MetTST", ">50000")
            .unwrap();
        cut
    };
    let combined = fx
        .cut(CutKind::Int, "N_Jets", ">=2")
        .combine(monitor_only, Combine::Or);

    fx.event(0, 0.0, true);
    assert!(!fx.passes(&combined, false));
    assert!(!fx.passes(&combined, true));

    fx.event(0, 60_000.0, true);
    assert!(fx.passes(&combined, false));

    fx.event(2, 0.0, true);
    assert!(fx.passes(&combined, false));
}

// ============================================================================
// Evaluation modes and missing values
// ============================================================================

#[test]
fn test_non_skimming_cut_only_counts_in_monitor() {
    let mut fx = fixture();
    let mut cut = Cut::new("MET", CutKind::Float, false);
    cut.initialize_from_str(&fx.directory, fx.scope, "MetTST", ">50")
        .unwrap();

    fx.event(0, 10.0, true);
    assert!(fx.passes(&cut, false));
    assert!(!fx.passes(&cut, true));
}

#[test]
fn test_missing_value_fails() {
    let mut fx = fixture();
    let cut = fx.cut(CutKind::Int, "N_Jets", ">=2");
    fx.event(3, 0.0, true);
    assert!(fx.passes(&cut, false));

    fx.directory.begin_event(99, false);
    assert!(!fx.passes(&cut, false));
    assert!(!fx.passes(&Cut::new("pending", CutKind::Int, true), false));
}

// ============================================================================
// Binding errors
// ============================================================================

#[test]
fn test_binding_errors() {
    let fx = fixture();
    let bind = |kind: CutKind, target: &str, condition: &str| {
        let mut cut = Cut::new("cut", kind, true);
        cut.initialize_from_str(&fx.directory, fx.scope, target, condition)
    };

    assert!(matches!(
        bind(CutKind::Float, "N_Jets", ">2"),
        Err(CutflowError::TypeMismatch { .. })
    ));
    assert!(matches!(
        bind(CutKind::Int, "N_Jets", ">2.5"),
        Err(CutflowError::TypeMismatch { .. })
    ));
    assert!(matches!(
        bind(CutKind::PartFloat, "N_Jets", ">2"),
        Err(CutflowError::Config(_))
    ));
    assert!(matches!(
        bind(CutKind::Float, "Muon pt[0]", ">2"),
        Err(CutflowError::Config(_))
    ));
    assert!(matches!(
        bind(CutKind::PartInt, "Muon pt[0]", ">2"),
        Err(CutflowError::TypeMismatch { .. })
    ));
    assert!(matches!(
        bind(CutKind::Int, "N_Leptons", ">2"),
        Err(CutflowError::UnknownVariable(ref name)) if name == "N_Leptons"
    ));
    assert!(matches!(
        bind(CutKind::Int, "N_Jets", "2"),
        Err(CutflowError::Parse(_))
    ));
}

#[test]
fn test_cut_binds_once() {
    let fx = fixture();
    let mut cut = fx.cut(CutKind::Int, "N_Jets", ">=2");
    let err = cut
        .initialize(&fx.directory, fx.n_jets, 4, Relation::Greater)
        .unwrap_err();
    assert!(err.to_string().contains("already initialized"));
}

#[test]
fn test_float_cut_accepts_integer_threshold() {
    let mut fx = fixture();
    let cut = fx.cut(CutKind::Float, "MetTST", ">50");
    assert_eq!(cut.leaf().map(|(_, _, t)| t), Some(Threshold::Float(50.0)));
    fx.event(0, 51.0, true);
    assert!(fx.passes(&cut, false));
}
