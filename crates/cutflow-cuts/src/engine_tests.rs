//! Tests for the selection engine.

use std::sync::Arc;

use cutflow_config::{CombineOp, CutDef, CutFlowDef, SelectionConfig, SystematicsConfig};
use cutflow_core::{CutKind, CutflowError, ElementRef, SelectionObject, Value, ValueKind, Variation};
use cutflow_storage::{ContainerHandle, RegistryDirectory, ScopeRef, VariableHandle, VariableOptions};
use cutflow_systematics::{VariationBroadcaster, VariationCatalog};
use cutflow_test::{collection, TestParticle};

use crate::{AnalysisConfig, AnalysisConfigBuilder, ApplyMode, Cut, CutFlow, EvalContext};

// ============================================================================
// Fixtures
// ============================================================================

fn jes() -> Variation {
    Variation::new("JET_JES__1up")
}

struct Setup {
    catalog: Arc<VariationCatalog>,
    directory: RegistryDirectory,
    scope: ScopeRef,
    n_jets: VariableHandle,
    grl: VariableHandle,
    muons: ContainerHandle,
    jets: ContainerHandle,
}

fn setup() -> Setup {
    let mut broadcaster = VariationBroadcaster::new(SystematicsConfig::default());
    broadcaster.insert_kinematic(&jes(), SelectionObject::Jet).unwrap();
    let catalog = broadcaster.fix().unwrap();

    let mut directory = RegistryDirectory::new(Arc::clone(&catalog));
    let scope = ScopeRef::from(directory.open_scope("Stop0L").unwrap());
    let options = VariableOptions::default();
    let n_jets = directory
        .register_variable(scope, "N_Jets", ValueKind::Int, options)
        .unwrap();
    let grl = directory
        .register_variable(ScopeRef::Shared, "PassGRL", ValueKind::Char, options)
        .unwrap();
    let muons = directory.register_container(scope, "Muon", options).unwrap();
    let jets = directory.register_container(scope, "Jets", options).unwrap();
    directory.lock();

    Setup {
        catalog,
        directory,
        scope,
        n_jets,
        grl,
        muons,
        jets,
    }
}

impl Setup {
    fn cut(&self, name: &str, kind: CutKind, target: &str, condition: &str) -> Cut {
        let mut cut = Cut::new(name, kind, true);
        cut.initialize_from_str(&self.directory, self.scope, target, condition)
            .unwrap();
        cut
    }

    /// Fills one event for `variation` and returns the leading muon and jet.
    fn event(
        &mut self,
        variation: &Variation,
        muon_pt: f64,
        jet_pt: f64,
        grl: bool,
    ) -> (Arc<TestParticle>, Arc<TestParticle>) {
        let number = self.directory.event().number + 1;
        self.directory.begin_event(number, false);
        let muon = Arc::new(TestParticle::new(muon_pt, 0.5));
        let jet = Arc::new(TestParticle::new(jet_pt, -0.5));
        let muon_ref: ElementRef = muon.clone();
        let jet_ref: ElementRef = jet.clone();
        self.directory
            .fill(self.muons, variation, collection(&[muon_ref]))
            .unwrap();
        self.directory
            .fill(self.jets, variation, collection(&[jet_ref]))
            .unwrap();
        self.directory.write_shared(self.grl, Value::from(grl)).unwrap();
        self.directory
            .write(self.n_jets, variation, Value::Int(1))
            .unwrap();
        (muon, jet)
    }

    /// Selection with the chain [muon pt > 1000, jet pt > 1000].
    fn two_cut_config(&self, with_grl: bool) -> AnalysisConfig {
        let mut builder = AnalysisConfigBuilder::new(self.scope);
        if with_grl {
            builder
                .add_standard_cut(self.cut("PassGRL", CutKind::Char, "PassGRL", "==1"))
                .unwrap();
        }
        let flow = CutFlow::new("SR")
            .with_cut(self.cut("muon", CutKind::PartFloat, "Muon pt[0]", ">1000"))
            .with_cut(self.cut("jet", CutKind::PartFloat, "Jets pt[0]", ">1000"));
        builder.add_cut_flow(flow).unwrap();
        builder.build(&self.catalog).unwrap()
    }

    fn apply(&self, config: &mut AnalysisConfig, variation: &Variation, mode: ApplyMode) -> bool {
        config
            .apply(&EvalContext::new(&self.directory, variation), mode)
            .unwrap()
    }
}

// ============================================================================
// Registration checks
// ============================================================================

#[test]
fn test_build_requires_a_cut_flow() {
    let s = setup();
    let err = AnalysisConfigBuilder::new(s.scope).build(&s.catalog).unwrap_err();
    assert!(matches!(err, CutflowError::Config(_)));
}

#[test]
fn test_cut_flow_names_are_unique() {
    let s = setup();
    let mut builder = AnalysisConfigBuilder::new(s.scope);
    assert!(builder
        .add_cut_flow(CutFlow::new("SR").with_cut(s.cut("a", CutKind::Int, "N_Jets", ">=2")))
        .unwrap());
    let err = builder
        .add_cut_flow(CutFlow::new("SR").with_cut(s.cut("b", CutKind::Int, "N_Jets", ">=3")))
        .unwrap_err();
    assert!(matches!(
        err,
        CutflowError::DuplicateName { kind: "cut flow", ref name, .. } if name == "SR"
    ));
}

#[test]
fn test_uninitialized_cuts_are_refused() {
    let s = setup();
    let mut builder = AnalysisConfigBuilder::new(s.scope);
    let pending = builder.new_cut_flow_cut("pending", CutKind::Int);
    let err = builder
        .add_cut_flow(CutFlow::new("SR").with_cut(pending))
        .unwrap_err();
    assert!(err.to_string().contains("pending"));
    assert!(builder.cut_flows().is_empty());

    let pending = builder.new_skimming_cut("grl", CutKind::Char);
    assert!(matches!(
        builder.add_standard_cut(pending),
        Err(CutflowError::NotInitialized(_))
    ));
}

#[test]
fn test_inactive_cut_flows_are_skipped() {
    let s = setup();
    let mut builder = AnalysisConfigBuilder::new(s.scope).with_active_cut_flows(vec!["CR".to_string()]);
    let added = builder
        .add_cut_flow(CutFlow::new("SR").with_cut(s.cut("a", CutKind::Int, "N_Jets", ">=2")))
        .unwrap();
    assert!(!added);
    assert!(builder
        .add_cut_flow(CutFlow::new("CR").with_cut(s.cut("b", CutKind::Int, "N_Jets", "<2")))
        .unwrap());
    let names: Vec<&str> = builder.cut_flows().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["CR"]);
}

// ============================================================================
// Skim and monitor semantics
// ============================================================================

#[test]
fn test_skim_stops_at_first_failing_cut() {
    let mut s = setup();
    let mut config = s.two_cut_config(false);
    let nominal = Variation::nominal();

    let (muon, jet) = s.event(&nominal, 500.0, 5000.0, true);
    assert!(!s.apply(&mut config, &nominal, ApplyMode::Skim));
    assert_eq!(muon.read_count(), 1);
    assert_eq!(jet.read_count(), 0);

    assert!(!s.apply(&mut config, &nominal, ApplyMode::Monitor));
    assert_eq!(jet.read_count(), 1);
}

#[test]
fn test_monitor_bins_follow_reached_cut() {
    let mut s = setup();
    let mut config = s.two_cut_config(false);
    let nominal = Variation::nominal();

    s.event(&nominal, 500.0, 5000.0, true);
    s.apply(&mut config, &nominal, ApplyMode::Monitor);
    let failing = config.histogram(&nominal, "SR").unwrap().highest_filled();

    s.event(&nominal, 5000.0, 5000.0, true);
    s.apply(&mut config, &nominal, ApplyMode::Monitor);
    let histogram = config.histogram(&nominal, "SR").unwrap();

    assert_eq!(failing, 1);
    assert_eq!(histogram.highest_filled(), 3);
    assert_eq!(histogram.labels(), ["Initial", "muon", "jet"]);
    assert_eq!(histogram.counts(), [2, 1, 1]);
}

#[test]
fn test_standard_cut_failure() {
    let mut s = setup();
    let mut config = s.two_cut_config(true);
    let nominal = Variation::nominal();

    let (muon, _) = s.event(&nominal, 5000.0, 5000.0, false);
    assert!(!s.apply(&mut config, &nominal, ApplyMode::Skim));
    assert!(!s.apply(&mut config, &nominal, ApplyMode::Monitor));
    assert_eq!(muon.read_count(), 0);

    let histogram = config.histogram(&nominal, "SR").unwrap();
    assert_eq!(histogram.count("Initial"), Some(1));
    assert_eq!(histogram.count("PassGRL"), Some(0));
    assert_eq!(histogram.count("jet"), Some(0));

    s.event(&nominal, 5000.0, 5000.0, true);
    assert!(s.apply(&mut config, &nominal, ApplyMode::Skim));
    s.apply(&mut config, &nominal, ApplyMode::Monitor);
    let histogram = config.histogram(&nominal, "SR").unwrap();
    assert_eq!(histogram.counts(), [2, 1, 1, 1]);
}

#[test]
fn test_event_dump_stops_at_first_passing_flow() {
    let mut s = setup();
    let mut builder = AnalysisConfigBuilder::new(s.scope);
    builder
        .add_cut_flow(CutFlow::new("Muons").with_cut(s.cut("muon", CutKind::PartFloat, "Muon pt[0]", ">1000")))
        .unwrap();
    builder
        .add_cut_flow(CutFlow::new("Jets").with_cut(s.cut("jet", CutKind::PartFloat, "Jets pt[0]", ">1000")))
        .unwrap();
    let mut config = builder.build(&s.catalog).unwrap();
    let nominal = Variation::nominal();

    let (_, jet) = s.event(&nominal, 5000.0, 5000.0, true);
    assert!(s.apply(&mut config, &nominal, ApplyMode::EventDump));
    assert_eq!(jet.read_count(), 0);
    assert!(s.apply(&mut config, &nominal, ApplyMode::Skim));
    assert_eq!(jet.read_count(), 1);
}

#[test]
fn test_skim_accepts_when_any_flow_passes() {
    let mut s = setup();
    let mut builder = AnalysisConfigBuilder::new(s.scope);
    builder
        .add_cut_flow(CutFlow::new("Muons").with_cut(s.cut("muon", CutKind::PartFloat, "Muon pt[0]", ">1000")))
        .unwrap();
    builder
        .add_cut_flow(CutFlow::new("Jets").with_cut(s.cut("jet", CutKind::PartFloat, "Jets pt[0]", ">1000")))
        .unwrap();
    let mut config = builder.build(&s.catalog).unwrap();
    let nominal = Variation::nominal();

    s.event(&nominal, 10.0, 5000.0, true);
    assert!(s.apply(&mut config, &nominal, ApplyMode::Skim));
    s.event(&nominal, 10.0, 10.0, true);
    assert!(!s.apply(&mut config, &nominal, ApplyMode::Skim));
}

// ============================================================================
// Histograms
// ============================================================================

#[test]
fn test_histograms_per_kinematic_variation() {
    let mut s = setup();
    let mut config = s.two_cut_config(false);
    assert_eq!(config.histograms().len(), 2);

    s.event(&jes(), 5000.0, 5000.0, true);
    config
        .apply(
            &EvalContext::new(&s.directory, &jes()).with_weight(2.5),
            ApplyMode::Monitor,
        )
        .unwrap();
    let shifted = config.histogram(&jes(), "SR").unwrap();
    assert_eq!(shifted.counts(), [1, 1, 1]);
    assert_eq!(shifted.weights(), [2.5, 2.5, 2.5]);
    assert_eq!(config.histogram(&Variation::nominal(), "SR").unwrap().counts(), [0, 0, 0]);
}

#[test]
fn test_monitor_unknown_variation_fails() {
    let mut s = setup();
    let mut config = s.two_cut_config(false);
    s.event(&Variation::nominal(), 5000.0, 5000.0, true);

    let err = config
        .apply(
            &EvalContext::new(&s.directory, &Variation::new("MUON_ID__1up")),
            ApplyMode::Monitor,
        )
        .unwrap_err();
    assert!(matches!(err, CutflowError::UnknownVariation(ref v) if v == "MUON_ID__1up"));
}

// ============================================================================
// Replacement and lookup
// ============================================================================

#[test]
fn test_replace_cut_in_place() {
    let s = setup();
    let mut builder = AnalysisConfigBuilder::new(s.scope);
    builder
        .add_standard_cut(s.cut("PassGRL", CutKind::Char, "PassGRL", "==1"))
        .unwrap();
    builder
        .add_cut_flow(
            CutFlow::new("SR")
                .with_cut(s.cut("2 jets", CutKind::Int, "N_Jets", ">=2"))
                .with_cut(s.cut("muon", CutKind::PartFloat, "Muon pt[0]", ">1000")),
        )
        .unwrap();

    builder
        .replace_cut("SR", "2 jets", s.cut("3 jets", CutKind::Int, "N_Jets", ">=3"))
        .unwrap();
    assert!(builder.replace_cut("SR", "4 jets", s.cut("x", CutKind::Int, "N_Jets", ">=4")).is_err());
    assert!(builder.replace_cut("CR", "muon", s.cut("y", CutKind::Int, "N_Jets", ">=4")).is_err());
    assert!(builder.find_cut("3 jets").is_some());

    let config = builder.build(&s.catalog).unwrap();
    let hash = config.cut_flows()[0].hash();
    assert_eq!(config.cut_names(hash), vec!["PassGRL", "3 jets", "muon"]);
    assert_eq!(
        config.histogram(&Variation::nominal(), "SR").unwrap().labels(),
        ["Initial", "PassGRL", "3 jets", "muon"]
    );
    assert!(config.find_cut("2 jets").is_some());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_builder_from_selection() {
    let mut s = setup();
    let selection = SelectionConfig {
        active_cut_flows: vec!["SR".to_string()],
        standard_cuts: vec![CutDef::new("PassGRL", CutKind::Char, "PassGRL", "==1")],
        cut_flows: vec![
            CutFlowDef::new("SR")
                .with_cut(CutDef::new(">= 1 jet", CutKind::Int, "N_Jets", ">=1"))
                .with_cut(
                    CutDef::new("muon", CutKind::PartFloat, "Muon pt[0]", ">1000").combined_with(
                        CombineOp::Or,
                        CutDef::new("jet", CutKind::PartFloat, "Jets pt[0]", ">1000"),
                    ),
                ),
            CutFlowDef::new("Disabled").with_cut(CutDef::new("x", CutKind::Int, "N_Jets", ">5")),
        ],
    };

    let builder = AnalysisConfigBuilder::from_selection(&selection, &s.directory, s.scope).unwrap();
    assert_eq!(builder.standard_cuts().len(), 1);
    assert_eq!(builder.cut_flows().len(), 1);
    assert_eq!(builder.cut_flows()[0].len(), 2);
    assert_eq!(builder.cut_flows()[0].cuts()[1].name(), "muon || jet");

    let mut config = builder.build(&s.catalog).unwrap();
    let nominal = Variation::nominal();
    s.event(&nominal, 10.0, 5000.0, true);
    assert!(s.apply(&mut config, &nominal, ApplyMode::Skim));
}

#[test]
fn test_from_selection_reports_bad_cut() {
    let s = setup();
    let selection = SelectionConfig {
        active_cut_flows: Vec::new(),
        standard_cuts: Vec::new(),
        cut_flows: vec![CutFlowDef::new("SR").with_cut(CutDef::new("x", CutKind::Int, "N_Jets", "=>2"))],
    };
    let err = AnalysisConfigBuilder::from_selection(&selection, &s.directory, s.scope).unwrap_err();
    assert!(matches!(err, CutflowError::Parse(_)));
}
