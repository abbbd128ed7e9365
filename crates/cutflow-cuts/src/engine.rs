//! Selection engine: standard cuts, cut flows and their histograms.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use cutflow_config::{CutDef, SelectionConfig};
use cutflow_core::{CutKind, CutflowError, Result, Variation};
use cutflow_storage::{RegistryDirectory, ScopeRef};
use cutflow_systematics::VariationCatalog;

use crate::cut::{Cut, EvalContext};
use crate::flow::{CutFlow, FlowOutcome};
use crate::histogram::CutFlowHistogram;

/// How [`AnalysisConfig::apply`] treats the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Accept the event if any cut flow fully passes.
    Skim,
    /// Like `Skim`, but stop at the first fully passing cut flow.
    EventDump,
    /// Evaluate every cut and fill the cut-flow histograms.
    Monitor,
}

/// Collects standard cuts and cut flows during setup.
///
/// ```
/// use cutflow_config::SystematicsConfig;
/// use cutflow_core::{CutKind, Value, ValueKind, Variation};
/// use cutflow_cuts::{AnalysisConfigBuilder, ApplyMode, CutFlow, EvalContext};
/// use cutflow_storage::{RegistryDirectory, ScopeRef, VariableOptions};
/// use cutflow_systematics::VariationBroadcaster;
///
/// let catalog = VariationBroadcaster::new(SystematicsConfig::default()).fix().unwrap();
/// let mut directory = RegistryDirectory::new(catalog.clone());
/// let scope = ScopeRef::from(directory.open_scope("Stop0L").unwrap());
/// let n_jets = directory
///     .register_variable(scope, "N_Jets", ValueKind::Int, VariableOptions::default())
///     .unwrap();
/// directory.lock();
///
/// let mut builder = AnalysisConfigBuilder::new(scope);
/// let mut cut = builder.new_skimming_cut(">= 2 jets", CutKind::Int);
/// cut.initialize_from_str(&directory, scope, "N_Jets", ">=2").unwrap();
/// builder.add_cut_flow(CutFlow::new("SR").with_cut(cut)).unwrap();
/// let mut config = builder.build(&catalog).unwrap();
///
/// directory.begin_event(1, false);
/// directory.write(n_jets, &Variation::nominal(), Value::Int(3)).unwrap();
/// let nominal = Variation::nominal();
/// let ctx = EvalContext::new(&directory, &nominal);
/// assert!(config.apply(&ctx, ApplyMode::Skim).unwrap());
/// ```
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    scope: ScopeRef,
    active_cut_flows: Vec<String>,
    standard_cuts: Vec<Arc<Cut>>,
    cut_flows: Vec<CutFlow>,
    defined_cuts: Vec<Arc<Cut>>,
}

impl AnalysisConfigBuilder {
    /// Starts an empty selection resolving names from `scope`.
    pub fn new(scope: ScopeRef) -> Self {
        Self {
            scope,
            active_cut_flows: Vec::new(),
            standard_cuts: Vec::new(),
            cut_flows: Vec::new(),
            defined_cuts: Vec::new(),
        }
    }

    /// Restricts the cut flows that [`add_cut_flow`](Self::add_cut_flow)
    /// accepts. An empty list accepts all of them.
    pub fn with_active_cut_flows(mut self, names: Vec<String>) -> Self {
        self.active_cut_flows = names;
        self
    }

    pub fn scope(&self) -> ScopeRef {
        self.scope
    }

    /// Builds a selection from configuration, binding every cut against
    /// `directory`.
    pub fn from_selection(
        selection: &SelectionConfig,
        directory: &RegistryDirectory,
        scope: ScopeRef,
    ) -> Result<Self> {
        let mut builder =
            Self::new(scope).with_active_cut_flows(selection.active_cut_flows.clone());
        for def in &selection.standard_cuts {
            let cut = builder.cut_from_def(def, directory)?;
            builder.add_standard_cut(cut)?;
        }
        for flow_def in &selection.cut_flows {
            let mut flow = CutFlow::new(flow_def.name.as_str());
            for def in &flow_def.cuts {
                flow.push(builder.cut_from_def(def, directory)?);
            }
            builder.add_cut_flow(flow)?;
        }
        Ok(builder)
    }

    fn cut_from_def(&self, def: &CutDef, directory: &RegistryDirectory) -> Result<Cut> {
        let mut cut = self.new_cut(def.name.as_str(), def.kind, def.skimming);
        cut.initialize_from_str(directory, self.scope, &def.target, &def.condition)?;
        match &def.combine {
            Some(combine) => {
                let other = self.cut_from_def(&combine.with, directory)?;
                Ok(cut.combine(other, combine.op.into()))
            }
            None => Ok(cut),
        }
    }

    pub fn new_cut(&self, name: impl Into<String>, kind: CutKind, skimming: bool) -> Cut {
        Cut::new(name, kind, skimming)
    }

    pub fn new_skimming_cut(&self, name: impl Into<String>, kind: CutKind) -> Cut {
        self.new_cut(name, kind, true)
    }

    /// A cut that only counts in monitor mode.
    pub fn new_cut_flow_cut(&self, name: impl Into<String>, kind: CutKind) -> Cut {
        self.new_cut(name, kind, false)
    }

    /// Adds a cut evaluated before every cut flow.
    pub fn add_standard_cut(&mut self, cut: Cut) -> Result<Arc<Cut>> {
        if !cut.is_initialized() {
            return Err(CutflowError::NotInitialized(cut.name().to_string()));
        }
        if self.standard_cuts.iter().any(|c| c.name() == cut.name()) {
            return Err(CutflowError::DuplicateName {
                kind: "standard cut",
                name: cut.name().to_string(),
                scope: "selection".to_string(),
            });
        }
        let cut = Arc::new(cut);
        self.standard_cuts.push(Arc::clone(&cut));
        self.defined_cuts.push(Arc::clone(&cut));
        Ok(cut)
    }

    /// Enables a cut flow.
    ///
    /// Returns `Ok(false)` when the flow is not in the active list and was
    /// skipped.
    ///
    /// # Errors
    ///
    /// Fails for a second flow with the same name and for a flow holding a
    /// cut that was never initialized.
    pub fn add_cut_flow(&mut self, flow: CutFlow) -> Result<bool> {
        if !self.is_active(flow.name()) {
            info!(event = "cut_flow_skipped", cut_flow = flow.name());
            return Ok(false);
        }
        if self.cut_flows.iter().any(|f| f.name() == flow.name()) {
            return Err(CutflowError::DuplicateName {
                kind: "cut flow",
                name: flow.name().to_string(),
                scope: "selection".to_string(),
            });
        }
        if let Some(cut) = flow.cuts().iter().find(|c| !c.is_initialized()) {
            return Err(CutflowError::NotInitialized(format!(
                "{} (cut flow '{}')",
                cut.name(),
                flow.name()
            )));
        }
        for cut in flow.cuts() {
            if !self.defined_cuts.iter().any(|c| Arc::ptr_eq(c, cut)) {
                self.defined_cuts.push(Arc::clone(cut));
            }
        }
        info!(
            event = "cut_flow_added",
            cut_flow = flow.name(),
            cuts = flow.len() as u64,
            standard_cuts = self.standard_cuts.len() as u64,
        );
        self.cut_flows.push(flow);
        Ok(true)
    }

    fn is_active(&self, name: &str) -> bool {
        self.active_cut_flows.is_empty() || self.active_cut_flows.iter().any(|n| n == name)
    }

    /// Replaces cut `old` of cut flow `flow` in place.
    pub fn replace_cut(&mut self, flow: &str, old: &str, with: Cut) -> Result<()> {
        if !with.is_initialized() {
            return Err(CutflowError::NotInitialized(with.name().to_string()));
        }
        let target = self
            .cut_flows
            .iter_mut()
            .find(|f| f.name() == flow)
            .ok_or_else(|| CutflowError::Config(format!("unknown cut flow '{}'", flow)))?;
        let cut = target.replace(old, with)?;
        debug!(cut_flow = flow, old, new = cut.name(), "cut replaced");
        self.defined_cuts.push(cut);
        Ok(())
    }

    /// Finds any standard or cut-flow cut by name.
    pub fn find_cut(&self, name: &str) -> Option<&Arc<Cut>> {
        self.defined_cuts.iter().find(|c| c.name() == name)
    }

    pub fn standard_cuts(&self) -> &[Arc<Cut>] {
        &self.standard_cuts
    }

    pub fn cut_flows(&self) -> &[CutFlow] {
        &self.cut_flows
    }

    /// Freezes the selection and books one histogram per kinematic
    /// variation and cut flow.
    pub fn build(self, catalog: &VariationCatalog) -> Result<AnalysisConfig> {
        if self.cut_flows.is_empty() {
            return Err(CutflowError::Config("no cut flow is enabled".to_string()));
        }
        let mut histograms = HashMap::new();
        for variation in catalog.all_kinematic() {
            for (index, flow) in self.cut_flows.iter().enumerate() {
                let labels = cut_labels(&self.standard_cuts, flow);
                histograms.insert(
                    (variation.clone(), index),
                    CutFlowHistogram::new(flow.name(), variation.clone(), labels),
                );
            }
        }
        info!(
            event = "analysis_config_built",
            cut_flows = self.cut_flows.len() as u64,
            standard_cuts = self.standard_cuts.len() as u64,
            histograms = histograms.len() as u64,
        );
        Ok(AnalysisConfig {
            standard_cuts: self.standard_cuts,
            cut_flows: self.cut_flows,
            defined_cuts: self.defined_cuts,
            histograms,
        })
    }
}

fn cut_labels(standard_cuts: &[Arc<Cut>], flow: &CutFlow) -> Vec<String> {
    std::iter::once("Initial".to_string())
        .chain(standard_cuts.iter().map(|c| c.name().to_string()))
        .chain(flow.cuts().iter().map(|c| c.name().to_string()))
        .collect()
}

/// The frozen selection applied to every event.
#[derive(Debug)]
pub struct AnalysisConfig {
    standard_cuts: Vec<Arc<Cut>>,
    cut_flows: Vec<CutFlow>,
    defined_cuts: Vec<Arc<Cut>>,
    histograms: HashMap<(Variation, usize), CutFlowHistogram>,
}

impl AnalysisConfig {
    /// Applies the selection to the event in `ctx`.
    ///
    /// Skim and event-dump modes reject the event when a standard cut
    /// fails and accept it when any cut flow fully passes. Monitor mode
    /// fills the histogram of every cut flow for the context's variation
    /// with `1 + passed standard cuts + reached cuts`; cut flows are not
    /// evaluated past a failed standard cut.
    ///
    /// # Errors
    ///
    /// [`CutflowError::UnknownVariation`] when monitoring a variation
    /// without histograms.
    pub fn apply(&mut self, ctx: &EvalContext<'_>, mode: ApplyMode) -> Result<bool> {
        let monitor = mode == ApplyMode::Monitor;
        let (start, standard_passed) = self.standard_bin(ctx, monitor);
        if !standard_passed && !monitor {
            debug!(variation = %ctx.variation, "standard cuts failed");
            return Ok(false);
        }

        let mut accepted = false;
        for (index, flow) in self.cut_flows.iter().enumerate() {
            let outcome = if standard_passed {
                flow.evaluate(ctx, monitor)
            } else {
                FlowOutcome::default()
            };
            if monitor {
                let histogram = self
                    .histograms
                    .get_mut(&(ctx.variation.clone(), index))
                    .ok_or_else(|| CutflowError::UnknownVariation(ctx.variation.to_string()))?;
                histogram.fill_bin(start + outcome.reached, ctx.weight);
            }
            if outcome.passed {
                debug!(cut_flow = flow.name(), variation = %ctx.variation, "cut flow passed");
                if mode == ApplyMode::EventDump {
                    return Ok(true);
                }
                accepted = true;
            }
        }
        Ok(accepted)
    }

    /// 1 plus the number of standard cuts passed in a row, and whether all
    /// of them passed.
    fn standard_bin(&self, ctx: &EvalContext<'_>, monitor: bool) -> (usize, bool) {
        let mut bin = 1;
        for cut in &self.standard_cuts {
            if !cut.apply(ctx, monitor) {
                debug!(cut = cut.name(), "standard cut failed");
                return (bin, false);
            }
            bin += 1;
        }
        (bin, true)
    }

    /// Standard cut names followed by the cuts of every flow with `hash`.
    pub fn cut_names(&self, hash: u64) -> Vec<String> {
        self.standard_cuts
            .iter()
            .map(|c| c.name().to_string())
            .chain(
                self.cut_flows
                    .iter()
                    .filter(|f| f.hash() == hash)
                    .flat_map(|f| f.cuts().iter().map(|c| c.name().to_string())),
            )
            .collect()
    }

    pub fn histogram(&self, variation: &Variation, flow: &str) -> Option<&CutFlowHistogram> {
        let index = self.cut_flows.iter().position(|f| f.name() == flow)?;
        self.histograms.get(&(variation.clone(), index))
    }

    /// Every histogram, ordered by variation and cut flow.
    pub fn histograms(&self) -> Vec<&CutFlowHistogram> {
        let mut keys: Vec<_> = self.histograms.keys().collect();
        keys.sort();
        keys.into_iter().filter_map(|k| self.histograms.get(k)).collect()
    }

    pub fn standard_cuts(&self) -> &[Arc<Cut>] {
        &self.standard_cuts
    }

    pub fn cut_flows(&self) -> &[CutFlow] {
        &self.cut_flows
    }

    pub fn find_cut(&self, name: &str) -> Option<&Arc<Cut>> {
        self.defined_cuts.iter().find(|c| c.name() == name)
    }
}
