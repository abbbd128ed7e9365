//! cutflow - variation-aware event storage and cut-flow selection
//!
//! Register per-event variables once, write them once per systematic
//! variation, and run the same selection over every variation with
//! cut-flow histograms kept per variation.
//!
//! # Example
//!
//! ```rust
//! use cutflow::prelude::*;
//!
//! let config = JobConfig::new().with_nominal_only();
//! let mut job = AnalysisJob::new(config, Vec::new()).unwrap();
//!
//! let scope = ScopeRef::from(job.directory_mut().open_scope("Stop0L").unwrap());
//! let n_jets = job
//!     .directory_mut()
//!     .register_variable(scope, "N_Jets", ValueKind::Int, VariableOptions::default())
//!     .unwrap();
//!
//! let mut builder = job.builder(scope);
//! let mut jets = builder.new_skimming_cut(">= 2 jets", CutKind::Int);
//! jets.initialize_from_str(job.directory(), scope, "N_Jets", ">=2").unwrap();
//! builder.add_cut_flow(CutFlow::new("MyCutFlow").with_cut(jets)).unwrap();
//! job.finish_setup(builder).unwrap();
//!
//! let outcome = job
//!     .process_event(1, 1.0, false, |directory, variation| {
//!         directory.write(n_jets, variation, Value::Int(3))
//!     })
//!     .unwrap();
//! assert!(outcome.any_accepted());
//! ```

mod job;
mod standard;


pub use job::{AnalysisJob, EventOutcome};
pub use standard::{add_standard_cuts, STANDARD_CUTS};

// Shared vocabulary
pub use cutflow_core::{
    same_object, Collection, CutKind, CutflowError, Element, ElementRef, ObjectMatcher, Result,
    SelectionObject, Value, ValueKind, Variation,
};

// Configuration
pub use cutflow_config::{
    CombineOp, ConfigError, CutDef, CutFlowDef, EtaRanges, JobConfig, SelectionConfig,
    SystematicsConfig,
};

// Systematics
pub use cutflow_systematics::{
    SystInfo, SystematicToolService, VariationBroadcaster, VariationCatalog,
};

// Storage
pub use cutflow_storage::{
    sharing, ContainerHandle, OutputUnit, RegistryDirectory, ScopeRef, VariableHandle,
    VariableOptions, VariationGroup,
};

// Selection
pub use cutflow_cuts::{
    grammar, AnalysisConfig, AnalysisConfigBuilder, ApplyMode, Combine, Cut, CutFlow,
    CutFlowHistogram, EvalContext, Relation,
};

/// Console output, available with the `console` feature.
#[cfg(feature = "console")]
pub use cutflow_console as console;

pub mod prelude {
    pub use super::{AnalysisJob, EventOutcome};
    pub use super::{CutKind, CutflowError, Result, SelectionObject, Value, ValueKind, Variation};
    pub use super::{CutDef, CutFlowDef, JobConfig};
    pub use super::{RegistryDirectory, ScopeRef, VariableOptions};
    pub use super::{AnalysisConfigBuilder, ApplyMode, Combine, Cut, CutFlow, Relation};
}
