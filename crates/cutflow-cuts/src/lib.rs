//! Cuts, cut flows and the selection engine for cutflow.
//!
//! A [`Cut`] is bound once at setup to a variable or to a field of a
//! container element, either in code or from a short string such as
//! `"N_Jets" ">=2"` or `"Muon pt[0]" ">=50000"`. Cuts are grouped into
//! ordered [`CutFlow`]s, and an [`AnalysisConfigBuilder`] freezes them into
//! an [`AnalysisConfig`] that decides whether an event is kept
//! ([`ApplyMode::Skim`]) and fills cut-flow histograms
//! ([`ApplyMode::Monitor`]).

mod cut;
mod engine;
mod flow;
pub mod grammar;
mod histogram;
mod relation;

#[cfg(test)]
mod cut_tests;
#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod grammar_tests;

pub use cut::{Accessor, Cut, EvalContext};
pub use engine::{AnalysisConfig, AnalysisConfigBuilder, ApplyMode};
pub use flow::{CutFlow, FlowOutcome};
pub use grammar::{parse_condition, parse_target, Condition, CutTarget};
pub use histogram::CutFlowHistogram;
pub use relation::{Combine, Relation, Threshold};
