//! Configuration system for cutflow.
//!
//! Load the job configuration (systematics settings, cut definitions and
//! particle eta exclusions) from TOML or YAML without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use cutflow_config::JobConfig;
//! use cutflow_core::CutKind;
//!
//! let config = JobConfig::from_toml_str(r#"
//!     [systematics]
//!     do_syst = false
//!
//!     [selection]
//!     active_cut_flows = ["MyCutFlow"]
//!
//!     [[selection.standard_cuts]]
//!     name = "PassGRL"
//!     kind = "char"
//!     target = "PassGRL"
//!     condition = "==1"
//!
//!     [[selection.cut_flows]]
//!     name = "MyCutFlow"
//!
//!     [[selection.cut_flows.cuts]]
//!     name = ">= 2 jets"
//!     kind = "int"
//!     target = "N_Jets"
//!     condition = ">=2"
//! "#).unwrap();
//!
//! assert!(!config.systematics.do_syst);
//! assert_eq!(config.selection.cut_flows[0].cuts[0].kind, CutKind::Int);
//! assert!(config.selection.cut_flows[0].cuts[0].skimming);
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use cutflow_config::JobConfig;
//!
//! let config = JobConfig::load("cutflow.toml").unwrap_or_default();
//! assert!(config.systematics.do_weights);
//! ```

mod eta;


pub use eta::{EtaRange, EtaRanges};

use std::collections::HashSet;
use std::path::Path;

use cutflow_core::{CutKind, SelectionObject};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main job configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JobConfig {
    /// Analysis naming.
    #[serde(default)]
    pub analysis: AnalysisSection,

    /// Systematic variation settings.
    #[serde(default)]
    pub systematics: SystematicsConfig,

    /// Standard cuts and cut flows.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Particle-level selection settings.
    #[serde(default)]
    pub particles: ParticlesConfig,
}

impl JobConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Disables systematic variations, keeping only the nominal one.
    pub fn with_nominal_only(mut self) -> Self {
        self.systematics.do_syst = false;
        self
    }

    /// Marks the input as collision data.
    pub fn with_data(mut self, is_data: bool) -> Self {
        self.systematics.is_data = is_data;
        self
    }

    /// Adds a cut flow definition.
    pub fn with_cut_flow(mut self, cut_flow: CutFlowDef) -> Self {
        self.selection.cut_flows.push(cut_flow);
        self
    }

    /// Adds a standard cut applied before every cut flow.
    pub fn with_standard_cut(mut self, cut: CutDef) -> Self {
        self.selection.standard_cuts.push(cut);
        self
    }

    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for systematics requested on data,
    /// duplicate cut flow names, unnamed cuts or malformed eta ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.systematics.do_syst && self.systematics.is_data {
            return Err(ConfigError::Invalid(
                "systematics cannot be evaluated on data".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for flow in &self.selection.cut_flows {
            if flow.name.is_empty() {
                return Err(ConfigError::Invalid("cut flow without a name".to_string()));
            }
            if !seen.insert(flow.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "cut flow '{}' is defined twice",
                    flow.name
                )));
            }
        }

        let all_cuts = self
            .selection
            .standard_cuts
            .iter()
            .chain(self.selection.cut_flows.iter().flat_map(|f| f.cuts.iter()));
        for cut in all_cuts {
            cut.validate()?;
        }

        self.particles.baseline_eta_ranges()?;
        self.particles.signal_eta_ranges()?;
        Ok(())
    }
}

/// Analysis naming.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct AnalysisSection {
    /// Analysis name used in log output.
    pub name: String,

    /// Name of the per-variation output tree.
    pub tree_name: String,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            name: "Analysis".to_string(),
            tree_name: "CutflowTree".to_string(),
        }
    }
}

/// Systematic variation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SystematicsConfig {
    /// Evaluate variations other than the nominal one.
    pub do_syst: bool,

    /// Evaluate weight variations.
    pub do_weights: bool,

    /// Input is collision data (no truth, no systematics).
    pub is_data: bool,

    /// Object types whose variations are ignored.
    pub disabled_objects: Vec<SelectionObject>,

    /// Variation names that are never registered.
    pub prune: Vec<String>,
}

impl Default for SystematicsConfig {
    fn default() -> Self {
        Self {
            do_syst: true,
            do_weights: true,
            is_data: false,
            disabled_objects: vec![SelectionObject::DiTau, SelectionObject::TrackParticle],
            prune: Vec::new(),
        }
    }
}

impl SystematicsConfig {
    /// Whether variations of `object` are evaluated.
    pub fn processes(&self, object: SelectionObject) -> bool {
        !self.disabled_objects.contains(&object)
    }

    pub fn is_pruned(&self, name: &str) -> bool {
        self.prune.iter().any(|p| p == name)
    }
}

/// Standard cuts and cut flows.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SelectionConfig {
    /// Cut flows to enable. Empty enables every defined cut flow.
    #[serde(default)]
    pub active_cut_flows: Vec<String>,

    /// Cuts applied before every cut flow.
    #[serde(default)]
    pub standard_cuts: Vec<CutDef>,

    /// Named, ordered cut lists.
    #[serde(default)]
    pub cut_flows: Vec<CutFlowDef>,
}

/// One named cut flow.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CutFlowDef {
    pub name: String,

    #[serde(default)]
    pub cuts: Vec<CutDef>,
}

impl CutFlowDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cuts: Vec::new(),
        }
    }

    pub fn with_cut(mut self, cut: CutDef) -> Self {
        self.cuts.push(cut);
        self
    }
}

/// A cut defined by a target and a condition string.
///
/// `target` is either a variable name or `"<Container> <field>[<index>]"`,
/// `condition` is a relation followed by a number, e.g. `">=2"`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CutDef {
    pub name: String,

    pub kind: CutKind,

    pub target: String,

    pub condition: String,

    /// Whether the cut takes part in skimming decisions.
    #[serde(default = "default_true")]
    pub skimming: bool,

    /// Optional second cut combined with this one.
    #[serde(default)]
    pub combine: Option<CombineDef>,
}

impl CutDef {
    pub fn new(
        name: impl Into<String>,
        kind: CutKind,
        target: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            condition: condition.into(),
            skimming: true,
            combine: None,
        }
    }

    /// Marks the cut as monitor-only.
    pub fn non_skimming(mut self) -> Self {
        self.skimming = false;
        self
    }

    /// Combines this cut with `other`.
    pub fn combined_with(mut self, op: CombineOp, other: CutDef) -> Self {
        self.combine = Some(CombineDef {
            op,
            with: Box::new(other),
        });
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "cut on '{}' has no name",
                self.target
            )));
        }
        if self.target.trim().is_empty() || self.condition.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "cut '{}' needs both a target and a condition",
                self.name
            )));
        }
        match &self.combine {
            Some(combine) => combine.with.validate(),
            None => Ok(()),
        }
    }
}

/// Second operand of a combined cut.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CombineDef {
    pub op: CombineOp,
    pub with: Box<CutDef>,
}

/// Boolean combinator for two cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineOp {
    And,
    Or,
}

/// Particle-level selection settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ParticlesConfig {
    /// `"low;high"` eta ranges removed at baseline level.
    #[serde(default)]
    pub baseline_eta_exclude: Vec<String>,

    /// `"low;high"` eta ranges removed at signal level.
    #[serde(default)]
    pub signal_eta_exclude: Vec<String>,
}

impl ParticlesConfig {
    pub fn baseline_eta_ranges(&self) -> Result<EtaRanges, ConfigError> {
        EtaRanges::parse(&self.baseline_eta_exclude)
    }

    pub fn signal_eta_ranges(&self) -> Result<EtaRanges, ConfigError> {
        EtaRanges::parse(&self.signal_eta_exclude)
    }
}

fn default_true() -> bool {
    true
}
