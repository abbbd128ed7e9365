//! Ordered cut lists.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use cutflow_core::{CutflowError, Result};

use crate::cut::{Cut, EvalContext};

/// Result of running one cut flow over an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowOutcome {
    /// Number of cuts passed in a row from the start of the flow.
    pub reached: usize,
    /// Whether every cut passed.
    pub passed: bool,
}

/// A named, ordered list of cuts.
///
/// Cuts are shared, so cloning a flow copies the list, not the cuts.
#[derive(Debug, Clone)]
pub struct CutFlow {
    name: String,
    hash: u64,
    cuts: Vec<Arc<Cut>>,
}

impl CutFlow {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            name,
            cuts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier derived from the name.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn cuts(&self) -> &[Arc<Cut>] {
        &self.cuts
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn push(&mut self, cut: Cut) {
        self.cuts.push(Arc::new(cut));
    }

    /// Appends a cut that is also used elsewhere.
    pub fn push_shared(&mut self, cut: Arc<Cut>) {
        self.cuts.push(cut);
    }

    pub fn with_cut(mut self, cut: Cut) -> Self {
        self.push(cut);
        self
    }

    /// Replaces the cut named `old` in place and returns the new handle.
    pub fn replace(&mut self, old: &str, with: Cut) -> Result<Arc<Cut>> {
        let slot = self
            .cuts
            .iter_mut()
            .find(|c| c.name() == old)
            .ok_or_else(|| {
                CutflowError::Config(format!("cut flow '{}' has no cut '{}'", self.name, old))
            })?;
        let with = Arc::new(with);
        *slot = Arc::clone(&with);
        Ok(with)
    }

    /// Runs the cuts in order.
    ///
    /// Outside monitor mode evaluation stops at the first failing cut.
    /// In monitor mode every cut is evaluated and `reached` still counts
    /// only the passes before the first failure.
    pub fn evaluate(&self, ctx: &EvalContext<'_>, monitor: bool) -> FlowOutcome {
        let mut reached = 0;
        let mut passed = true;
        for cut in &self.cuts {
            if cut.apply(ctx, monitor) {
                if passed {
                    reached += 1;
                }
            } else {
                passed = false;
                if !monitor {
                    break;
                }
            }
        }
        FlowOutcome { reached, passed }
    }
}
