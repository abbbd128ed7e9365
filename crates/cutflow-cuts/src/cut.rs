//! A single cut and its evaluation.

use std::fmt;

use tracing::{debug, error};

use cutflow_core::{CutKind, CutflowError, Result, Value, Variation};
use cutflow_storage::{ContainerHandle, RegistryDirectory, ScopeRef, VariableHandle};

use crate::grammar::{parse_condition, parse_target, CutTarget};
use crate::relation::{canonicalize, Combine, Relation, Threshold};

/// Per-evaluation inputs: the directory holding this event's values, the
/// variation being evaluated and the event weight.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub directory: &'a RegistryDirectory,
    pub variation: &'a Variation,
    pub weight: f64,
}

impl<'a> EvalContext<'a> {
    pub fn new(directory: &'a RegistryDirectory, variation: &'a Variation) -> Self {
        Self {
            directory,
            variation,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

impl fmt::Debug for EvalContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("variation", self.variation)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Where a leaf cut reads its value from. Resolved once at setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    Variable(VariableHandle),
    Element {
        container: ContainerHandle,
        field: String,
        index: usize,
    },
}

#[derive(Debug)]
enum CutNode {
    Pending,
    Leaf {
        accessor: Accessor,
        relation: Relation,
        threshold: Threshold,
    },
    And(Box<Cut>, Box<Cut>),
    Or(Box<Cut>, Box<Cut>),
}

/// A named predicate on one event.
///
/// Cuts start out pending and are bound with one of the `initialize`
/// methods. Skimming cuts take part in skim decisions; the others only
/// count in monitor mode.
#[derive(Debug)]
pub struct Cut {
    name: String,
    kind: CutKind,
    skimming: bool,
    node: CutNode,
}

impl Cut {
    pub fn new(name: impl Into<String>, kind: CutKind, skimming: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            skimming,
            node: CutNode::Pending,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CutKind {
        self.kind
    }

    pub fn is_skimming(&self) -> bool {
        self.skimming
    }

    /// Whether the cut, and every cut it was combined from, is bound.
    pub fn is_initialized(&self) -> bool {
        match &self.node {
            CutNode::Pending => false,
            CutNode::Leaf { .. } => true,
            CutNode::And(left, right) | CutNode::Or(left, right) => {
                left.is_initialized() && right.is_initialized()
            }
        }
    }

    /// The bound accessor, relation and threshold of a leaf cut.
    pub fn leaf(&self) -> Option<(&Accessor, Relation, Threshold)> {
        match &self.node {
            CutNode::Leaf {
                accessor,
                relation,
                threshold,
            } => Some((accessor, *relation, *threshold)),
            _ => None,
        }
    }

    /// Binds a scalar cut to a variable.
    ///
    /// # Errors
    ///
    /// Fails for element cut kinds, for a cut that is already bound, for a
    /// stale handle and when the variable kind does not match the cut kind.
    pub fn initialize(
        &mut self,
        directory: &RegistryDirectory,
        handle: VariableHandle,
        threshold: impl Into<Threshold>,
        relation: Relation,
    ) -> Result<()> {
        self.check_pending()?;
        if self.kind.is_element() {
            return Err(CutflowError::Config(format!(
                "cut '{}' of kind {} must be bound to a container element",
                self.name, self.kind
            )));
        }
        let variable = directory.variable(handle)?;
        if variable.kind() != self.kind.value_kind() {
            return Err(CutflowError::TypeMismatch {
                name: format!("{} (cut '{}')", variable.name(), self.name),
                expected: self.kind.value_kind().to_string(),
                found: variable.kind().to_string(),
            });
        }
        let threshold = threshold.into().coerce(self.kind, &self.name)?;
        self.node = CutNode::Leaf {
            accessor: Accessor::Variable(handle),
            relation,
            threshold,
        };
        Ok(())
    }

    /// Binds an element cut to `field` of element `index` of a container.
    pub fn initialize_element(
        &mut self,
        directory: &RegistryDirectory,
        container: ContainerHandle,
        field: &str,
        index: usize,
        threshold: impl Into<Threshold>,
        relation: Relation,
    ) -> Result<()> {
        self.check_pending()?;
        if !self.kind.is_element() {
            return Err(CutflowError::Config(format!(
                "cut '{}' of kind {} must be bound to a scalar variable",
                self.name, self.kind
            )));
        }
        let store = directory.container(container)?;
        if let Some(branch) = store.branches().iter().find(|b| b.name == field) {
            if branch.kind != self.kind.value_kind() {
                return Err(CutflowError::TypeMismatch {
                    name: format!("{}.{} (cut '{}')", store.name(), field, self.name),
                    expected: self.kind.value_kind().to_string(),
                    found: branch.kind.to_string(),
                });
            }
        }
        let threshold = threshold.into().coerce(self.kind, &self.name)?;
        self.node = CutNode::Leaf {
            accessor: Accessor::Element {
                container,
                field: field.to_string(),
                index,
            },
            relation,
            threshold,
        };
        Ok(())
    }

    /// Binds the cut from a target such as `N_Jets` or `Muon pt[0]` and a
    /// condition such as `>=2`, resolving names visible from `scope`.
    ///
    /// Inclusive relations are rewritten before binding. Integral kinds
    /// read `>=N` as `>N-1` and `<=N` as `<N+1`; float kinds read `>=` as
    /// `>` and `<=` as `<`.
    pub fn initialize_from_str(
        &mut self,
        directory: &RegistryDirectory,
        scope: ScopeRef,
        target: &str,
        condition: &str,
    ) -> Result<()> {
        let target = parse_target(target)?;
        let condition = parse_condition(condition)?;
        let threshold = condition.threshold.coerce(self.kind, &self.name)?;
        let (relation, threshold) = canonicalize(condition.relation, threshold);

        match target {
            CutTarget::Variable(name) => {
                let handle = directory
                    .resolve_variable(scope, &name)
                    .ok_or(CutflowError::UnknownVariable(name))?;
                self.initialize(directory, handle, threshold, relation)
            }
            CutTarget::Element {
                container,
                field,
                index,
            } => {
                let handle = directory
                    .resolve_container(scope, &container)
                    .ok_or(CutflowError::UnknownVariable(container))?;
                self.initialize_element(directory, handle, &field, index, threshold, relation)
            }
        }
    }

    fn check_pending(&self) -> Result<()> {
        if matches!(self.node, CutNode::Pending) {
            Ok(())
        } else {
            Err(CutflowError::Config(format!(
                "cut '{}' is already initialized",
                self.name
            )))
        }
    }

    /// Merges two cuts into one. Both are consumed, so neither can be
    /// added to a cut flow on its own afterwards.
    ///
    /// The result is skimming when either input is.
    pub fn combine(self, other: Cut, op: Combine) -> Cut {
        let name = format!("{} {} {}", self.name, op, other.name);
        let kind = self.kind;
        let skimming = self.skimming || other.skimming;
        let (left, right) = (Box::new(self), Box::new(other));
        let node = match op {
            Combine::And => CutNode::And(left, right),
            Combine::Or => CutNode::Or(left, right),
        };
        Cut {
            name,
            kind,
            skimming,
            node,
        }
    }

    /// Evaluates the cut for the context's variation.
    ///
    /// Outside monitor mode non-skimming cuts pass. A value that was not
    /// produced for this event is logged and counts as a failure.
    pub fn apply(&self, ctx: &EvalContext<'_>, monitor: bool) -> bool {
        if !monitor && !self.skimming {
            return true;
        }
        self.eval_node(ctx)
    }

    /// Evaluates the predicate regardless of the skimming flag. Operands of
    /// a combined cut are decided by the combined cut's own flag.
    fn eval_node(&self, ctx: &EvalContext<'_>) -> bool {
        match &self.node {
            CutNode::Pending => {
                error!(cut = %self.name, "cut evaluated before initialization");
                false
            }
            CutNode::Leaf {
                accessor,
                relation,
                threshold,
            } => self.apply_leaf(ctx, accessor, *relation, *threshold),
            CutNode::And(left, right) => left.eval_node(ctx) && right.eval_node(ctx),
            CutNode::Or(left, right) => left.eval_node(ctx) || right.eval_node(ctx),
        }
    }

    fn apply_leaf(&self, ctx: &EvalContext<'_>, accessor: &Accessor, relation: Relation, threshold: Threshold) -> bool {
        match accessor {
            Accessor::Variable(handle) => match ctx.directory.read(*handle, ctx.variation) {
                Ok(value) => self.compare(value, relation, threshold),
                Err(err) => {
                    error!(cut = %self.name, variation = %ctx.variation, error = %err, "cut value unavailable");
                    false
                }
            },
            Accessor::Element {
                container,
                field,
                index,
            } => match ctx
                .directory
                .element_field(*container, ctx.variation, *index, field)
            {
                Ok(Some(value)) => self.compare(&value, relation, threshold),
                Ok(None) => {
                    debug!(cut = %self.name, index = *index as u64, field = %field, "element not available");
                    false
                }
                Err(err) => {
                    error!(cut = %self.name, variation = %ctx.variation, error = %err, "cut value unavailable");
                    false
                }
            },
        }
    }

    fn compare(&self, value: &Value, relation: Relation, threshold: Threshold) -> bool {
        let outcome = match (threshold, value) {
            (Threshold::Int(t), Value::Int(v)) => Some(relation.holds(*v, t)),
            (Threshold::Int(t), Value::Char(v)) => Some(relation.holds(i64::from(*v), t)),
            (Threshold::Float(t), Value::Float(v)) => Some(relation.holds(*v, t)),
            (Threshold::Float(t), Value::Int(v)) => Some(relation.holds(*v as f64, t)),
            _ => None,
        };
        outcome.unwrap_or_else(|| {
            error!(cut = %self.name, kind = %self.kind, found = %value.kind(), "cut value has the wrong kind");
            false
        })
    }
}
