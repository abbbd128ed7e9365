//! Relations, thresholds and cut combinators.

use std::fmt;

use cutflow_config::CombineOp;
use cutflow_core::{CutKind, CutflowError, Result};

/// Comparison between a value and a cut threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Equal => "==",
            Relation::NotEqual => "!=",
            Relation::Greater => ">",
            Relation::Less => "<",
            Relation::GreaterEqual => ">=",
            Relation::LessEqual => "<=",
        }
    }

    /// Whether `value <relation> threshold` holds.
    pub fn holds<T: PartialOrd>(self, value: T, threshold: T) -> bool {
        match self {
            Relation::Equal => value == threshold,
            Relation::NotEqual => value != threshold,
            Relation::Greater => value > threshold,
            Relation::Less => value < threshold,
            Relation::GreaterEqual => value >= threshold,
            Relation::LessEqual => value <= threshold,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Cut threshold. Integral cut kinds carry `Int`, float kinds `Float`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Int(i64),
    Float(f64),
}

impl Threshold {
    /// Converts the threshold to the representation `kind` compares with.
    ///
    /// Integers widen to floats for float kinds; a fractional threshold on
    /// an integral kind is refused.
    pub fn coerce(self, kind: CutKind, cut: &str) -> Result<Threshold> {
        match (self, kind.is_integral()) {
            (Threshold::Int(v), true) => Ok(Threshold::Int(v)),
            (Threshold::Int(v), false) => Ok(Threshold::Float(v as f64)),
            (Threshold::Float(v), false) => Ok(Threshold::Float(v)),
            (Threshold::Float(v), true) => Err(CutflowError::TypeMismatch {
                name: cut.to_string(),
                expected: format!("integral threshold for a {} cut", kind),
                found: v.to_string(),
            }),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Int(v) => write!(f, "{}", v),
            Threshold::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Threshold {
    fn from(v: i64) -> Self {
        Threshold::Int(v)
    }
}

impl From<i32> for Threshold {
    fn from(v: i32) -> Self {
        Threshold::Int(i64::from(v))
    }
}

impl From<u8> for Threshold {
    fn from(v: u8) -> Self {
        Threshold::Int(i64::from(v))
    }
}

impl From<f64> for Threshold {
    fn from(v: f64) -> Self {
        Threshold::Float(v)
    }
}

/// Rewrites inclusive relations parsed from cut strings.
///
/// Integral kinds turn `>= N` into `> N-1` and `<= N` into `< N+1`. Float
/// kinds turn `>=` into `>` and `<=` into `<` with the threshold unchanged,
/// so a float cut `>=50` rejects exactly 50. Existing selections rely on
/// this, keep it.
pub(crate) fn canonicalize(relation: Relation, threshold: Threshold) -> (Relation, Threshold) {
    match (relation, threshold) {
        (Relation::GreaterEqual, Threshold::Int(v)) => (Relation::Greater, Threshold::Int(v.saturating_sub(1))),
        (Relation::LessEqual, Threshold::Int(v)) => (Relation::Less, Threshold::Int(v.saturating_add(1))),
        (Relation::GreaterEqual, Threshold::Float(v)) => (Relation::Greater, Threshold::Float(v)),
        (Relation::LessEqual, Threshold::Float(v)) => (Relation::Less, Threshold::Float(v)),
        other => other,
    }
}

/// How two cuts are merged by [`Cut::combine`](crate::Cut::combine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combine {
    And,
    Or,
}

impl Combine {
    pub fn symbol(self) -> &'static str {
        match self {
            Combine::And => "&&",
            Combine::Or => "||",
        }
    }
}

impl From<CombineOp> for Combine {
    fn from(op: CombineOp) -> Self {
        match op {
            CombineOp::And => Combine::And,
            CombineOp::Or => Combine::Or,
        }
    }
}

impl fmt::Display for Combine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
