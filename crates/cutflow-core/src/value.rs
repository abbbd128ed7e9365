//! Tagged per-event values.

use std::fmt;

use crate::error::{CutflowError, Result};

/// Declared kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ValueKind {
    Int,
    Float,
    Char,
    IntVec,
    FloatVec,
    CharVec,
}

impl ValueKind {
    pub fn is_vector(self) -> bool {
        matches!(self, ValueKind::IntVec | ValueKind::FloatVec | ValueKind::CharVec)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Char => "char",
            ValueKind::IntVec => "vector<int>",
            ValueKind::FloatVec => "vector<float>",
            ValueKind::CharVec => "vector<char>",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value stored in a variable or read from an element field.
///
/// Booleans are stored as `Char(0)` / `Char(1)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Char(u8),
    IntVec(Vec<i64>),
    FloatVec(Vec<f64>),
    CharVec(Vec<u8>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Char(_) => ValueKind::Char,
            Value::IntVec(_) => ValueKind::IntVec,
            Value::FloatVec(_) => ValueKind::FloatVec,
            Value::CharVec(_) => ValueKind::CharVec,
        }
    }

    /// The value a reader falls back to when nothing was written.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Char => Value::Char(0),
            ValueKind::IntVec => Value::IntVec(Vec::new()),
            ValueKind::FloatVec => Value::FloatVec(Vec::new()),
            ValueKind::CharVec => Value::CharVec(Vec::new()),
        }
    }

    /// Fails with [`CutflowError::TypeMismatch`] naming `name` unless the
    /// value carries `expected`.
    pub fn ensure_kind(&self, name: &str, expected: ValueKind) -> Result<()> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(CutflowError::TypeMismatch {
                name: name.to_string(),
                expected: expected.to_string(),
                found: self.kind().to_string(),
            })
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<u8> {
        match self {
            Value::Char(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_char().map(|c| c != 0)
    }

    pub fn as_int_vec(&self) -> Option<&[i64]> {
        match self {
            Value::IntVec(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float_vec(&self) -> Option<&[f64]> {
        match self {
            Value::FloatVec(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_char_vec(&self) -> Option<&[u8]> {
        match self {
            Value::CharVec(v) => Some(v),
            _ => None,
        }
    }

    /// Typed read of an `Int` value.
    pub fn to_int(&self, name: &str) -> Result<i64> {
        self.ensure_kind(name, ValueKind::Int)?;
        Ok(self.as_int().unwrap_or_default())
    }

    /// Typed read of a `Float` value.
    pub fn to_float(&self, name: &str) -> Result<f64> {
        self.ensure_kind(name, ValueKind::Float)?;
        Ok(self.as_float().unwrap_or_default())
    }

    /// Typed read of a `Char` value.
    pub fn to_char(&self, name: &str) -> Result<u8> {
        self.ensure_kind(name, ValueKind::Char)?;
        Ok(self.as_char().unwrap_or_default())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Char(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Char(v as u8)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntVec(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::FloatVec(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::CharVec(v)
    }
}
