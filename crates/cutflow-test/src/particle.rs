//! Test particles.
//!
//! [`TestParticle`] counts field reads so tests can observe which cuts were
//! evaluated.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cutflow_core::{Collection, Element, ElementRef, Value};

/// A particle with the usual kinematic fields.
///
/// Exposes `pt`, `eta` (float), `charge` (int) and `signal` (char).
#[derive(Debug)]
pub struct TestParticle {
    pub pt: f64,
    pub eta: f64,
    pub charge: i64,
    pub signal: bool,
    parent: Option<ElementRef>,
    reads: AtomicUsize,
}

impl TestParticle {
    pub fn new(pt: f64, eta: f64) -> Self {
        Self {
            pt,
            eta,
            charge: 0,
            signal: false,
            parent: None,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn with_charge(mut self, charge: i64) -> Self {
        self.charge = charge;
        self
    }

    pub fn signal(mut self) -> Self {
        self.signal = true;
        self
    }

    /// Number of `field` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl Element for TestParticle {
    fn field(&self, name: &str) -> Option<Value> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        match name {
            "pt" => Some(Value::Float(self.pt)),
            "eta" => Some(Value::Float(self.eta)),
            "charge" => Some(Value::Int(self.charge)),
            "signal" => Some(Value::from(self.signal)),
            _ => None,
        }
    }

    fn copied_from(&self) -> Option<ElementRef> {
        self.parent.clone()
    }
}

/// A fresh particle behind an element handle.
pub fn particle(pt: f64, eta: f64) -> ElementRef {
    Arc::new(TestParticle::new(pt, eta))
}

/// A shallow copy of `original` that remembers where it came from.
pub fn copy_of(original: &ElementRef) -> ElementRef {
    let read_float = |name| {
        original
            .field(name)
            .and_then(|v| v.as_float())
            .unwrap_or_default()
    };
    Arc::new(TestParticle {
        parent: Some(Arc::clone(original)),
        ..TestParticle::new(read_float("pt"), read_float("eta"))
    })
}

/// Wraps handles into a collection.
pub fn collection(elements: &[ElementRef]) -> Collection {
    Arc::new(elements.to_vec())
}
