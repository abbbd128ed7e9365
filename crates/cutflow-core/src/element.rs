//! Collection elements and their identity.
//!
//! Containers hold shared element handles. Two handles denote the same
//! physics object when they point at the same allocation, optionally after
//! following each element's `copied_from` chain back to its original.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// One element of a per-event collection (a jet, a muon, ...).
pub trait Element: fmt::Debug + Send + Sync {
    /// Reads a named attribute; `None` when the element has no such field.
    fn field(&self, name: &str) -> Option<Value>;

    /// The element this one was shallow-copied from, if any.
    fn copied_from(&self) -> Option<ElementRef> {
        None
    }
}

pub type ElementRef = Arc<dyn Element>;

/// A per-event collection. Cloning shares the underlying vector.
pub type Collection = Arc<Vec<ElementRef>>;

/// Identity predicate on element handles.
pub trait ObjectMatcher: Send + Sync {
    fn same_object(&self, a: &ElementRef, b: &ElementRef, through_copies: bool) -> bool;
}

/// Pointer identity, resolving copy chains on request.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMatcher;

impl ObjectMatcher for IdentityMatcher {
    fn same_object(&self, a: &ElementRef, b: &ElementRef, through_copies: bool) -> bool {
        same_object(a, b, through_copies)
    }
}

/// Returns true when `a` and `b` are the same allocation, or, with
/// `through_copies`, when both copy chains end at the same original.
pub fn same_object(a: &ElementRef, b: &ElementRef, through_copies: bool) -> bool {
    if std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)) {
        return true;
    }
    if !through_copies {
        return false;
    }
    let (oa, ob) = (original(a), original(b));
    std::ptr::addr_eq(Arc::as_ptr(&oa), Arc::as_ptr(&ob))
}

fn original(element: &ElementRef) -> ElementRef {
    let mut current = Arc::clone(element);
    while let Some(parent) = current.copied_from() {
        current = parent;
    }
    current
}
