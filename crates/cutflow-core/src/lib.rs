//! cutflow core - shared vocabulary for the variation storage and cut engine
//!
//! This crate provides the types every other cutflow crate speaks:
//! - [`Variation`] identifiers, with the empty name as the nominal variation
//! - [`Value`] and [`ValueKind`], the tagged per-event payloads
//! - [`SelectionObject`] and [`CutKind`] tags
//! - [`Element`] handles and the [`ObjectMatcher`] identity predicate
//! - [`CutflowError`], the error taxonomy of the whole workspace

pub mod element;
pub mod error;
pub mod object;
pub mod value;
pub mod variation;


pub use element::{same_object, Collection, Element, ElementRef, IdentityMatcher, ObjectMatcher};
pub use error::{CutflowError, Result};
pub use object::{CutKind, SelectionObject};
pub use value::{Value, ValueKind};
pub use variation::Variation;
