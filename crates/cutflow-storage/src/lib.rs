//! Variation-aware variable storage for cutflow.
//!
//! Producers publish named per-event values through a
//! [`RegistryDirectory`]. Each value is kept once per variation in a
//! [`VariantCache`] stamped with the event generation, so stale entries are
//! detected instead of cleared. Containers tagged with a
//! [`VariationGroup`] are checked against their nominal counterpart when
//! filled for a variation that does not affect the group, which is what
//! lets the [`sharing`] rule write them once for many outputs.
//!
//! # Example
//!
//! ```
//! use cutflow_config::SystematicsConfig;
//! use cutflow_core::{Value, ValueKind, Variation};
//! use cutflow_storage::{RegistryDirectory, ScopeRef, VariableOptions};
//! use cutflow_systematics::VariationBroadcaster;
//!
//! let catalog = VariationBroadcaster::new(SystematicsConfig::default()).fix().unwrap();
//! let mut directory = RegistryDirectory::new(catalog);
//! let scope = ScopeRef::from(directory.open_scope("EventInfo").unwrap());
//! let n_jets = directory
//!     .register_variable(scope, "N_Jets", ValueKind::Int, VariableOptions::default())
//!     .unwrap();
//! directory.lock();
//!
//! directory.begin_event(1, false);
//! directory.write(n_jets, &Variation::nominal(), Value::Int(3)).unwrap();
//! assert_eq!(directory.read(n_jets, &Variation::nominal()).unwrap(), &Value::Int(3));
//!
//! directory.begin_event(2, false);
//! assert!(directory.read(n_jets, &Variation::nominal()).is_err());
//! ```

mod cache;
mod container;
mod directory;
mod group;
mod registry;
pub mod sharing;
mod variable;

#[cfg(test)]
mod sharing_tests;

pub use cache::{CacheSlot, VariantCache};
pub use container::{Branch, ContainerStore};
pub use directory::{ContainerHandle, EventInfo, RegistryDirectory, ScopeId, ScopeRef, VariableHandle};
pub use group::VariationGroup;
pub use registry::VariableRegistry;
pub use sharing::OutputUnit;
pub use variable::{Variable, VariableOptions};
