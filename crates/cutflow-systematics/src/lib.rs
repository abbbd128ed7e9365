//! Systematic variations for cutflow.
//!
//! The [`VariationBroadcaster`] collects every variation the calibration
//! tools advertise, split by affected object and by "changes kinematics"
//! versus "changes only a weight". Once [`VariationBroadcaster::fix`] is
//! called the set is frozen into an immutable [`VariationCatalog`] that the
//! storage and the cut engine are configured against. At run time the
//! broadcaster forwards "activate variation X" to every registered
//! [`SystematicToolService`].
//!
//! # Example
//!
//! ```
//! use cutflow_config::SystematicsConfig;
//! use cutflow_core::{SelectionObject, Variation};
//! use cutflow_systematics::VariationBroadcaster;
//!
//! let mut broadcaster = VariationBroadcaster::new(SystematicsConfig::default());
//! broadcaster
//!     .insert_kinematic(&Variation::new("JET_JES__1up"), SelectionObject::Jet)
//!     .unwrap();
//! let catalog = broadcaster.fix().unwrap();
//!
//! let jets = catalog.kinematic(SelectionObject::Jet);
//! assert_eq!(jets.len(), 2);
//! assert!(jets[1].is_nominal());
//! assert!(catalog.all_kinematic()[0].is_nominal());
//! ```

mod broadcaster;
mod catalog;
mod service;


pub use broadcaster::VariationBroadcaster;
pub use catalog::VariationCatalog;
pub use service::{SystInfo, SystematicToolService};
