//! Shared test fixtures for cutflow crates.
//!
//! This crate provides element types and collection helpers for testing.
//! It only depends on `cutflow-core` so every other crate can use it as a
//! dev-dependency without cycles.
//!
//! - [`particle`] - a counting test particle and copy helpers
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! cutflow-test = { workspace = true }
//! ```
//!
//! Then build collections from particles:
//!
//! ```
//! use cutflow_test::particle::{collection, copy_of, particle};
//!
//! let a = particle(25_000.0, 0.3);
//! let b = particle(40_000.0, -1.2);
//! let nominal = collection(&[a.clone(), b.clone()]);
//! let shifted = collection(&[copy_of(&a), copy_of(&b)]);
//! assert_eq!(nominal.len(), shifted.len());
//! ```

pub mod particle;

pub use particle::{collection, copy_of, particle, TestParticle};
