#![deny(missing_docs)]

//! # recco-core: Foundational Types for the Recommendation Engine
//!
//! This crate is the leaf of the recco workspace. It defines the catalog of
//! known features and categories, the identity scheme for unordered item
//! sets, the pass/fail counters every table aggregates, the engine
//! configuration, and the error hierarchy. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Exact keys, prime fingerprints.** Tables are keyed by [`ItemSet`], a
//!    canonical sorted set of names. The multiplicative prime-product
//!    [`Identity`] is carried alongside as a compact fingerprint and as the
//!    key of exported artifacts.
//!
//! 2. **Validated catalog.** A [`Catalog`] can only be constructed through
//!    [`Catalog::new()`], which rejects non-prime or reused values and
//!    features without categories. Every lookup of an unknown name is a
//!    typed [`CatalogError::UnknownItem`].
//!
//! 3. **Counters that cannot drift.** [`Counts::record()`] bumps the total
//!    and exactly one of fails/success, so `totals == fails + success`
//!    holds by construction.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `recco-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod catalog;
pub mod config;
pub mod counts;
pub mod error;
pub mod identity;

// Re-export primary types for ergonomic imports.
pub use catalog::{Catalog, CatalogSpec, FeatureSpec, ItemKind, DEFAULT_MODULUS};
pub use config::EngineConfig;
pub use counts::Counts;
pub use error::{CatalogError, LoadError, RecoError};
pub use identity::{Identity, ItemSet};
