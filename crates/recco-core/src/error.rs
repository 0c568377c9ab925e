//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used throughout the recco workspace. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Catalog errors name the offending item and its kind.
//! - Load errors carry the 1-based CSV line so operators can fix the input.
//! - `NotFound` is an expected query outcome, not a fault; callers match on
//!   it and report it rather than logging it as an error.

use thiserror::Error;

use crate::catalog::ItemKind;

/// Top-level error type for the recommendation engine.
#[derive(Error, Debug)]
pub enum RecoError {
    /// Catalog lookup or validation failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Dataset loading failed.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// The queried combination never occurred in the training data.
    #[error("no {kind} combination recorded for [{}]", items.join(", "))]
    NotFound {
        /// Whether features or categories were queried.
        kind: ItemKind,
        /// The queried names, sorted.
        items: Vec<String>,
    },

    /// A query was issued with no items.
    #[error("empty {0} query")]
    EmptyQuery(ItemKind),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecoError {
    /// True when this error reports an unknown feature or category name.
    pub fn is_unknown_item(&self) -> bool {
        matches!(self, Self::Catalog(CatalogError::UnknownItem { .. }))
    }

    /// True when this error reports a combination absent from the tables.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Error in catalog construction or lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A name is absent from the catalog.
    #[error("unknown {kind}: {name:?}")]
    UnknownItem {
        /// Feature or category namespace.
        kind: ItemKind,
        /// The name that failed to resolve.
        name: String,
    },

    /// A feature maps to no categories.
    #[error("feature {0:?} has no categories")]
    NoCategories(String),

    /// An assigned value is not prime.
    #[error("{kind} {name:?} is assigned {value}, which is not prime")]
    NotPrime {
        /// Feature or category namespace.
        kind: ItemKind,
        /// The item name.
        name: String,
        /// The offending value.
        value: u64,
    },

    /// The same prime is assigned to two items.
    #[error("prime {value} is assigned to both {first:?} and {second:?}")]
    DuplicatePrime {
        /// The reused value.
        value: u64,
        /// The item that claimed it first.
        first: String,
        /// The item that claimed it again.
        second: String,
    },

    /// The modulus does not exceed every assigned prime.
    #[error("modulus {modulus} must exceed every assigned prime (largest is {largest})")]
    ModulusTooSmall {
        /// Configured modulus.
        modulus: u64,
        /// Largest assigned prime.
        largest: u64,
    },
}

/// Error while reading the scan-result dataset.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The header lacks a required column.
    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),

    /// A single row could not be used.
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow {
        /// 1-based line number in the source file.
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },

    /// The CSV reader failed outside of any single row.
    #[error("csv error: {0}")]
    Csv(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
