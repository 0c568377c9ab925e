//! # Item-Set Identity
//!
//! Two ways to name an unordered set of features or categories:
//!
//! - [`ItemSet`] is the exact canonical key, the names themselves, sorted and
//!   deduplicated. Equality is set equality.
//! - [`Identity`] is the compact fingerprint, the product of each member's
//!   catalog prime, reduced modulo a large prime bound.
//!
//! ## Collision Model
//!
//! Multiplication modulo a fixed modulus commutes, so the identity is
//! independent of insertion order. Distinct sets *can* share an identity
//! once the product wraps the modulus; the fingerprint is probabilistic.
//! Every table in the engine is therefore keyed by `ItemSet`, and the
//! `Identity` is only ever used as a label (logs, exported JSON keys).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prime-product fingerprint of an unordered item set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(u64);

impl Identity {
    /// Identity of the empty set, the multiplicative unit.
    pub const EMPTY: Identity = Identity(1);

    /// Fold a sequence of primes into an identity.
    ///
    /// The caller is responsible for deduplicating items before resolving
    /// them to primes; this function multiplies every value it is given.
    pub fn fold(primes: impl IntoIterator<Item = u64>, modulus: u64) -> Self {
        primes
            .into_iter()
            .fold(Self::EMPTY, |acc, prime| acc.extend(prime, modulus))
    }

    /// Multiply one more prime into this identity.
    ///
    /// Computed in `u128`, so any modulus below 2^64 is overflow-free.
    pub fn extend(self, prime: u64, modulus: u64) -> Self {
        let product = (self.0 as u128 * prime as u128) % modulus as u128;
        Self(product as u64)
    }

    /// The raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Identity {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical, order-free set of item names.
///
/// Backed by a `BTreeSet`, so iteration is sorted and duplicates collapse on
/// insertion. `Ord` is derived, which gives tables keyed by `ItemSet` a
/// deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemSet(BTreeSet<String>);

impl ItemSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Insert a name. Returns `false` if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    /// Whether the set contains `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    /// Sorted names as an owned vector.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ItemSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ItemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        f.write_str("]")
    }
}
