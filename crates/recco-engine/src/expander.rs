//! # Category Expander
//!
//! A feature may belong to several categories. A feature combination can
//! therefore be filed under every category combination obtained by picking
//! one category per feature. The expander enumerates those picks depth-first:
//! branch over the categories of the head feature, recurse on the tail, and
//! emit the accumulated path when no features remain.
//!
//! The number of paths is the product of the per-feature fan-outs. Feature
//! combinations observed in practice hold a handful of features, so the
//! enumeration stays small.
//!
//! Paths are ordered lists, one category per input feature. Reducing a path
//! to a set may merge entries (`SQLDatabase → Storage`, `Storage → Storage`
//! gives `{Storage}`); callers that credit category sets must dedup, or use
//! [`CategoryExpander::distinct_sets`], which never materialises the paths.

use std::collections::BTreeSet;

use recco_core::{Catalog, CatalogError, ItemSet};

/// Enumerates the category paths of a feature list.
#[derive(Debug, Clone, Copy)]
pub struct CategoryExpander<'a> {
    catalog: &'a Catalog,
}

impl<'a> CategoryExpander<'a> {
    /// Expander over the given catalog.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Every path, in depth-first order.
    ///
    /// Fails before enumerating anything if a feature is unknown or has no
    /// categories. An empty feature list yields one empty path.
    pub fn paths(&self, features: &[&str]) -> Result<Vec<Vec<String>>, CatalogError> {
        let mut out = Vec::new();
        self.visit(features, |path| {
            out.push(path.iter().map(|c| c.to_string()).collect());
        })?;
        Ok(out)
    }

    /// Every path of the set's features, reduced to a category set.
    ///
    /// One entry per path, so the same set can appear more than once.
    pub fn category_sets(&self, features: &ItemSet) -> Result<Vec<ItemSet>, CatalogError> {
        let names: Vec<&str> = features.iter().collect();
        let mut out = Vec::new();
        self.visit(&names, |path| {
            out.push(path.iter().copied().collect());
        })?;
        Ok(out)
    }

    /// The distinct category sets the paths of `features` reduce to, in
    /// sorted order.
    ///
    /// Equivalent to deduplicating [`category_sets`](Self::category_sets),
    /// but the frontier is deduplicated after every feature, so work and
    /// memory are bounded by the number of distinct sets rather than the
    /// number of paths.
    pub fn distinct_sets(&self, features: &ItemSet) -> Result<BTreeSet<ItemSet>, CatalogError> {
        let choices = features
            .iter()
            .map(|feature| self.catalog.categories_of(feature))
            .collect::<Result<Vec<_>, _>>()?;

        let mut frontier: BTreeSet<BTreeSet<&'a str>> = BTreeSet::new();
        frontier.insert(BTreeSet::new());
        for categories in choices {
            frontier = frontier
                .iter()
                .flat_map(|partial| {
                    categories.iter().map(move |category| {
                        let mut next = partial.clone();
                        next.insert(category.as_str());
                        next
                    })
                })
                .collect();
        }
        Ok(frontier
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect())
    }

    /// Number of paths `features` expands to.
    pub fn fan_out(&self, features: &[&str]) -> Result<usize, CatalogError> {
        features.iter().try_fold(1usize, |acc, feature| {
            Ok(acc.saturating_mul(self.catalog.categories_of(feature)?.len()))
        })
    }

    /// Call `visit` with each complete path.
    pub fn visit<F>(&self, features: &[&str], mut visit: F) -> Result<(), CatalogError>
    where
        F: FnMut(&[&str]),
    {
        let choices = features
            .iter()
            .map(|feature| self.catalog.categories_of(feature))
            .collect::<Result<Vec<_>, _>>()?;
        let mut path = Vec::with_capacity(choices.len());
        walk(&choices, &mut path, &mut visit);
        Ok(())
    }
}

fn walk<'c, F>(remaining: &[&'c [String]], path: &mut Vec<&'c str>, visit: &mut F)
where
    F: FnMut(&[&str]),
{
    match remaining.split_first() {
        None => visit(path),
        Some((head, tail)) => {
            for category in head.iter() {
                path.push(category.as_str());
                walk(tail, path, visit);
                path.pop();
            }
        }
    }
}
