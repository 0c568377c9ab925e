//! # Aggregation Engine
//!
//! Builds the three read-only tables from grouped scan results:
//!
//! - **Feature Combination table**: one entry per distinct feature set seen
//!   in a resource group, with summed counters and an occurrence count.
//! - **Category Combination table**: one entry per category set reachable by
//!   expanding any feature combination, with summed counters.
//! - **Category index**: category set → summaries of the feature
//!   combinations filed under it.
//!
//! ## Build Order
//!
//! 1. Fold every resource group into the feature table.
//! 2. For each *distinct* feature combination, expand it to the distinct
//!    category sets its paths reduce to and credit each one once. The
//!    dedup is scoped to the one feature combination being processed, and
//!    paths are never materialised, so a resource group holding many
//!    multi-category features stays cheap.
//!
//! Tables are keyed by [`ItemSet`], so equality is exact. The prime-product
//! [`Identity`] is carried as a label for logs and exported JSON.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use recco_core::{Catalog, Counts, Identity, ItemKind, ItemSet, RecoError};

use crate::expander::CategoryExpander;
use crate::loader::ResourceGroup;

/// An entry of the Feature Combination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCombo {
    /// Member features.
    pub features: ItemSet,
    /// Prime-product label of `features`.
    pub identity: Identity,
    /// Counters summed over every resource group with exactly this set.
    pub counts: Counts,
    /// Number of resource groups with exactly this set.
    pub occurrences: u64,
}

/// An entry of the Category Combination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCombo {
    /// Member categories.
    pub categories: ItemSet,
    /// Prime-product label of `categories`.
    pub identity: Identity,
    /// Counters summed over every feature combination filed here.
    pub counts: Counts,
}

/// A feature combination as listed in the category index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboSummary {
    /// Member features, sorted.
    pub features: Vec<String>,
    /// The feature combination's own counters.
    pub info: Counts,
}

/// The three built tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexTables {
    feature_combos: BTreeMap<ItemSet, FeatureCombo>,
    category_combos: BTreeMap<ItemSet, CategoryCombo>,
    category_index: BTreeMap<ItemSet, Vec<ComboSummary>>,
}

impl IndexTables {
    /// The entry for exactly this feature set.
    pub fn feature_combo(&self, features: &ItemSet) -> Option<&FeatureCombo> {
        self.feature_combos.get(features)
    }

    /// The entry for exactly this category set.
    pub fn category_combo(&self, categories: &ItemSet) -> Option<&CategoryCombo> {
        self.category_combos.get(categories)
    }

    /// Feature combinations filed under this category set, in build order.
    pub fn indexed_combos(&self, categories: &ItemSet) -> &[ComboSummary] {
        self.category_index
            .get(categories)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Feature Combination table in key order.
    pub fn feature_combos(&self) -> impl Iterator<Item = &FeatureCombo> + '_ {
        self.feature_combos.values()
    }

    /// Category Combination table in key order.
    pub fn category_combos(&self) -> impl Iterator<Item = &CategoryCombo> + '_ {
        self.category_combos.values()
    }

    /// Category index in key order.
    pub fn category_index(&self) -> impl Iterator<Item = (&ItemSet, &[ComboSummary])> + '_ {
        self.category_index
            .iter()
            .map(|(categories, combos)| (categories, combos.as_slice()))
    }

    /// Distinct feature combinations.
    pub fn feature_combo_count(&self) -> usize {
        self.feature_combos.len()
    }

    /// Distinct category combinations.
    pub fn category_combo_count(&self) -> usize {
        self.category_combos.len()
    }

    /// True when no resource group was aggregated.
    pub fn is_empty(&self) -> bool {
        self.feature_combos.is_empty()
    }
}

/// A resource group left out of the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedGroup {
    /// The resource group id.
    pub resource_group_id: String,
    /// Why it was left out.
    pub reason: String,
}

/// Statistics of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Resource groups offered to the build.
    pub resource_groups: usize,
    /// Resource groups left out.
    pub skipped: Vec<SkippedGroup>,
    /// Distinct feature combinations.
    pub feature_combinations: usize,
    /// Distinct category combinations.
    pub category_combinations: usize,
}

/// Tables plus the report of the build that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// The built tables.
    pub tables: IndexTables,
    /// What happened during the build.
    pub report: BuildReport,
}

/// Build the tables from grouped scan results.
///
/// A resource group with an empty feature set or a feature missing from the
/// catalog is skipped and reported. A catalog that cannot expand a known
/// feature fails the whole build.
pub fn build(
    groups: &BTreeMap<String, ResourceGroup>,
    catalog: &Catalog,
) -> Result<BuildOutput, RecoError> {
    let mut tables = IndexTables::default();
    let mut report = BuildReport {
        resource_groups: groups.len(),
        ..BuildReport::default()
    };
    let mut labels = LabelGuard::default();

    for (id, group) in groups {
        if group.features.is_empty() {
            skip(&mut report, id, "empty feature set".to_string());
            continue;
        }
        let identity = match catalog.feature_identity(&group.features) {
            Ok(identity) => identity,
            Err(e) => {
                skip(&mut report, id, e.to_string());
                continue;
            }
        };
        match tables.feature_combos.get_mut(&group.features) {
            Some(combo) => {
                combo.counts.merge(&group.counts);
                combo.occurrences += 1;
            }
            None => {
                labels.check(ItemKind::Feature, identity, &group.features);
                tables.feature_combos.insert(
                    group.features.clone(),
                    FeatureCombo {
                        features: group.features.clone(),
                        identity,
                        counts: group.counts,
                        occurrences: 1,
                    },
                );
            }
        }
    }

    let expander = CategoryExpander::new(catalog);
    for combo in tables.feature_combos.values() {
        // Distinct sets only: each is credited once for this combination.
        let credited = expander.distinct_sets(&combo.features)?;
        debug!(features = %combo.features, category_sets = credited.len(), "expanding feature combination");
        for categories in credited {
            let identity = catalog.category_identity(&categories)?;
            match tables.category_combos.get_mut(&categories) {
                Some(entry) => entry.counts.merge(&combo.counts),
                None => {
                    labels.check(ItemKind::Category, identity, &categories);
                    tables.category_combos.insert(
                        categories.clone(),
                        CategoryCombo {
                            categories: categories.clone(),
                            identity,
                            counts: combo.counts,
                        },
                    );
                }
            }
            tables
                .category_index
                .entry(categories)
                .or_default()
                .push(ComboSummary {
                    features: combo.features.to_vec(),
                    info: combo.counts,
                });
        }
    }

    report.feature_combinations = tables.feature_combo_count();
    report.category_combinations = tables.category_combo_count();
    info!(
        resource_groups = report.resource_groups,
        skipped = report.skipped.len(),
        feature_combinations = report.feature_combinations,
        category_combinations = report.category_combinations,
        "built index tables"
    );
    Ok(BuildOutput { tables, report })
}

fn skip(report: &mut BuildReport, id: &str, reason: String) {
    warn!(resource_group = id, %reason, "skipping resource group");
    report.skipped.push(SkippedGroup {
        resource_group_id: id.to_string(),
        reason,
    });
}

/// Warns when two different sets fold to the same identity label.
#[derive(Default)]
struct LabelGuard {
    seen: HashMap<(ItemKind, Identity), ItemSet>,
}

impl LabelGuard {
    fn check(&mut self, kind: ItemKind, identity: Identity, items: &ItemSet) {
        match self.seen.get(&(kind, identity)) {
            Some(first) if first != items => {
                warn!(%kind, %identity, first = %first, second = %items, "identity label collision");
            }
            Some(_) => {}
            None => {
                self.seen.insert((kind, identity), items.clone());
            }
        }
    }
}
