//! # Scoring and Recommendation
//!
//! Read-only lookups against built [`IndexTables`]. Every lookup is by exact
//! set; there is no partial-match fallback.
//!
//! Name validation happens before lookup, so a name the catalog does not
//! know is reported as an unknown item, while a valid set that no resource
//! group ever exhibited is reported as not found.

use serde::{Deserialize, Serialize};

use recco_core::{Catalog, Counts, ItemKind, ItemSet, RecoError};

use crate::aggregate::{CategoryCombo, ComboSummary, FeatureCombo, IndexTables};

/// A feature combination ranked by failure rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCombo {
    /// Member features, sorted.
    pub features: Vec<String>,
    /// The combination's counters.
    pub info: Counts,
    /// `Fails / Totals`.
    pub failure_rate: f64,
}

impl RankedCombo {
    fn from_summary(summary: &ComboSummary) -> Self {
        Self {
            features: summary.features.clone(),
            info: summary.info,
            failure_rate: summary.info.failure_rate().unwrap_or(0.0),
        }
    }
}

/// Combined answer for one feature combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Recommendation {
    /// Feature combinations under the same category set, safest first.
    pub recommended_feature_groups: Vec<RankedCombo>,
    /// The queried features.
    pub current_feature_group: Vec<String>,
    /// 1-based position of the queried combination in the ranked list.
    pub ranking: Option<usize>,
    /// Passing rows of the queried combination.
    pub total_success_count: u64,
    /// Failing rows of the queried combination.
    pub total_fail_count: u64,
    /// Failure fraction of the queried combination.
    pub security_rating: f64,
    /// Failure percentage of the queried combination.
    pub failure_percentage: f64,
    /// Resource groups that exhibited exactly the queried combination.
    pub total_occurrences: u64,
    /// Category set the recommendations were drawn from.
    pub current_category_group: Vec<String>,
}

/// Query front-end over one catalog and one set of built tables.
#[derive(Debug, Clone, Copy)]
pub struct Recommender<'a> {
    catalog: &'a Catalog,
    tables: &'a IndexTables,
}

impl<'a> Recommender<'a> {
    /// Recommender over the given catalog and tables.
    pub fn new(catalog: &'a Catalog, tables: &'a IndexTables) -> Self {
        Self { catalog, tables }
    }

    /// Failure percentage of exactly this feature combination.
    pub fn feature_safety(&self, features: &ItemSet) -> Result<f64, RecoError> {
        let combo = self.feature_combo(features)?;
        Ok(combo.counts.failure_percentage().unwrap_or(0.0))
    }

    /// Failure percentage of the primary-category set of `features`.
    pub fn category_safety(&self, features: &ItemSet) -> Result<f64, RecoError> {
        let categories = self.primary_categories(features)?;
        self.category_safety_for(&categories)
    }

    /// Failure percentage of exactly this category combination.
    pub fn category_safety_for(&self, categories: &ItemSet) -> Result<f64, RecoError> {
        let combo = self.category_combo(categories)?;
        Ok(combo.counts.failure_percentage().unwrap_or(0.0))
    }

    /// Feature combinations filed under this category set, lowest failure
    /// rate first. Ties are ordered by feature list. A valid set with no
    /// indexed combinations gives an empty list.
    pub fn safest_feature_combos(&self, categories: &ItemSet) -> Result<Vec<RankedCombo>, RecoError> {
        self.validate(ItemKind::Category, categories)?;
        let mut ranked: Vec<RankedCombo> = self
            .tables
            .indexed_combos(categories)
            .iter()
            .map(RankedCombo::from_summary)
            .collect();
        ranked.sort_by(|a, b| {
            a.failure_rate
                .total_cmp(&b.failure_rate)
                .then_with(|| a.features.cmp(&b.features))
        });
        Ok(ranked)
    }

    /// Feature Combination entry for exactly this set.
    pub fn feature_combo(&self, features: &ItemSet) -> Result<&'a FeatureCombo, RecoError> {
        self.validate(ItemKind::Feature, features)?;
        self.tables
            .feature_combo(features)
            .ok_or_else(|| not_found(ItemKind::Feature, features))
    }

    /// Category Combination entry for exactly this set.
    pub fn category_combo(&self, categories: &ItemSet) -> Result<&'a CategoryCombo, RecoError> {
        self.validate(ItemKind::Category, categories)?;
        self.tables
            .category_combo(categories)
            .ok_or_else(|| not_found(ItemKind::Category, categories))
    }

    /// Recommendations under the primary-category set of `features`.
    pub fn recommend(&self, features: &ItemSet) -> Result<Recommendation, RecoError> {
        self.recommend_under(features, None)
    }

    /// Recommendations under `categories`, or under the primary-category set
    /// of `features` when none are given.
    pub fn recommend_under(
        &self,
        features: &ItemSet,
        categories: Option<&ItemSet>,
    ) -> Result<Recommendation, RecoError> {
        let combo = self.feature_combo(features)?;
        let categories = match categories {
            Some(categories) => categories.clone(),
            None => self.primary_categories(features)?,
        };
        let ranked = self.safest_feature_combos(&categories)?;
        let current = features.to_vec();
        let ranking = ranked
            .iter()
            .position(|r| r.features == current)
            .map(|idx| idx + 1);

        Ok(Recommendation {
            recommended_feature_groups: ranked,
            current_feature_group: current,
            ranking,
            total_success_count: combo.counts.success,
            total_fail_count: combo.counts.fails,
            security_rating: combo.counts.failure_rate().unwrap_or(0.0),
            failure_percentage: combo.counts.failure_percentage().unwrap_or(0.0),
            total_occurrences: combo.occurrences,
            current_category_group: categories.to_vec(),
        })
    }

    fn primary_categories(&self, features: &ItemSet) -> Result<ItemSet, RecoError> {
        self.validate(ItemKind::Feature, features)?;
        Ok(self.catalog.primary_categories(features)?)
    }

    fn validate(&self, kind: ItemKind, items: &ItemSet) -> Result<(), RecoError> {
        if items.is_empty() {
            return Err(RecoError::EmptyQuery(kind));
        }
        self.catalog.ensure_known(kind, items)?;
        Ok(())
    }
}

fn not_found(kind: ItemKind, items: &ItemSet) -> RecoError {
    RecoError::NotFound {
        kind,
        items: items.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::aggregate::build;
    use crate::loader::ResourceGroup;

    fn set(names: &[&str]) -> ItemSet {
        names.iter().copied().collect()
    }

    fn group(id: &str, features: &[&str], success: u64, fails: u64) -> (String, ResourceGroup) {
        (
            id.to_string(),
            ResourceGroup {
                features: set(features),
                counts: Counts::new(success, fails),
            },
        )
    }

    fn tables(entries: Vec<(String, ResourceGroup)>) -> IndexTables {
        let groups: BTreeMap<String, ResourceGroup> = entries.into_iter().collect();
        build(&groups, &Catalog::builtin()).unwrap().tables
    }

    #[test]
    fn feature_safety_one_fail_in_three() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![group("rg1", &["Storage", "KeyVault"], 2, 1)]);
        let pct = Recommender::new(&catalog, &tables)
            .feature_safety(&set(&["KeyVault", "Storage"]))
            .unwrap();
        assert!((pct - 33.33).abs() < 0.01, "got {pct}");
    }

    #[test]
    fn safest_orders_by_failure_rate() {
        let catalog = Catalog::builtin();
        // Both reduce to {Storage, Reporting} along some path.
        let tables = tables(vec![
            group("rg1", &["SQLDatabase", "StreamAnalytics"], 6, 4),
            group("rg2", &["CosmosDB", "DataLakeAnalytics"], 9, 1),
        ]);
        let ranked = Recommender::new(&catalog, &tables)
            .safest_feature_combos(&set(&["Storage", "Reporting"]))
            .unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].features, vec!["CosmosDB", "DataLakeAnalytics"]);
        assert!((ranked[0].failure_rate - 0.10).abs() < 1e-9);
        assert!((ranked[1].failure_rate - 0.40).abs() < 1e-9);
    }

    #[test]
    fn ties_are_ordered_by_features() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![
            group("rg1", &["Storage"], 1, 1),
            group("rg2", &["SQLDatabase"], 1, 1),
        ]);
        let ranked = Recommender::new(&catalog, &tables)
            .safest_feature_combos(&set(&["Storage"]))
            .unwrap();
        assert_eq!(ranked[0].features, vec!["SQLDatabase"]);
        assert_eq!(ranked[1].features, vec!["Storage"]);
    }

    #[test]
    fn unindexed_category_set_is_empty_not_error() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![group("rg1", &["Storage"], 1, 0)]);
        let ranked = Recommender::new(&catalog, &tables)
            .safest_feature_combos(&set(&["Cache"]))
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn unknown_feature_is_unknown_item() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![group("rg1", &["Storage"], 1, 0)]);
        let err = Recommender::new(&catalog, &tables)
            .feature_safety(&set(&["NotARealFeature"]))
            .unwrap_err();
        assert!(err.is_unknown_item(), "got {err:?}");
    }

    #[test]
    fn unknown_category_is_unknown_item() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![group("rg1", &["Storage"], 1, 0)]);
        let err = Recommender::new(&catalog, &tables)
            .safest_feature_combos(&set(&["Mainframe"]))
            .unwrap_err();
        assert!(err.is_unknown_item());
    }

    #[test]
    fn unseen_combination_is_not_found() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![group("rg1", &["Storage"], 1, 0)]);
        let err = Recommender::new(&catalog, &tables)
            .feature_safety(&set(&["Storage", "KeyVault"]))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn empty_query_is_rejected() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![group("rg1", &["Storage"], 1, 0)]);
        let err = Recommender::new(&catalog, &tables)
            .feature_safety(&ItemSet::new())
            .unwrap_err();
        assert!(matches!(err, RecoError::EmptyQuery(ItemKind::Feature)));
    }

    #[test]
    fn category_safety_uses_primary_categories() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![
            group("rg1", &["SQLDatabase"], 3, 1),
            group("rg2", &["Storage"], 1, 3),
        ]);
        let recommender = Recommender::new(&catalog, &tables);
        // Primary category of both is Storage: 4 fails of 8.
        let pct = recommender.category_safety(&set(&["SQLDatabase"])).unwrap();
        assert!((pct - 50.0).abs() < 1e-9);
        let direct = recommender
            .category_safety_for(&set(&["Storage"]))
            .unwrap();
        assert_eq!(pct, direct);
    }

    #[test]
    fn recommend_composes_payload() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![
            group("rg1", &["Storage"], 1, 3),
            group("rg2", &["Storage"], 0, 0),
            group("rg3", &["SQLDatabase"], 9, 1),
        ]);
        let rec = Recommender::new(&catalog, &tables)
            .recommend(&set(&["Storage"]))
            .unwrap();
        assert_eq!(rec.current_feature_group, vec!["Storage"]);
        assert_eq!(rec.current_category_group, vec!["Storage"]);
        assert_eq!(rec.total_success_count, 1);
        assert_eq!(rec.total_fail_count, 3);
        assert_eq!(rec.total_occurrences, 2);
        assert!((rec.security_rating - 0.75).abs() < 1e-9);
        assert!((rec.failure_percentage - 75.0).abs() < 1e-9);
        assert_eq!(rec.recommended_feature_groups[0].features, vec!["SQLDatabase"]);
        assert_eq!(rec.ranking, Some(2));
    }

    #[test]
    fn recommend_under_explicit_categories() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![group("rg1", &["Storage"], 1, 1)]);
        let rec = Recommender::new(&catalog, &tables)
            .recommend_under(&set(&["Storage"]), Some(&set(&["Reporting"])))
            .unwrap();
        assert_eq!(rec.current_category_group, vec!["Reporting"]);
        assert_eq!(rec.ranking, Some(1));
    }

    #[test]
    fn recommendation_uses_pascal_case_keys() {
        let catalog = Catalog::builtin();
        let tables = tables(vec![group("rg1", &["KeyVault"], 1, 0)]);
        let rec = Recommender::new(&catalog, &tables)
            .recommend(&set(&["KeyVault"]))
            .unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        for key in [
            "RecommendedFeatureGroups",
            "CurrentFeatureGroup",
            "Ranking",
            "TotalSuccessCount",
            "TotalFailCount",
            "SecurityRating",
            "FailurePercentage",
            "TotalOccurrences",
            "CurrentCategoryGroup",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
