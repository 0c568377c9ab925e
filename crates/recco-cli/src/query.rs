//! # Query CLI: Scores and recommendations from a scan-result file.
//!
//! ```bash
//! recco score --data scans.csv --features Storage,KeyVault
//! recco category-score --data scans.csv --features SQLDatabase
//! recco safest --data scans.csv --categories Storage,Reporting
//! recco recommend --data scans.csv --features Storage
//! ```
//!
//! Exit codes: 0 on success, 2 when the combination was never observed,
//! 1 on any other failure.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use recco_core::RecoError;

use crate::{item_set, print_json, GlobalOpts};

/// Exit code for a valid query with no recorded combination.
pub const EXIT_NOT_FOUND: u8 = 2;

/// Arguments for queries keyed by features.
#[derive(Args, Debug)]
pub struct FeatureQueryArgs {
    /// Scan-result CSV.
    #[arg(long)]
    pub data: PathBuf,

    /// Comma-separated feature names.
    #[arg(long, value_delimiter = ',', required = true)]
    pub features: Vec<String>,
}

/// Arguments for queries keyed by categories.
#[derive(Args, Debug)]
pub struct CategoryQueryArgs {
    /// Scan-result CSV.
    #[arg(long)]
    pub data: PathBuf,

    /// Comma-separated category names.
    #[arg(long, value_delimiter = ',', required = true)]
    pub categories: Vec<String>,
}

/// `recco score`
pub fn run_score(args: &FeatureQueryArgs, opts: &GlobalOpts) -> Result<u8> {
    let snapshot = opts.snapshot(&args.data)?;
    let features = item_set(&args.features);
    report(
        snapshot
            .recommender()
            .feature_safety(&features)
            .map(|score| json!({ "features": features, "score": score })),
    )
}

/// `recco category-score`
pub fn run_category_score(args: &FeatureQueryArgs, opts: &GlobalOpts) -> Result<u8> {
    let snapshot = opts.snapshot(&args.data)?;
    let features = item_set(&args.features);
    let result = snapshot
        .catalog()
        .primary_categories(&features)
        .map_err(RecoError::from)
        .and_then(|categories| {
            let score = snapshot.recommender().category_safety_for(&categories)?;
            Ok(json!({ "categories": categories, "score": score }))
        });
    report(result)
}

/// `recco safest`
pub fn run_safest(args: &CategoryQueryArgs, opts: &GlobalOpts) -> Result<u8> {
    let snapshot = opts.snapshot(&args.data)?;
    let categories = item_set(&args.categories);
    report(snapshot.recommender().safest_feature_combos(&categories))
}

/// `recco recommend`
pub fn run_recommend(args: &FeatureQueryArgs, opts: &GlobalOpts) -> Result<u8> {
    let snapshot = opts.snapshot(&args.data)?;
    let features = item_set(&args.features);
    report(snapshot.recommender().recommend(&features))
}

/// Print a query result, mapping "never observed" to its own exit code.
fn report<T: serde::Serialize>(result: Result<T, RecoError>) -> Result<u8> {
    match result {
        Ok(value) => {
            print_json(&value)?;
            Ok(0)
        }
        Err(e) if e.is_not_found() => {
            eprintln!("{e}");
            Ok(EXIT_NOT_FOUND)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "ResourceGroupId,Feature,VerificationResult\n\
                       rg1,Storage,Passed\n\
                       rg1,KeyVault,Passed\n\
                       rg1,Storage,Failed\n";

    fn data(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("scan.csv");
        std::fs::write(&path, CSV).unwrap();
        path
    }

    fn feature_args(dir: &tempfile::TempDir, features: &[&str]) -> FeatureQueryArgs {
        FeatureQueryArgs {
            data: data(dir),
            features: features.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn score_known_combination_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let code = run_score(&feature_args(&dir, &["Storage", "KeyVault"]), &GlobalOpts::default())
            .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn score_unseen_combination_exits_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let code = run_score(&feature_args(&dir, &["Storage"]), &GlobalOpts::default()).unwrap();
        assert_eq!(code, EXIT_NOT_FOUND);
    }

    #[test]
    fn score_unknown_feature_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_score(&feature_args(&dir, &["NotARealFeature"]), &GlobalOpts::default())
            .unwrap_err();
        assert!(err.to_string().contains("NotARealFeature"));
    }

    #[test]
    fn category_score_uses_primary_categories() {
        let dir = tempfile::tempdir().unwrap();
        let code = run_category_score(
            &feature_args(&dir, &["Storage", "KeyVault"]),
            &GlobalOpts::default(),
        )
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn safest_unindexed_set_succeeds_with_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let args = CategoryQueryArgs {
            data: data(&dir),
            categories: vec!["Cache".to_string()],
        };
        assert_eq!(run_safest(&args, &GlobalOpts::default()).unwrap(), 0);
    }

    #[test]
    fn recommend_known_combination_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let code = run_recommend(&feature_args(&dir, &["KeyVault", "Storage"]), &GlobalOpts::default())
            .unwrap();
        assert_eq!(code, 0);
    }
}
