//! # recco-cli: CLI Tool for Combination Scoring
//!
//! Provides the `recco` command-line interface over the engine crate.
//!
//! ## Subcommands
//!
//! - `recco build`: Load scan results, build the index, export JSON.
//! - `recco score`: Failure percentage of a feature combination.
//! - `recco category-score`: Failure percentage of the primary-category set.
//! - `recco safest`: Feature combinations under a category set, safest first.
//! - `recco recommend`: Combined recommendation payload.
//!
//! ```bash
//! recco build --data scans.csv --out index.json
//! recco score --data scans.csv --features Storage,KeyVault
//! recco safest --data scans.csv --categories Storage,Reporting
//! ```

pub mod build;
pub mod query;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use recco_core::{Catalog, EngineConfig, ItemSet};
use recco_engine::Snapshot;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Engine config YAML.
    pub config: Option<PathBuf>,
    /// Catalog YAML. The builtin catalog is used when absent.
    pub catalog: Option<PathBuf>,
}

impl GlobalOpts {
    /// Load the catalog named by `--catalog`, or the builtin one.
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::load(path)
                .with_context(|| format!("failed to load catalog {}", path.display())),
            None => Ok(Catalog::builtin()),
        }
    }

    /// Load the engine config named by `--config`, or the defaults.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display())),
            None => Ok(EngineConfig::default()),
        }
    }

    /// Load `data` and build a snapshot from it.
    pub fn snapshot(&self, data: &Path) -> Result<Snapshot> {
        let catalog = Arc::new(self.catalog()?);
        let config = self.engine_config()?;
        Snapshot::from_path(catalog, data, &config)
            .with_context(|| format!("failed to build index from {}", data.display()))
    }
}

/// Turn a comma-split argument list into a set, trimming each name.
pub fn item_set(names: &[String]) -> ItemSet {
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{text}");
    Ok(())
}
