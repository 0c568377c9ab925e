//! # Build CLI: Load scan results and export the index.
//!
//! ```bash
//! recco build --data scans.csv --out index.json --feature-table table.json
//! ```
//!
//! Prints the build summary as JSON. Malformed rows and skipped resource
//! groups are reported in the summary and logged; they do not fail the
//! build unless the engine config is strict.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use recco_engine::export;

use crate::{print_json, GlobalOpts};

/// Build subcommand arguments.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Scan-result CSV.
    #[arg(long)]
    pub data: PathBuf,

    /// Write the category index JSON here.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Write the feature combination table JSON here.
    #[arg(long)]
    pub feature_table: Option<PathBuf>,
}

/// Execute the build subcommand.
pub fn run_build(args: &BuildArgs, opts: &GlobalOpts) -> Result<u8> {
    let snapshot = opts.snapshot(&args.data)?;

    if let Some(out) = &args.out {
        export::write_category_index(out, snapshot.tables())
            .with_context(|| format!("failed to write {}", out.display()))?;
    }
    if let Some(table) = &args.feature_table {
        export::write_feature_table(table, snapshot.tables())
            .with_context(|| format!("failed to write {}", table.display()))?;
    }

    let summary = snapshot.summary();
    if !summary.build.skipped.is_empty() {
        tracing::warn!(
            skipped = summary.build.skipped.len(),
            "some resource groups were left out of the index"
        );
    }
    print_json(summary)?;
    Ok(0)
}
