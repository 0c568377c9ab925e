//! # recco CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use recco_cli::build::{run_build, BuildArgs};
use recco_cli::query::{
    run_category_score, run_recommend, run_safest, run_score, CategoryQueryArgs, FeatureQueryArgs,
};
use recco_cli::GlobalOpts;

/// Feature-combination security scoring.
///
/// Aggregates historical scan results by the combination of features
/// deployed together, and recommends the combinations that fail least.
#[derive(Parser, Debug)]
#[command(name = "recco", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the engine configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to a catalog file (YAML). Defaults to the builtin catalog.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the index from scan results and optionally export it.
    Build(BuildArgs),

    /// Failure percentage of a feature combination.
    Score(FeatureQueryArgs),

    /// Failure percentage of the primary categories of a feature combination.
    CategoryScore(FeatureQueryArgs),

    /// Feature combinations under a category set, safest first.
    Safest(CategoryQueryArgs),

    /// Safest alternatives plus the record of a feature combination.
    Recommend(FeatureQueryArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let opts = GlobalOpts {
        config: cli.config,
        catalog: cli.catalog,
    };
    tracing::debug!(?opts, "recco CLI starting");

    let result = match &cli.command {
        Commands::Build(args) => run_build(args, &opts),
        Commands::Score(args) => run_score(args, &opts),
        Commands::CategoryScore(args) => run_category_score(args, &opts),
        Commands::Safest(args) => run_safest(args, &opts),
        Commands::Recommend(args) => run_recommend(args, &opts),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_build_with_exports() {
        let cli = Cli::try_parse_from([
            "recco",
            "build",
            "--data",
            "scan.csv",
            "--out",
            "index.json",
            "--feature-table",
            "table.json",
        ])
        .unwrap();
        if let Commands::Build(args) = cli.command {
            assert_eq!(args.data, PathBuf::from("scan.csv"));
            assert_eq!(args.out, Some(PathBuf::from("index.json")));
            assert_eq!(args.feature_table, Some(PathBuf::from("table.json")));
        } else {
            panic!("expected build");
        }
    }

    #[test]
    fn cli_parse_build_requires_data() {
        assert!(Cli::try_parse_from(["recco", "build"]).is_err());
    }

    #[test]
    fn cli_parse_score_splits_features() {
        let cli = Cli::try_parse_from([
            "recco",
            "score",
            "--data",
            "scan.csv",
            "--features",
            "Storage,KeyVault",
        ])
        .unwrap();
        if let Commands::Score(args) = cli.command {
            assert_eq!(args.features, vec!["Storage", "KeyVault"]);
        } else {
            panic!("expected score");
        }
    }

    #[test]
    fn cli_parse_category_score_kebab_case() {
        let cli = Cli::try_parse_from([
            "recco",
            "category-score",
            "--data",
            "scan.csv",
            "--features",
            "SQLDatabase",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::CategoryScore(_)));
    }

    #[test]
    fn cli_parse_safest_categories_with_spaces() {
        let cli = Cli::try_parse_from([
            "recco",
            "safest",
            "--data",
            "scan.csv",
            "--categories",
            "Web Front End,APIs",
        ])
        .unwrap();
        if let Commands::Safest(args) = cli.command {
            assert_eq!(args.categories, vec!["Web Front End", "APIs"]);
        } else {
            panic!("expected safest");
        }
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "recco",
            "recommend",
            "--data",
            "scan.csv",
            "--features",
            "Storage",
            "-vv",
            "--config",
            "engine.yaml",
            "--catalog",
            "catalog.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("engine.yaml")));
        assert_eq!(cli.catalog, Some(PathBuf::from("catalog.yaml")));
        assert!(matches!(cli.command, Commands::Recommend(_)));
    }

    #[test]
    fn cli_parse_score_requires_features() {
        assert!(Cli::try_parse_from(["recco", "score", "--data", "scan.csv"]).is_err());
    }
}
