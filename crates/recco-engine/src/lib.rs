//! # recco-engine: Combination Scoring & Recommendation
//!
//! Turns a historical record of security-control scan results into three
//! read-only tables and answers safety queries against them:
//!
//! - **Loader** (`loader.rs`): reads the scan-result CSV and groups rows by
//!   resource group into (feature set, pass/fail counts).
//!
//! - **Expander** (`expander.rs`): enumerates every category path a feature
//!   combination can be filed under, one category per feature.
//!
//! - **Aggregation** (`aggregate.rs`): builds the Feature-Combination table,
//!   the Category-Combination table, and the Category → Feature-Combination
//!   index in one sequential pass.
//!
//! - **Query** (`query.rs`): failure-rate lookups and ranked "safest
//!   combination" recommendations.
//!
//! - **Snapshot** (`snapshot.rs`): an immutable built index plus a handle
//!   that swaps in rebuilt snapshots atomically.
//!
//! - **Export** (`export.rs`): JSON rendering of the built tables.
//!
//! ## Data Flow
//!
//! ```text
//! CSV ──load──▶ resource groups ──build──▶ IndexTables ──▶ Recommender
//!                                              │
//!                                              └──▶ export (JSON)
//! ```
//!
//! ## Dedup Invariant
//!
//! A feature combination may reach the same category set through several
//! expansion paths. It credits that set exactly once. The credited-set is
//! allocated fresh for every feature combination, so distinct combinations
//! that reduce to the same category set still add up.

pub mod aggregate;
pub mod expander;
pub mod export;
pub mod loader;
pub mod query;
pub mod snapshot;

pub use aggregate::{
    build, BuildOutput, BuildReport, CategoryCombo, ComboSummary, FeatureCombo, IndexTables,
    SkippedGroup,
};
pub use expander::CategoryExpander;
pub use loader::{group_records, load_path, load_reader, LoadReport, ResourceGroup, RowIssue, ScanRecord};
pub use query::{RankedCombo, Recommendation, Recommender};
pub use snapshot::{BuildSummary, IndexHandle, Snapshot};
