//! # Index Snapshots
//!
//! A [`Snapshot`] is one immutable build: the catalog it was built against,
//! the tables, and the build statistics. [`IndexHandle`] publishes snapshots
//! to concurrent readers.
//!
//! Readers clone the current `Arc<Snapshot>` under a read lock and query it
//! without holding any lock. A rebuild constructs the new snapshot outside
//! the snapshot lock and then swaps the pointer under a brief write lock,
//! so a reader sees either the old tables or the new ones, never a mix.
//!
//! Rebuilds are serialized against each other, so the last rebuild to
//! finish is also the last one to start, and an older dataset can never
//! replace a newer one.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use recco_core::{Catalog, EngineConfig, RecoError};

use crate::aggregate::{build, BuildReport, IndexTables};
use crate::loader::{load_path, LoadReport};
use crate::query::Recommender;

/// Summary of a published snapshot, as reported to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// When the snapshot was built.
    pub built_at: DateTime<Utc>,
    /// Data rows read.
    pub rows_read: u64,
    /// Rows dropped by the ignore list.
    pub rows_ignored: u64,
    /// Rows skipped as malformed.
    pub rows_malformed: usize,
    /// Aggregation statistics.
    #[serde(flatten)]
    pub build: BuildReport,
}

/// One immutable build of the index.
#[derive(Debug, Clone)]
pub struct Snapshot {
    catalog: Arc<Catalog>,
    tables: IndexTables,
    summary: BuildSummary,
}

impl Snapshot {
    /// Aggregate an already loaded dataset.
    pub fn build(catalog: Arc<Catalog>, load: &LoadReport) -> Result<Self, RecoError> {
        let output = build(&load.groups, &catalog)?;
        let summary = BuildSummary {
            built_at: Utc::now(),
            rows_read: load.rows_read,
            rows_ignored: load.rows_ignored,
            rows_malformed: load.malformed.len(),
            build: output.report,
        };
        Ok(Self {
            catalog,
            tables: output.tables,
            summary,
        })
    }

    /// Load a CSV file and aggregate it.
    pub fn from_path(
        catalog: Arc<Catalog>,
        path: &Path,
        config: &EngineConfig,
    ) -> Result<Self, RecoError> {
        let load = load_path(path, config)?;
        Self::build(catalog, &load)
    }

    /// A snapshot with no data. Every feature query on it is not found.
    pub fn empty(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            tables: IndexTables::default(),
            summary: BuildSummary {
                built_at: Utc::now(),
                rows_read: 0,
                rows_ignored: 0,
                rows_malformed: 0,
                build: BuildReport::default(),
            },
        }
    }

    /// Query front-end over this snapshot.
    pub fn recommender(&self) -> Recommender<'_> {
        Recommender::new(&self.catalog, &self.tables)
    }

    /// The catalog this snapshot was built against.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The built tables.
    pub fn tables(&self) -> &IndexTables {
        &self.tables
    }

    /// Build statistics.
    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }
}

/// Shared, atomically replaceable pointer to the live snapshot.
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Arc<Snapshot>>,
    rebuild: Mutex<()>,
}

impl IndexHandle {
    /// Handle publishing `snapshot`.
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            rebuild: Mutex::new(()),
        }
    }

    /// The live snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Replace the live snapshot, returning the one it replaced.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Load, build, and publish from a CSV file using the live catalog.
    ///
    /// On failure the live snapshot is left in place. Concurrent calls run
    /// one at a time; readers are never blocked by the rebuild lock.
    pub fn rebuild_from_path(
        &self,
        path: &Path,
        config: &EngineConfig,
    ) -> Result<BuildSummary, RecoError> {
        let _rebuilding = self.rebuild.lock();
        let catalog = Arc::clone(self.current().catalog());
        match Snapshot::from_path(catalog, path, config) {
            Ok(snapshot) => {
                let summary = snapshot.summary().clone();
                self.publish(snapshot);
                info!(
                    path = %path.display(),
                    feature_combinations = summary.build.feature_combinations,
                    "published rebuilt index"
                );
                Ok(summary)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "rebuild failed; keeping live index");
                Err(e)
            }
        }
    }
}
