//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The live index is an [`IndexHandle`]: handlers take the current snapshot
//! and query it lock-free, while a rebuild publishes a replacement in one
//! pointer swap.

use std::path::PathBuf;
use std::sync::Arc;

use recco_core::{Catalog, EngineConfig, RecoError};
use recco_engine::{IndexHandle, Snapshot};

/// Environment variable naming the listen port.
pub const ENV_PORT: &str = "RECCO_PORT";
/// Environment variable naming the scan-result CSV.
pub const ENV_DATA: &str = "RECCO_DATA";
/// Environment variable naming a YAML catalog file.
pub const ENV_CATALOG: &str = "RECCO_CATALOG";
/// Environment variable naming a YAML engine config file.
pub const ENV_CONFIG: &str = "RECCO_CONFIG";

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Scan-result CSV loaded at startup and on rebuild. Without one the
    /// service starts empty and rebuild returns 503.
    pub data_path: Option<PathBuf>,
    /// Catalog file. The builtin catalog is used when absent.
    pub catalog_path: Option<PathBuf>,
    /// Engine config file. Defaults apply when absent.
    pub config_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: None,
            catalog_path: None,
            config_path: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from `RECCO_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Unparseable ports fall back to 8080.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            port: lookup(ENV_PORT)
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            data_path: path(ENV_DATA),
            catalog_path: path(ENV_CATALOG),
            config_path: path(ENV_CONFIG),
        }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The live index.
    pub index: Arc<IndexHandle>,
    /// Loader policy used for rebuilds.
    pub engine: Arc<EngineConfig>,
    /// Service configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Empty index over the builtin catalog, with default configuration.
    pub fn new() -> Self {
        Self::with_snapshot(
            AppConfig::default(),
            EngineConfig::default(),
            Snapshot::empty(Arc::new(Catalog::builtin())),
        )
    }

    /// State publishing `snapshot`.
    pub fn with_snapshot(config: AppConfig, engine: EngineConfig, snapshot: Snapshot) -> Self {
        Self {
            index: Arc::new(IndexHandle::new(snapshot)),
            engine: Arc::new(engine),
            config,
        }
    }

    /// Load catalog, engine config, and (if configured) the dataset.
    pub fn bootstrap(config: AppConfig) -> Result<Self, RecoError> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin(),
        };
        let engine = match &config.config_path {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        let catalog = Arc::new(catalog);
        let snapshot = match &config.data_path {
            Some(path) => Snapshot::from_path(catalog, path, &engine)?,
            None => {
                tracing::warn!("{ENV_DATA} not set; serving an empty index until rebuilt");
                Snapshot::empty(catalog)
            }
        };
        Ok(Self::with_snapshot(config, engine, snapshot))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
