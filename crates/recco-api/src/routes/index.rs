//! # Index API
//!
//! - `GET /v1/index`: summary of the live snapshot
//! - `POST /v1/index/rebuild`: reload the configured dataset and publish
//!
//! A rebuild runs on the blocking pool. Queries keep reading the previous
//! snapshot until the new one is published; a failed rebuild leaves it live.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use recco_engine::BuildSummary;

use crate::error::AppError;
use crate::state::AppState;

/// Build the index router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/index", get(summary))
        .route("/v1/index/rebuild", post(rebuild))
}

/// GET /v1/index: summary of the live snapshot.
async fn summary(State(state): State<AppState>) -> Json<BuildSummary> {
    Json(state.index.current().summary().clone())
}

/// POST /v1/index/rebuild: reload the dataset and swap in the new snapshot.
async fn rebuild(State(state): State<AppState>) -> Result<Json<BuildSummary>, AppError> {
    let path = state
        .config
        .data_path
        .clone()
        .ok_or_else(|| AppError::service_unavailable("no data source configured"))?;
    let index = state.index.clone();
    let engine = state.engine.clone();

    let summary = tokio::task::spawn_blocking(move || index.rebuild_from_path(&path, &engine))
        .await
        .map_err(|e| AppError::Internal(format!("rebuild task failed: {e}")))??;
    tracing::info!(
        feature_combinations = summary.build.feature_combinations,
        "index rebuilt via API"
    );
    Ok(Json(summary))
}
