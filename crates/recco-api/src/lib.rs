//! # recco-api: Axum Service for Combination Scoring
//!
//! Serves safety scores and safest-combination recommendations from an
//! in-memory index built from historical scan results.
//!
//! ## API Surface
//!
//! | Path                    | Module                | Purpose                      |
//! |-------------------------|-----------------------|------------------------------|
//! | `/v1/score`             | [`routes::scoring`]   | Feature combination score    |
//! | `/v1/score/category`    | [`routes::scoring`]   | Category combination score   |
//! | `/v1/safest`            | [`routes::scoring`]   | Ranked feature combinations  |
//! | `/v1/recommend`         | [`routes::scoring`]   | Combined recommendation      |
//! | `/v1/index`             | [`routes::index`]     | Live snapshot summary        |
//! | `/v1/index/rebuild`     | [`routes::index`]     | Reload and publish           |
//! | `/health/*`             | this module           | Liveness / readiness probes  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → DefaultBodyLimit → Handler
//! ```

pub mod error;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::scoring::router())
        .merge(routes::index::router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe: the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: ready once the live snapshot holds at least one
/// feature combination. Returns 200 "ready" or 503.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if state.index.current().tables().is_empty() {
        return (StatusCode::SERVICE_UNAVAILABLE, "index empty").into_response();
    }
    (StatusCode::OK, "ready").into_response()
}
