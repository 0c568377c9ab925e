//! # recco-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from `RECCO_*`
//! environment variables; see [`recco_api::state::AppConfig`].

use recco_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured JSON logs; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let port = config.port;
    tracing::info!(?config, "starting recco-api");

    let state = AppState::bootstrap(config).map_err(|e| {
        tracing::error!("Bootstrap failed: {e}");
        e
    })?;

    let summary = state.index.current().summary().clone();
    tracing::info!(
        feature_combinations = summary.build.feature_combinations,
        category_combinations = summary.build.category_combinations,
        skipped = summary.build.skipped.len(),
        "index ready"
    );

    let app = recco_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("recco API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
