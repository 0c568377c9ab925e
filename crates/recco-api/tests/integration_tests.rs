//! # Integration Tests for recco-api
//!
//! Drives the full router with `oneshot`: health probes, scoring,
//! recommendations, error mapping, and index rebuilds.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use recco_api::state::{AppConfig, AppState};
use recco_core::{Catalog, EngineConfig};
use recco_engine::Snapshot;

const SCAN: &str = "ResourceGroupId,Feature,CategoryName,VerificationResult,ControlStringId\n\
                    rg1,Storage,Storage,Passed,C1\n\
                    rg1,KeyVault,Security Infra,Passed,C2\n\
                    rg1,Storage,Storage,Failed,C3\n\
                    rg2,SQLDatabase,Storage,Passed,C4\n\
                    rg2,SQLDatabase,Storage,Passed,C5\n\
                    rg3,Storage,Storage,Failed,C6\n";

fn write_scan(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("scan.csv");
    std::fs::write(&path, body).unwrap();
    path
}

/// Helper: app serving the sample dataset, with rebuild pointed at it.
fn test_app(dir: &tempfile::TempDir) -> axum::Router {
    let path = write_scan(dir, SCAN);
    let config = AppConfig {
        data_path: Some(path),
        ..AppConfig::default()
    };
    let state = AppState::bootstrap(config).unwrap();
    recco_api::app(state)
}

/// Helper: app with an empty index and no data source.
fn empty_app() -> axum::Router {
    recco_api::app(AppState::new())
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = empty_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_empty_index_is_unavailable() {
    let response = empty_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readiness_with_data() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir).oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Scoring ------------------------------------------------------------------

#[tokio::test]
async fn test_score_feature_combination() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir)
        .oneshot(post_json("/v1/score", r#"{"features": ["KeyVault", "Storage"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["features"], serde_json::json!(["KeyVault", "Storage"]));
    let score = json["score"].as_f64().unwrap();
    assert!((score - 33.33).abs() < 0.01, "got {score}");
}

#[tokio::test]
async fn test_score_unknown_feature_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir)
        .oneshot(post_json("/v1/score", r#"{"features": ["NotARealFeature"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("NotARealFeature"));
}

#[tokio::test]
async fn test_score_unseen_combination_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir)
        .oneshot(post_json("/v1/score", r#"{"features": ["AppService"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_score_malformed_body_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir)
        .oneshot(post_json("/v1/score", r#"{"features": "Storage"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_score_empty_features_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir)
        .oneshot(post_json("/v1/score", r#"{"features": []}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_category_score_by_categories_and_by_features_agree() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let by_categories = app
        .clone()
        .oneshot(post_json("/v1/score/category", r#"{"categories": ["Storage"]}"#))
        .await
        .unwrap();
    assert_eq!(by_categories.status(), StatusCode::OK);
    let a = body_json(by_categories).await;

    let by_features = app
        .oneshot(post_json("/v1/score/category", r#"{"features": ["SQLDatabase"]}"#))
        .await
        .unwrap();
    assert_eq!(by_features.status(), StatusCode::OK);
    let b = body_json(by_features).await;

    assert_eq!(a["categories"], serde_json::json!(["Storage"]));
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_safest_orders_by_failure_rate() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir)
        .oneshot(post_json("/v1/safest", r#"{"categories": ["Storage"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let ranked = json.as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["features"], serde_json::json!(["SQLDatabase"]));
    assert_eq!(ranked[1]["features"], serde_json::json!(["Storage"]));
}

#[tokio::test]
async fn test_safest_unindexed_categories_is_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir)
        .oneshot(post_json("/v1/safest", r#"{"categories": ["Cache"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_recommend_payload() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir)
        .oneshot(post_json("/v1/recommend", r#"{"Features": ["Storage"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["CurrentFeatureGroup"], serde_json::json!(["Storage"]));
    assert_eq!(json["CurrentCategoryGroup"], serde_json::json!(["Storage"]));
    assert_eq!(json["TotalFailCount"], 1);
    assert_eq!(json["TotalSuccessCount"], 0);
    assert_eq!(json["TotalOccurrences"], 1);
    assert_eq!(json["Ranking"], 2);
    assert_eq!(
        json["RecommendedFeatureGroups"][0]["features"],
        serde_json::json!(["SQLDatabase"])
    );
}

// -- Index --------------------------------------------------------------------

#[tokio::test]
async fn test_index_summary() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(&dir).oneshot(get("/v1/index")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["rows_read"], 6);
    assert_eq!(json["resource_groups"], 3);
    assert_eq!(json["feature_combinations"], 3);
}

#[tokio::test]
async fn test_rebuild_without_data_source_is_503() {
    let response = empty_app()
        .oneshot(post_json("/v1/index/rebuild", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_rebuild_publishes_new_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scan(&dir, "ResourceGroupId,Feature,VerificationResult\n");
    let config = AppConfig {
        data_path: Some(path.clone()),
        ..AppConfig::default()
    };
    let state = AppState::bootstrap(config).unwrap();
    let app = recco_api::app(state);

    let before = app
        .clone()
        .oneshot(post_json("/v1/score", r#"{"features": ["KeyVault", "Storage"]}"#))
        .await
        .unwrap();
    assert_eq!(before.status(), StatusCode::NOT_FOUND);

    std::fs::write(&path, SCAN).unwrap();
    let rebuilt = app
        .clone()
        .oneshot(post_json("/v1/index/rebuild", ""))
        .await
        .unwrap();
    assert_eq!(rebuilt.status(), StatusCode::OK);
    assert_eq!(body_json(rebuilt).await["feature_combinations"], 3);

    let after = app
        .oneshot(post_json("/v1/score", r#"{"features": ["KeyVault", "Storage"]}"#))
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failed_rebuild_keeps_serving() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scan(&dir, SCAN);
    let snapshot = Snapshot::from_path(
        Arc::new(Catalog::builtin()),
        &path,
        &EngineConfig::default(),
    )
    .unwrap();
    let config = AppConfig {
        data_path: Some(path.clone()),
        ..AppConfig::default()
    };
    let app = recco_api::app(AppState::with_snapshot(
        config,
        EngineConfig::default(),
        snapshot,
    ));

    std::fs::write(&path, "ResourceGroupId,Feature\nrg1,Storage\n").unwrap();
    let rebuilt = app
        .clone()
        .oneshot(post_json("/v1/index/rebuild", ""))
        .await
        .unwrap();
    assert_eq!(rebuilt.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(rebuilt).await;
    assert_eq!(json["error"]["message"], "An internal error occurred");

    let still = app
        .oneshot(post_json("/v1/score", r#"{"features": ["KeyVault", "Storage"]}"#))
        .await
        .unwrap();
    assert_eq!(still.status(), StatusCode::OK);
}
