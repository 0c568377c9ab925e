//! # Scoring API
//!
//! Safety scores and recommendations against the live index.
//!
//! ## Endpoints
//!
//! - `POST /v1/score`: failure percentage of a feature combination
//! - `POST /v1/score/category`: failure percentage of a category combination
//! - `POST /v1/safest`: feature combinations under a category set, safest first
//! - `POST /v1/recommend`: combined recommendation payload
//!
//! Request keys are lower-case; the capitalized `Features` / `Categories`
//! keys are accepted as aliases.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use recco_core::{ItemSet, RecoError};
use recco_engine::{RankedCombo, Recommendation};

use crate::error::AppError;
use crate::state::AppState;

/// A scoring request: a JSON body naming one or more item sets.
///
/// Every named set must be non-empty. Whether the names exist in the
/// catalog is left to the engine, which reports unknown names as
/// validation errors of their own.
pub trait ScoringRequest {
    /// The item sets the request carries, with their field names.
    fn item_sets(&self) -> Vec<(&'static str, &ItemSet)>;

    /// Shape checks beyond what serde enforces.
    fn check(&self) -> Result<(), String> {
        for (field, items) in self.item_sets() {
            if items.is_empty() {
                return Err(format!("{field} must not be empty"));
            }
        }
        Ok(())
    }
}

/// Unwrap a JSON body and check it, mapping a rejected body to
/// [`AppError::BadRequest`] and a failed check to [`AppError::Validation`].
pub fn parse<T: ScoringRequest>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(req) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    req.check().map_err(AppError::Validation)?;
    Ok(req)
}

/// Request naming a feature combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesRequest {
    #[serde(alias = "Features")]
    pub features: ItemSet,
}

impl ScoringRequest for FeaturesRequest {
    fn item_sets(&self) -> Vec<(&'static str, &ItemSet)> {
        vec![("features", &self.features)]
    }
}

/// Request naming a category combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesRequest {
    #[serde(alias = "Categories")]
    pub categories: ItemSet,
}

impl ScoringRequest for CategoriesRequest {
    fn item_sets(&self) -> Vec<(&'static str, &ItemSet)> {
        vec![("categories", &self.categories)]
    }
}

/// Category score request: either the categories themselves, or features
/// whose primary categories are scored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryScoreRequest {
    #[serde(default, alias = "Features")]
    pub features: Option<ItemSet>,
    #[serde(default, alias = "Categories")]
    pub categories: Option<ItemSet>,
}

impl ScoringRequest for CategoryScoreRequest {
    fn item_sets(&self) -> Vec<(&'static str, &ItemSet)> {
        let features = self.features.as_ref().map(|f| ("features", f));
        let categories = self.categories.as_ref().map(|c| ("categories", c));
        features.into_iter().chain(categories).collect()
    }

    fn check(&self) -> Result<(), String> {
        let sets = self.item_sets();
        match sets.as_slice() {
            [(field, items)] if items.is_empty() => Err(format!("{field} must not be empty")),
            [_] => Ok(()),
            _ => Err("exactly one of features or categories is required".to_string()),
        }
    }
}

/// Recommendation request. `categories` overrides the derived category set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(alias = "Features")]
    pub features: ItemSet,
    #[serde(default, alias = "Categories")]
    pub categories: Option<ItemSet>,
}

impl ScoringRequest for RecommendRequest {
    fn item_sets(&self) -> Vec<(&'static str, &ItemSet)> {
        let mut sets = vec![("features", &self.features)];
        if let Some(categories) = &self.categories {
            sets.push(("categories", categories));
        }
        sets
    }
}

/// Feature score response.
#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureScoreResponse {
    /// The scored features, sorted.
    pub features: Vec<String>,
    /// Failure percentage.
    pub score: f64,
}

/// Category score response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryScoreResponse {
    /// The scored categories, sorted.
    pub categories: Vec<String>,
    /// Failure percentage.
    pub score: f64,
}

/// Build the scoring router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/score", post(score))
        .route("/v1/score/category", post(score_category))
        .route("/v1/safest", post(safest))
        .route("/v1/recommend", post(recommend))
}

/// POST /v1/score: failure percentage of exactly this feature combination.
async fn score(
    State(state): State<AppState>,
    body: Result<Json<FeaturesRequest>, JsonRejection>,
) -> Result<Json<FeatureScoreResponse>, AppError> {
    let req = parse(body)?;
    let snapshot = state.index.current();
    let score = snapshot.recommender().feature_safety(&req.features)?;
    Ok(Json(FeatureScoreResponse {
        features: req.features.to_vec(),
        score,
    }))
}

/// POST /v1/score/category: failure percentage of a category combination.
async fn score_category(
    State(state): State<AppState>,
    body: Result<Json<CategoryScoreRequest>, JsonRejection>,
) -> Result<Json<CategoryScoreResponse>, AppError> {
    let req = parse(body)?;
    let snapshot = state.index.current();
    let categories = match (req.categories, req.features) {
        (Some(categories), _) => categories,
        (None, Some(features)) => snapshot
            .catalog()
            .primary_categories(&features)
            .map_err(RecoError::from)?,
        (None, None) => return Err(AppError::Validation("no items given".to_string())),
    };
    let score = snapshot.recommender().category_safety_for(&categories)?;
    Ok(Json(CategoryScoreResponse {
        categories: categories.to_vec(),
        score,
    }))
}

/// POST /v1/safest: feature combinations under a category set, safest first.
async fn safest(
    State(state): State<AppState>,
    body: Result<Json<CategoriesRequest>, JsonRejection>,
) -> Result<Json<Vec<RankedCombo>>, AppError> {
    let req = parse(body)?;
    let snapshot = state.index.current();
    let ranked = snapshot
        .recommender()
        .safest_feature_combos(&req.categories)?;
    Ok(Json(ranked))
}

/// POST /v1/recommend: safest alternatives plus the queried combination's record.
async fn recommend(
    State(state): State<AppState>,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<Recommendation>, AppError> {
    let req = parse(body)?;
    let snapshot = state.index.current();
    let recommendation = snapshot
        .recommender()
        .recommend_under(&req.features, req.categories.as_ref())?;
    Ok(Json(recommendation))
}
