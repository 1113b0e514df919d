//! Axum route handlers for the Recommendation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::locations::{province_table, resolve_selection, ProvinceView};
use crate::state::AppState;
use crate::vector_store::FieldType;

use super::{HardConstraint, Recommendation, RequestContext, SoftCriterion};

/// Upper bound of the experience input, in years.
pub const MAX_EXPERIENCE_YEARS: u32 = 20;

const DEFAULT_IMPORTANCE: i64 = 3;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PreferenceInput {
    pub text: String,
    #[serde(default = "default_importance")]
    pub importance: i64,
}

fn default_importance() -> i64 {
    DEFAULT_IMPORTANCE
}

fn default_locations() -> Vec<String> {
    vec!["all".to_string()]
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub title: Option<String>,
    pub experience: u32,
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
    pub responsibilities: Option<PreferenceInput>,
    pub qualifications: Option<PreferenceInput>,
    pub benefits: Option<PreferenceInput>,
}

impl RecommendRequest {
    /// Validates and normalizes the body into a pipeline context.
    pub fn into_context(self) -> Result<RequestContext, AppError> {
        if self.experience > MAX_EXPERIENCE_YEARS {
            return Err(AppError::Validation(format!(
                "experience must be at most {MAX_EXPERIENCE_YEARS} years, got {}",
                self.experience
            )));
        }
        let locations = resolve_selection(&self.locations)?;

        let mut criteria = Vec::new();
        for (field, input) in [
            (FieldType::Responsibilities, self.responsibilities),
            (FieldType::QualificationsAndPreferred, self.qualifications),
            (FieldType::Benefits, self.benefits),
        ] {
            let Some(input) = input else { continue };
            let importance = u8::try_from(input.importance)
                .ok()
                .filter(|i| (1..=5).contains(i))
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "importance for {} must be between 1 and 5, got {}",
                        field.label(),
                        input.importance
                    ))
                })?;
            if let Some(criterion) = SoftCriterion::new(field, &input.text, importance)? {
                criteria.push(criterion);
            }
        }

        RequestContext::new(
            self.title.as_deref(),
            HardConstraint {
                max_experience: self.experience,
                locations,
            },
            criteria,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: Recommendation,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/recommendations
///
/// Hard filter → strategy → ranking → posting join → rationale.
/// A request that matches nothing is a `no_match` response, not an error.
pub async fn handle_recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let Json(request) = payload.map_err(rejection_to_validation)?;
    let ctx = request.into_context()?;

    let span = info_span!("recommend", %request_id);
    let outcome = async {
        info!(
            "Recommendation request: title={}, experience<={}, criteria={}",
            ctx.has_title(),
            ctx.constraint.max_experience,
            ctx.criteria.len()
        );
        state.recommender.recommend(&ctx).await
    }
    .instrument(span)
    .await?;

    Ok(Json(RecommendResponse {
        request_id,
        generated_at: Utc::now(),
        outcome,
    }))
}

/// Malformed bodies (missing fields, wrong types, bad JSON) get the same error shape
/// as other invalid input.
fn rejection_to_validation(rejection: JsonRejection) -> AppError {
    AppError::Validation(rejection.body_text())
}

/// GET /api/v1/locations
///
/// Province → district table accepted by the `locations` field.
pub async fn handle_locations() -> Json<Vec<ProvinceView>> {
    Json(province_table())
}
