//! Survey progress and final submission.

use crate::db;
use crate::domain::email::validate_corporate_email;
use crate::domain::survey::{validate_full_answers, validate_partial_answers};
use crate::error::ApiError;
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/response", get(response))
        .route("/save", post(save))
        .route("/submit", post(submit))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ResponseQuery {
    pub email: Option<String>,
}

/// The saved response for an email, or `null` when the employee has not
/// started yet.
async fn response(
    State(state): State<SharedState>,
    Query(query): Query<ResponseQuery>,
) -> Result<Json<Option<db::SurveyResponse>>, ApiError> {
    let email = required_email(query.email.as_deref())?;
    let response = db::get_survey_response(&state.pool, &email).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub email: Option<String>,
    pub answers: Option<Map<String, Value>>,
    #[serde(default)]
    pub is_complete: bool,
}

async fn save(
    State(state): State<SharedState>,
    Json(payload): Json<SavePayload>,
) -> Result<Json<db::SurveyResponse>, ApiError> {
    let email = required_email(payload.email.as_deref())?;
    let answers = payload
        .answers
        .ok_or_else(|| ApiError::Validation("Answers are required".to_string()))?;
    validate_partial_answers(&answers).map_err(ApiError::Validation)?;

    let saved = db::save_progress(&state.pool, &email, &answers, payload.is_complete).await?;
    Ok(Json(saved))
}

#[derive(Debug, Deserialize)]
pub struct SubmitPayload {
    pub email: Option<String>,
    pub answers: Option<Map<String, Value>>,
}

async fn submit(
    State(state): State<SharedState>,
    Json(payload): Json<SubmitPayload>,
) -> Result<Json<db::SurveyResponse>, ApiError> {
    let email = required_email(payload.email.as_deref())?;
    let answers = payload
        .answers
        .ok_or_else(|| ApiError::Validation("Answers are required".to_string()))?;
    validate_full_answers(&answers).map_err(ApiError::Validation)?;

    let finalized = db::submit_final(&state.pool, &email, &answers).await?;
    tracing::info!(response_number = finalized.response_number, "survey submitted");
    Ok(Json(finalized))
}

fn required_email(raw: Option<&str>) -> Result<String, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".to_string()))?;
    validate_corporate_email(raw).map_err(ApiError::Validation)
}
