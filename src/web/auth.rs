//! Employee identification for the survey flow. No passwords here: an
//! employee is identified by a validated corporate email and upserted
//! with whatever demographics the form collected.

use crate::db::{self, UpsertEmployee};
use crate::domain::email::validate_corporate_email;
use crate::error::ApiError;
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/validate", post(validate))
        .route("/user", get(user))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePayload {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub education_level: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub working_tenure: Option<String>,
}

async fn validate(
    State(state): State<SharedState>,
    Json(payload): Json<ValidatePayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let raw = payload
        .email
        .as_deref()
        .ok_or_else(|| ApiError::Validation("Email is required".to_string()))?;
    let email = validate_corporate_email(raw).map_err(ApiError::Validation)?;

    let employee = db::upsert_employee(
        &state.pool,
        &UpsertEmployee {
            email: email.clone(),
            first_name: payload.first_name,
            last_name: payload.last_name,
            department: payload.department,
            education_level: payload.education_level,
            gender: payload.gender,
            age: payload.age,
            working_tenure: payload.working_tenure,
        },
    )
    .await?;

    Ok(Json(json!({ "user": employee, "email": email })))
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub email: Option<String>,
}

async fn user(
    State(state): State<SharedState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = lookup_email(query.email.as_deref())?;

    let employee = db::get_employee(&state.pool, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": employee })))
}

/// Malformed emails are a 400 before any storage access, never a 404.
fn lookup_email(raw: Option<&str>) -> Result<String, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".to_string()))?;
    validate_corporate_email(raw).map_err(ApiError::Validation)
}
