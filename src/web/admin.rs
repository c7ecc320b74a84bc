//! Admin-only operations: tenant listing and the certification workflow.

use crate::db::{self, CertificationRow};
use crate::error::ApiError;
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/companies", get(companies))
        .route("/employees", get(employees))
        .route("/certifications", post(issue_certification).get(certifications))
        // patch-only: other verbs fall through to the router's 405.
        .route("/certifications/:id/revoke", patch(revoke_certification))
        .with_state(state)
}

async fn companies(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    crate::web::session::require_account(&state, &headers, true).await?;
    Ok(Json(db::get_all_companies(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyIdQuery {
    pub company_id: Option<i32>,
}

async fn employees(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<CompanyIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    crate::web::session::require_account(&state, &headers, true).await?;
    Ok(Json(
        db::get_all_employees(&state.pool, query.company_id).await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificationPayload {
    pub company_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
}

async fn issue_certification(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<IssueCertificationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let account = crate::web::session::require_account(&state, &headers, true).await?;

    let company_id = payload
        .company_id
        .ok_or_else(|| ApiError::Validation("companyId is required".to_string()))?;
    let title = payload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Validation("Title is required".to_string()))?;

    let certification = db::issue_certification(
        &state.pool,
        company_id,
        account.id,
        title,
        payload.description.as_deref(),
        payload.valid_until,
    )
    .await?;
    tracing::info!(
        certificate_number = %certification.certificate_number,
        company_id,
        "certification issued"
    );

    Ok(Json(certification))
}

/// A certification with its company and issuing account nested.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CertificationView {
    id: i32,
    company_id: i32,
    certificate_number: String,
    issued_by: i32,
    title: String,
    description: Option<String>,
    valid_from: DateTime<Utc>,
    valid_until: Option<DateTime<Utc>>,
    status: crate::domain::models::CertificationStatus,
    created_at: DateTime<Utc>,
    company: Option<serde_json::Value>,
    issued_by_account: Option<serde_json::Value>,
}

impl From<CertificationRow> for CertificationView {
    fn from(row: CertificationRow) -> Self {
        let company = row
            .company_domain
            .as_ref()
            .map(|domain| json!({ "domain": domain, "name": row.company_name }));
        let issued_by_account = row
            .issuer_email
            .as_ref()
            .map(|email| json!({ "id": row.issued_by, "email": email, "role": row.issuer_role }));
        Self {
            id: row.id,
            company_id: row.company_id,
            certificate_number: row.certificate_number,
            issued_by: row.issued_by,
            title: row.title,
            description: row.description,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            status: row.status,
            created_at: row.created_at,
            company,
            issued_by_account,
        }
    }
}

async fn certifications(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<CompanyIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    crate::web::session::require_account(&state, &headers, true).await?;
    let rows = db::get_certifications(&state.pool, query.company_id).await?;
    let views: Vec<CertificationView> = rows.into_iter().map(CertificationView::from).collect();
    Ok(Json(views))
}

async fn revoke_certification(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    crate::web::session::require_account(&state, &headers, true).await?;
    db::revoke_certification(&state.pool, id).await?;
    Ok(Json(json!({ "success": true })))
}
