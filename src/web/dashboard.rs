//! HR/admin dashboard reads. Every handler resolves the session first;
//! HR-role callers are scoped to their own company, admins see all.

use crate::analytics::{
    company_insights, demographic_breakdown, section_averages, survey_stats, wellbeing_metrics,
    WellbeingFilters,
};
use crate::db::{self, Employee, HrAccountWithCompany, SurveyResponse};
use crate::error::ApiError;
use crate::state::SharedState;
use crate::web::session::{company_scope, require_account};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/section-averages", get(sections))
        .route("/responses", get(responses))
        .route("/company-insights", get(insights))
        .route("/responses-with-users", get(responses_with_users))
        .route("/wellbeing-metrics", get(wellbeing))
        .route("/demographic-breakdown", get(demographics))
        .route("/hr-accounts", get(hr_accounts))
        .route("/export-csv", get(export_csv))
        .route("/response/:number", get(response_by_number))
        .with_state(state)
}

/// A response with its employee nested under `user`.
#[derive(Debug, Serialize)]
struct ResponseDetail {
    #[serde(flatten)]
    response: SurveyResponse,
    user: Employee,
}

impl From<db::ResponseWithEmployee> for ResponseDetail {
    fn from(row: db::ResponseWithEmployee) -> Self {
        let (response, user) = row.split();
        Self { response, user }
    }
}

async fn stats(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_account(&state, &headers, false).await?;
    let (total, completed) = db::survey_counts(&state.pool, company_scope(&account)).await?;
    Ok(Json(survey_stats(total, completed)))
}

async fn sections(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_account(&state, &headers, false).await?;
    let completed = db::get_responses(&state.pool, company_scope(&account), true).await?;
    Ok(Json(section_averages(&completed)))
}

async fn responses(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_account(&state, &headers, false).await?;
    let all = db::get_responses(&state.pool, company_scope(&account), false).await?;
    Ok(Json(all))
}

async fn insights(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_account(&state, &headers, false).await?;
    let all = db::get_responses(&state.pool, company_scope(&account), false).await?;
    Ok(Json(company_insights(&all)))
}

async fn responses_with_users(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_account(&state, &headers, true).await?;
    let rows = db::get_responses_with_employees(&state.pool, None).await?;
    let details: Vec<ResponseDetail> = rows.into_iter().map(ResponseDetail::from).collect();
    Ok(Json(details))
}

async fn wellbeing(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(mut filters): Query<WellbeingFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_account(&state, &headers, false).await?;
    let scope = company_scope(&account);
    // HR callers cannot widen the filter beyond their own company.
    if let Some(company_id) = scope {
        filters.company_id = Some(company_id);
        filters.company_domain = None;
    }
    let rows = db::get_responses_with_employees(&state.pool, scope).await?;
    Ok(Json(wellbeing_metrics(&rows, &filters)))
}

async fn demographics(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_account(&state, &headers, false).await?;
    let rows = db::get_responses_with_employees(&state.pool, company_scope(&account)).await?;
    Ok(Json(demographic_breakdown(&rows)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HrAccountView {
    id: i32,
    company_id: i32,
    email: String,
    role: crate::domain::models::AccountRole,
    last_login: Option<chrono::DateTime<Utc>>,
    must_reset_password: bool,
    created_at: chrono::DateTime<Utc>,
    company_domain: Option<String>,
    company_name: Option<String>,
}

impl From<HrAccountWithCompany> for HrAccountView {
    fn from(row: HrAccountWithCompany) -> Self {
        Self {
            id: row.id,
            company_id: row.company_id,
            email: row.email,
            role: row.role,
            last_login: row.last_login,
            must_reset_password: row.must_reset_password,
            created_at: row.created_at,
            company_domain: row.company_domain,
            company_name: row.company_name,
        }
    }
}

async fn hr_accounts(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_account(&state, &headers, true).await?;
    let accounts = db::get_all_hr_accounts(&state.pool).await?;
    let views: Vec<HrAccountView> = accounts.into_iter().map(HrAccountView::from).collect();
    Ok(Json(views))
}

async fn export_csv(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_account(&state, &headers, false).await?;
    let rows = db::get_responses_with_employees(&state.pool, company_scope(&account)).await?;
    let body = crate::analytics::csv::render_csv(&rows);

    let filename = format!("survey-responses-{}.csv", Utc::now().format("%Y-%m-%d"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

async fn response_by_number(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_account(&state, &headers, true).await?;

    let number: i32 = number
        .parse()
        .map_err(|_| ApiError::Validation("Response number must be numeric".to_string()))?;
    let row = db::get_response_by_number(&state.pool, number)
        .await?
        .ok_or_else(|| ApiError::NotFound("Response not found".to_string()))?;

    Ok(Json(ResponseDetail::from(row)))
}
