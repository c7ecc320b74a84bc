//! HR login, logout and session introspection.

use crate::db::{self, HrAccount};
use crate::error::ApiError;
use crate::state::SharedState;
use crate::web::session;
use axum::{
    extract::{ConnectInfo, State},
    http::header,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: i32,
    pub email: String,
    pub role: crate::domain::models::AccountRole,
    pub company_id: i32,
    pub must_reset_password: bool,
}

impl From<&HrAccount> for AccountView {
    fn from(account: &HrAccount) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            role: account.role,
            company_id: account.company_id,
            must_reset_password: account.must_reset_password,
        }
    }
}

async fn login(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    if !state.login_limiter.check(&addr.ip().to_string()).await {
        tracing::warn!(ip = %addr.ip(), "login rate limited");
        return Err(ApiError::RateLimited);
    }

    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".to_string()))?
        .to_lowercase();
    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::Validation("Password is required".to_string()))?;

    let account = db::validate_hr_credentials(&state.pool, &email, password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = session::generate_token();
    db::create_session(&state.pool, account.id, &token).await?;
    db::update_last_login(&state.pool, account.id).await?;
    tracing::info!(account_id = account.id, "hr login");

    Ok((
        [(header::SET_COOKIE, session::session_cookie(&token))],
        Json(json!({ "success": true, "account": AccountView::from(&account) })),
    ))
}

pub(crate) async fn logout(
    State(state): State<SharedState>,
    headers: axum::http::HeaderMap,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    if let Some(token) = session::extract_token(&headers) {
        db::delete_session(&state.pool, &token).await?;
    }
    Ok((
        [(header::SET_COOKIE, session::clear_cookie())],
        Json(json!({ "success": true })),
    ))
}

async fn me(
    State(state): State<SharedState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = session::require_account(&state, &headers, false).await?;
    Ok(Json(json!({ "account": AccountView::from(&account) })))
}
