//! Cookie-backed HR sessions.
//!
//! Tokens are 32 random bytes, base64url encoded, stored server-side in
//! the sessions table. The token carries no claims; revocation is a row
//! delete.

use crate::db::{self, HrAccount, SESSION_TTL_DAYS};
use crate::error::ApiError;
use crate::state::AppState;
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use rand::RngCore;

pub const SESSION_COOKIE: &str = "hr_session";

const SESSION_MAX_AGE_SECS: i64 = SESSION_TTL_DAYS * 24 * 60 * 60;

pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn cookie_is_secure() -> bool {
    std::env::var("RAILWAY_ENVIRONMENT").is_ok()
        || std::env::var("PRODUCTION").is_ok_and(|v| v == "1" || v == "true")
}

fn build_cookie(token: &str, max_age: i64) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if cookie_is_secure() {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn session_cookie(token: &str) -> String {
    build_cookie(token, SESSION_MAX_AGE_SECS)
}

pub fn clear_cookie() -> String {
    build_cookie("", 0)
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        if let Some(token) = pair.trim().strip_prefix(&format!("{SESSION_COOKIE}=")) {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Resolves the caller's session cookie to an HR account.
///
/// Missing/unknown/expired tokens are all `Unauthenticated`; a live
/// session pointing at a deleted account is `AccountNotFound`; and with
/// `admin_only`, an HR-role caller gets `ForbiddenRole`.
pub async fn require_account(
    state: &AppState,
    headers: &HeaderMap,
    admin_only: bool,
) -> Result<HrAccount, ApiError> {
    let token = extract_token(headers).ok_or(ApiError::Unauthenticated)?;

    let session = db::get_valid_session(&state.pool, &token)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    // The query already filters on expiry; re-check so a stale row that
    // slipped through (clock skew, cached reads) still fails closed.
    if !session.is_valid_at(Utc::now()) {
        return Err(ApiError::Unauthenticated);
    }

    let account = db::get_hr_account_by_id(&state.pool, session.hr_account_id)
        .await?
        .ok_or(ApiError::AccountNotFound)?;

    if admin_only && account.role != crate::domain::models::AccountRole::Admin {
        return Err(ApiError::ForbiddenRole);
    }

    Ok(account)
}

/// The company scope for dashboard queries: admins see everything, HR
/// accounts only their own company.
pub fn company_scope(account: &HrAccount) -> Option<i32> {
    match account.role {
        crate::domain::models::AccountRole::Admin => None,
        crate::domain::models::AccountRole::Hr => Some(account.company_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::AccountRole;
    use axum::http::HeaderValue;

    fn account(role: AccountRole, company_id: i32) -> HrAccount {
        let now = Utc::now();
        HrAccount {
            id: 1,
            company_id,
            email: "hr@acme.com".to_string(),
            password_hash: String::new(),
            role,
            last_login: None,
            must_reset_password: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn hr_accounts_are_scoped_to_their_own_company() {
        assert_eq!(company_scope(&account(AccountRole::Hr, 7)), Some(7));
    }

    #[test]
    fn admin_accounts_see_every_company() {
        assert_eq!(company_scope(&account(AccountRole::Admin, 7)), None);
    }

    #[test]
    fn tokens_are_long_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes, base64url without padding.
        assert_eq!(a.len(), 43);
        assert!(!a.contains('='));
    }

    #[test]
    fn extracts_the_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; hr_session=abc123; lang=en"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        let headers = HeaderMap::new();
        assert!(extract_token(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("hr_session="));
        assert!(extract_token(&headers).is_none());
    }

    #[test]
    fn cookies_carry_the_expected_attributes() {
        let set = session_cookie("tok");
        assert!(set.starts_with("hr_session=tok; "));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("SameSite=Lax"));
        assert!(set.contains("Max-Age=604800"));

        let cleared = clear_cookie();
        assert!(cleared.contains("Max-Age=0"));
    }
}
