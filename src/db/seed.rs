//! Bootstrap admin account, created from environment on startup.

use crate::db;
use crate::domain::email::{company_domain, validate_corporate_email};
use crate::domain::models::AccountRole;
use anyhow::Result;
use sqlx::PgPool;

/// Ensures the platform admin exists. Reads `ADMIN_EMAIL` and
/// `ADMIN_PASSWORD`; skips with a warning when either is unset so local
/// setups without credentials still boot.
pub async fn seed_admin(pool: &PgPool) -> Result<()> {
    let (email, password) = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
        (Ok(email), Ok(password)) => (email, password),
        _ => {
            tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin seed");
            return Ok(());
        }
    };

    let email = validate_corporate_email(&email)
        .map_err(|e| anyhow::anyhow!("invalid ADMIN_EMAIL: {e}"))?;
    let domain = company_domain(&email);
    let company = db::ensure_company(pool, &domain).await?;

    let account =
        db::create_hr_account(pool, company.id, &email, &password, AccountRole::Admin).await?;
    tracing::info!(account_id = account.id, %email, "admin account ready");

    Ok(())
}
