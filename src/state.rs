use crate::middleware::RateLimiter;
use sqlx::PgPool;
use std::sync::Arc;

pub struct AppState {
    pub pool: PgPool,
    pub login_limiter: RateLimiter,
}

pub type SharedState = Arc<AppState>;
