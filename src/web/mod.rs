pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod hr;
pub mod session;
pub mod survey;

use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Legacy top-level logout alias kept for older dashboard builds.
        .merge(
            Router::new()
                .route("/logout", post(hr::logout))
                .with_state(state.clone()),
        )
        .nest("/hr", hr::routes(state.clone()))
        .nest("/auth", auth::routes(state.clone()))
        .nest("/survey", survey::routes(state.clone()))
        .nest("/dashboard", dashboard::routes(state.clone()))
        .nest("/admin", admin::routes(state))
}
