mod analytics;
mod db;
mod domain;
mod error;
mod middleware;
mod state;
mod web;

use crate::db::seed;
use crate::middleware::RateLimiter;
use crate::state::SharedState;
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL missing")?;
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("failed to connect to database")?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    seed::seed_admin(&pool).await?;

    let shared: SharedState = Arc::new(state::AppState {
        pool,
        // 5 login attempts per IP per minute.
        login_limiter: RateLimiter::new(5, 60),
    });

    let scheduler = JobScheduler::new().await?;
    let purge_pool = shared.pool.clone();
    scheduler
        .add(Job::new_async("0 0 * * * *", move |_uuid, _l| {
            let pool = purge_pool.clone();
            Box::pin(async move {
                match db::purge_expired_sessions(&pool).await {
                    Ok(purged) if purged > 0 => {
                        tracing::info!(purged, "expired sessions purged")
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("session purge failed: {e:#}"),
                }
            })
        })?)
        .await?;
    scheduler.start().await?;

    let app = web::routes(shared)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        format!("0.0.0.0:{port}")
    });
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
