pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use studyflow_core::{Clock, SystemClock};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub clock: Arc<dyn Clock>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // User routes
        .route("/api/users/me", get(routes::users::me))
        // Subject routes
        .route(
            "/api/subjects",
            get(routes::subjects::list).post(routes::subjects::create),
        )
        .route(
            "/api/subjects/:id",
            put(routes::subjects::update).delete(routes::subjects::delete),
        )
        .route("/api/subjects/:id/reconcile", post(routes::subjects::reconcile))
        // Session routes
        .route(
            "/api/sessions",
            get(routes::sessions::list).post(routes::sessions::create),
        )
        .route("/api/sessions/upcoming", get(routes::sessions::upcoming))
        .route(
            "/api/sessions/:id",
            put(routes::sessions::update).delete(routes::sessions::delete),
        )
        .route("/api/sessions/:id/status", put(routes::sessions::update_status))
        // Statistics routes
        .route("/api/summary", get(routes::summary::get))
        .route("/api/stats/subjects", get(routes::stats::subjects))
        .route("/api/stats/streak", get(routes::stats::streak))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(routes::users::register))
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    tracing::info!(
        daily_reset_hour = config.daily_reset_hour,
        "Using local study day"
    );
    let state = AppState {
        db: Arc::new(db),
        clock: Arc::new(SystemClock::new(config.daily_reset_hour)),
    };

    let app = router(state);
    let addr = config.bind_addr();

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
