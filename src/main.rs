//! RendEx API Server
//!
//! ```text
//! Routes    /health  /pricing/quote  /trail/*  /catalog/*
//! Services  Pricing Engine (pure)    Trail Progression Engine
//! Data      PostgreSQL (sqlx pool, migrations on startup)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rendex_api::{routes, AppState, Config, Database, TrailService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG=debug,sqlx=warn style filtering
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rendex_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting RendEx API Server");

    let config = Config::from_env()?;
    tracing::info!("📋 Configuration loaded");

    let db = Database::connect(&config.database_url).await?;
    tracing::info!("🗄️  Database connected");

    db.run_migrations().await?;
    tracing::info!("📦 Migrations completed");

    let db = Arc::new(db);
    let trail = TrailService::new(db.clone());
    tracing::info!("🧭 Trail service ready");

    let state = AppState {
        db,
        trail: Arc::new(trail),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🌐 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// # Route Structure
///
/// ```text
/// GET  /health                      - server/database status
///
/// POST /pricing/quote               - product or service quote
///
/// GET  /trail/:user_id              - current trail snapshot
/// POST /trail/:user_id/initialize   - idempotent first-visit setup
/// POST /trail/:user_id/complete     - complete today's mission
///
/// POST /catalog/products            - save a pricing snapshot
/// GET  /catalog/:user_id/products   - list saved snapshots
/// ```
fn create_router(state: AppState) -> Router {
    // Production restricts origins via ALLOWED_ORIGINS; development
    // allows the local frontend dev servers.
    let cors = if state.config.is_production() {
        let allowed_origins =
            std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "https://rendex.app".to_string());
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))
        // Pricing
        .route("/pricing/quote", post(routes::pricing::quote))
        // Trail
        .route("/trail/:user_id", get(routes::trail::get_trail_state))
        .route(
            "/trail/:user_id/initialize",
            post(routes::trail::initialize_trail),
        )
        .route(
            "/trail/:user_id/complete",
            post(routes::trail::complete_mission),
        )
        // Catalog
        .route("/catalog/products", post(routes::catalog::save_product))
        .route(
            "/catalog/:user_id/products",
            get(routes::catalog::list_products),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}
