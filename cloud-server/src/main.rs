//! AntiScam Cloud Backend Server
//!
//! URL risk scoring API for Vietnamese users.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ANTISCAM CLOUD                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Auth     │  │  Scan Pipeline          │ │
//! │  │  Gateway  │  │  JWT /    │  │  heuristics + Groq +    │ │
//! │  │  (Axum)   │  │  API key  │  │  threat intel           │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │     ┌─────────────┐       ┌──────────────────────┐         │
//! │     │ PostgreSQL  │       │ Rate limiter (memory)│         │
//! │     └─────────────┘       └──────────────────────┘         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod middleware;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post, put, delete},
    middleware as axum_middleware,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use antiscam_core::constants::{APP_NAME, APP_VERSION};
use antiscam_core::logic::external_intel::{PhishTankClient, ThreatFeedClient};
use antiscam_core::{CachedDomainLists, ScanPipeline, WindowLimiter};

use crate::models::PgDomainLists;

pub use error::{AppError, AppResult};

/// Limiter windows and list cache entries are swept on this period
const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (core crate logs via `log`, bridged into tracing)
    let json = config.json_logs();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "antiscam_cloud=debug,antiscam_core=info,tower_http=debug".into()))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("{} Cloud Server v{} starting ({})...", APP_NAME, APP_VERSION, config.environment);
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await
        .context("Failed to run migrations")?;

    // Build application state
    let state = build_state(pool, config.clone())?;
    spawn_purge_task(&state);

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub pipeline: Arc<ScanPipeline>,
    pub lists: Arc<CachedDomainLists<PgDomainLists>>,
    pub limiter: Arc<WindowLimiter>,
    pub feeds: Arc<ThreatFeedClient>,
    pub phishtank: Arc<PhishTankClient>,
}

/// Wire the scan pipeline, list cache and feed clients around the pool
fn build_state(pool: sqlx::PgPool, config: config::Config) -> anyhow::Result<AppState> {
    let http = reqwest::Client::builder()
        .user_agent(format!("{}/{}", APP_NAME, APP_VERSION))
        .build()
        .context("Failed to build HTTP client")?;

    let lists = Arc::new(CachedDomainLists::new(PgDomainLists::new(pool.clone())));
    let pipeline = ScanPipeline::from_config(config.pipeline_config(), lists.clone())
        .context("Failed to build scan pipeline")?;

    let feeds = ThreatFeedClient::new(http.clone(), config.phishtank_api_key.clone());
    let phishtank = PhishTankClient::new(http, config.phishtank_api_key.clone());

    Ok(AppState {
        pool,
        config,
        pipeline: Arc::new(pipeline),
        lists,
        limiter: Arc::new(WindowLimiter::new()),
        feeds: Arc::new(feeds),
        phishtank: Arc::new(phishtank),
    })
}

fn spawn_purge_task(state: &AppState) {
    let limiter = state.limiter.clone();
    let lists = state.lists.clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let windows = limiter.purge_expired();
            let cached = lists.purge_expired();
            if windows + cached > 0 {
                tracing::debug!("Purged {} rate windows, {} cached list entries", windows, cached);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/health", get(handlers::health::check))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/share/:token", get(handlers::history::shared))
        .route("/api/v1/blocklist", get(handlers::lists::list_blocklist))
        .route("/api/v1/whitelist", get(handlers::lists::list_whitelist))
        .route("/api/v1/reports", post(handlers::reports::create))
        .route("/api/v1/stats", get(handlers::stats::overview));

    // Scan: anonymous, JWT or API key
    let scan_routes = Router::new()
        .route("/api/v1/scan", post(handlers::scan::scan))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_auth
        ));

    // User routes (JWT auth)
    let user_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::me))

        // History
        .route("/api/v1/history", get(handlers::history::list))
        .route("/api/v1/history/:id", delete(handlers::history::delete))
        .route("/api/v1/history/:id/visibility", put(handlers::history::set_visibility))

        // Watchlist (PRO+)
        .route("/api/v1/watchlist", get(handlers::watchlist::list))
        .route("/api/v1/watchlist", post(handlers::watchlist::create))
        .route("/api/v1/watchlist/alerts", get(handlers::watchlist::alerts))
        .route("/api/v1/watchlist/:id", delete(handlers::watchlist::delete))

        // API keys (BUSINESS+)
        .route("/api/v1/api-keys", get(handlers::api_keys::list))
        .route("/api/v1/api-keys", post(handlers::api_keys::create))
        .route("/api/v1/api-keys/:id", delete(handlers::api_keys::delete))

        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user_auth
        ));

    // Admin routes (admin JWT or ADMIN_SECRET)
    let admin_routes = Router::new()
        .route("/api/v1/blocklist", post(handlers::lists::upsert_blocklist))
        .route("/api/v1/blocklist", delete(handlers::lists::delete_blocklist))
        .route("/api/v1/whitelist", post(handlers::lists::upsert_whitelist))
        .route("/api/v1/whitelist", delete(handlers::lists::delete_whitelist))
        .route("/api/v1/reports", get(handlers::reports::list))
        .route("/api/v1/admin/verify", post(handlers::admin::verify))
        .route("/api/v1/admin/threat-feeds", get(handlers::admin::threat_feeds))
        .route("/api/v1/admin/threat-feeds", post(handlers::admin::sync_threat_feeds))
        .route("/api/v1/admin/sync", get(handlers::admin::data_stats))
        .route("/api/v1/admin/sync", post(handlers::admin::sync_community))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin_auth
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(scan_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn(middleware::security::security_headers))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    /// Router over a pool that never connects; only routes that fail
    /// before touching the database are exercised here
    fn test_app() -> Router {
        let config = config::test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let state = assert_ok!(build_state(pool, config));
        create_router(state)
    }

    fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_has_security_headers() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_history_requires_token() {
        let response = test_app()
            .oneshot(Request::builder().uri("/api/v1/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let response = test_app()
            .oneshot(Request::builder().uri("/api/v1/admin/threat-feeds").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_secret_reaches_handler() {
        let mut request = json_request(Method::POST, "/api/v1/admin/threat-feeds", r#"{"source":"bogus"}"#);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            "Bearer admin-test-secret".parse().unwrap(),
        );

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_jwt_on_scan_is_rejected() {
        let mut request = json_request(Method::POST, "/api/v1/scan", r#"{"url":"https://example.com"}"#);
        request.headers_mut().insert(header::AUTHORIZATION, "Bearer not-a-jwt".parse().unwrap());

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_anonymous_scan_window() {
        let app = test_app();

        for _ in 0..20 {
            let response = app
                .clone()
                .oneshot(json_request(Method::POST, "/api/v1/scan", r#"{"url":""}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = app
            .oneshot(json_request(Method::POST, "/api/v1/scan", r#"{"url":""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }
}
