//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use auth::gate::{AccessPolicy, AccessRule, AuthGate, authorize};
use auth::{AccessTokenCodec, PgAuthRepository, auth_router, bootstrap_admin};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, header},
    middleware,
    routing::get,
};
use content::{PgContentRepository, content_router};
use platform::storage::Storage;
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const API_PREFIX: &str = "/api/v1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,content=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect_with(config.database.clone())
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    match sqlx::migrate!("../../../database/migrations").run(&pool).await {
        Ok(()) => tracing::info!("Migrations completed"),
        Err(e) if config.migrations_strict => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Migrations failed, continuing anyway");
        }
    }

    // Startup cleanup and admin bootstrap
    // Errors here should not prevent server startup
    let auth_repo = PgAuthRepository::new(pool.clone());
    match auth_repo.cleanup_expired().await {
        Ok(deleted) => {
            tracing::info!(rows_deleted = deleted, "Auth token cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Auth token cleanup failed, continuing anyway");
        }
    }

    if let Some(admin) = &config.admin {
        match bootstrap_admin(&auth_repo, &config.auth, &admin.email, admin.password.clone()).await {
            Ok(true) => tracing::info!(email = %admin.email, "Bootstrap administrator created"),
            Ok(false) => tracing::debug!("Bootstrap administrator already exists"),
            Err(e) => {
                tracing::warn!(error = %e, "Admin bootstrap failed, continuing anyway");
            }
        }
    }

    let auth_config = Arc::new(config.auth.clone());
    let codec = Arc::new(AccessTokenCodec::new(&auth_config));
    let storage = Arc::new(Storage::from_config(&config.storage));

    let policy = AccessPolicy::new()
        .with_rules("", [AccessRule::public(Method::GET, "/health")])
        .with_rules(API_PREFIX, auth::access_rules())
        .with_rules(API_PREFIX, content::access_rules());
    let gate = Arc::new(AuthGate::new(policy, codec.clone()));

    let api = auth_router(auth_repo, storage.clone(), auth_config, codec).merge(content_router(
        PgContentRepository::new(pool.clone()),
        storage.clone(),
        Arc::new(config.content.clone()),
    ));

    // Build router
    let mut app = Router::new()
        .route("/health", get(health))
        .with_state(pool)
        .nest(API_PREFIX, api)
        .layer(middleware::from_fn_with_state(gate, authorize));

    // Uploaded files are public, so they sit outside the gate
    if let Some(root) = storage.local_root() {
        app = app.nest_service("/uploads", ServeDir::new(root));
    }

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(cors(config.frontend_origins.as_deref()));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Liveness plus a database round trip
async fn health(State(pool): State<PgPool>) -> AppResult<Json<Value>> {
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Health check database probe failed");
            AppError::service_unavailable("Database unavailable")
        })?;

    Ok(Json(json!({ "status": "ok" })))
}

/// Credentials are only allowed with an explicit origin list
fn cors(origins: Option<&[String]>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]));

    match origins {
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            layer.allow_origin(allowed).allow_credentials(true)
        }
        None => layer.allow_origin(AllowOrigin::any()),
    }
}
