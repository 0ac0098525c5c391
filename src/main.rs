//! Disk Inventory Backend
//!
//! A REST backend with SQLite persistence, live snapshot streaming and
//! per-session dashboards for the IT department's storage disk inventory.

mod api;
mod auth;
mod config;
mod dashboard;
mod db;
mod errors;
mod export;
mod import;
mod models;
mod sessions;
mod store;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use sessions::SessionGate;
use store::RecordStore;

/// Largest spreadsheet accepted for import.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub sessions: Arc<SessionGate>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Disk Inventory Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Capacity buckets: {}",
        config
            .capacity_buckets
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (DISKINV_API_PSK). Authentication is disabled!");
    }

    // Initialize database and load the first snapshot
    let pool = db::init_database(&config.db_path).await?;
    let store = Arc::new(RecordStore::open(Repository::new(pool)).await?);
    tracing::info!(
        "Loaded {} disks at revision {}",
        store.current().disks.len(),
        store.current().revision_id
    );

    let state = AppState {
        store,
        sessions: Arc::new(SessionGate::new(config.capacity_buckets.clone())),
        config: Arc::new(config.clone()),
    };

    // Close sessions nobody has used for a while
    tokio::spawn(sessions::run_expiry(
        state.sessions.clone(),
        config.session_idle_timeout,
    ));

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK and sessions for the auth layer
    let psk = state.config.api_psk.clone();
    let sessions = state.sessions.clone();

    // API routes
    let api_routes = Router::new()
        // Records and snapshots
        .route("/disks", get(api::get_snapshot).post(api::create_disk))
        .route("/disks/visible", get(api::list_visible))
        .route("/disks/stream", get(api::stream_disks))
        .route(
            "/disks/{id}",
            get(api::get_disk)
                .put(api::update_disk)
                .delete(api::delete_disk),
        )
        .route("/revision", get(api::get_revision))
        // Session
        .route(
            "/session",
            get(api::current_identity)
                .post(api::sign_in)
                .delete(api::sign_out),
        )
        // Dashboard
        .route("/dashboard", get(api::get_dashboard))
        .route("/dashboard/commands", post(api::apply_command))
        // Import and export
        .route(
            "/import/preview",
            post(api::preview_workbook).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/import/rows", post(api::preview_rows))
        .route("/export/{format}", get(api::export_report))
        // Apply auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::auth_layer(psk.clone(), sessions.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
