//! Read-only query API over housekeeping records.
//!
//! Scheduled cleanups of table paths and partitions are listed through two
//! endpoints, `GET /api/v1/tables` and `GET /api/v1/paths`, each accepting
//! optional exact-match filters plus page, size and sort parameters.

use std::sync::Arc;

use axum::Router;
use http::StatusCode;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
#[cfg(feature = "server")]
pub mod observability;
pub mod routes;
pub mod services;
pub mod specification;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::BeekeeperConfig>,
    pub db: Option<Arc<db::DbPool>>,
    pub services: Option<services::Services>,
}

impl AppState {
    /// Connect to the configured record store, applying migrations when the
    /// backend asks for them. Without a `[database]` section the state has no
    /// store and the listing endpoints answer 503.
    pub async fn new(config: config::BeekeeperConfig) -> db::DbResult<Self> {
        if config.database.is_none() {
            tracing::warn!("No [database] configured; listing endpoints will return 503");
            return Ok(Self::with_db(config, None));
        }

        let pool = db::DbPool::from_config(&config.database).await?;
        tracing::info!(backend = pool.backend(), "Record store connected");

        if config.database.run_migrations() {
            pool.run_migrations().await?;
        }

        Ok(Self::with_db(config, Some(pool)))
    }

    pub fn with_db(config: config::BeekeeperConfig, db: Option<db::DbPool>) -> Self {
        let db = db.map(Arc::new);
        let services = db
            .as_ref()
            .map(|db| services::Services::new(Arc::clone(db), config.api.pagination));
        Self {
            config: Arc::new(config),
            db,
            services,
        }
    }
}

pub fn build_app(config: &config::BeekeeperConfig, state: AppState) -> Router {
    let mut app = Router::new()
        .merge(routes::health_routes())
        .nest("/api", routes::api_routes());

    if let Some(cors) = config.server.cors.clone().into_layer() {
        app = app.layer(cors);
    }

    app.layer(axum::middleware::from_fn(
        middleware::request_id_middleware,
    ))
    .layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        config.server.timeout(),
    ))
    .layer(TraceLayer::new_for_http())
    .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
    .with_state(state)
}
