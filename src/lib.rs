//! Precast ERP server core
//!
//! Stock registry, dispatch and erection coordinators, and work-order
//! revisions for a precast-concrete construction ERP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::auth::{DbSessionStore, SessionStore};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::AppServices;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    pub services: AppServices,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// Wires every service over one pool, with sessions resolved from the
    /// database.
    pub fn new(db: Arc<DbPool>, config: AppConfig, event_sender: EventSender) -> Self {
        let services = AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            sessions: Arc::new(DbSessionStore::new(db.clone())),
            db,
            config,
            event_sender,
            services,
        }
    }

    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }
}

/// Routes mounted under `/api/v1`. Everything except `/health` requires a
/// session.
pub fn api_v1_routes(sessions: Arc<dyn SessionStore>) -> Router<AppState> {
    let protected = Router::new()
        .merge(handlers::precast_stock::precast_stock_routes())
        .merge(handlers::dispatch::dispatch_routes())
        .merge(handlers::erection::erection_routes())
        .merge(handlers::work_orders::work_order_routes())
        .merge(handlers::invoices::invoice_routes())
        .route_layer(middleware::from_fn_with_state(
            sessions,
            auth::require_session,
        ));

    Router::new()
        .merge(handlers::health::health_routes())
        .merge(protected)
}

/// The complete HTTP application: API, Swagger UI and the middleware stack.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::<AppState>::new()
        .route("/", get(|| async { "precast-erp up" }))
        .nest("/api/v1", api_v1_routes(state.sessions.clone()))
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}
