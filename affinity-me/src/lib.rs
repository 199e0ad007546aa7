//! affinity-me library - Affinity Matching Engine
//!
//! Ranks an identity's tagged preference items (influences) for a request
//! context, balancing stated alignment, mood relevance and recency-based
//! rotation.

use affinity_common::db::SqliteStore;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod engine;
pub mod error;
pub mod params;

pub use crate::error::{ApiError, ApiResult};
use crate::engine::MatchEngine;
use crate::params::EngineParams;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used for selection writes
    pub db: SqlitePool,
    /// Read-only matching engine
    pub engine: Arc<MatchEngine>,
}

impl AppState {
    /// Create application state over an initialized database
    pub fn new(db: SqlitePool, params: EngineParams) -> Self {
        let store = Arc::new(SqliteStore::new(db.clone()));
        let engine = Arc::new(MatchEngine::new(store, Arc::new(params)));
        Self { db, engine }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::match_routes())
        .merge(api::selection_routes())
        .merge(api::history_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
