//! Selection recording endpoint
//!
//! POST /api/selections appends a Selection Event after the caller has acted
//! on a match. This is the only write path in the service; the matching
//! engine itself never records history.

use affinity_common::db::selections::record_selection;
use affinity_common::db::SelectionEvent;
use affinity_common::time;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::api::required_id;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectionBody {
    pub identity_id: Option<String>,
    pub influence_id: Option<String>,
    /// Defaults to the time the request is received
    pub selected_at: Option<DateTime<Utc>>,
}

/// POST /api/selections
pub async fn create_selection(
    State(state): State<AppState>,
    payload: Result<Json<SelectionBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SelectionEvent>)> {
    let Json(body) = payload?;
    let identity_id = required_id("identity_id", body.identity_id.as_deref())?;
    let influence_id = required_id("influence_id", body.influence_id.as_deref())?;
    let selected_at = body.selected_at.unwrap_or_else(time::now);

    let event = record_selection(&state.db, identity_id, influence_id, selected_at).await?;

    info!(
        identity = %identity_id,
        influence = %influence_id,
        "Selection recorded"
    );

    Ok((StatusCode::CREATED, Json(event)))
}

/// Build selection routes
pub fn selection_routes() -> Router<AppState> {
    Router::new().route("/api/selections", post(create_selection))
}
