//! Selection history endpoint
//!
//! GET /api/identities/:identity_id/history shows the aggregated window the
//! engine's recency stage sees, most recently selected first.

use affinity_common::time;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::api::required_id;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HistoryEntryResponse {
    pub influence_id: Uuid,
    pub count: u32,
    pub last_selected_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub identity_id: Uuid,
    pub lookback_days: u32,
    pub entries: Vec<HistoryEntryResponse>,
}

/// GET /api/identities/:identity_id/history
pub async fn get_history(
    State(state): State<AppState>,
    Path(identity_id): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let identity_id = required_id("identity_id", Some(&identity_id))?;
    let history = state.engine.history_at(identity_id, time::now()).await?;

    let mut entries: Vec<HistoryEntryResponse> = history
        .into_iter()
        .map(|(influence_id, entry)| HistoryEntryResponse {
            influence_id,
            count: entry.count,
            last_selected_at: entry.last_selected_at,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.last_selected_at
            .cmp(&a.last_selected_at)
            .then_with(|| a.influence_id.cmp(&b.influence_id))
    });

    Ok(Json(HistoryResponse {
        identity_id,
        lookback_days: state.engine.params().history_lookback_days,
        entries,
    }))
}

/// Build history routes
pub fn history_routes() -> Router<AppState> {
    Router::new().route("/api/identities/:identity_id/history", get(get_history))
}
