//! Match endpoint
//!
//! POST /api/matches ranks an identity's influences for a request context.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::required_id;
use crate::engine::{Match, MatchRequest};
use crate::error::ApiResult;
use crate::AppState;

/// Request context
#[derive(Debug, Default, Deserialize)]
pub struct MatchContextBody {
    pub mood: Option<String>,
    /// Defaults to the configured default category type
    pub category_types: Option<Vec<String>>,
}

/// Request body for POST /api/matches
///
/// `identity_id` is optional here so a missing id is reported as 400 with a
/// clear message rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct MatchRequestBody {
    pub identity_id: Option<String>,
    #[serde(default)]
    pub context: MatchContextBody,
    pub count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub matches: Vec<Match>,
}

/// POST /api/matches
pub async fn find_matches(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequestBody>, JsonRejection>,
) -> ApiResult<Json<MatchResponse>> {
    let Json(body) = payload?;
    let identity_id = required_id("identity_id", body.identity_id.as_deref())?;

    let request = MatchRequest {
        identity_id,
        mood: body.context.mood,
        category_types: body.context.category_types.unwrap_or_default(),
        count: body.count,
    };

    let matches = state.engine.find_matches(&request).await?;
    Ok(Json(MatchResponse { matches }))
}

/// Build match routes
pub fn match_routes() -> Router<AppState> {
    Router::new().route("/api/matches", post(find_matches))
}
