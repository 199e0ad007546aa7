//! HTTP API handlers for affinity-me

pub mod health;
pub mod history;
pub mod matches;
pub mod selections;

pub use health::health_routes;
pub use history::history_routes;
pub use matches::match_routes;
pub use selections::selection_routes;

use crate::error::{ApiError, ApiResult};
use uuid::Uuid;

/// Parse a required id field from a request
pub(crate) fn required_id(field: &str, value: Option<&str>) -> ApiResult<Uuid> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))?;

    Uuid::parse_str(value)
        .map_err(|_| ApiError::BadRequest(format!("{} is not a valid id: {}", field, value)))
}
