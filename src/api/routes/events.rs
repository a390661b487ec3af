//! Event history endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::actors::store::DEFAULT_RECENT_LIMIT;
use crate::api::{error::ApiResult, state::ApiState, ApiError};
use crate::HeatEvent;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<usize>,
}

/// GET /api/v1/events/recent?limit=N
///
/// Stored events, newest first.
pub async fn recent_events(
    State(state): State<ApiState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<HeatEvent>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);

    let events = state.store.recent(limit).await?;

    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct ByPointQuery {
    id: Option<String>,
    name: Option<String>,
}

/// GET /api/v1/events/by-point?id=|name=
///
/// The newest stored event for one point, matched by id or display name.
pub async fn event_by_point(
    State(state): State<ApiState>,
    Query(query): Query<ByPointQuery>,
) -> ApiResult<Json<HeatEvent>> {
    let lookup = query
        .id
        .or(query.name)
        .ok_or_else(|| ApiError::InvalidRequest("either 'id' or 'name' is required".to_string()))?;

    match state.store.find_by_point_id_or_name(&lookup).await? {
        Some(event) => Ok(Json(event)),
        None => Err(ApiError::NotFound(format!("no event for point '{lookup}'"))),
    }
}
