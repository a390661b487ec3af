//! Point catalog endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::{error::ApiResult, state::ApiState, ApiError};
use crate::registry::MonitoredPoint;

#[derive(Debug, Deserialize)]
pub struct PointsQuery {
    /// `all` (default) or `base`
    scope: Option<String>,
}

/// GET /api/v1/points
///
/// The monitored point catalog: the full densified set, or base points only.
pub async fn list_points(
    State(state): State<ApiState>,
    Query(query): Query<PointsQuery>,
) -> ApiResult<Json<Vec<MonitoredPoint>>> {
    let points: Vec<MonitoredPoint> = match query.scope.as_deref() {
        None | Some("all") => state.registry.all_points(),
        Some("base") => state
            .registry
            .base_points()
            .iter()
            .map(MonitoredPoint::from)
            .collect(),
        Some(other) => {
            return Err(ApiError::InvalidRequest(format!(
                "unknown scope '{other}', expected 'all' or 'base'"
            )));
        }
    };

    Ok(Json(points))
}
