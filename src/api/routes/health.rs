//! Health check endpoint

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::{error::ApiResult, state::ApiState};

/// GET /api/v1/health
///
/// Process uptime, subscriber count, stored-event count, and the configured
/// poll interval.
pub async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let subscribers = state.fanout.subscriber_count().await?;
    let stored_events = state.store.count().await?;

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "subscribers": subscribers,
        "stored_events": stored_events,
        "poll_interval_secs": state.poll_interval_secs,
    })))
}
