//! Health check endpoint

use axum::{Json, extract::State};

use crate::actors::messages::SchedulerState;
use crate::api::{state::ApiState, types::HealthResponse};

/// GET /api/health
///
/// Reports "ok" while the scheduler is running and "stopped" once its run
/// duration has elapsed. The HTTP status is 200 in both cases.
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let scheduler = state.monitor.scheduler().state();
    let status = match scheduler {
        SchedulerState::Stopped => "stopped",
        _ => "ok",
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        started_at: state.started_at.to_rfc3339(),
        scheduler,
        targets: state.monitor.store().targets().len(),
        subscribers: state.monitor.broadcaster().subscriber_count().await,
    })
}
