//! Per-target detail

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::debug;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::TargetDetail,
};
use crate::store::TargetSummary;

/// GET /api/targets/:key
pub async fn get_target(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> ApiResult<Json<TargetDetail>> {
    let store = state.monitor.store();

    let target = store
        .targets()
        .iter()
        .find(|target| target.key() == key)
        .cloned()
        .ok_or_else(|| {
            debug!("lookup of unknown target key {key}");
            ApiError::NotFound(format!("Target '{}' not found", key))
        })?;

    let summary = store
        .summary(&target)
        .await
        .unwrap_or_else(|| TargetSummary::new(&target));
    let latest = store.latest(&target).await;

    Ok(Json(TargetDetail {
        key,
        summary,
        latest,
    }))
}
