//! Latest results and dashboard summary

use std::collections::BTreeMap;

use axum::{Json, extract::State};

use crate::ProbeOutcome;
use crate::api::state::ApiState;
use crate::store::DashboardSummary;

/// GET /api/results
///
/// Latest outcome of every probed target, keyed by target key.
/// Targets that have not been probed yet are absent.
pub async fn get_results(State(state): State<ApiState>) -> Json<BTreeMap<String, ProbeOutcome>> {
    let snapshot = state.monitor.store().snapshot().await;
    Json(snapshot.results_by_key())
}

/// GET /api/summary
pub async fn get_summary(State(state): State<ApiState>) -> Json<DashboardSummary> {
    let snapshot = state.monitor.store().snapshot().await;
    Json(snapshot.dashboard())
}
