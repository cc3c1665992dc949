//! API response types

use serde::{Deserialize, Serialize};

use crate::ProbeOutcome;
use crate::actors::messages::SchedulerState;
use crate::store::TargetSummary;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub started_at: String,
    pub scheduler: SchedulerState,
    pub targets: usize,
    pub subscribers: usize,
}

/// Summary and latest outcome of a single target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDetail {
    pub key: String,
    pub summary: TargetSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<ProbeOutcome>,
}
