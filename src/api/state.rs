//! API shared state

use chrono::{DateTime, Utc};

use crate::monitor::Monitor;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// The running monitor (store, broadcaster, scheduler)
    pub monitor: Monitor,

    /// When the server state was created, reported by the health check
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(monitor: Monitor) -> Self {
        Self {
            monitor,
            started_at: Utc::now(),
        }
    }
}
