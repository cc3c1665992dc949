//! Aggregated per-target and dashboard-wide statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ProbeOutcome, Target};

/// Running statistics for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    /// Display form of the target (`host` or `host:port`)
    pub target: String,
    pub total_tests: u64,
    pub successful: u64,
    pub failed: u64,
    pub packet_loss_percent: f64,
    /// Mean latency over successful attempts only
    pub avg_latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl TargetSummary {
    pub fn new(target: &Target) -> Self {
        Self {
            target: target.to_string(),
            total_tests: 0,
            successful: 0,
            failed: 0,
            packet_loss_percent: 0.0,
            avg_latency_ms: 0.0,
            last_error: None,
        }
    }

    /// Fold one outcome into the summary.
    ///
    /// The average is updated incrementally so no history is kept.
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.total_tests += 1;

        if outcome.success {
            self.successful += 1;
            let n = self.successful as f64;
            self.avg_latency_ms = (self.avg_latency_ms * (n - 1.0) + outcome.duration_ms) / n;
        } else {
            self.failed += 1;
            self.last_error = outcome.error.clone();
        }

        self.packet_loss_percent = self.failed as f64 / self.total_tests as f64 * 100.0;
    }
}

/// Point-in-time overview across all targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub timestamp: DateTime<Utc>,
    pub total_targets: usize,
    pub online_targets: usize,
    pub offline_targets: usize,
    /// Mean of the online targets' average latencies
    pub avg_latency_ms: f64,
    pub target_stats: Vec<TargetSummary>,
}
