//! Shared result store
//!
//! Holds the latest outcome and the running [`TargetSummary`] for every
//! configured target. All mutation happens under one exclusive lock so a
//! reader never sees a summary whose counters disagree with each other.
//!
//! ## Locking
//!
//! - `record` takes the write lock for a handful of field updates, no I/O
//! - `snapshot` copies under the read lock; serialization happens afterwards
//! - summaries exist for every target from construction and are never removed

pub mod summary;

pub use summary::{DashboardSummary, TargetSummary};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{trace, warn};

use crate::{ProbeOutcome, Target};

#[derive(Debug, Default)]
struct StoreState {
    latest: HashMap<Target, ProbeOutcome>,
    summaries: HashMap<Target, TargetSummary>,
}

/// Concurrent table of latest outcomes and summaries
///
/// Cloning is cheap; clones share the same table.
#[derive(Debug, Clone)]
pub struct ResultStore {
    targets: Arc<[Target]>,
    state: Arc<RwLock<StoreState>>,
}

impl ResultStore {
    /// Create a store with an empty summary for every target
    pub fn new(targets: impl Into<Arc<[Target]>>) -> Self {
        let targets = targets.into();

        let summaries = targets
            .iter()
            .map(|target| (target.clone(), TargetSummary::new(target)))
            .collect();

        Self {
            targets,
            state: Arc::new(RwLock::new(StoreState {
                latest: HashMap::new(),
                summaries,
            })),
        }
    }

    /// Configured targets in configuration order
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Record an outcome, returning the updated summary.
    ///
    /// Outcomes for targets that are not configured are dropped and `None`
    /// is returned.
    pub async fn record(&self, outcome: ProbeOutcome) -> Option<TargetSummary> {
        let mut state = self.state.write().await;

        let Some(summary) = state.summaries.get_mut(&outcome.target) else {
            warn!("ignoring outcome for unknown target {}", outcome.target);
            return None;
        };
        summary.record(&outcome);
        let updated = summary.clone();

        state.latest.insert(outcome.target.clone(), outcome);
        drop(state);

        trace!(
            "recorded outcome for {}: {}/{} successful",
            updated.target, updated.successful, updated.total_tests
        );
        Some(updated)
    }

    pub async fn summary(&self, target: &Target) -> Option<TargetSummary> {
        self.state.read().await.summaries.get(target).cloned()
    }

    pub async fn latest(&self, target: &Target) -> Option<ProbeOutcome> {
        self.state.read().await.latest.get(target).cloned()
    }

    /// Consistent copy of the whole table
    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;

        let latest = self
            .targets
            .iter()
            .filter_map(|target| state.latest.get(target).cloned())
            .collect();
        let (summaries, online): (Vec<TargetSummary>, Vec<bool>) = self
            .targets
            .iter()
            .filter_map(|target| {
                let summary = state.summaries.get(target)?.clone();
                let up = state.latest.get(target).is_some_and(|outcome| outcome.success);
                Some((summary, up))
            })
            .unzip();

        StoreSnapshot {
            taken_at: Utc::now(),
            latest,
            summaries,
            online,
        }
    }
}

/// Copy of the store taken under a single read lock
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub taken_at: DateTime<Utc>,
    /// Latest outcome of every target probed at least once, in configuration order
    pub latest: Vec<ProbeOutcome>,
    /// One summary per configured target, in configuration order
    pub summaries: Vec<TargetSummary>,
    /// Whether the latest outcome succeeded, aligned with `summaries`
    online: Vec<bool>,
}

impl StoreSnapshot {
    /// Latest outcomes keyed by [`Target::key`]
    pub fn results_by_key(&self) -> BTreeMap<String, ProbeOutcome> {
        self.latest
            .iter()
            .map(|outcome| (outcome.target.key(), outcome.clone()))
            .collect()
    }

    pub fn dashboard(&self) -> DashboardSummary {
        let online: Vec<&TargetSummary> = self
            .summaries
            .iter()
            .zip(&self.online)
            .filter_map(|(summary, up)| up.then_some(summary))
            .collect();

        let avg_latency_ms = if online.is_empty() {
            0.0
        } else {
            online.iter().map(|s| s.avg_latency_ms).sum::<f64>() / online.len() as f64
        };

        let total_targets = self.summaries.len();
        let online_targets = online.len();

        DashboardSummary {
            timestamp: self.taken_at,
            total_targets,
            online_targets,
            offline_targets: total_targets - online_targets,
            avg_latency_ms,
            target_stats: self.summaries.clone(),
        }
    }
}
