//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Request/response messages sent to the scheduler via mpsc
//! 2. **Events**: Outcomes and summaries pushed onto the internal event channel
//! 3. **Immutability**: Events are cloneable values, serialized once per fan-out

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::{ProbeOutcome, store::DashboardSummary};

/// Event flowing from the scheduler to the broadcaster
///
/// The internal channel is bounded and written with `try_send`; events that
/// do not fit are dropped. The result store stays the source of truth.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A single probe finished
    Outcome(ProbeOutcome),

    /// Periodic overview over all targets
    Summary(DashboardSummary),
}

impl MonitorEvent {
    /// Serialize the event into the message sent to viewers
    ///
    /// Outcomes are sent as-is, summaries wrapped as `{"type":"summary","summary":{..}}`.
    pub fn to_message(&self) -> serde_json::Result<String> {
        match self {
            MonitorEvent::Outcome(outcome) => serde_json::to_string(outcome),
            MonitorEvent::Summary(summary) => serde_json::to_string(&serde_json::json!({
                "type": "summary",
                "summary": summary,
            })),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MonitorEvent::Outcome(_) => "outcome",
            MonitorEvent::Summary(_) => "summary",
        }
    }
}

/// Commands that can be sent to the SchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Launch an extra probe round outside the regular tick
    ///
    /// The reply is sent once every probe of that round has been recorded.
    ProbeNow {
        respond_to: oneshot::Sender<Vec<ProbeOutcome>>,
    },

    /// Build and publish a dashboard summary immediately
    SummaryNow {
        respond_to: oneshot::Sender<DashboardSummary>,
    },

    /// Stop scheduling; probes already in flight still complete
    Shutdown,
}

/// Lifecycle of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "idle"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Stopped => write!(f, "stopped"),
        }
    }
}
