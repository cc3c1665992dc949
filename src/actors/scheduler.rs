//! SchedulerActor - Drives probe rounds on a fixed tick
//!
//! ## Message Flow
//!
//! ```text
//! Probe tick   → spawn one probe per target → ResultStore::record → try_send(Outcome)
//! Summary tick → ResultStore::snapshot → DashboardSummary → try_send(Summary)
//!     ↑
//!     └─── Commands (ProbeNow, SummaryNow, Shutdown)
//! ```
//!
//! The loop never awaits a probe: each probe is its own task and commits its
//! outcome independently. Publishing is best effort; a full event channel
//! drops the event instead of delaying the loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::MonitorConfig;
use crate::probe::Prober;
use crate::store::{DashboardSummary, ResultStore};
use crate::{ProbeOutcome, Target};

use super::messages::{MonitorEvent, SchedulerCommand, SchedulerState};

/// Timing parameters of the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub probe_interval: Duration,
    pub summary_interval: Duration,
    /// Total run time; `None` runs until shut down
    pub run_duration: Option<Duration>,
}

impl From<&MonitorConfig> for SchedulerSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            probe_interval: config.probe_interval,
            summary_interval: config.summary_interval,
            run_duration: config.run_duration,
        }
    }
}

/// Actor that probes every configured target once per tick
pub struct SchedulerActor {
    settings: SchedulerSettings,

    /// Prober shared by all probe tasks
    prober: Arc<dyn Prober>,

    /// Store receiving every outcome
    store: ResultStore,

    /// Internal event channel consumed by the broadcaster
    event_tx: mpsc::Sender<MonitorEvent>,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    /// Publishes lifecycle transitions
    state_tx: watch::Sender<SchedulerState>,
}

impl SchedulerActor {
    pub fn new(
        settings: SchedulerSettings,
        prober: Arc<dyn Prober>,
        store: ResultStore,
        event_tx: mpsc::Sender<MonitorEvent>,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        state_tx: watch::Sender<SchedulerState>,
    ) -> Self {
        Self {
            settings,
            prober,
            store,
            event_tx,
            command_rx,
            state_tx,
        }
    }

    /// Run the actor's main loop
    ///
    /// This runs until:
    /// - The configured run duration has elapsed
    /// - A Shutdown command is received
    /// - Every command sender has been dropped
    #[instrument(skip(self), fields(targets = self.store.targets().len()))]
    pub async fn run(mut self) {
        let started = Instant::now();
        let deadline = self.settings.run_duration.and_then(|d| {
            let deadline = started.checked_add(d);
            if deadline.is_none() {
                warn!("run duration {d:?} is out of range, running until shut down");
            }
            deadline
        });
        let first_summary = started
            .checked_add(self.settings.summary_interval)
            .unwrap_or(started);

        info!(
            "scheduler running: probe every {:?}, summary every {:?}, duration {:?}",
            self.settings.probe_interval, self.settings.summary_interval, self.settings.run_duration
        );
        self.state_tx.send_replace(SchedulerState::Running);

        let mut probe_ticker = interval(self.settings.probe_interval);
        probe_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut summary_ticker = interval_at(first_summary, self.settings.summary_interval);
        summary_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let expiry = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => futures::future::pending().await,
            }
        };
        tokio::pin!(expiry);

        loop {
            tokio::select! {
                _ = &mut expiry => {
                    info!("run duration elapsed, stopping");
                    break;
                }

                // Timer tick - launch a probe round
                _ = probe_ticker.tick() => {
                    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                        info!("run duration elapsed, stopping");
                        break;
                    }
                    self.launch_round();
                }

                // Independent timer - publish an overview
                _ = summary_ticker.tick() => {
                    self.publish_summary().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::ProbeNow { respond_to }) => {
                            debug!("received ProbeNow command");
                            let round = self.launch_round();
                            tokio::spawn(async move {
                                let outcomes = collect_round(round).await;
                                let _ = respond_to.send(outcomes);
                            });
                        }

                        Some(SchedulerCommand::SummaryNow { respond_to }) => {
                            debug!("received SummaryNow command");
                            let summary = self.publish_summary().await;
                            let _ = respond_to.send(summary);
                        }

                        Some(SchedulerCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        self.state_tx.send_replace(SchedulerState::Stopped);
        debug!("scheduler stopped");
    }

    /// Spawn one probe task per target
    ///
    /// Each task records its outcome and publishes it on its own, so outcomes
    /// for one target are committed in completion order.
    fn launch_round(&self) -> Vec<JoinHandle<ProbeOutcome>> {
        trace!("launching probe round");

        self.store
            .targets()
            .iter()
            .cloned()
            .map(|target| {
                let prober = self.prober.clone();
                let store = self.store.clone();
                let event_tx = self.event_tx.clone();

                tokio::spawn(probe_target(target, prober, store, event_tx))
            })
            .collect()
    }

    async fn publish_summary(&self) -> DashboardSummary {
        let summary = self.store.snapshot().await.dashboard();
        trace!(
            "publishing summary: {}/{} online",
            summary.online_targets, summary.total_targets
        );
        publish(&self.event_tx, MonitorEvent::Summary(summary.clone()));
        summary
    }
}

async fn probe_target(
    target: Target,
    prober: Arc<dyn Prober>,
    store: ResultStore,
    event_tx: mpsc::Sender<MonitorEvent>,
) -> ProbeOutcome {
    let outcome = prober.probe(&target).await;
    store.record(outcome.clone()).await;
    publish(&event_tx, MonitorEvent::Outcome(outcome.clone()));
    outcome
}

async fn collect_round(round: Vec<JoinHandle<ProbeOutcome>>) -> Vec<ProbeOutcome> {
    join_all(round)
        .await
        .into_iter()
        .filter_map(|joined| match joined {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("probe task failed: {e}");
                None
            }
        })
        .collect()
}

/// Non-blocking publish; drops the event when the channel is full
fn publish(event_tx: &mpsc::Sender<MonitorEvent>, event: MonitorEvent) {
    let kind = event.kind();
    match event_tx.try_send(event) {
        Ok(()) => trace!("published {kind} event"),
        Err(TrySendError::Full(_)) => trace!("event channel full, dropping {kind} event"),
        Err(TrySendError::Closed(_)) => trace!("no broadcaster listening, dropping {kind} event"),
    }
}

/// Handle for controlling a SchedulerActor
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
    state_rx: watch::Receiver<SchedulerState>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler actor
    pub fn spawn(
        settings: SchedulerSettings,
        prober: Arc<dyn Prober>,
        store: ResultStore,
        event_tx: mpsc::Sender<MonitorEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);

        let actor = SchedulerActor::new(settings, prober, store, event_tx, cmd_rx, state_tx);

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            state_rx,
        }
    }

    /// Launch a probe round now and wait until all of its outcomes are recorded
    pub async fn probe_now(&self) -> Result<Vec<ProbeOutcome>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::ProbeNow { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    /// Publish a summary now and return it
    pub async fn summary_now(&self) -> Result<DashboardSummary> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::SummaryNow { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    /// Stop the scheduler
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SchedulerCommand::Shutdown).await;
    }

    pub fn state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Wait until the scheduler has reached [`SchedulerState::Stopped`]
    pub async fn stopped(&self) {
        let mut state_rx = self.state_rx.clone();
        // An error means the actor is gone, which also means stopped.
        let _ = state_rx
            .wait_for(|state| *state == SchedulerState::Stopped)
            .await;
    }
}

// ============================================================================
// Tests
// ============================================================================
