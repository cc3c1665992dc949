//! The monitor aggregate
//!
//! [`Monitor`] owns the result store, the broadcaster and the scheduler. It is
//! built once at startup and handed to the transport layer; clones share the
//! same running actors.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::actors::broadcaster::{BroadcasterHandle, SubscriberHandle};
use crate::actors::scheduler::{SchedulerHandle, SchedulerSettings};
use crate::config::MonitorConfig;
use crate::probe::{NetworkProber, Prober};
use crate::store::ResultStore;
use crate::subscription::{DeliveryError, MessageSink};

#[derive(Clone)]
pub struct Monitor {
    config: Arc<MonitorConfig>,
    store: ResultStore,
    broadcaster: BroadcasterHandle,
    scheduler: SchedulerHandle,
}

impl Monitor {
    /// Start monitoring with the network prober
    pub fn spawn(config: MonitorConfig) -> Self {
        let prober = Arc::new(NetworkProber::new(config.probe_timeout));
        Self::spawn_with_prober(config, prober)
    }

    /// Start monitoring with a custom prober
    pub fn spawn_with_prober(config: MonitorConfig, prober: Arc<dyn Prober>) -> Self {
        info!(
            "starting monitor for {} targets: {}",
            config.targets.len(),
            config
                .targets
                .iter()
                .map(|t| format!("{t} ({})", t.protocol()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let store = ResultStore::new(config.targets.clone());
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);

        let broadcaster = BroadcasterHandle::spawn(store.clone(), event_rx, config.delivery_timeout);
        let scheduler = SchedulerHandle::spawn(
            SchedulerSettings::from(&config),
            prober,
            store.clone(),
            event_tx,
        );

        Self {
            config: Arc::new(config),
            store,
            broadcaster,
            scheduler,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    pub fn broadcaster(&self) -> &BroadcasterHandle {
        &self.broadcaster
    }

    pub async fn subscribe(
        &self,
        sink: Box<dyn MessageSink>,
    ) -> Result<SubscriberHandle, DeliveryError> {
        self.broadcaster.subscribe(sink).await
    }

    pub async fn unsubscribe(&self, handle: SubscriberHandle) {
        self.broadcaster.unsubscribe(handle).await
    }

    /// Stop the scheduler and wait for it to settle
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        self.scheduler.stopped().await;
    }
}
