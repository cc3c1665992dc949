//! BroadcasterActor - Fans out monitor events to live subscribers
//!
//! ## Key Features
//!
//! 1. **Serialize once** - each event is turned into JSON a single time
//! 2. **Independent deliveries** - every subscriber write runs on its own task
//! 3. **Self-cleaning** - a failed or timed out write unsubscribes that viewer
//! 4. **Snapshot first** - new subscribers get one message per known target
//!    before any live event
//!
//! ## Message Flow
//!
//! ```text
//! event channel → serialize → for each subscriber: spawn(deliver) → [viewer A, viewer B, ...]
//!                                                       └── on error: unsubscribe + close
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, instrument, trace};

use crate::store::ResultStore;
use crate::subscription::{
    DeliveryError, MessageSink, Subscriber, SubscriberId, SubscriberRegistry,
};

use super::messages::MonitorEvent;

/// Actor consuming the internal event channel
pub struct BroadcasterActor {
    registry: Arc<SubscriberRegistry>,

    /// Receiving side of the scheduler's event channel
    event_rx: mpsc::Receiver<MonitorEvent>,
}

impl BroadcasterActor {
    pub fn new(registry: Arc<SubscriberRegistry>, event_rx: mpsc::Receiver<MonitorEvent>) -> Self {
        Self { registry, event_rx }
    }

    /// Run until every event sender is gone
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting broadcaster actor");

        while let Some(event) = self.event_rx.recv().await {
            self.fan_out(event).await;
        }

        debug!("event channel closed, broadcaster stopped");
    }

    async fn fan_out(&self, event: MonitorEvent) {
        let message: Arc<str> = match event.to_message() {
            Ok(message) => message.into(),
            Err(e) => {
                error!("failed to serialize {} event: {e}", event.kind());
                return;
            }
        };

        let subscribers = self.registry.active().await;
        trace!(
            "fanning out {} event to {} subscribers",
            event.kind(),
            subscribers.len()
        );

        for subscriber in subscribers {
            tokio::spawn(deliver(self.registry.clone(), subscriber, message.clone()));
        }
    }
}

/// Deliver one message; a failure removes and closes the subscriber
async fn deliver(registry: Arc<SubscriberRegistry>, subscriber: Arc<Subscriber>, message: Arc<str>) {
    if let Err(e) = subscriber.deliver(&message).await {
        debug!("delivery to {} failed: {e}", subscriber.id());
        drop_subscriber(&registry, &subscriber).await;
    }
}

async fn drop_subscriber(registry: &SubscriberRegistry, subscriber: &Subscriber) {
    if registry.remove(subscriber.id()).await.is_some() {
        subscriber.close().await;
    }
}

/// Proof of an active subscription, consumed by [`BroadcasterHandle::unsubscribe`]
#[derive(Debug)]
pub struct SubscriberHandle {
    id: SubscriberId,
}

impl SubscriberHandle {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

/// Handle for registering viewers with the broadcaster
#[derive(Clone)]
pub struct BroadcasterHandle {
    registry: Arc<SubscriberRegistry>,
    store: ResultStore,
}

impl BroadcasterHandle {
    /// Spawn a new broadcaster actor reading from `event_rx`
    pub fn spawn(
        store: ResultStore,
        event_rx: mpsc::Receiver<MonitorEvent>,
        delivery_timeout: Duration,
    ) -> Self {
        let registry = Arc::new(SubscriberRegistry::new(delivery_timeout));

        let actor = BroadcasterActor::new(registry.clone(), event_rx);

        tokio::spawn(actor.run());

        Self { registry, store }
    }

    /// Register a sink and send it the current snapshot
    ///
    /// The subscriber's write lock is taken before registration and held
    /// until the snapshot is written, so live events queue up behind it and
    /// the viewer never starts from a blank state.
    pub async fn subscribe(
        &self,
        sink: Box<dyn MessageSink>,
    ) -> Result<SubscriberHandle, DeliveryError> {
        let subscriber = self.registry.create(sink);
        let id = subscriber.id();

        let mut writer = subscriber.lock().await;
        self.registry.insert(subscriber.clone()).await;

        let snapshot = self.store.snapshot().await;
        trace!("sending {} snapshot messages to {id}", snapshot.latest.len());

        for outcome in &snapshot.latest {
            let sent = match serde_json::to_string(outcome) {
                Ok(message) => subscriber.write(&mut writer, &message).await,
                Err(e) => Err(DeliveryError::Write(e.to_string())),
            };

            if let Err(e) = sent {
                debug!("snapshot delivery to {id} failed: {e}");
                drop(writer);
                drop_subscriber(&self.registry, &subscriber).await;
                return Err(e);
            }
        }

        Ok(SubscriberHandle { id })
    }

    /// Remove a subscriber and close its sink
    pub async fn unsubscribe(&self, handle: SubscriberHandle) {
        if let Some(subscriber) = self.registry.remove(handle.id).await {
            subscriber.close().await;
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.registry.len().await
    }
}

// ============================================================================
// Tests
// ============================================================================
