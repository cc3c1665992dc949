//! Live-update subscribers
//!
//! A [`Subscriber`] wraps one viewer's output sink behind its own mutex, so
//! concurrent deliveries to the same viewer are serialized while deliveries to
//! different viewers never wait on each other. The [`SubscriberRegistry`]
//! tracks the active subscribers under a separate lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, trace};

/// Default upper bound for a single write to a subscriber
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("subscriber channel closed")]
    Closed,
    #[error("write to subscriber failed: {0}")]
    Write(String),
    #[error("write to subscriber timed out after {0:?}")]
    Timeout(Duration),
}

/// Output side of a viewer connection
#[async_trait]
pub trait MessageSink: Send + 'static {
    /// Write one complete, already serialized message.
    async fn send(&mut self, message: &str) -> Result<(), DeliveryError>;

    /// Close the underlying transport. Errors are irrelevant at this point.
    async fn close(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

/// One registered viewer
pub struct Subscriber {
    id: SubscriberId,
    sink: Arc<Mutex<Box<dyn MessageSink>>>,
    delivery_timeout: Duration,
}

impl Subscriber {
    fn new(id: SubscriberId, sink: Box<dyn MessageSink>, delivery_timeout: Duration) -> Self {
        Self {
            id,
            sink: Arc::new(Mutex::new(sink)),
            delivery_timeout,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Deliver one message, waiting for any write already in progress.
    pub async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        let mut sink = self.sink.lock().await;
        self.write(&mut sink, message).await
    }

    /// Take exclusive write access, e.g. to send a snapshot before live events.
    pub(crate) async fn lock(&self) -> OwnedMutexGuard<Box<dyn MessageSink>> {
        self.sink.clone().lock_owned().await
    }

    pub(crate) async fn write(
        &self,
        sink: &mut Box<dyn MessageSink>,
        message: &str,
    ) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.delivery_timeout, sink.send(message)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(self.delivery_timeout)),
        }
    }

    /// Close the sink, giving up after the delivery timeout.
    pub async fn close(&self) {
        let closing = async { self.sink.lock().await.close().await };
        if tokio::time::timeout(self.delivery_timeout, closing).await.is_err() {
            debug!("{} did not close within {:?}", self.id, self.delivery_timeout);
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Set of active subscribers
#[derive(Debug)]
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<SubscriberId, Arc<Subscriber>>>,
    next_id: AtomicU64,
    delivery_timeout: Duration,
}

impl SubscriberRegistry {
    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            delivery_timeout,
        }
    }

    /// Wrap a sink in a new subscriber without registering it yet
    pub fn create(&self, sink: Box<dyn MessageSink>) -> Arc<Subscriber> {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        Arc::new(Subscriber::new(id, sink, self.delivery_timeout))
    }

    pub async fn insert(&self, subscriber: Arc<Subscriber>) {
        let id = subscriber.id();
        let count = {
            let mut subscribers = self.subscribers.write().await;
            subscribers.insert(id, subscriber);
            subscribers.len()
        };
        debug!("{id} registered ({count} active)");
    }

    /// Remove a subscriber, returning it if it was still registered
    pub async fn remove(&self, id: SubscriberId) -> Option<Arc<Subscriber>> {
        let removed = self.subscribers.write().await.remove(&id);
        if removed.is_some() {
            debug!("{id} removed");
        } else {
            trace!("{id} was already removed");
        }
        removed
    }

    /// Current subscribers; the lock is released before returning
    pub async fn active(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_DELIVERY_TIMEOUT)
    }
}

/// Sink forwarding messages into an unbounded channel
///
/// Handy for in-process consumers; the send fails once the receiver is gone.
pub struct ChannelSink {
    tx: tokio::sync::mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn channel() -> (Self, tokio::sync::mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send(&mut self, message: &str) -> Result<(), DeliveryError> {
        self.tx
            .send(message.to_string())
            .map_err(|_| DeliveryError::Closed)
    }
}
