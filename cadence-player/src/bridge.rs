//! State synchronization bridge
//!
//! Fans every published [`PlaybackStateMessage`] out to the registered
//! subscribers and keeps the latest one for late joiners. Delivery is
//! best-effort and at-most-once per change: there is no replay queue and no
//! acknowledgment. A failing subscriber is logged and skipped; it never stops
//! delivery to the others.
//!
//! Subscribers are transports. [`ChannelSubscriber`] covers in-process
//! consumers (the SSE endpoint uses it); anything that can push a message
//! somewhere can implement [`Subscriber`].

use crate::error::Error;
use cadence_common::PlaybackStateMessage;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Identity of a subscriber registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a single delivery failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Subscriber is alive but not keeping up; this message is dropped
    #[error("subscriber buffer full")]
    Lagged,
    /// Subscriber transport is gone; the registration is pruned
    #[error("subscriber disconnected")]
    Disconnected,
}

/// A transport that can receive state snapshots
///
/// `deliver` must not block: it runs on the playback owner's task.
pub trait Subscriber: Send + Sync {
    fn deliver(&self, message: &PlaybackStateMessage) -> Result<(), DeliveryError>;
}

/// Subscriber backed by a bounded tokio channel
pub struct ChannelSubscriber {
    tx: mpsc::Sender<PlaybackStateMessage>,
}

impl ChannelSubscriber {
    pub fn new(tx: mpsc::Sender<PlaybackStateMessage>) -> Self {
        Self { tx }
    }
}

impl Subscriber for ChannelSubscriber {
    fn deliver(&self, message: &PlaybackStateMessage) -> Result<(), DeliveryError> {
        self.tx.try_send(message.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Lagged,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Disconnected,
        })
    }
}

/// Publish/subscribe hub between the playback owner and its observers
pub struct StateBridge {
    subscribers: Mutex<HashMap<SubscriberId, Arc<dyn Subscriber>>>,
    latest: RwLock<Option<PlaybackStateMessage>>,
    publish_count: AtomicU64,
}

impl StateBridge {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            latest: RwLock::new(None),
            publish_count: AtomicU64::new(0),
        }
    }

    /// Register `subscriber` under `id`
    ///
    /// Returns false (and changes nothing) if `id` is already registered.
    pub fn subscribe(&self, id: SubscriberId, subscriber: Arc<dyn Subscriber>) -> bool {
        let mut subscribers = lock(&self.subscribers);
        if subscribers.contains_key(&id) {
            return false;
        }
        subscribers.insert(id, subscriber);
        debug!("Subscriber {} registered, total {}", id, subscribers.len());
        true
    }

    /// Register a channel subscriber and hand back its receiving end
    pub fn subscribe_channel(
        &self,
        capacity: usize,
    ) -> (SubscriberId, mpsc::Receiver<PlaybackStateMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = SubscriberId::new();
        self.subscribe(id, Arc::new(ChannelSubscriber::new(tx)));
        (id, rx)
    }

    /// Remove a registration; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = lock(&self.subscribers).remove(&id).is_some();
        if removed {
            debug!("Subscriber {} unregistered", id);
        }
        removed
    }

    /// Record `message` as the latest state and deliver it to every subscriber
    ///
    /// Returns the number of successful deliveries.
    pub fn publish(&self, message: PlaybackStateMessage) -> usize {
        *self.latest.write().unwrap_or_else(|e| e.into_inner()) = Some(message.clone());
        self.publish_count.fetch_add(1, Ordering::Relaxed);

        let targets: Vec<(SubscriberId, Arc<dyn Subscriber>)> = lock(&self.subscribers)
            .iter()
            .map(|(id, subscriber)| (*id, Arc::clone(subscriber)))
            .collect();

        let mut delivered = 0;
        let mut disconnected = Vec::new();
        for (id, subscriber) in targets {
            match subscriber.deliver(&message) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    log_unreachable(id, e);
                    if e == DeliveryError::Disconnected {
                        disconnected.push(id);
                    }
                }
            }
        }

        if !disconnected.is_empty() {
            let mut subscribers = lock(&self.subscribers);
            for id in disconnected {
                subscribers.remove(&id);
            }
        }

        delivered
    }

    /// Deliver the latest state to one subscriber
    ///
    /// Used by late joiners instead of waiting for the next state change.
    /// Returns the latest state, or `None` if nothing has been published yet.
    /// The read guard is held through delivery so a concurrent publish cannot
    /// reach this subscriber ahead of the older snapshot.
    pub fn request_snapshot(
        &self,
        id: SubscriberId,
    ) -> crate::Result<Option<PlaybackStateMessage>> {
        let latest = self.latest.read().unwrap_or_else(|e| e.into_inner());
        let Some(message) = latest.as_ref() else {
            return Ok(None);
        };

        let subscriber = lock(&self.subscribers).get(&id).cloned();
        if let Some(subscriber) = subscriber {
            if let Err(e) = subscriber.deliver(message) {
                log_unreachable(id, e);
                if e == DeliveryError::Disconnected {
                    self.unsubscribe(id);
                }
                return Err(Error::SubscriberUnreachable {
                    subscriber: id,
                    reason: e.to_string(),
                });
            }
        }

        Ok(Some(message.clone()))
    }

    /// Most recently published state
    pub fn latest(&self) -> Option<PlaybackStateMessage> {
        self.latest.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Total number of publishes since creation
    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }
}

impl Default for StateBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn log_unreachable(id: SubscriberId, error: DeliveryError) {
    let error = Error::SubscriberUnreachable {
        subscriber: id,
        reason: error.to_string(),
    };
    warn!("{}", error);
}
