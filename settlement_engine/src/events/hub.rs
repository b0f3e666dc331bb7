use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    RwLock,
};

use crate::events::{Channel, SettlementEvent};

/// The number of undelivered messages a subscriber may have queued before further messages to it are dropped.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 32;

struct Subscriber {
    id: u64,
    sender: mpsc::Sender<Arc<str>>,
}

#[derive(Default)]
struct Registry {
    general: Vec<Subscriber>,
    by_settlement: HashMap<i64, Vec<Subscriber>>,
}

impl Registry {
    fn subscribers(&self, channel: Channel) -> &[Subscriber] {
        match channel {
            Channel::General => &self.general,
            Channel::Settlement(id) => self.by_settlement.get(&id).map(Vec::as_slice).unwrap_or_default(),
        }
    }

    fn add(&mut self, channel: Channel, subscriber: Subscriber) {
        match channel {
            Channel::General => self.general.push(subscriber),
            Channel::Settlement(id) => self.by_settlement.entry(id).or_default().push(subscriber),
        }
    }

    /// Removes the given subscribers from the channel. Per-settlement lists that become empty are dropped.
    /// Returns the number of subscribers actually removed.
    fn remove(&mut self, channel: Channel, ids: &[u64]) -> usize {
        let list = match channel {
            Channel::General => &mut self.general,
            Channel::Settlement(id) => match self.by_settlement.get_mut(&id) {
                Some(list) => list,
                None => return 0,
            },
        };
        let before = list.len();
        list.retain(|s| !ids.contains(&s.id));
        let removed = before - list.len();
        if let Channel::Settlement(id) = channel {
            if list.is_empty() {
                self.by_settlement.remove(&id);
            }
        }
        removed
    }
}

/// A live registration on a [`Channel`]. Payloads published on the channel arrive via [`Subscription::recv`].
///
/// Dropping a subscription does not remove it from the hub; call [`NotificationHub::unsubscribe`] when the consumer
/// goes away. A subscription that is dropped without unsubscribing is pruned on the next publish to its channel.
pub struct Subscription {
    id: u64,
    channel: Channel,
    receiver: mpsc::Receiver<Arc<str>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Waits for the next payload. Returns `None` once the subscription has been removed from the hub and all queued
    /// payloads have been consumed.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.receiver.recv().await
    }

    /// Returns the next queued payload, if there is one, without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.receiver.try_recv().ok()
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscription #{} on {}", self.id, self.channel)
    }
}

/// The registry of connected observers, shared by every request handler.
///
/// Cloning the hub is cheap; all clones refer to the same registry.
#[derive(Clone)]
pub struct NotificationHub {
    registry: Arc<RwLock<Registry>>,
    next_id: Arc<AtomicU64>,
    buffer_size: usize,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationHub (buffer size {})", self.buffer_size)
    }
}

impl NotificationHub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            next_id: Arc::new(AtomicU64::new(1)),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Registers a new subscriber at the end of the channel's subscriber list.
    pub async fn subscribe(&self, channel: Channel) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        self.registry.write().await.add(channel, Subscriber { id, sender });
        debug!("📬️ Subscriber #{id} connected to the {channel} channel");
        Subscription { id, channel, receiver }
    }

    /// Removes the subscription from its channel. Removing a subscription that is already gone is a no-op, and
    /// `false` is returned.
    pub async fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let removed = self.registry.write().await.remove(subscription.channel, &[subscription.id]) > 0;
        if removed {
            debug!("📬️ Subscriber #{} disconnected from the {} channel", subscription.id, subscription.channel);
        }
        removed
    }

    /// The number of subscribers currently registered on the channel.
    pub async fn subscriber_count(&self, channel: Channel) -> usize {
        self.registry.read().await.subscribers(channel).len()
    }

    /// The number of settlements that currently have at least one subscriber.
    pub async fn active_settlement_channels(&self) -> usize {
        self.registry.read().await.by_settlement.len()
    }

    /// Serializes the event once and queues it for every subscriber of the event's channel, in subscription order.
    ///
    /// A subscriber that has gone away is pruned, and a subscriber whose queue is full misses this message. Neither
    /// affects delivery to the other subscribers. Returns the number of subscribers the payload was queued for.
    pub async fn publish(&self, event: &SettlementEvent) -> usize {
        let payload = match event.to_payload() {
            Ok(p) => Arc::<str>::from(p),
            Err(e) => {
                error!("📬️ Could not serialize {event:?}. Nobody will be notified. {e}");
                return 0;
            },
        };
        self.publish_payload(event.channel(), payload).await
    }

    async fn publish_payload(&self, channel: Channel, payload: Arc<str>) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        {
            let registry = self.registry.read().await;
            for subscriber in registry.subscribers(channel) {
                match subscriber.sender.try_send(Arc::clone(&payload)) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => warn!(
                        "📬️ Subscriber #{} on the {channel} channel is not keeping up. Message dropped.",
                        subscriber.id
                    ),
                    Err(TrySendError::Closed(_)) => closed.push(subscriber.id),
                }
            }
        }
        if !closed.is_empty() {
            let pruned = self.registry.write().await.remove(channel, &closed);
            debug!("📬️ Pruned {pruned} disconnected subscribers from the {channel} channel");
        }
        trace!("📬️ Broadcast to {delivered} subscribers on the {channel} channel: {payload}");
        delivered
    }
}
