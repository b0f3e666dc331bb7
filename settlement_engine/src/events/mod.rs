//! Live notifications
//!
//! Connected observers register with the [`NotificationHub`] on one of two kinds of [`Channel`]:
//! * the general channel, which receives a snapshot every time a settlement is responded to, and
//! * a per-settlement channel, which receives a summary every time that settlement is revised.
//!
//! Each subscriber gets a bounded queue. Publishing never waits on a subscriber: closed subscribers are pruned and full
//! queues drop the message for that subscriber only. Nothing is persisted, so only subscribers that are connected when
//! an event is published will ever see it.
mod event_types;
mod hub;

pub use event_types::{Channel, SettlementEvent};
pub use hub::{NotificationHub, Subscription, DEFAULT_SUBSCRIBER_BUFFER};
