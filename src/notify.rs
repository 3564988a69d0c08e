//! Upstream notification channels
//!
//! The router pushes each [`EventRecord`] to a [`NotificationSink`] keyed by
//! the [`ChannelId`] the caller supplied when opening the port. Delivery is
//! fire-and-forget: sinks never report failure back to the router.

use crate::router::EventRecord;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Opaque identifier of an upstream receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub i64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, channel: ChannelId, record: EventRecord);
}

/// Fans event records out to crossbeam channels, one per subscribed id.
///
/// Records for ids nobody subscribed to, or whose receiver was dropped, are
/// discarded.
#[derive(Clone, Default)]
pub struct ChannelHub {
    senders: Arc<Mutex<HashMap<ChannelId, Sender<EventRecord>>>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `channel` and returns the receiving end. Subscribing again
    /// replaces the previous receiver.
    pub fn subscribe(&self, channel: ChannelId) -> Receiver<EventRecord> {
        let (tx, rx) = unbounded();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel, tx);
        rx
    }

    pub fn unsubscribe(&self, channel: ChannelId) {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&channel);
    }
}

impl NotificationSink for ChannelHub {
    fn notify(&self, channel: ChannelId, record: EventRecord) {
        let sender = self
            .senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel)
            .cloned();

        match sender {
            Some(tx) => {
                if tx.send(record).is_err() {
                    debug!("Receiver for channel {} is gone, dropping {:?}", channel, record);
                }
            }
            None => debug!("No subscriber on channel {}, dropping {:?}", channel, record),
        }
    }
}

impl<F> NotificationSink for F
where
    F: Fn(ChannelId, EventRecord) + Send + Sync,
{
    fn notify(&self, channel: ChannelId, record: EventRecord) {
        self(channel, record)
    }
}
