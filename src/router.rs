//! Callback routing from backend events to notification channels

use crate::midi::DeviceHandle;
use crate::notify::NotificationSink;
use crate::session::SharedSessionTable;
use log::debug;
use std::sync::Arc;

/// One backend callback invocation, as delivered upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub port: u32,
    pub message_kind: u32,
    pub instance_tag: u32,
    pub param1: u32,
    pub param2: u32,
}

impl EventRecord {
    pub fn new(port: u32, message_kind: u32, instance_tag: u32, param1: u32, param2: u32) -> Self {
        EventRecord {
            port,
            message_kind,
            instance_tag,
            param1,
            param2,
        }
    }

    /// The fixed five-element wire shape.
    pub fn to_array(self) -> [u32; 5] {
        [
            self.port,
            self.message_kind,
            self.instance_tag,
            self.param1,
            self.param2,
        ]
    }
}

impl From<EventRecord> for [u32; 5] {
    fn from(record: EventRecord) -> Self {
        record.to_array()
    }
}

/// Entry point handed to the backend at open time.
///
/// Cloning is cheap; every clone shares the same session table and sink.
#[derive(Clone)]
pub struct CallbackRouter {
    table: SharedSessionTable,
    sink: Arc<dyn NotificationSink>,
}

impl CallbackRouter {
    pub fn new(table: SharedSessionTable, sink: Arc<dyn NotificationSink>) -> Self {
        CallbackRouter { table, sink }
    }

    /// Resolves `handle` to its port and channel and forwards the record.
    ///
    /// Events for handles no longer in the table (a callback racing a close)
    /// are dropped. Returns whether the record was forwarded.
    pub fn route(
        &self,
        handle: DeviceHandle,
        message_kind: u32,
        instance_tag: u32,
        param1: u32,
        param2: u32,
    ) -> bool {
        let target = {
            let table = self.table.lock();
            table
                .port_for(handle)
                .and_then(|port| table.channel_for(port).map(|channel| (port, channel)))
        };

        let Some((port, channel)) = target else {
            debug!(
                "Dropping event {:#x} for unknown handle {}",
                message_kind, handle
            );
            return false;
        };

        let record = EventRecord::new(port, message_kind, instance_tag, param1, param2);
        debug!("Routing {:?} to channel {}", record.to_array(), channel);
        self.sink.notify(channel, record);
        true
    }
}
