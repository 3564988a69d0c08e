//! Session table
//!
//! Three mappings kept consistent as a unit:
//! - port -> device handle
//! - device handle -> port (derived index; backend callbacks only carry the handle)
//! - port -> notification channel
//!
//! The table is shared between the [`SessionManager`](crate::lifecycle::SessionManager)
//! and the [`CallbackRouter`](crate::router::CallbackRouter) behind a mutex, see
//! [`SharedSessionTable`].

use crate::midi::DeviceHandle;
use crate::notify::ChannelId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Entries removed from the table by [`SessionTable::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedSession {
    pub handle: DeviceHandle,
    pub channel: Option<ChannelId>,
}

#[derive(Debug, Default)]
pub struct SessionTable {
    handles: HashMap<u32, DeviceHandle>,
    ports: HashMap<DeviceHandle, u32>,
    channels: HashMap<u32, ChannelId>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts all three mappings for `port`. Any previous session for the
    /// port is dropped from the table first so no stale reverse entry is left.
    pub fn insert(&mut self, port: u32, handle: DeviceHandle, channel: ChannelId) {
        self.remove(port);
        self.handles.insert(port, handle);
        self.ports.insert(handle, port);
        self.channels.insert(port, channel);
    }

    /// Removes all three mappings for `port`, returning what was stored.
    pub fn remove(&mut self, port: u32) -> Option<RemovedSession> {
        let handle = self.handles.remove(&port)?;
        // A NULL handle may be shared by several failed opens; only drop the
        // reverse entry if it still points at this port.
        if self.ports.get(&handle) == Some(&port) {
            self.ports.remove(&handle);
        }
        let channel = self.channels.remove(&port);
        Some(RemovedSession { handle, channel })
    }

    pub fn handle_for(&self, port: u32) -> Option<DeviceHandle> {
        self.handles.get(&port).copied()
    }

    pub fn port_for(&self, handle: DeviceHandle) -> Option<u32> {
        self.ports.get(&handle).copied()
    }

    pub fn channel_for(&self, port: u32) -> Option<ChannelId> {
        self.channels.get(&port).copied()
    }

    /// True if `port` appears in the port-keyed mappings or as the target of a
    /// reverse entry.
    pub fn contains_port(&self, port: u32) -> bool {
        self.handles.contains_key(&port)
            || self.channels.contains_key(&port)
            || self.ports.values().any(|p| *p == port)
    }

    pub fn ports(&self) -> Vec<u32> {
        let mut ports: Vec<u32> = self.handles.keys().copied().collect();
        ports.sort_unstable();
        ports
    }

    /// Ports holding a real handle, excluding NULL placeholders left by
    /// failed opens.
    pub fn live_ports(&self) -> Vec<u32> {
        let mut ports: Vec<u32> = self
            .handles
            .iter()
            .filter(|(_, handle)| !handle.is_null())
            .map(|(port, _)| *port)
            .collect();
        ports.sort_unstable();
        ports
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Session table shared between lifecycle operations and the callback router.
#[derive(Debug, Clone, Default)]
pub struct SharedSessionTable(Arc<Mutex<SessionTable>>);

impl SharedSessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the table. A panic on another thread while holding the lock does
    /// not leave the maps half-updated (every mutation is a single call), so a
    /// poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, SessionTable> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
