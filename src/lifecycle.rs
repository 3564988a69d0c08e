//! Session lifecycle: open, start, stop and close MIDI input ports
//!
//! Each operation drives the backend and the session table in lock-step and
//! returns the backend's status code verbatim.

use crate::midi::{CapabilityDescriptor, DeviceHandle, MidiBackend, MmResult};
use crate::notify::{ChannelId, NotificationSink};
use crate::router::CallbackRouter;
use crate::session::SharedSessionTable;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};

pub struct SessionManager<B: MidiBackend> {
    backend: B,
    table: SharedSessionTable,
    router: CallbackRouter,
    instance_tag: u32,
    // Serialises lifecycle operations. The table lock is never held across a
    // backend call, since backends may route events synchronously.
    ops: Mutex<()>,
}

impl<B: MidiBackend> SessionManager<B> {
    pub fn new(backend: B, sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_instance_tag(backend, sink, 0)
    }

    /// `instance_tag` is handed to the backend at open time and comes back as
    /// the third element of every event record.
    pub fn with_instance_tag(backend: B, sink: Arc<dyn NotificationSink>, instance_tag: u32) -> Self {
        let table = SharedSessionTable::new();
        let router = CallbackRouter::new(table.clone(), sink);
        SessionManager {
            backend,
            table,
            router,
            instance_tag,
            ops: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn table(&self) -> &SharedSessionTable {
        &self.table
    }

    pub fn count_devices(&self) -> u32 {
        self.backend.count_devices()
    }

    pub fn device_capabilities(&self, index: u32) -> Result<CapabilityDescriptor, MmResult> {
        self.backend.device_capabilities(index)
    }

    /// Opens `port` and records the session, delivering its events to `channel`.
    ///
    /// The table entries are written even when the backend fails, with the
    /// NULL handle it returned; a later open of the same port replaces them.
    /// A port holding a live handle is refused with [`MmResult::ALLOCATED`].
    pub fn open(&self, port: u32, channel: ChannelId) -> MmResult {
        let _guard = self.ops.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = self.table.lock().handle_for(port) {
            if !existing.is_null() {
                warn!("Port {} is already open as {}", port, existing);
                return MmResult::ALLOCATED;
            }
        }

        let (status, handle) = self
            .backend
            .open(port, self.router.clone(), self.instance_tag);
        self.table.lock().insert(port, handle, channel);

        if status.is_ok() {
            info!("Opened port {} as {} (channel {})", port, handle, channel);
        } else {
            warn!("Opening port {} failed: {}", port, status);
        }
        status
    }

    pub fn start(&self, port: u32) -> MmResult {
        let _guard = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(handle) = self.lookup(port) else {
            return MmResult::INVALHANDLE;
        };

        let status = self.backend.start(handle);
        log_status("start", port, status);
        status
    }

    /// Suspends event delivery; the session stays in the table.
    pub fn stop(&self, port: u32) -> MmResult {
        let _guard = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(handle) = self.lookup(port) else {
            return MmResult::INVALHANDLE;
        };

        let status = self.backend.stop(handle);
        log_status("stop", port, status);
        status
    }

    /// Releases the port's handle, then drops all three table entries.
    pub fn close(&self, port: u32) -> MmResult {
        let _guard = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        self.close_locked(port)
    }

    /// Closes every open port, returning the status of each close. NULL
    /// placeholders from failed opens are dropped without being reported.
    pub fn close_all(&self) -> Vec<(u32, MmResult)> {
        let _guard = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        let live = {
            let mut table = self.table.lock();
            for port in table.ports() {
                if table.handle_for(port).is_some_and(DeviceHandle::is_null) {
                    table.remove(port);
                }
            }
            table.live_ports()
        };
        live.into_iter()
            .map(|port| (port, self.close_locked(port)))
            .collect()
    }

    pub fn is_open(&self, port: u32) -> bool {
        self.table
            .lock()
            .handle_for(port)
            .map(|handle| !handle.is_null())
            .unwrap_or(false)
    }

    /// Ports with a live session; agrees with [`SessionManager::is_open`].
    pub fn open_ports(&self) -> Vec<u32> {
        self.table.lock().live_ports()
    }

    pub fn router(&self) -> &CallbackRouter {
        &self.router
    }

    fn close_locked(&self, port: u32) -> MmResult {
        let Some(handle) = self.table.lock().handle_for(port) else {
            debug!("Close of port {} that is not open", port);
            return MmResult::INVALHANDLE;
        };

        // NULL entries come from failed opens; there is nothing to release.
        let status = if handle.is_null() {
            MmResult::INVALHANDLE
        } else {
            self.backend.close(handle)
        };
        if let Some(removed) = self.table.lock().remove(port) {
            debug!(
                "Dropped session {} of port {} (channel {:?})",
                removed.handle, port, removed.channel
            );
        }

        log_status("close", port, status);
        status
    }

    fn lookup(&self, port: u32) -> Option<DeviceHandle> {
        let handle = self.table.lock().handle_for(port);
        if handle.is_none() {
            debug!("Port {} has no session", port);
        }
        handle
    }
}

impl<B: MidiBackend> Drop for SessionManager<B> {
    fn drop(&mut self) {
        for (port, status) in self.close_all() {
            debug!("Closed port {} on shutdown: {}", port, status);
        }
    }
}

fn log_status(operation: &str, port: u32, status: MmResult) {
    if status.is_ok() {
        info!("{} port {}", operation, port);
    } else {
        warn!("{} port {} failed: {}", operation, port, status);
    }
}
