use crate::midi::{message_kind, CapabilityDescriptor, DeviceHandle, MidiBackend, MmResult};
use crate::router::CallbackRouter;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct MockSession {
    port: u32,
    instance: u32,
    started: bool,
    router: CallbackRouter,
}

struct MockState {
    devices: Vec<CapabilityDescriptor>,
    sessions: HashMap<DeviceHandle, MockSession>,
    next_handle: u64,
    open_failure: Option<MmResult>,
}

/// Scriptable in-memory backend.
///
/// Clones share state, so a test can keep one clone to simulate hardware
/// events while the session manager owns another.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new<S: Into<String>>(device_names: impl IntoIterator<Item = S>) -> Self {
        let devices = device_names
            .into_iter()
            .enumerate()
            .map(|(index, name)| CapabilityDescriptor {
                name: name.into(),
                manufacturer_id: 1,
                product_id: index as u16 + 1,
                driver_version: 0x0100,
            })
            .collect();

        MockBackend {
            state: Arc::new(Mutex::new(MockState {
                devices,
                sessions: HashMap::new(),
                next_handle: 1,
                open_failure: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `open` fail with `code`.
    pub fn fail_next_open(&self, code: MmResult) {
        self.state().open_failure = Some(code);
    }

    pub fn open_handles(&self) -> Vec<DeviceHandle> {
        let mut handles: Vec<DeviceHandle> = self.state().sessions.keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    pub fn handle_for_port(&self, port: u32) -> Option<DeviceHandle> {
        self.state()
            .sessions
            .iter()
            .find(|(_, session)| session.port == port)
            .map(|(handle, _)| *handle)
    }

    pub fn is_started(&self, handle: DeviceHandle) -> bool {
        self.state()
            .sessions
            .get(&handle)
            .map(|session| session.started)
            .unwrap_or(false)
    }

    /// Fires a hardware event on `handle` as the OS would.
    ///
    /// Data messages are only delivered while the session is started. Returns
    /// whether the router forwarded the event.
    pub fn simulate_event(
        &self,
        handle: DeviceHandle,
        message_kind: u32,
        param1: u32,
        param2: u32,
    ) -> bool {
        let target = {
            let state = self.state();
            match state.sessions.get(&handle) {
                Some(session) if session.started || !is_data(message_kind) => {
                    Some((session.router.clone(), session.instance))
                }
                _ => None,
            }
        };

        match target {
            Some((router, instance)) => router.route(handle, message_kind, instance, param1, param2),
            None => {
                debug!("Mock: event {:#x} on {} not delivered", message_kind, handle);
                false
            }
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        MockBackend::new(["Mock Device 1", "Mock Device 2"])
    }
}

fn is_data(kind: u32) -> bool {
    matches!(
        kind,
        message_kind::MIM_DATA | message_kind::MIM_LONGDATA | message_kind::MIM_MOREDATA
    )
}

impl MidiBackend for MockBackend {
    fn count_devices(&self) -> u32 {
        self.state().devices.len() as u32
    }

    fn device_capabilities(&self, index: u32) -> Result<CapabilityDescriptor, MmResult> {
        self.state()
            .devices
            .get(index as usize)
            .cloned()
            .ok_or(MmResult::BADDEVICEID)
    }

    fn open(&self, port: u32, router: CallbackRouter, instance: u32) -> (MmResult, DeviceHandle) {
        let handle = {
            let mut state = self.state();
            if let Some(code) = state.open_failure.take() {
                return (code, DeviceHandle::NULL);
            }
            if port as usize >= state.devices.len() {
                return (MmResult::BADDEVICEID, DeviceHandle::NULL);
            }
            if state.sessions.values().any(|session| session.port == port) {
                return (MmResult::ALLOCATED, DeviceHandle::NULL);
            }

            let handle = DeviceHandle(state.next_handle);
            state.next_handle += 1;
            state.sessions.insert(
                handle,
                MockSession {
                    port,
                    instance,
                    started: false,
                    router: router.clone(),
                },
            );
            handle
        };

        // Fires before the caller has recorded the handle, like the real thing.
        router.route(handle, message_kind::MIM_OPEN, instance, 0, 0);
        (MmResult::NOERROR, handle)
    }

    fn start(&self, handle: DeviceHandle) -> MmResult {
        match self.state().sessions.get_mut(&handle) {
            Some(session) => {
                session.started = true;
                MmResult::NOERROR
            }
            None => MmResult::INVALHANDLE,
        }
    }

    fn stop(&self, handle: DeviceHandle) -> MmResult {
        match self.state().sessions.get_mut(&handle) {
            Some(session) => {
                session.started = false;
                MmResult::NOERROR
            }
            None => MmResult::INVALHANDLE,
        }
    }

    fn close(&self, handle: DeviceHandle) -> MmResult {
        let session = self.state().sessions.remove(&handle);
        match session {
            Some(session) => {
                session
                    .router
                    .route(handle, message_kind::MIM_CLOSE, session.instance, 0, 0);
                MmResult::NOERROR
            }
            None => MmResult::INVALHANDLE,
        }
    }
}
