use crate::midi::{
    message_kind, pack_short_message, CapabilityDescriptor, DeviceHandle, MidiBackend, MmResult,
    MM_UNMAPPED,
};
use crate::router::CallbackRouter;
use log::{debug, error, info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Start/stop gate shared with the input callback. `Some` while capturing,
/// holding the instant capture began.
#[derive(Default)]
struct CaptureGate {
    started_at: Mutex<Option<Instant>>,
}

impl CaptureGate {
    fn started_at(&self) -> Option<Instant> {
        *self.started_at.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens the gate. Starting an already started gate keeps its instant.
    fn start(&self) {
        self.started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(Instant::now);
    }

    fn stop(&self) {
        *self.started_at.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Milliseconds since capture began, wrapping at `u32`; `None` while stopped.
    fn elapsed_ms(&self) -> Option<u32> {
        self.started_at()
            .map(|started_at| started_at.elapsed().as_millis() as u32)
    }
}

struct OpenInput {
    port: u32,
    instance: u32,
    router: CallbackRouter,
    connection: MidiInputConnection<()>,
    gate: Arc<CaptureGate>,
}

/// Hardware backend on top of midir.
///
/// midir connections deliver as soon as they are made, so `start`/`stop` are
/// emulated with a gate checked inside the input callback. Only short
/// messages are forwarded; SysEx is ignored at the midir level.
pub struct MidirBackend {
    client_name: String,
    next_handle: AtomicU64,
    inputs: Mutex<HashMap<DeviceHandle, OpenInput>>,
}

impl MidirBackend {
    pub fn new(client_name: impl Into<String>) -> Self {
        MidirBackend {
            client_name: client_name.into(),
            next_handle: AtomicU64::new(1),
            inputs: Mutex::new(HashMap::new()),
        }
    }

    fn inputs(&self) -> MutexGuard<'_, HashMap<DeviceHandle, OpenInput>> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn midi_input(&self, suffix: &str) -> Option<MidiInput> {
        match MidiInput::new(&format!("{}-{}", self.client_name, suffix)) {
            Ok(midi_in) => Some(midi_in),
            Err(e) => {
                warn!("Failed to initialize MIDI input: {}", e);
                None
            }
        }
    }
}

impl Default for MidirBackend {
    fn default() -> Self {
        MidirBackend::new("midibridge")
    }
}

impl MidiBackend for MidirBackend {
    fn count_devices(&self) -> u32 {
        self.midi_input("list")
            .map(|midi_in| midi_in.port_count() as u32)
            .unwrap_or(0)
    }

    fn device_capabilities(&self, index: u32) -> Result<CapabilityDescriptor, MmResult> {
        let midi_in = self.midi_input("caps").ok_or(MmResult::NODRIVER)?;
        let ports = midi_in.ports();
        let port = ports.get(index as usize).ok_or(MmResult::BADDEVICEID)?;
        let name = midi_in.port_name(port).map_err(|e| {
            warn!("Failed to read name of MIDI input {}: {}", index, e);
            MmResult::ERROR
        })?;

        Ok(CapabilityDescriptor {
            name,
            manufacturer_id: MM_UNMAPPED,
            product_id: MM_UNMAPPED,
            driver_version: 0,
        })
    }

    fn open(&self, port: u32, router: CallbackRouter, instance: u32) -> (MmResult, DeviceHandle) {
        if self.inputs().values().any(|input| input.port == port) {
            return (MmResult::ALLOCATED, DeviceHandle::NULL);
        }

        let Some(mut midi_in) = self.midi_input("in") else {
            return (MmResult::NODRIVER, DeviceHandle::NULL);
        };
        midi_in.ignore(Ignore::Sysex);

        let ports = midi_in.ports();
        let Some(in_port) = ports.get(port as usize) else {
            return (MmResult::BADDEVICEID, DeviceHandle::NULL);
        };

        let handle = DeviceHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let gate = Arc::new(CaptureGate::default());
        let callback_gate = Arc::clone(&gate);
        let callback_router = router.clone();

        let connection = midi_in.connect(
            in_port,
            &format!("{}-port-{}", self.client_name, port),
            move |_stamp, message, _| {
                let Some(elapsed) = callback_gate.elapsed_ms() else {
                    return;
                };
                let Some(param1) = pack_short_message(message) else {
                    debug!("Skipping {}-byte message on {}", message.len(), handle);
                    return;
                };
                callback_router.route(handle, message_kind::MIM_DATA, instance, param1, elapsed);
            },
            (),
        );

        match connection {
            Ok(connection) => {
                info!("Opened MIDI input {} as {}", port, handle);
                self.inputs().insert(
                    handle,
                    OpenInput {
                        port,
                        instance,
                        router,
                        connection,
                        gate,
                    },
                );
                (MmResult::NOERROR, handle)
            }
            Err(e) => {
                error!("Failed to connect to MIDI input {}: {}", port, e);
                (MmResult::ERROR, DeviceHandle::NULL)
            }
        }
    }

    fn start(&self, handle: DeviceHandle) -> MmResult {
        match self.inputs().get(&handle) {
            Some(input) => {
                input.gate.start();
                MmResult::NOERROR
            }
            None => MmResult::INVALHANDLE,
        }
    }

    fn stop(&self, handle: DeviceHandle) -> MmResult {
        match self.inputs().get(&handle) {
            Some(input) => {
                input.gate.stop();
                MmResult::NOERROR
            }
            None => MmResult::INVALHANDLE,
        }
    }

    fn close(&self, handle: DeviceHandle) -> MmResult {
        let input = self.inputs().remove(&handle);
        match input {
            Some(input) => {
                input.gate.stop();
                input
                    .router
                    .route(handle, message_kind::MIM_CLOSE, input.instance, 0, 0);
                input.connection.close();
                info!("Closed MIDI input {} ({})", input.port, handle);
                MmResult::NOERROR
            }
            None => MmResult::INVALHANDLE,
        }
    }
}
