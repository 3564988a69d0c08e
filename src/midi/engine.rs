use crate::router::CallbackRouter;
use std::fmt;

/// Status code returned by every backend operation.
///
/// Values follow the multimedia system error enumeration; `0` is success.
/// Codes are passed back to callers verbatim and never translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MmResult(pub u32);

impl MmResult {
    pub const NOERROR: MmResult = MmResult(0);
    pub const ERROR: MmResult = MmResult(1);
    pub const BADDEVICEID: MmResult = MmResult(2);
    pub const ALLOCATED: MmResult = MmResult(4);
    pub const INVALHANDLE: MmResult = MmResult(5);
    pub const NODRIVER: MmResult = MmResult(6);
    pub const NOMEM: MmResult = MmResult(7);

    pub fn is_ok(self) -> bool {
        self == MmResult::NOERROR
    }

    pub fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            MmResult::NOERROR => "no error",
            MmResult::ERROR => "unspecified error",
            MmResult::BADDEVICEID => "device id out of range",
            MmResult::ALLOCATED => "device already allocated",
            MmResult::INVALHANDLE => "invalid device handle",
            MmResult::NODRIVER => "no device driver present",
            MmResult::NOMEM => "memory allocation error",
            _ => "unknown status",
        };
        write!(f, "{} ({})", name, self.0)
    }
}

/// Callback message kinds delivered through the router.
pub mod message_kind {
    pub const MIM_OPEN: u32 = 0x3C1;
    pub const MIM_CLOSE: u32 = 0x3C2;
    pub const MIM_DATA: u32 = 0x3C3;
    pub const MIM_LONGDATA: u32 = 0x3C4;
    pub const MIM_ERROR: u32 = 0x3C5;
    pub const MIM_LONGERROR: u32 = 0x3C6;
    pub const MIM_MOREDATA: u32 = 0x3CC;
}

/// Manufacturer/product id reported when the backend has no registered id.
pub const MM_UNMAPPED: u16 = 0xFFFF;

/// Opaque handle for an open input session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(pub u64);

impl DeviceHandle {
    /// Sentinel handed back by a failed open.
    pub const NULL: DeviceHandle = DeviceHandle(0);

    pub fn is_null(self) -> bool {
        self == DeviceHandle::NULL
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Static metadata describing an input device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub manufacturer_id: u16,
    pub product_id: u16,
    pub driver_version: u32,
}

/// Packs a short MIDI message the way `MIM_DATA` carries it in `param1`:
/// status in the low byte, then the two data bytes.
pub fn pack_short_message(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [] => None,
        [status] => Some(u32::from(*status)),
        [status, data1] => Some(u32::from(*status) | u32::from(*data1) << 8),
        [status, data1, data2] => {
            Some(u32::from(*status) | u32::from(*data1) << 8 | u32::from(*data2) << 16)
        }
        _ => None,
    }
}

/// The OS seam: device enumeration plus callback-mode input sessions.
///
/// Implementations invoke [`CallbackRouter::route`] for every hardware event,
/// possibly from their own thread. Calling `start`, `stop` or `close` with a
/// handle the backend does not know must return [`MmResult::INVALHANDLE`].
pub trait MidiBackend: Send + Sync {
    /// Number of input devices currently visible.
    fn count_devices(&self) -> u32;

    /// Capability descriptor for the device at `index`.
    fn device_capabilities(&self, index: u32) -> Result<CapabilityDescriptor, MmResult>;

    /// Opens `port` with `router` as the event sink. On failure the handle is
    /// [`DeviceHandle::NULL`].
    fn open(&self, port: u32, router: CallbackRouter, instance: u32) -> (MmResult, DeviceHandle);

    fn start(&self, handle: DeviceHandle) -> MmResult;

    fn stop(&self, handle: DeviceHandle) -> MmResult;

    fn close(&self, handle: DeviceHandle) -> MmResult;
}
