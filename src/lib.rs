pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod midi;
pub mod notify;
pub mod router;
pub mod session;
pub mod ui;

pub use cli::{device_names, finish_session, validate_port, Args};
pub use dispatch::{BridgePlugin, MethodCall, MethodHandler, MethodResponse, Value};
pub use error::{BridgeError, Result};
pub use lifecycle::SessionManager;
pub use midi::{CapabilityDescriptor, DeviceHandle, MidiBackend, MmResult};
pub use notify::{ChannelHub, ChannelId, NotificationSink};
pub use router::{CallbackRouter, EventRecord};
pub use session::{SessionTable, SharedSessionTable};
