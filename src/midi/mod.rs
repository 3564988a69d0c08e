//! MIDI input backends for midibridge
//!
//! This module provides the OS seam the session manager drives:
//! - Status codes, device handles and capability descriptors
//! - The [`MidiBackend`] trait for enumeration and callback-mode input sessions
//! - Real MIDI device access via midir
//! - A scriptable mock backend for testing
//!
mod engine;
pub mod midir_engine;
pub mod mock_engine;

// Re-export main types from engine
pub use engine::{
    message_kind, pack_short_message, CapabilityDescriptor, DeviceHandle, MidiBackend, MmResult,
    MM_UNMAPPED,
};

// Re-export concrete implementations
pub use midir_engine::MidirBackend;
pub use mock_engine::MockBackend;

// Set default backend type
#[cfg(not(feature = "test-mock"))]
pub type DefaultMidiBackend = MidirBackend;
#[cfg(feature = "test-mock")]
pub type DefaultMidiBackend = MockBackend;
