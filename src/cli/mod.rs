use crate::error::{BridgeError, Result};
use crate::lifecycle::SessionManager;
use crate::midi::MidiBackend;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI input devices
    #[arg(long)]
    pub device_list: bool,

    /// Print the capability descriptor of a device
    #[arg(long, value_name = "INDEX")]
    pub capabilities: Option<u32>,

    /// Monitor a specific input port (prompts when omitted)
    #[arg(long)]
    pub port: Option<u32>,

    /// Notification channel id the events are delivered to
    #[arg(long, default_value_t = 1)]
    pub channel: i64,

    /// Stop monitoring after this many seconds
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Names of all input devices in enumeration order. Devices whose
/// capabilities cannot be read are listed by index only.
pub fn device_names<B: MidiBackend>(backend: &B) -> Vec<String> {
    (0..backend.count_devices())
        .map(|index| match backend.device_capabilities(index) {
            Ok(caps) => caps.name,
            Err(status) => format!("<device {}: {}>", index, status),
        })
        .collect()
}

pub fn validate_port(port: u32, devices: &[String]) -> std::result::Result<(), String> {
    if port as usize >= devices.len() {
        let mut error_msg = format!(
            "Error: Port {} not found in available devices:\n",
            port
        );
        for (index, device) in devices.iter().enumerate() {
            error_msg.push_str(&format!("  {}: {}\n", index, device));
        }
        return Err(error_msg);
    }
    Ok(())
}

/// Stops and closes `port` at the end of a monitor run. A failed stop is
/// only logged; a close that does not succeed is an error, since the handle
/// may still be held.
pub fn finish_session<B: MidiBackend>(manager: &SessionManager<B>, port: u32) -> Result<()> {
    let status = manager.stop(port);
    if !status.is_ok() {
        log::warn!("Stopping port {} reported {}", port, status);
    }

    let status = manager.close(port);
    if !status.is_ok() {
        return Err(BridgeError::Session(format!(
            "close port {}: {}",
            port, status
        )));
    }
    Ok(())
}
