//! Terminal output for the monitor
//!
//! This module provides the terminal components of the `midibridge` binary:
//! - An event spinner showing the running event count
//! - Timestamped formatting of event records
//! - The monitor loop draining a notification channel
//!
//! The UI is built using the indicatif library for spinners.

mod monitor;
mod progress;

pub use monitor::{format_record, message_kind_name, run_monitor};
pub use progress::create_event_spinner;
