use crate::midi::message_kind::*;
use crate::router::EventRecord;
use crate::ui::create_event_spinner;
use chrono::{DateTime, Local, TimeZone};
use crossbeam::channel::{Receiver, RecvTimeoutError};
use log::{debug, info};
use std::fmt::Display;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn message_kind_name(kind: u32) -> &'static str {
    match kind {
        MIM_OPEN => "OPEN",
        MIM_CLOSE => "CLOSE",
        MIM_DATA => "DATA",
        MIM_LONGDATA => "LONGDATA",
        MIM_ERROR => "ERROR",
        MIM_LONGERROR => "LONGERROR",
        MIM_MOREDATA => "MOREDATA",
        _ => "UNKNOWN",
    }
}

pub fn format_record<Tz: TimeZone>(record: &EventRecord, at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!(
        "{} port {} {:<9} instance={} param1={:#08x} param2={}",
        at.format("%H:%M:%S%.3f"),
        record.port,
        message_kind_name(record.message_kind),
        record.instance_tag,
        record.param1,
        record.param2
    )
}

/// Prints records from `events` until `duration` elapses or every sender is
/// gone. Runs indefinitely when `duration` is `None`. Returns the number of
/// records received.
pub fn run_monitor(port: u32, events: &Receiver<EventRecord>, duration: Option<Duration>) -> u64 {
    let deadline = duration.map(|d| Instant::now() + d);
    let spinner = create_event_spinner(port);
    let mut received = 0u64;

    info!("Monitoring port {}", port);
    loop {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }

        match events.recv_timeout(POLL_INTERVAL) {
            Ok(record) => {
                received += 1;
                spinner.inc(1);
                spinner.println(format_record(&record, &Local::now()));
            }
            Err(RecvTimeoutError::Timeout) => spinner.tick(),
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Event channel disconnected");
                break;
            }
        }
    }

    spinner.finish_with_message("done");
    info!("Monitor on port {} finished after {} events", port, received);
    received
}
