use crate::error::{BridgeError, Result};
use simplelog::*;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::OnceLock;

static INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Appends log output to `<log_dir>/app.log`. Only the first call installs
/// the logger; later calls return its outcome.
pub fn init_logger(log_dir: &Path, level: LevelFilter) -> Result<()> {
    // Create the log directory if it doesn't exist
    fs::create_dir_all(log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("app.log"))?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build();

    INIT.get_or_init(|| {
        CombinedLogger::init(vec![WriteLogger::new(level, config, log_file)])
            .map_err(|e| e.to_string())
    })
    .clone()
    .map_err(BridgeError::Logging)
}
