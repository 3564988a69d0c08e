use std::error::Error;
use std::fmt;

/// Error type for everything around the session core: configuration,
/// logging and the command line. Session operations report [`MmResult`]
/// status codes instead.
///
/// [`MmResult`]: crate::midi::MmResult
#[derive(Debug)]
pub enum BridgeError {
    /// Error when loading configuration
    Config(String),
    /// Error when setting up the logger
    Logging(String),
    /// Error when the requested port is not usable
    InvalidPort(String),
    /// Error from the interactive prompt
    Prompt(String),
    /// Error when a session operation does not report success
    Session(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BridgeError::Logging(msg) => write!(f, "Logging error: {}", msg),
            BridgeError::InvalidPort(msg) => write!(f, "Invalid port: {}", msg),
            BridgeError::Prompt(msg) => write!(f, "Prompt error: {}", msg),
            BridgeError::Session(msg) => write!(f, "Session error: {}", msg),
        }
    }
}

impl Error for BridgeError {}

impl From<config::ConfigError> for BridgeError {
    fn from(e: config::ConfigError) -> Self {
        BridgeError::Config(e.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Logging(e.to_string())
    }
}

impl From<dialoguer::Error> for BridgeError {
    fn from(e: dialoguer::Error) -> Self {
        BridgeError::Prompt(e.to_string())
    }
}

/// Result type for bridge set-up
pub type Result<T> = std::result::Result<T, BridgeError>;
