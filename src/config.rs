// config.rs

use crate::error::{BridgeError, Result};
use config::{Config, Environment, File};
use log::{debug, LevelFilter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CLIENT_NAME: &str = "midibridge";
pub const ENV_PREFIX: &str = "MIDIBRIDGE";

pub struct BridgeConfig {
    /// Client name the backend registers with the MIDI system
    pub client_name: String,
    pub log_level: LevelFilter,
    pub log_dir: PathBuf,
    /// Echoed back as the instance field of every event record
    pub instance_tag: u32,
}

impl BridgeConfig {
    /// Loads defaults, then `path` if given, then `MIDIBRIDGE_*` environment
    /// variables, later sources overriding earlier ones.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::defaults()?;
        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Self::from_settings(&settings)
    }

    /// Loads only defaults and `path`, ignoring the environment.
    pub fn load_file(path: &Path) -> Result<Self> {
        let settings = Self::defaults()?
            .add_source(File::from(path).required(true))
            .build()?;
        Self::from_settings(&settings)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("client_name", DEFAULT_CLIENT_NAME)?
            .set_default("log_level", "info")?
            .set_default("log_dir", default_log_dir().to_string_lossy().into_owned())?
            .set_default("instance_tag", 0i64)?)
    }

    fn from_settings(settings: &Config) -> Result<Self> {
        let client_name = settings.get_string("client_name")?;
        let log_level = parse_log_level(&settings.get_string("log_level")?)?;
        let log_dir = PathBuf::from(settings.get_string("log_dir")?);
        let instance_tag = settings.get_int("instance_tag")?;
        let instance_tag = u32::try_from(instance_tag).map_err(|_| {
            BridgeError::Config(format!("instance_tag {} is out of range", instance_tag))
        })?;

        debug!(
            "Configuration: client_name={}, log_level={}, log_dir={}, instance_tag={}",
            client_name,
            log_level,
            log_dir.display(),
            instance_tag
        );

        Ok(BridgeConfig {
            client_name,
            log_level,
            log_dir,
            instance_tag,
        })
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            log_level: LevelFilter::Info,
            log_dir: default_log_dir(),
            instance_tag: 0,
        }
    }
}

pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level)
        .map_err(|_| BridgeError::Config(format!("unknown log level '{}'", level)))
}

fn default_log_dir() -> PathBuf {
    let base = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));
    base.join(".local")
        .join("share")
        .join("midibridge")
        .join("logs")
}
