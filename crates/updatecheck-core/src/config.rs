//! Deployment manifest for the gateway.
//!
//! ```toml
//! [origin]
//! url = "https://codexs-com-br.github.io"
//!
//! [listen]
//! addr = "127.0.0.1:8787"
//!
//! [analytics]
//! endpoint = "https://ingest.example.com/v1/write"
//! dataset = "codexdns_update_checks"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! The `[analytics]` table is optional: omitting it runs the gateway as a
//! plain pass-through proxy with no binding.

use std::io;
use std::path::Path;

use log::LevelFilter;
use serde::Deserialize;
use validator::Validate;

/// Dataset name used when `[analytics] dataset` is omitted.
pub const DEFAULT_DATASET: &str = "codexdns_update_checks";

/// Listen address used when `[listen]` is omitted.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8787";

#[derive(Debug, Deserialize, Validate)]
pub struct GatewayManifest {
    #[validate(nested)]
    pub origin: OriginConfig,
    #[serde(default)]
    #[validate(nested)]
    pub listen: ListenConfig,
    #[serde(default)]
    #[validate(nested)]
    pub analytics: Option<AnalyticsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayManifest {
    pub fn load_from_str(contents: &str) -> Result<Self, io::Error> {
        let manifest: GatewayManifest = toml::from_str(contents)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        manifest
            .validate()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
        Ok(manifest)
    }

    pub fn from_path(path: &Path) -> Result<Self, io::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }
}

/// Upstream origin serving the actual content.
#[derive(Debug, Deserialize, Validate)]
pub struct OriginConfig {
    #[validate(url)]
    pub url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListenConfig {
    #[serde(default = "default_listen_addr")]
    #[validate(length(min = 1))]
    pub addr: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

/// Analytics-sink binding supplied at deployment time.
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyticsConfig {
    #[validate(url)]
    pub endpoint: String,
    #[serde(default = "default_dataset")]
    #[validate(length(min = 1))]
    pub dataset: String,
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "off" => Ok(Self::Off),
            other => Err(serde::de::Error::custom(format!(
                "logging level must be trace, debug, info, warn, error, or off (got `{}`)",
                other
            ))),
        }
    }
}
