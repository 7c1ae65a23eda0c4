//! layerscan configuration.
//!
//! Values are layered: built-in defaults, then a YAML file, then
//! `LAYERSCAN_*` environment variables. CLI flags are applied last by the
//! caller.

use serde::{Deserialize, Serialize};
use std::net::UdpSocket;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};

/// Default analysis oracle host.
const DEFAULT_ORACLE_URI: &str = "http://localhost";

/// Default analysis oracle API port.
const DEFAULT_ORACLE_PORT: u16 = 6060;

/// Default analysis oracle API version segment.
const DEFAULT_API_VERSION: &str = "v1";

/// Default port of the local blob server.
const DEFAULT_SERVER_PORT: u16 = 44480;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Analysis oracle endpoint
    pub oracle: OracleConfig,

    /// Use the local image store and local transport
    pub local: bool,

    /// Local blob server
    pub server: ServerConfig,

    /// Extracted `docker save` export used in local mode
    pub export_dir: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,
}

impl ScanConfig {
    /// Load configuration from an explicit file, or from the default
    /// location if it exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&data)
    }

    /// Parse YAML configuration text. Missing fields take their defaults.
    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(data).map_err(|e| ScanError::Config(e.to_string()))
    }

    /// Apply `LAYERSCAN_*` overrides using the given variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("LAYERSCAN_ORACLE_URI") {
            self.oracle.uri = uri;
        }
        if let Some(port) = lookup("LAYERSCAN_ORACLE_PORT") {
            self.oracle.port = port.parse().map_err(|_| {
                ScanError::Config(format!("invalid LAYERSCAN_ORACLE_PORT: '{}'", port))
            })?;
        }
        if let Some(local) = lookup("LAYERSCAN_LOCAL") {
            self.local = parse_bool(&local).ok_or_else(|| {
                ScanError::Config(format!("invalid LAYERSCAN_LOCAL: '{}'", local))
            })?;
        }
        if let Some(address) = lookup("LAYERSCAN_SERVER_ADDRESS") {
            self.server.address = Some(address);
        }
        Ok(())
    }

    /// Base URL of the analysis oracle API, e.g. `http://localhost:6060/v1`.
    pub fn oracle_base_url(&self) -> String {
        self.oracle.base_url()
    }

    /// Address (`host:port`) the oracle uses to reach the local blob server.
    ///
    /// A configured `server.address` wins. Otherwise the outbound interface
    /// address is discovered.
    pub fn local_server_address(&self) -> Result<String> {
        let host = match self.server.address {
            Some(ref address) => address.clone(),
            None => discover_outbound_ip()?,
        };
        Ok(format!("{}:{}", host, self.server.port))
    }
}

/// Analysis oracle endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Scheme and host, e.g. `http://clair`
    pub uri: String,

    /// API port
    pub port: u16,

    /// API version path segment
    pub api_version: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_ORACLE_URI.to_string(),
            port: DEFAULT_ORACLE_PORT,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl OracleConfig {
    /// Override the endpoint from an `http(s)://host[:port]` URL.
    ///
    /// Without an explicit port the scheme's default port is used.
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        let invalid = |reason: &str| {
            ScanError::Config(format!("invalid oracle endpoint '{}': {}", endpoint, reason))
        };

        let url = reqwest::Url::parse(endpoint.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials are not supported"));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("path, query and fragment are not allowed"));
        }
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port"))?;

        self.uri = format!("{}://{}", url.scheme(), host);
        self.port = port;
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!(
            "{}:{}/{}",
            self.uri.trim_end_matches('/'),
            self.port,
            self.api_version
        )
    }
}

/// Local blob server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host the oracle can reach this process on (discovered when unset)
    pub address: Option<String>,

    /// Port of the blob server
    pub port: u16,

    /// In remote mode, route blob fetches through the local server
    pub proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: DEFAULT_SERVER_PORT,
            proxy: false,
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string for `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!(
                "unknown log level: '{}' (supported: debug, info, warn, error)",
                s
            )),
        }
    }
}

/// Default configuration file (`~/.layerscan/config.yaml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".layerscan").join("config.yaml"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Find the address of the interface used for outbound traffic.
///
/// Connecting a UDP socket sends nothing; it only selects a route.
fn discover_outbound_ip() -> Result<String> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80").map_err(|e| {
        ScanError::Config(format!(
            "Cannot determine local server address (set server.address): {}",
            e
        ))
    })?;
    let addr = socket.local_addr()?;
    tracing::debug!(address = %addr.ip(), "Discovered local server address");
    Ok(addr.ip().to_string())
}
