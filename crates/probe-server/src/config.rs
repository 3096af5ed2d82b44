//! Configuration loading and validation for mini-goga

use crate::types::ServerConfig;
use clap::Parser;
use probe::{ClientConfig, DEFAULT_STATUS_CODES};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
}

/// Command line options. Each one overrides the matching file setting.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mini-goga", author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML settings file
    #[arg(long, env = "MINI_GOGA_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Path to the target list (one URL per line)
    #[arg(long, env = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Port for the metrics endpoint
    #[arg(long, env = "SERVER_PORT")]
    pub port: Option<u16>,

    /// Time between probe rounds, e.g. "15s"
    #[arg(long, env = "INTERVAL", value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Deadline for a single probe, e.g. "10s"
    #[arg(long, env = "TIMEOUT", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeSettings,

    #[serde(default)]
    pub targets: TargetsSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub telemetry: TelemetrySettings,

    /// File the settings were read from, `None` when running on defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.probe.validate()?;
        self.targets.validate()?;
        self.server.validate()?;
        validate_client(&self.client)?;
        self.telemetry.validate()?;
        Ok(())
    }
}

/// Probe scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProbeSettings {
    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_interval")]
    pub interval: Duration,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_timeout")]
    pub timeout: Duration,

    #[validate(custom = "validate_status_codes")]
    pub status_codes: Vec<u16>,
}

/// Target list source
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TargetsSettings {
    #[validate(custom = "validate_targets_path")]
    pub path: PathBuf,
}

/// Exposition endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerSettings {
    #[validate(custom = "validate_host")]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_request_timeout")]
    pub request_timeout: Duration,
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

/// OTLP transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    Http,
}

/// OpenTelemetry export settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TelemetrySettings {
    pub enabled: bool,

    #[validate(length(min = 1))]
    pub service_name: String,

    #[validate(length(min = 1))]
    pub otlp_endpoint: String,

    pub protocol: OtlpProtocol,
}

// Default implementations

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(15),
            status_codes: DEFAULT_STATUS_CODES.to_vec(),
        }
    }
}

impl Default for TargetsSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config.cfg"),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9100,
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "mini-goga".to_string(),
            otlp_endpoint: "http://localhost:4317".to_string(),
            protocol: OtlpProtocol::Grpc,
        }
    }
}

// Custom validators

fn validate_interval(interval: &Duration) -> Result<(), ValidationError> {
    let millis = interval.as_millis();
    if !(100..=3_600_000).contains(&millis) {
        return Err(ValidationError::new("interval_out_of_range"));
    }
    Ok(())
}

fn validate_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    let millis = timeout.as_millis();
    if !(10..=300_000).contains(&millis) {
        return Err(ValidationError::new("timeout_out_of_range"));
    }
    Ok(())
}

fn validate_request_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    if timeout.is_zero() || timeout.as_secs() > 300 {
        return Err(ValidationError::new("request_timeout_out_of_range"));
    }
    Ok(())
}

fn validate_status_codes(codes: &[u16]) -> Result<(), ValidationError> {
    if codes.is_empty() {
        return Err(ValidationError::new("status_codes_empty"));
    }
    if codes.iter().any(|code| !(100..=599).contains(code)) {
        return Err(ValidationError::new("status_code_out_of_range"));
    }
    if codes.iter().enumerate().any(|(i, code)| codes[..i].contains(code)) {
        return Err(ValidationError::new("status_code_repeated"));
    }
    Ok(())
}

fn validate_targets_path(path: &Path) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ValidationError::new("targets_path_empty"));
    }
    Ok(())
}

fn validate_host(host: &str) -> Result<(), ValidationError> {
    host.trim()
        .parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("host_not_an_ip_address"))
}

fn validate_client(client: &ClientConfig) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if client.connect_timeout.is_zero() {
        errors.add("connect_timeout", ValidationError::new("connect_timeout_zero"));
    }
    if client.user_agent.trim().is_empty() {
        errors.add("user_agent", ValidationError::new("user_agent_empty"));
    }

    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// Configuration loading implementation

impl Config {
    /// Load configuration for `args`.
    ///
    /// An explicit `--settings` file must exist. Otherwise the standard
    /// locations are searched and defaults are used when none is found; the
    /// chosen file is kept in `source`. Command line overrides are applied
    /// last and the result is validated.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let source = match &args.settings {
            Some(path) if path.is_file() => Some(path.clone()),
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => Self::find_config_file(),
        };

        let mut config = match &source {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.source = source;

        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides
    pub fn apply_overrides(&mut self, args: &Args) {
        if let Some(path) = &args.config {
            self.targets.path = path.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(interval) = args.interval {
            self.probe.interval = interval;
        }
        if let Some(timeout) = args.timeout {
            self.probe.timeout = timeout;
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/mini-goga/mini-goga.yaml")];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./mini-goga.yaml"));

        paths.into_iter().find(|p| p.is_file())
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/mini-goga/mini-goga.yaml"))
    }

    /// Socket address for the exposition endpoint
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .server
            .host
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.server.host.clone()))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Convert to the resolved runtime configuration
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        Ok(ServerConfig {
            listen_addr: self.listen_addr()?,
            targets_path: self.targets.path.clone(),
            interval: self.probe.interval,
            timeout: self.probe.timeout,
            status_codes: self.probe.status_codes.clone(),
            request_timeout: self.server.request_timeout,
            client: self.client.clone(),
        })
    }
}
