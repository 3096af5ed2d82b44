//! Runtime configuration for the mini-goga server.

use probe::{ClientConfig, DEFAULT_STATUS_CODES};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the exposition endpoint listens on
    pub listen_addr: SocketAddr,

    /// Target list file
    pub targets_path: PathBuf,

    /// Time between probe rounds
    pub interval: Duration,

    /// Deadline for a single probe
    pub timeout: Duration,

    /// Status codes always exposed as one-hot series
    pub status_codes: Vec<u16>,

    /// Deadline for a single exposition request
    pub request_timeout: Duration,

    /// Probe client transport settings
    pub client: ClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9100)),
            targets_path: PathBuf::from("config.cfg"),
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(15),
            status_codes: DEFAULT_STATUS_CODES.to_vec(),
            request_timeout: Duration::from_secs(5),
            client: ClientConfig::default(),
        }
    }
}
