//! Shared HTTP client used by every probe.

use common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection pool and transport settings for the probe client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// TCP connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// How long an idle pooled connection is kept
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Duration,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,

    /// TCP keepalive interval
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Duration,

    /// User-Agent header sent with every probe
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 20,
            tcp_keepalive: Duration::from_secs(30),
            user_agent: concat!("mini-goga/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Build the pooled client.
///
/// `request_timeout` caps each request end to end; the connect timeout is
/// never allowed to exceed it. Proxies are taken from the environment.
pub fn build_client(config: &ClientConfig, request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .connect_timeout(config.connect_timeout.min(request_timeout))
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .tcp_keepalive(config.tcp_keepalive)
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| Error::client(format!("failed to build HTTP client: {}", e)))
}
