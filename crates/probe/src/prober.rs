//! Probe implementations.

use crate::types::{ProbeOutcome, Target};
use async_trait::async_trait;
use std::time::{Duration, Instant, SystemTime};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Prober trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prober: Send + Sync {
    /// Perform exactly one probe attempt against `target`.
    ///
    /// Never fails: transport problems are reported as a failed outcome.
    async fn probe(&self, target: &Target) -> ProbeOutcome;
}

/// HTTP GET prober
pub struct HttpProber {
    client: reqwest::Client,
    timeout_duration: Duration,
}

impl HttpProber {
    /// Create a new HTTP prober.
    ///
    /// `client` is shared by every probe; `timeout_duration` bounds each
    /// attempt from dispatch to the end of the body.
    pub fn new(client: reqwest::Client, timeout_duration: Duration) -> Self {
        Self {
            client,
            timeout_duration,
        }
    }

    /// Send the request and drain the body, returning the status code
    async fn fetch(&self, url: &str) -> Result<u16, reqwest::Error> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status().as_u16();

        while response.chunk().await?.is_some() {}

        Ok(status)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target) -> ProbeOutcome {
        let started_at = SystemTime::now();
        let start = Instant::now();

        match timeout(self.timeout_duration, self.fetch(target.as_str())).await {
            Ok(Ok(status)) => {
                let duration = start.elapsed();
                debug!(url = %target, status, duration_ms = duration.as_millis(), "Probe succeeded");
                ProbeOutcome::success(status, duration, started_at)
            }
            Ok(Err(e)) => {
                warn!(url = %target, error = %e, "Probe failed");
                ProbeOutcome::failure(format!("HTTP request failed: {}", e), started_at)
            }
            Err(_) => {
                warn!(url = %target, timeout_ms = self.timeout_duration.as_millis(), "Probe timed out");
                ProbeOutcome::failure(
                    format!("timed out after {:?}", self.timeout_duration),
                    started_at,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientConfig, build_client};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober(timeout: Duration) -> HttpProber {
        let client = build_client(&ClientConfig::default(), timeout).unwrap();
        HttpProber::new(client, timeout)
    }

    #[tokio::test]
    async fn test_probe_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let target = Target::from(format!("{}/health", server.uri()));
        let outcome = prober(Duration::from_secs(2)).probe(&target).await;

        assert!(outcome.up);
        assert!(!outcome.error_occurred());
        assert_eq!(outcome.status_code, Some(200));
        assert!(outcome.latency_ms.is_some());
        assert!(outcome.observed_at >= outcome.started_at);
    }

    #[tokio::test]
    async fn test_probe_error_status_is_still_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let target = Target::from(server.uri());
        let outcome = prober(Duration::from_secs(2)).probe(&target).await;

        assert!(outcome.up);
        assert_eq!(outcome.status_code, Some(503));
    }

    #[tokio::test]
    async fn test_probe_latency_includes_response_delay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(50)))
            .mount(&server)
            .await;

        let target = Target::from(server.uri());
        let outcome = prober(Duration::from_secs(2)).probe(&target).await;

        assert!(outcome.up);
        assert!(outcome.latency_ms.unwrap() >= 50);
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let target = Target::from(server.uri());
        let start = Instant::now();
        let outcome = prober(Duration::from_millis(100)).probe(&target).await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!outcome.up);
        assert!(outcome.error_occurred());
        assert_eq!(outcome.status_code, None);
        assert_eq!(outcome.latency_ms, None);
    }

    #[tokio::test]
    async fn test_probe_connection_refused() {
        // Nothing listens on port 1
        let target = Target::from("http://127.0.0.1:1/health");
        let outcome = prober(Duration::from_millis(500)).probe(&target).await;

        assert!(!outcome.up);
        assert!(outcome.error_occurred());
    }

    #[tokio::test]
    async fn test_probe_malformed_url() {
        let target = Target::from("not a url");
        let outcome = prober(Duration::from_millis(500)).probe(&target).await;

        assert!(!outcome.up);
        assert!(outcome.error.unwrap().starts_with("HTTP request failed"));
    }
}
