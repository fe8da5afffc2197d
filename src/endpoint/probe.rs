//! Endpoint reachability probing.
//!
//! A probe is a bounded-timeout `GET <base>/health`. Any HTTP response at
//! all counts as reachable; this is a connectivity check, not a protocol
//! check, so error status codes still prove the endpoint is there.

use std::time::{Duration, Instant};
use tracing::debug;

/// Default per-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Health-probes candidate base URLs.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    timeout: Duration,
}

impl Prober {
    /// Create a prober with the given per-probe timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, timeout }
    }

    /// The configured per-probe timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `<base_url>/health`, returning whether the endpoint answered.
    ///
    /// Probing is side-effect-free and idempotent; failures are logged,
    /// never surfaced as errors.
    pub async fn reachable(&self, base_url: &str) -> bool {
        let url = format!("{}/health", base_url.trim_end_matches('/'));
        let start = Instant::now();

        match self.client.get(&url).send().await {
            Ok(response) => {
                debug!(
                    url = url.as_str(),
                    status = response.status().as_u16(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "health probe answered"
                );
                true
            }
            Err(e) => {
                debug!(url = url.as_str(), error = %e, "health probe failed");
                false
            }
        }
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_port_is_not_reachable() {
        // Port 1 on loopback refuses connections immediately.
        let prober = Prober::new(Duration::from_millis(500));
        assert!(!prober.reachable("http://127.0.0.1:1").await);
    }

    #[test]
    fn default_timeout_is_three_seconds() {
        assert_eq!(Prober::default().timeout(), Duration::from_secs(3));
    }
}
