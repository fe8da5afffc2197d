//! Ordered failover resolution of the conversation endpoint.
//!
//! Candidates are tried in priority order — loopback, registry-published
//! tunnel, static fallback domain — and the first reachable one wins. The
//! result is cached for the rest of the process; repeated calls are free
//! until [`force_resolve`] refreshes the cache.
//!
//! [`force_resolve`]: EndpointResolver::force_resolve

use crate::endpoint::probe::Prober;
use crate::endpoint::registry::{RegistryClient, ServerIdCell, ServerStatus};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Which candidate a resolution landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    /// Loopback server on this machine.
    Local,
    /// Tunnel URL published through the registry.
    Registry,
    /// Static fallback tunnel domain.
    Fallback,
}

/// A reachable conversation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Base URL all conversation requests are addressed to.
    pub base_url: String,
    /// Which candidate this is.
    pub source: EndpointSource,
}

/// User-visible registry outcomes collected while resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerNotice {
    /// The registry entry says the server is closed.
    Closed,
    /// The registry entry carries a status other than open.
    NotOpen,
}

/// A successful resolution plus anything the user should be told.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The endpoint to use.
    pub endpoint: ResolvedEndpoint,
    /// Notices to surface in the UI, in the order they occurred.
    pub notices: Vec<ServerNotice>,
}

/// Resolution failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// Every candidate failed its reachability probe.
    #[error("no conversation endpoint reachable")]
    AllUnreachable {
        /// Notices collected before giving up.
        notices: Vec<ServerNotice>,
    },
}

/// Endpoint candidates and waits, separate from the probing machinery.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Loopback candidate, probed first.
    pub local_url: String,
    /// Static fallback candidate, probed last.
    pub fallback_url: String,
    /// Placeholder server id when the host never provides one.
    pub placeholder_server_id: String,
    /// How long to wait for the host-provided server id.
    pub settings_wait: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        let server = crate::config::ServerConfig::default();
        let settings_wait = server.settings_wait();
        Self {
            local_url: server.local_url,
            fallback_url: server.fallback_url,
            placeholder_server_id: server.server_id,
            settings_wait,
        }
    }
}

impl ResolverOptions {
    /// Build options from the server section of the config file.
    pub fn from_config(server: &crate::config::ServerConfig) -> Self {
        Self {
            local_url: server.local_url.clone(),
            fallback_url: server.fallback_url.clone(),
            placeholder_server_id: server.server_id.clone(),
            settings_wait: server.settings_wait(),
        }
    }
}

/// Resolves and caches the conversation endpoint.
///
/// The cache is single-writer (this resolver), many-reader; share the
/// resolver behind an `Arc` and call [`resolve`](Self::resolve) freely.
#[derive(Debug)]
pub struct EndpointResolver {
    prober: Prober,
    registry: RegistryClient,
    server_id: ServerIdCell,
    options: ResolverOptions,
    cache: RwLock<Option<ResolvedEndpoint>>,
}

impl EndpointResolver {
    /// Create a resolver over the given probing and registry machinery.
    pub fn new(
        prober: Prober,
        registry: RegistryClient,
        server_id: ServerIdCell,
        options: ResolverOptions,
    ) -> Self {
        Self {
            prober,
            registry,
            server_id,
            options,
            cache: RwLock::new(None),
        }
    }

    /// The cached endpoint, without any network I/O.
    pub async fn cached(&self) -> Option<ResolvedEndpoint> {
        self.cache.read().await.clone()
    }

    /// Return the cached endpoint, probing the candidates only on the
    /// first call of the process (or after the cache was never filled).
    pub async fn resolve(&self) -> Result<Resolution, ResolveError> {
        if let Some(endpoint) = self.cached().await {
            return Ok(Resolution {
                endpoint,
                notices: Vec::new(),
            });
        }
        self.force_resolve().await
    }

    /// Probe the candidates in priority order, refreshing the cache.
    pub async fn force_resolve(&self) -> Result<Resolution, ResolveError> {
        let mut notices = Vec::new();

        if self.prober.reachable(&self.options.local_url).await {
            let endpoint = self
                .commit(EndpointSource::Local, self.options.local_url.clone())
                .await;
            return Ok(Resolution { endpoint, notices });
        }

        if let Some(url) = self.registry_candidate(&mut notices).await {
            if self.prober.reachable(&url).await {
                let endpoint = self.commit(EndpointSource::Registry, url).await;
                return Ok(Resolution { endpoint, notices });
            }
            warn!(url = url.as_str(), "registry endpoint did not answer");
        }

        if self.prober.reachable(&self.options.fallback_url).await {
            let endpoint = self
                .commit(EndpointSource::Fallback, self.options.fallback_url.clone())
                .await;
            return Ok(Resolution { endpoint, notices });
        }

        warn!("all conversation endpoint candidates unreachable");
        Err(ResolveError::AllUnreachable { notices })
    }

    /// Consult the registry for a probe-worthy URL.
    ///
    /// Fetch errors and non-open statuses fall through to the next
    /// candidate; non-open statuses additionally surface a notice.
    async fn registry_candidate(&self, notices: &mut Vec<ServerNotice>) -> Option<String> {
        let server_id = self
            .server_id
            .wait(
                self.options.settings_wait,
                &self.options.placeholder_server_id,
            )
            .await;

        let entry = match self.registry.fetch(&server_id).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(server_id = server_id.as_str(), error = %e, "registry consultation failed");
                return None;
            }
        };

        match entry.status {
            ServerStatus::Open => Some(entry.url),
            ServerStatus::Closed => {
                info!(server_id = server_id.as_str(), "registry server is closed");
                notices.push(ServerNotice::Closed);
                None
            }
            ServerStatus::Unknown => {
                info!(server_id = server_id.as_str(), "registry server is not open");
                notices.push(ServerNotice::NotOpen);
                None
            }
        }
    }

    async fn commit(&self, source: EndpointSource, base_url: String) -> ResolvedEndpoint {
        let endpoint = ResolvedEndpoint { base_url, source };
        info!(
            source = ?endpoint.source,
            base_url = endpoint.base_url.as_str(),
            "conversation endpoint resolved"
        );
        *self.cache.write().await = Some(endpoint.clone());
        endpoint
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn resolver_with(local: &str, fallback: &str) -> EndpointResolver {
        EndpointResolver::new(
            Prober::new(Duration::from_millis(300)),
            RegistryClient::new("", "", Duration::from_millis(300)),
            ServerIdCell::with_id("test"),
            ResolverOptions {
                local_url: local.to_owned(),
                fallback_url: fallback.to_owned(),
                placeholder_server_id: "test".to_owned(),
                settings_wait: Duration::from_millis(10),
            },
        )
    }

    #[tokio::test]
    async fn nothing_reachable_is_an_error() {
        // Port 1 refuses connections; no registry configured.
        let resolver = resolver_with("http://127.0.0.1:1", "http://127.0.0.1:1");
        let err = resolver.resolve().await.unwrap_err();
        let ResolveError::AllUnreachable { notices } = err;
        assert!(notices.is_empty());
        assert!(resolver.cached().await.is_none());
    }

    #[tokio::test]
    async fn cache_starts_empty() {
        let resolver = resolver_with("http://127.0.0.1:1", "http://127.0.0.1:1");
        assert!(resolver.cached().await.is_none());
    }

    #[test]
    fn options_follow_server_config() {
        let server = crate::config::ServerConfig::default();
        let options = ResolverOptions::from_config(&server);
        assert_eq!(options.local_url, server.local_url);
        assert_eq!(options.settings_wait, Duration::from_secs(3));
    }
}
