//! Remote registry lookup and server-id readiness.
//!
//! The registry is a signed JSON document in a cloud object store mapping
//! server ids to `{url, status}` pairs. It is fetched fresh on every
//! consultation and treated as read-only external truth.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

/// Published availability of a registered server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// The server accepts conversations.
    Open,
    /// The owner has closed the server.
    Closed,
    /// Any other published value.
    #[serde(other)]
    Unknown,
}

/// One registry document entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Base URL of the registered server.
    pub url: String,
    /// Published availability.
    pub status: ServerStatus,
}

/// Errors from a registry consultation.
///
/// All of these are non-fatal to endpoint resolution; the resolver logs
/// them and falls through to the next candidate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// The document could not be fetched.
    #[error("registry fetch failed: {0}")]
    Fetch(String),

    /// The document could not be parsed.
    #[error("registry document malformed: {0}")]
    Parse(String),

    /// The document has no entry for the requested server id.
    #[error("registry has no entry for server {0:?}")]
    MissingServer(String),
}

/// Fetches the registry document and looks up one server id.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    registry_url: String,
    api_key: String,
}

impl RegistryClient {
    /// Create a client for the given signed document URL and bearer key.
    pub fn new(
        registry_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            registry_url: registry_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetch the document and return the entry for `server_id`.
    ///
    /// Always refetches; the document is never cached across calls.
    pub async fn fetch(&self, server_id: &str) -> Result<RegistryEntry, RegistryError> {
        if self.registry_url.is_empty() {
            return Err(RegistryError::Fetch("no registry URL configured".into()));
        }

        let response = self
            .client
            .get(&self.registry_url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RegistryError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RegistryError::Fetch(format!(
                "registry returned HTTP {}",
                response.status()
            )));
        }

        let document: HashMap<String, RegistryEntry> = response
            .json()
            .await
            .map_err(|e| RegistryError::Parse(e.to_string()))?;

        document
            .get(server_id)
            .cloned()
            .ok_or_else(|| RegistryError::MissingServer(server_id.to_owned()))
    }
}

/// One-shot readiness cell for the server id.
///
/// The host application loads its settings on its own schedule; resolution
/// must not start a registry lookup until the id is known. The settings
/// collaborator calls [`provide`](Self::provide) once, and
/// [`wait`](Self::wait) resolves immediately afterwards. If the id never
/// arrives within the timeout, the configured placeholder is used instead —
/// a best-effort degrade, not an error.
#[derive(Clone)]
pub struct ServerIdCell {
    tx: watch::Sender<Option<String>>,
}

impl std::fmt::Debug for ServerIdCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerIdCell")
            .field("provided", &self.tx.borrow().is_some())
            .finish()
    }
}

impl ServerIdCell {
    /// Create an unfilled cell.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Create a cell already holding an id.
    pub fn with_id(id: impl Into<String>) -> Self {
        let cell = Self::new();
        cell.provide(id);
        cell
    }

    /// Fill the cell. Later calls overwrite the value.
    pub fn provide(&self, id: impl Into<String>) {
        self.tx.send_replace(Some(id.into()));
    }

    /// Wait up to `timeout` for the id, falling back to `placeholder`.
    pub async fn wait(&self, timeout: Duration, placeholder: &str) -> String {
        let mut rx = self.tx.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await {
            Ok(Ok(value)) => value.as_deref().unwrap_or(placeholder).to_owned(),
            _ => {
                warn!(
                    placeholder,
                    "server id not provided in time, using placeholder"
                );
                placeholder.to_owned()
            }
        }
    }
}

impl Default for ServerIdCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn status_parses_known_and_unknown_values() {
        let open: ServerStatus = serde_json::from_str("\"open\"").unwrap();
        let closed: ServerStatus = serde_json::from_str("\"closed\"").unwrap();
        let odd: ServerStatus = serde_json::from_str("\"maintenance\"").unwrap();
        assert_eq!(open, ServerStatus::Open);
        assert_eq!(closed, ServerStatus::Closed);
        assert_eq!(odd, ServerStatus::Unknown);
    }

    #[test]
    fn document_shape_parses() {
        let raw = r#"{"mari-main":{"url":"https://mari.example.net","status":"open"}}"#;
        let document: HashMap<String, RegistryEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            document.get("mari-main").map(|e| e.status),
            Some(ServerStatus::Open)
        );
    }

    #[tokio::test]
    async fn provided_id_resolves_immediately() {
        let cell = ServerIdCell::with_id("mari-main");
        let id = cell.wait(Duration::from_millis(10), "default").await;
        assert_eq!(id, "mari-main");
    }

    #[tokio::test]
    async fn missing_id_falls_back_to_placeholder() {
        let cell = ServerIdCell::new();
        let id = cell.wait(Duration::from_millis(20), "default").await;
        assert_eq!(id, "default");
    }

    #[tokio::test]
    async fn late_provide_wakes_a_waiter() {
        let cell = ServerIdCell::new();
        let waiter = {
            let cell = cell.clone();
            tokio::spawn(async move { cell.wait(Duration::from_secs(1), "default").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cell.provide("late-id");
        assert_eq!(waiter.await.unwrap(), "late-id");
    }
}
