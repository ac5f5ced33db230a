//! BitTorrent client abstraction layer
//!
//! Each supported client (qBittorrent, Transmission) is a [`DomainSource`]:
//! it authenticates against the backend, lists its torrents and feeds the
//! tracker hostnames it decides to keep into a shared [`DomainSet`].
//!
//! The sources do not share a filtering routine: qBittorrent only
//! reports trackers of private torrents, Transmission reports every tracker.

mod qbittorrent;
mod transmission;

pub use qbittorrent::QBittorrentClient;
pub use transmission::TransmissionClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geosite::DomainSet;

/// Unified error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// BitTorrent client types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    QBittorrent,
    Transmission,
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientType::QBittorrent => write!(f, "qbittorrent"),
            ClientType::Transmission => write!(f, "transmission"),
        }
    }
}

/// A configured backend instance
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendEndpoint {
    #[serde(rename = "kind")]
    pub client_type: ClientType,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub use_https: bool,
}

impl BackendEndpoint {
    /// Parse the `user:pass@host:port` shorthand accepted on the command line.
    pub fn parse(client_type: ClientType, spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split('@').collect();
        if parts.len() != 2 {
            return Err(ClientError::InvalidEndpoint(format!(
                "expected user:password@host:port, got {:?}",
                redact(spec)
            )));
        }

        let (username, password) = parts[0].split_once(':').ok_or_else(|| {
            ClientError::InvalidEndpoint("credentials must be user:password".to_string())
        })?;

        let (host, port) = parts[1].rsplit_once(':').ok_or_else(|| {
            ClientError::InvalidEndpoint(format!("missing port in {:?}", parts[1]))
        })?;
        if host.is_empty() {
            return Err(ClientError::InvalidEndpoint(format!(
                "missing host in {:?}",
                parts[1]
            )));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| ClientError::InvalidEndpoint(format!("invalid port {:?}", port)))?;

        Ok(Self {
            client_type,
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            use_https: false,
        })
    }

    /// Get the base URL for the client
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Create the source matching this endpoint's client type
    pub fn create_source(&self, timeout: Option<Duration>) -> Result<Box<dyn DomainSource>> {
        let http = http_client(timeout)?;
        let source: Box<dyn DomainSource> = match self.client_type {
            ClientType::QBittorrent => Box::new(QBittorrentClient::new(self.clone(), http)),
            ClientType::Transmission => Box::new(TransmissionClient::new(self.clone(), http)),
        };
        Ok(source)
    }
}

// Endpoint identity used in logs. The password never leaves the process.
impl std::fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}@{}", self.client_type, self.username, self.base_url())
    }
}

impl std::fmt::Debug for BackendEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendEndpoint")
            .field("client_type", &self.client_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("use_https", &self.use_https)
            .finish()
    }
}

fn redact(spec: &str) -> String {
    match spec.rsplit_once('@') {
        Some((_, addr)) => format!("***@{}", addr),
        None => spec.to_string(),
    }
}

fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// A backend that yields canonical tracker domains
#[async_trait]
pub trait DomainSource: Send + Sync {
    /// Get the client type
    fn client_type(&self) -> ClientType;

    /// Get the configured endpoint
    fn endpoint(&self) -> &BackendEndpoint;

    /// Authenticate, fetch the torrent list and insert every accepted tracker
    /// hostname into `domains`. Returns the number of hostnames seen, duplicates
    /// included.
    ///
    /// An error means the backend as a whole failed (authentication, transport,
    /// or the top-level list call). Per-torrent problems are handled inside.
    async fn collect_domains(&self, domains: &mut DomainSet) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        let endpoint =
            BackendEndpoint::parse(ClientType::QBittorrent, "admin:adminadmin@192.168.1.1:8080")
                .unwrap();
        assert_eq!(endpoint.username, "admin");
        assert_eq!(endpoint.password, "adminadmin");
        assert_eq!(endpoint.host, "192.168.1.1");
        assert_eq!(endpoint.port, 8080);
        assert_eq!(endpoint.base_url(), "http://192.168.1.1:8080");
    }

    #[test]
    fn test_parse_endpoint_password_with_colon() {
        let endpoint =
            BackendEndpoint::parse(ClientType::Transmission, "user:pa:ss@nas.local:9091").unwrap();
        assert_eq!(endpoint.username, "user");
        assert_eq!(endpoint.password, "pa:ss");
        assert_eq!(endpoint.host, "nas.local");
    }

    #[test]
    fn test_parse_endpoint_rejects_malformed() {
        assert!(BackendEndpoint::parse(ClientType::QBittorrent, "nas.local:8080").is_err());
        assert!(BackendEndpoint::parse(ClientType::QBittorrent, "a:b@c@d:1").is_err());
        assert!(BackendEndpoint::parse(ClientType::QBittorrent, "admin@nas.local:8080").is_err());
        assert!(BackendEndpoint::parse(ClientType::QBittorrent, "a:b@nas.local").is_err());
        assert!(BackendEndpoint::parse(ClientType::QBittorrent, "a:b@nas.local:http").is_err());
        assert!(BackendEndpoint::parse(ClientType::QBittorrent, "a:b@:8080").is_err());
    }

    #[test]
    fn test_display_hides_password() {
        let endpoint =
            BackendEndpoint::parse(ClientType::Transmission, "user:hunter2@nas.local:9091").unwrap();
        let shown = format!("{} {:?}", endpoint, endpoint);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("transmission user@http://nas.local:9091"));
    }
}
