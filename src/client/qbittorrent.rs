//! qBittorrent WebUI API client
//!
//! Implements the subset of the qBittorrent WebUI API v2.x needed to list
//! trackers of private torrents.
//! Reference: https://github.com/qbittorrent/qBittorrent/wiki/WebUI-API-(qBittorrent-4.1)

use super::{BackendEndpoint, ClientError, ClientType, DomainSource, Result};
use crate::geosite::DomainSet;
use crate::tracker;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

const SESSION_COOKIE: &str = "SID";

pub struct QBittorrentClient {
    config: BackendEndpoint,
    http: Client,
}

/// Authenticated WebUI session
#[derive(Debug, Clone)]
struct Session {
    sid: String,
}

impl Session {
    fn cookie(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.sid)
    }
}

impl QBittorrentClient {
    pub fn new(config: BackendEndpoint, http: Client) -> Self {
        Self { config, http }
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v2{}", self.config.base_url(), endpoint)
    }

    async fn login(&self) -> Result<Session> {
        let url = self.api_url("/auth/login");

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self.http.post(&url).form(&params).send().await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(ClientError::AuthenticationFailed(
                "login refused (too many failed attempts or banned IP)".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(ClientError::AuthenticationFailed(format!(
                "login returned status {}",
                status
            )));
        }

        let sid = response
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.value().to_string());

        let text = response.text().await?;
        if text.contains("Fails") {
            return Err(ClientError::AuthenticationFailed(
                "invalid username or password".to_string(),
            ));
        }

        match sid {
            Some(sid) if !sid.is_empty() => {
                debug!("Logged in to qBittorrent at {}", self.config);
                Ok(Session { sid })
            }
            _ => Err(ClientError::AuthenticationFailed(format!(
                "{} cookie not found",
                SESSION_COOKIE
            ))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, session: &Session, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .header(header::COOKIE, session.cookie())
            .send()
            .await?;

        if response.status() == StatusCode::FORBIDDEN {
            return Err(ClientError::AuthenticationFailed(
                "session rejected".to_string(),
            ));
        }

        if !response.status().is_success() {
            return Err(ClientError::InvalidResponse(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_torrents(&self, session: &Session) -> Result<Vec<QBTorrent>> {
        self.get_json(session, &self.api_url("/torrents/info")).await
    }

    async fn get_properties(&self, session: &Session, hash: &str) -> Result<QBProperties> {
        let url = format!(
            "{}?hash={}",
            self.api_url("/torrents/properties"),
            urlencoding::encode(hash)
        );
        self.get_json(session, &url).await
    }

    async fn get_trackers(&self, session: &Session, hash: &str) -> Result<Vec<QBTracker>> {
        let url = format!(
            "{}?hash={}",
            self.api_url("/torrents/trackers"),
            urlencoding::encode(hash)
        );
        self.get_json(session, &url).await
    }
}

#[async_trait]
impl DomainSource for QBittorrentClient {
    fn client_type(&self) -> ClientType {
        ClientType::QBittorrent
    }

    fn endpoint(&self) -> &BackendEndpoint {
        &self.config
    }

    async fn collect_domains(&self, domains: &mut DomainSet) -> Result<usize> {
        let session = self.login().await?;
        let torrents = self.get_torrents(&session).await?;

        info!("qBittorrent at {} has {} torrents", self.config, torrents.len());

        let mut seen = 0;
        for torrent in &torrents {
            let properties = match self.get_properties(&session, &torrent.hash).await {
                Ok(p) => p,
                Err(e) => {
                    warn!("Skipping torrent {}: failed to get properties: {}", torrent.hash, e);
                    continue;
                }
            };

            // Only private torrents reveal their tracker to the routing list
            if !properties.is_private {
                continue;
            }

            let trackers = match self.get_trackers(&session, &torrent.hash).await {
                Ok(t) => t,
                Err(e) => {
                    warn!("Skipping torrent {}: failed to get trackers: {}", torrent.hash, e);
                    continue;
                }
            };

            for host in tracker::classify_all(trackers.iter().map(|t| t.url.as_str())) {
                debug!("Torrent {} uses tracker {}", torrent.hash, host);
                domains.insert(host);
                seen += 1;
            }
        }

        Ok(seen)
    }
}

// qBittorrent API response types

#[derive(Debug, Deserialize)]
struct QBTorrent {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct QBProperties {
    // Absent before qBittorrent 5.0
    #[serde(default)]
    is_private: bool,
}

#[derive(Debug, Deserialize)]
struct QBTracker {
    url: String,
}
