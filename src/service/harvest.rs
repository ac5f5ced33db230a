//! Harvest service
//!
//! Visits every configured backend in order, merges their tracker domains
//! and writes the geosite list. The list is only written when every backend
//! succeeded: a partial list would silently route fewer trackers, so a failed
//! run leaves the previous file untouched.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::client::{BackendEndpoint, DomainSource};
use crate::config::Settings;
use crate::geosite::{self, DomainSet};

/// Harvest service
pub struct HarvestService {
    backends: Vec<BackendEndpoint>,
    output: PathBuf,
    label: String,
    request_timeout: Option<Duration>,
}

impl HarvestService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            backends: settings.backends.clone(),
            output: settings.output.clone(),
            label: settings.label.clone(),
            request_timeout: settings.request_timeout(),
        }
    }

    /// Fetch from all configured backends and write the list.
    ///
    /// Backend failures produce [`HarvestResult::Skipped`]; encoding and
    /// write failures are returned as errors.
    pub async fn run(&self) -> Result<HarvestResult> {
        let mut sources = Vec::with_capacity(self.backends.len());
        let mut failures = Vec::new();

        for endpoint in &self.backends {
            match endpoint.create_source(self.request_timeout) {
                Ok(source) => sources.push(source),
                Err(e) => {
                    error!("Failed to set up client for {}: {}", endpoint, e);
                    failures.push(BackendFailure::new(endpoint, &e));
                }
            }
        }

        self.run_with_sources(&sources, failures).await
    }

    /// Run against already constructed sources. `failures` carries backends
    /// that failed before fetching started.
    pub async fn run_with_sources(
        &self,
        sources: &[Box<dyn DomainSource>],
        mut failures: Vec<BackendFailure>,
    ) -> Result<HarvestResult> {
        let backends = sources.len() + failures.len();
        info!("Fetching tracker domains from {} backends", backends);

        let mut domains = DomainSet::new();
        for source in sources {
            let endpoint = source.endpoint();
            match source.collect_domains(&mut domains).await {
                Ok(seen) => info!(
                    "{} tracker hosts from {} at {}",
                    seen,
                    source.client_type(),
                    endpoint.base_url()
                ),
                Err(e) => {
                    error!("Error fetching domains from {}: {}", endpoint, e);
                    failures.push(BackendFailure::new(endpoint, &e));
                }
            }
        }

        if !failures.is_empty() {
            warn!(
                "{} of {} backends failed; {} not written",
                failures.len(),
                backends,
                self.output.display()
            );
            return Ok(HarvestResult::Skipped { backends, failures });
        }

        if domains.is_empty() {
            warn!("No tracker domains found; writing an empty {} list", self.label);
        } else {
            debug!("{} distinct tracker domains", domains.len());
        }

        let domains = domains.finalize();
        let bytes = geosite::encode(&self.label, &domains).context("Failed to encode GeoSiteList")?;
        geosite::write_artifact(&self.output, &bytes).context("Failed to write geosite file")?;

        info!(
            "{} -> {} ({} domains)",
            self.label,
            self.output.display(),
            domains.len()
        );
        for domain in &domains {
            info!("{}", domain);
        }

        Ok(HarvestResult::Written {
            backends,
            path: self.output.clone(),
            domains,
        })
    }
}

/// A backend that failed during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    /// Endpoint identity, without credentials
    pub endpoint: String,
    pub error: String,
}

impl BackendFailure {
    fn new(endpoint: &BackendEndpoint, error: &dyn std::fmt::Display) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            error: error.to_string(),
        }
    }
}

/// Outcome of a harvest run
#[derive(Debug)]
pub enum HarvestResult {
    /// Every backend answered and the list was written
    Written {
        backends: usize,
        path: PathBuf,
        domains: Vec<String>,
    },
    /// At least one backend failed, nothing was written
    Skipped {
        backends: usize,
        failures: Vec<BackendFailure>,
    },
}
