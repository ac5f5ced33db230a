//! GeoSite list building
//!
//! Collects tracker hostnames into a [`DomainSet`] and serializes them as a
//! v2ray `GeoSiteList` protobuf message.

use prost::Message;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum GeoSiteError {
    #[error("Failed to encode geosite list: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GeoSiteError>;

/// Duplicate-free set of canonical tracker hostnames
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainSet {
    domains: BTreeSet<String>,
}

impl DomainSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a hostname. Returns `false` if it was already present.
    pub fn insert(&mut self, domain: impl Into<String>) -> bool {
        self.domains.insert(domain.into())
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Freeze the set into a strictly ascending sequence
    pub fn finalize(self) -> Vec<String> {
        self.domains.into_iter().collect()
    }
}

impl Extend<String> for DomainSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.domains.extend(iter);
    }
}

impl FromIterator<String> for DomainSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            domains: iter.into_iter().collect(),
        }
    }
}

// Wire types of v2ray's `app/router/config.proto`, limited to the fields we emit.

/// Match type of a domain rule
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DomainType {
    /// Substring match
    Plain = 0,
    Regex = 1,
    /// The domain and all of its subdomains
    Domain = 2,
    /// Exact hostname
    Full = 3,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Domain {
    #[prost(enumeration = "DomainType", tag = "1")]
    pub r#type: i32,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GeoSite {
    #[prost(string, tag = "1")]
    pub country_code: String,
    #[prost(message, repeated, tag = "2")]
    pub domain: Vec<Domain>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GeoSiteList {
    #[prost(message, repeated, tag = "1")]
    pub entry: Vec<GeoSite>,
}

impl GeoSiteList {
    /// Build a list with a single entry labelled `label`, keeping `domains` in
    /// the given order.
    pub fn single(label: &str, domains: &[String]) -> Self {
        let domain = domains
            .iter()
            .map(|value| Domain {
                r#type: DomainType::Domain as i32,
                value: value.clone(),
            })
            .collect();

        Self {
            entry: vec![GeoSite {
                country_code: label.to_string(),
                domain,
            }],
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

/// Serialize `domains` under `label`
pub fn encode(label: &str, domains: &[String]) -> Result<Vec<u8>> {
    GeoSiteList::single(label, domains).to_bytes()
}

/// Write the artifact, replacing any previous file at `path`.
///
/// New files are created with mode 0666 (before umask).
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    let wrap = |source: std::io::Error| GeoSiteError::Write {
        path: path.display().to_string(),
        source,
    };

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o666);
    }

    let mut file = options.open(path).map_err(wrap)?;
    file.write_all(bytes).map_err(wrap)?;
    file.sync_all().map_err(wrap)?;

    Ok(())
}
