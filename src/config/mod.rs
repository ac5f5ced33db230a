//! Configuration management module

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::client::{BackendEndpoint, ClientType};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Where the geosite list is written
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Category label of the single list entry
    #[serde(default = "default_label")]
    pub label: String,

    /// Per-request timeout; the HTTP client default applies when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Backends, visited in this order
    #[serde(default)]
    pub backends: Vec<BackendEndpoint>,

    #[serde(skip)]
    config_file: Option<PathBuf>,
}

fn default_output() -> PathBuf {
    PathBuf::from("/usr/share/v2ray/pt.dat")
}

fn default_label() -> String {
    "TRACKER".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: default_output(),
            label: default_label(),
            request_timeout_secs: None,
            backends: Vec::new(),
            config_file: None,
        }
    }
}

impl Settings {
    /// Load settings from config file, environment and command line, in
    /// increasing order of precedence
    pub fn load(cli: &Cli) -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut settings = match &cli.config {
            Some(path) => {
                let mut settings = Self::load_from_file(path)?;
                settings.config_file = Some(path.clone());
                settings
            }
            None => Self::load_default_file()?,
        };

        settings.apply_env_overrides();
        settings.apply_cli(cli)?;
        settings.validate()?;

        Ok(settings)
    }

    fn load_default_file() -> Result<Self> {
        let mut config_paths = vec![PathBuf::from("config.toml")];
        if let Some(path) = dirs_config_path() {
            config_paths.push(path);
        }

        for path in config_paths.iter() {
            if path.exists() {
                let mut settings = Self::load_from_file(path)?;
                settings.config_file = Some(path.clone());
                return Ok(settings);
            }
        }

        Ok(Settings::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("GEOSITE_PT_OUTPUT") {
            self.output = PathBuf::from(path);
        }
        if let Ok(label) = std::env::var("GEOSITE_PT_LABEL") {
            self.label = label;
        }
        if let Ok(timeout) = std::env::var("GEOSITE_PT_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                self.request_timeout_secs = Some(timeout);
            }
        }
    }

    fn apply_cli(&mut self, cli: &Cli) -> Result<()> {
        for spec in &cli.qbittorrent {
            let endpoint = BackendEndpoint::parse(ClientType::QBittorrent, spec)
                .context("Invalid --qb value")?;
            self.backends.push(endpoint);
        }
        for spec in &cli.transmission {
            let endpoint = BackendEndpoint::parse(ClientType::Transmission, spec)
                .context("Invalid --tr value")?;
            self.backends.push(endpoint);
        }
        if let Some(ref output) = cli.output {
            self.output = output.clone();
        }
        if let Some(ref label) = cli.label {
            self.label = label.clone();
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            bail!("At least one qb or tr backend must be specified");
        }
        if self.label.is_empty() {
            bail!("The list label must not be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Get the path to the config file (if loaded from file)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }
}

/// Get platform-specific config directory
fn dirs_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
            .map(|p| p.join("geosite-pt/config.toml"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/geosite-pt/config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("geosite-pt/config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}
