//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Default, Parser)]
#[command(name = "geosite-pt")]
#[command(version)]
#[command(about = "Build a v2ray geosite list from the trackers of private torrents")]
#[command(
    after_help = "Example:\n  geosite-pt --qb admin:adminadmin@192.168.1.1:8080 --tr user:password@192.168.1.1:9091"
)]
pub struct Cli {
    /// qBittorrent WebUI credentials and address, e.g. admin:adminadmin@192.168.1.1:8080
    #[arg(long = "qb", value_name = "USER:PASS@HOST:PORT")]
    pub qbittorrent: Vec<String>,

    /// Transmission RPC credentials and address, e.g. user:password@192.168.1.1:9091
    #[arg(long = "tr", value_name = "USER:PASS@HOST:PORT")]
    pub transmission: Vec<String>,

    /// Path where the .dat file will be written
    #[arg(long = "dat", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Category label of the generated list (e.g. PT or TRACKER)
    #[arg(long)]
    pub label: Option<String>,

    /// Config file to load instead of the default locations
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeatable_backends() {
        let cli = Cli::try_parse_from([
            "geosite-pt",
            "--qb",
            "admin:adminadmin@192.168.1.1:8080",
            "--qb",
            "admin:secret@192.168.1.2:8080",
            "--tr",
            "user:password@192.168.1.1:9091",
            "--dat",
            "/tmp/pt.dat",
            "--label",
            "PT",
        ])
        .unwrap();

        assert_eq!(cli.qbittorrent.len(), 2);
        assert_eq!(cli.transmission, vec!["user:password@192.168.1.1:9091"]);
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/pt.dat")));
        assert_eq!(cli.label.as_deref(), Some("PT"));
        assert!(cli.config.is_none());
    }
}
