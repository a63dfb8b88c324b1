//! Command-line arguments

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Prometheus exporter for MikroTik RouterOS devices
#[derive(Parser, Debug, Clone)]
#[command(name = "mikrotik-exporter")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config", default_value = "config.json")]
    pub config: PathBuf,

    /// Address the HTTP server listens on
    #[arg(short = 'l', long = "listen", default_value = "0.0.0.0:9436")]
    pub listen: SocketAddr,

    /// Log filter (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["mikrotik-exporter"]).unwrap();

        assert_eq!(args.config, PathBuf::from("config.json"));
        assert_eq!(args.listen, "0.0.0.0:9436".parse::<SocketAddr>().unwrap());
        assert!(args.log_level.is_none());
    }

    #[test]
    fn overrides() {
        let args = CliArgs::try_parse_from([
            "mikrotik-exporter",
            "--config",
            "/etc/mikrotik/exporter.json",
            "--listen",
            "127.0.0.1:9100",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("/etc/mikrotik/exporter.json"));
        assert_eq!(args.listen.port(), 9100);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn rejects_bad_listen_address() {
        assert!(CliArgs::try_parse_from(["mikrotik-exporter", "--listen", "nowhere"]).is_err());
    }
}
