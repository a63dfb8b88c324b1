use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;

/// Default RouterOS API port (plain, non-TLS).
pub const DEFAULT_API_PORT: u16 = 8728;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Top-level structure loaded from `config.json`.
//
// It defines:
// - The devices to poll
// - Which collector families are enabled
// - The device connect timeout
//
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Devices polled on every scrape
    pub devices: Vec<Device>,

    /// Collector family switches, shared by all devices
    #[serde(default)]
    pub features: Features,

    /// Connect timeout towards a device, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Semantic checks serde cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.devices.is_empty() {
            bail!("config contains no devices");
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                bail!("device with address {} has an empty name", device.address);
            }
            if !seen.insert(device.name.as_str()) {
                bail!("duplicate device name {}", device.name);
            }
        }

        Ok(())
    }
}

// ------------------------------------------------------------
// Device
// ------------------------------------------------------------
//
// One RouterOS target.
//
// Notes:
// - `name` is the stable `name` label on every metric.
// - `address` is the host only; the API port lives in `port`.
// - `password` is security-sensitive and never printed.
//
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub address: String,
    pub user: String,
    pub password: String,

    /// API port, defaults to 8728
    #[serde(default)]
    pub port: Option<u16>,
}

impl Device {
    /// `host:port` used to open the API connection.
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.address, self.port.unwrap_or(DEFAULT_API_PORT))
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

// ------------------------------------------------------------
// Feature switches
// ------------------------------------------------------------
//
// One flag per collector family. Keys are kebab-case in the
// config file (`dhcp-leases`, `wlan-stations`, ...).
//
// `interfaces` and `resource` are on unless disabled explicitly,
// everything else is opt-in.
//
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Features {
    #[serde(default = "enabled")]
    pub interfaces: bool,
    #[serde(default = "enabled")]
    pub resource: bool,
    #[serde(default)]
    pub bgp: bool,
    #[serde(default)]
    pub dhcp: bool,
    #[serde(default)]
    pub dhcpv6: bool,
    #[serde(default)]
    pub dhcp_leases: bool,
    #[serde(default)]
    pub routes: bool,
    #[serde(default)]
    pub routesv6: bool,
    #[serde(default)]
    pub pool: bool,
    #[serde(default)]
    pub poolv6: bool,
    #[serde(default)]
    pub optics: bool,
    #[serde(default)]
    pub wlan_stations: bool,
    #[serde(default)]
    pub wlan_interfaces: bool,
    #[serde(default)]
    pub monitor: bool,
    #[serde(default)]
    pub ipsec_peers: bool,
    #[serde(default)]
    pub ospf_neighbor: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Features {
    fn default() -> Self {
        Self {
            interfaces: true,
            resource: true,
            bgp: false,
            dhcp: false,
            dhcpv6: false,
            dhcp_leases: false,
            routes: false,
            routesv6: false,
            pool: false,
            poolv6: false,
            optics: false,
            wlan_stations: false,
            wlan_interfaces: false,
            monitor: false,
            ipsec_peers: false,
            ospf_neighbor: false,
        }
    }
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------

/// Reads and validates a JSON configuration file.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;

    parse_config(&data).with_context(|| format!("loading config file {}", path.display()))
}

/// Parses and validates configuration from a JSON string.
pub fn parse_config(data: &str) -> anyhow::Result<Config> {
    let cfg: Config = serde_json::from_str(data)?;
    cfg.validate()?;
    Ok(cfg)
}
