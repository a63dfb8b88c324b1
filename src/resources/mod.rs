//! RouterOS resource collectors and their registry
//!
//! This module provides:
//! - One collector per RouterOS resource family
//! - A factory resolving collectors by feature name
//! - The list of collectors enabled by a `Features` block
//!
//! All family-specific logic (commands, property lists, value
//! transforms) must live in the dedicated modules. The dispatcher
//! interacts exclusively through the `RouterOsCollector` trait.

pub mod collector;
pub mod interface;
pub mod resource;
pub mod dhcp;
pub mod dhcpv6;
pub mod dhcp_lease;
pub mod ipsec_peers;
pub mod routes;
pub mod pool;
pub mod wlan_sta;
pub mod wlan_if;
pub mod monitor;
pub mod optics;
pub mod bgp;
pub mod ospf_neighbor;

use std::sync::Arc;

use collector::{IpVersion, RouterOsCollector};

use crate::config::Features;

/// Returns a collector instance by feature name.
///
/// This function acts as the **central factory / registry** for all
/// supported resource families.
///
/// CONTRACT:
/// - `name` matches the kebab-case key in the `features` config block
/// - The returned collector reports the same `name()`
///
/// THREADING:
/// - Collectors are wrapped in `Arc` and shared across device polls
///
pub fn get_collector(name: &str) -> Option<Arc<dyn RouterOsCollector>> {
    match name {
        "interfaces" => Some(Arc::new(interface::InterfaceCollector::new())),
        "resource" => Some(Arc::new(resource::ResourceCollector::new())),
        "bgp" => Some(Arc::new(bgp::BgpCollector::new())),
        "dhcp" => Some(Arc::new(dhcp::DhcpCollector::new())),
        "dhcpv6" => Some(Arc::new(dhcpv6::Dhcpv6Collector::new())),
        "dhcp-leases" => Some(Arc::new(dhcp_lease::DhcpLeaseCollector::new())),
        "routes" => Some(Arc::new(routes::RoutesCollector::new(IpVersion::V4))),
        "routesv6" => Some(Arc::new(routes::RoutesCollector::new(IpVersion::V6))),
        "pool" => Some(Arc::new(pool::PoolCollector::new(IpVersion::V4))),
        "poolv6" => Some(Arc::new(pool::PoolCollector::new(IpVersion::V6))),
        "optics" => Some(Arc::new(optics::OpticsCollector::new())),
        "wlan-stations" => Some(Arc::new(wlan_sta::WlanStaCollector::new())),
        "wlan-interfaces" => Some(Arc::new(wlan_if::WlanIfCollector::new())),
        "monitor" => Some(Arc::new(monitor::MonitorCollector::new())),
        "ipsec-peers" => Some(Arc::new(ipsec_peers::IpsecPeersCollector::new())),
        "ospf-neighbor" => Some(Arc::new(ospf_neighbor::OspfNeighborCollector::new())),
        _ => None,
    }
}

/// Builds the enabled collectors, in a fixed order.
///
/// The order only affects the order of samples in one scrape.
pub fn collectors_for(features: &Features) -> Vec<Arc<dyn RouterOsCollector>> {
    let switches = [
        ("interfaces", features.interfaces),
        ("resource", features.resource),
        ("bgp", features.bgp),
        ("dhcp", features.dhcp),
        ("dhcpv6", features.dhcpv6),
        ("dhcp-leases", features.dhcp_leases),
        ("routes", features.routes),
        ("routesv6", features.routesv6),
        ("pool", features.pool),
        ("poolv6", features.poolv6),
        ("optics", features.optics),
        ("wlan-stations", features.wlan_stations),
        ("wlan-interfaces", features.wlan_interfaces),
        ("monitor", features.monitor),
        ("ipsec-peers", features.ipsec_peers),
        ("ospf-neighbor", features.ospf_neighbor),
    ];

    switches
        .into_iter()
        .filter(|(_, on)| *on)
        .filter_map(|(name, _)| get_collector(name))
        .collect()
}
