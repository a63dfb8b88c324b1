use std::sync::Arc;

use anyhow::{Context, anyhow};

use crate::collector::context::CollectorContext;
use crate::schema::{Descriptor, Reply};
use crate::util::parse_float;

/// RouterOsCollector is the abstraction layer between:
/// - The generic dispatcher (one poll cycle per device)
/// - RouterOS resource families (interfaces, leases, peers, ...)
///
/// Each implementation must:
/// - Build its descriptors once, at construction
/// - Request only its declared property list from the device
/// - Map reply records to samples in descriptor label order
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - One instance is shared by all devices and concurrent polls;
///   implementations hold nothing but immutable descriptors
///
#[async_trait::async_trait]
pub trait RouterOsCollector: Send + Sync {
    /// Feature name, as used in the configuration file.
    ///
    /// Used for logging and the `collector` label of scrape metrics.
    fn name(&self) -> &'static str;

    /// Every descriptor this collector can emit.
    ///
    /// Side-effect free, callable before any `collect`.
    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_>;

    /// Runs one collection against the device in `ctx`.
    ///
    /// ERRORS:
    /// - A failed command (or a reply with an unexpected shape) aborts
    ///   this collector for this device and cycle
    /// - Unparseable fields are skipped, never returned as errors
    ///
    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()>;
}

/// Which RouterOS address family a counting collector targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Menu prefix: `/ip/...` or `/ipv6/...`
    pub fn topic(&self) -> &'static str {
        match self {
            IpVersion::V4 => "ip",
            IpVersion::V6 => "ipv6",
        }
    }

    /// Metric name prefix: `ipv4_...` or `ipv6_...`
    pub fn metric_prefix(&self) -> &'static str {
        match self {
            IpVersion::V4 => "ipv4",
            IpVersion::V6 => "ipv6",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IpVersion::V4 => "IPv4",
            IpVersion::V6 => "IPv6",
        }
    }
}

/// Reads the `ret` attribute of a `=count-only=` reply.
///
/// A missing or non-numeric count is a structural failure.
pub fn count_from_reply(reply: &Reply) -> anyhow::Result<f64> {
    let ret = reply
        .done
        .get("ret")
        .ok_or_else(|| anyhow!("count-only reply without ret attribute"))?;

    parse_float(ret).context("parsing count-only reply")
}

/// Names of every record in `reply`, skipping records without one.
pub fn record_names(reply: &Reply) -> Vec<String> {
    reply
        .re
        .iter()
        .filter_map(|re| re.get("name"))
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .collect()
}
