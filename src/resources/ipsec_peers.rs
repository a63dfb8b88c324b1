use std::sync::Arc;

use super::collector::RouterOsCollector;
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::DescriptorSet;
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::{ParseError, parse_duration, parse_float};

const PROPS: [&str; 8] = [
    "id",
    "remote-address",
    "state",
    "uptime",
    "rx-bytes",
    "tx-bytes",
    "rx-packets",
    "tx-packets",
];

/// Properties from `state` on are metrics
const METRIC_PROPS: usize = 2;

/// IPsec active peers: session state, uptime and traffic counters.
pub struct IpsecPeersCollector {
    descriptions: DescriptorSet,
}

impl IpsecPeersCollector {
    pub fn new() -> Self {
        Self {
            descriptions: DescriptorSet::for_properties(
                "ipsec_peers",
                &PROPS[METRIC_PROPS..],
                &["id", "remote_address", "state"],
            ),
        }
    }

    fn collect_for_stat(&self, re: &Record, ctx: &CollectorContext<'_>) {
        let id = re.value("id");
        let labels = ctx.labels(&[id, re.value("remote-address"), re.value("state")]);

        for property in &PROPS[METRIC_PROPS..] {
            ctx.emit_property(
                &self.descriptions,
                id,
                property,
                re.get(property),
                value_kind(property),
                &labels,
                |raw| parse_value_for_property(property, raw),
            );
        }
    }
}

impl Default for IpsecPeersCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn value_kind(property: &str) -> ValueKind {
    match property {
        "state" | "uptime" => ValueKind::Gauge,
        _ => ValueKind::Counter,
    }
}

fn parse_value_for_property(property: &str, value: &str) -> Result<f64, ParseError> {
    match property {
        "state" => Ok(if value == "established" { 1.0 } else { 0.0 }),
        "uptime" => parse_duration(value),
        _ => parse_float(value),
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for IpsecPeersCollector {
    fn name(&self) -> &'static str {
        "ipsec-peers"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(self.descriptions.iter())
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let stats = ctx
            .run("/ip/ipsec/active-peers/print", &[proplist(&PROPS)])
            .await?;

        for re in &stats.re {
            self.collect_for_stat(re, ctx);
        }

        Ok(())
    }
}
