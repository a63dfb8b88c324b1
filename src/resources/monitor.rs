use std::sync::Arc;

use super::collector::{RouterOsCollector, record_names};
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::{DescriptorSet, description};
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::{ParseError, parse_bool, parse_link_rate};

const PROPS: [&str; 4] = ["name", "status", "rate", "full-duplex"];

/// Ethernet link monitor: link state, negotiated rate and duplex.
///
/// All enabled ethernet interfaces are monitored with a single
/// `=once=` call.
pub struct MonitorCollector {
    descriptions: DescriptorSet,
}

impl MonitorCollector {
    pub fn new() -> Self {
        let labels = ["interface"];
        let mut descriptions = DescriptorSet::new();
        descriptions.insert(
            "status",
            description("monitor", "status", "whether interface link is up (1) or down (0)", &labels),
        );
        descriptions.insert("rate", description("monitor", "rate", "actual link speed in Mbps", &labels));
        descriptions.insert(
            "full-duplex",
            description("monitor", "full_duplex", "full duplex data transmission", &labels),
        );

        Self { descriptions }
    }

    fn collect_for_monitor(&self, re: &Record, ctx: &CollectorContext<'_>) {
        let name = re.value("name");
        let labels = ctx.labels(&[name]);

        for p in &PROPS[1..] {
            ctx.emit_property(&self.descriptions, name, p, re.get(p), ValueKind::Gauge, &labels, |raw| {
                parse_monitor_value(p, raw)
            });
        }
    }
}

impl Default for MonitorCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_monitor_value(property: &str, value: &str) -> Result<f64, ParseError> {
    match property {
        "status" => Ok(if value == "link-ok" { 1.0 } else { 0.0 }),
        "rate" => parse_link_rate(value),
        _ => Ok(parse_bool(value)),
    }
}

/// Names of enabled ethernet interfaces, shared with the optics family.
pub(crate) async fn fetch_ethernet_names(ctx: &mut CollectorContext<'_>) -> anyhow::Result<Vec<String>> {
    let reply = ctx
        .run(
            "/interface/ethernet/print",
            &["?disabled=false".to_string(), proplist(&["name"])],
        )
        .await?;

    Ok(record_names(&reply))
}

#[async_trait::async_trait]
impl RouterOsCollector for MonitorCollector {
    fn name(&self) -> &'static str {
        "monitor"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(self.descriptions.iter())
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let names = fetch_ethernet_names(ctx).await?;
        if names.is_empty() {
            return Ok(());
        }

        let reply = ctx
            .run(
                "/interface/ethernet/monitor",
                &[format!("=numbers={}", names.join(",")), "=once=".to_string(), proplist(&PROPS)],
            )
            .await?;

        for re in &reply.re {
            self.collect_for_monitor(re, ctx);
        }

        Ok(())
    }
}
