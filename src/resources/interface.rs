use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};

use super::collector::RouterOsCollector;
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::DescriptorSet;
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::{parse_bool, parse_datetime, parse_float};

const PROPS: [&str; 17] = [
    "name",
    "comment",
    "mac-address",
    "type",
    "last-link-down-time",
    "last-link-up-time",
    "running",
    "actual-mtu",
    "link-downs",
    "rx-byte",
    "tx-byte",
    "rx-packet",
    "tx-packet",
    "rx-error",
    "tx-error",
    "rx-drop",
    "tx-drop",
];

/// Label properties come first in `PROPS`
const LABEL_PROPS: usize = 4;

/// Metric properties `[4..8]` are gauges, the rest counters
const GAUGE_END: usize = 8;

const LABELS: [&str; 4] = ["interface", "comment", "mac_address", "type"];

/// Interface counters and link state.
///
/// The two last-link timestamps are absolute device times; they are
/// exported as seconds elapsed relative to the device clock, which is
/// read once per collection.
pub struct InterfaceCollector {
    descriptions: DescriptorSet,
}

impl InterfaceCollector {
    pub fn new() -> Self {
        Self {
            descriptions: DescriptorSet::for_properties("interface", &PROPS[LABEL_PROPS..], &LABELS),
        }
    }

    async fn fetch_clock(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<DateTime<Utc>> {
        let reply = ctx
            .run("/system/clock/print", &[proplist(&["time", "date"])])
            .await?;

        // Exactly one clock is a precondition for every relative timestamp
        let [clock] = reply.re.as_slice() else {
            bail!(
                "expected exactly one clock record from {}, got {}",
                ctx.device.name,
                reply.re.len()
            );
        };

        let raw = format!("{} {}", clock.value("date"), clock.value("time"));
        parse_datetime(&raw).with_context(|| format!("parsing clock of {}", ctx.device.name))
    }

    fn collect_for_stat(&self, re: &Record, now: DateTime<Utc>, ctx: &CollectorContext<'_>) {
        let iface = re.value("name");
        let labels = ctx.labels(&[iface, re.value("comment"), re.value("mac-address"), re.value("type")]);

        for (i, property) in PROPS.iter().enumerate().skip(LABEL_PROPS) {
            let kind = if i < GAUGE_END {
                ValueKind::Gauge
            } else {
                ValueKind::Counter
            };

            ctx.emit_property(
                &self.descriptions,
                iface,
                property,
                re.get(property),
                kind,
                &labels,
                |raw| match *property {
                    "last-link-down-time" | "last-link-up-time" => {
                        let at = parse_datetime(raw)?;
                        Ok((now - at).num_milliseconds() as f64 / 1000.0)
                    }
                    "running" => Ok(parse_bool(raw)),
                    _ => parse_float(raw),
                },
            );
        }
    }
}

impl Default for InterfaceCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for InterfaceCollector {
    fn name(&self) -> &'static str {
        "interfaces"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(self.descriptions.iter())
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let stats = ctx
            .run("/interface/print", &["?disabled=false".to_string(), proplist(&PROPS)])
            .await?;

        let now = self.fetch_clock(ctx).await?;

        for re in &stats.re {
            self.collect_for_stat(re, now, ctx);
        }

        Ok(())
    }
}
