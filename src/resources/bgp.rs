use std::sync::Arc;

use super::collector::RouterOsCollector;
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::{DescriptorSet, description, description_for_property_name};
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::{ParseError, parse_float};

const PROPS: [&str; 8] = [
    "name",
    "remote-as",
    "state",
    "prefix-count",
    "updates-sent",
    "updates-received",
    "withdrawn-sent",
    "withdrawn-received",
];

const LABELS: [&str; 2] = ["session", "asn"];

/// BGP peer sessions: up/down state, received prefixes and update counters.
pub struct BgpCollector {
    descriptions: DescriptorSet,
}

impl BgpCollector {
    pub fn new() -> Self {
        let mut descriptions = DescriptorSet::new();
        descriptions.insert("state", description("bgp", "up", "BGP session is established (up = 1)", &LABELS));
        for p in &PROPS[3..] {
            descriptions.insert(p, description_for_property_name("bgp", p, &LABELS));
        }

        Self { descriptions }
    }

    fn collect_for_stat(&self, re: &Record, ctx: &CollectorContext<'_>) {
        let session = re.value("name");
        let labels = ctx.labels(&[session, re.value("remote-as")]);

        for p in &PROPS[2..] {
            ctx.emit_property(&self.descriptions, session, p, re.get(p), value_kind(p), &labels, |raw| {
                parse_value_for_property(p, raw)
            });
        }
    }
}

impl Default for BgpCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn value_kind(property: &str) -> ValueKind {
    match property {
        "state" | "prefix-count" => ValueKind::Gauge,
        _ => ValueKind::Counter,
    }
}

fn parse_value_for_property(property: &str, value: &str) -> Result<f64, ParseError> {
    match property {
        "state" => Ok(if value == "established" { 1.0 } else { 0.0 }),
        _ => parse_float(value),
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for BgpCollector {
    fn name(&self) -> &'static str {
        "bgp"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(self.descriptions.iter())
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let stats = ctx
            .run("/routing/bgp/peer/print", &[proplist(&PROPS)])
            .await?;

        for re in &stats.re {
            self.collect_for_stat(re, ctx);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::sink::SampleBuffer;
    use crate::config::Device;
    use crate::routeros::FakeSession;

    #[tokio::test]
    async fn exports_session_state_and_counters() {
        let device = Device {
            name: "edge".into(),
            address: "192.0.2.1".into(),
            user: "u".into(),
            password: "p".into(),
            port: Some(8729),
        };
        let mut session = FakeSession::new().with_records(
            "/routing/bgp/peer/print",
            vec![
                Record::from_iter([
                    ("name", "transit-a"),
                    ("remote-as", "64500"),
                    ("state", "established"),
                    ("prefix-count", "812345"),
                    ("updates-received", "99"),
                ]),
                Record::from_iter([("name", "transit-b"), ("remote-as", "64501"), ("state", "active")]),
            ],
        );
        let sink = SampleBuffer::new();

        let mut ctx = CollectorContext::new(&sink, &device, &mut session);
        BgpCollector::new().collect(&mut ctx).await.unwrap();

        let samples = sink.drain();
        assert_eq!(samples.len(), 4);

        assert_eq!(samples[0].descriptor.fq_name(), "mikrotik_bgp_up");
        assert_eq!(samples[0].label_values, ["edge", "192.0.2.1", "transit-a", "64500"]);
        assert_eq!(samples[0].value, 1.0);

        assert_eq!(samples[2].descriptor.fq_name(), "mikrotik_bgp_updates_received");
        assert_eq!(samples[2].kind, ValueKind::Counter);

        assert_eq!(samples[3].label("session"), Some("transit-b"));
        assert_eq!(samples[3].value, 0.0);
    }
}
