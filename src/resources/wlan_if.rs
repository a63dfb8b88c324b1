use std::sync::Arc;

use super::collector::{RouterOsCollector, record_names};
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::DescriptorSet;
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::parse_float;

const PROPS: [&str; 4] = ["channel", "registered-clients", "noise-floor", "overall-tx-ccq"];

/// Wireless interface monitor values, one monitor call per enabled interface.
pub struct WlanIfCollector {
    descriptions: DescriptorSet,
}

impl WlanIfCollector {
    pub fn new() -> Self {
        Self {
            descriptions: DescriptorSet::for_properties("wlan_interface", &PROPS[1..], &["interface", "channel"]),
        }
    }

    async fn fetch_interface_names(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<Vec<String>> {
        let reply = ctx
            .run(
                "/interface/wireless/print",
                &["?disabled=false".to_string(), proplist(&["name"])],
            )
            .await?;

        Ok(record_names(&reply))
    }

    async fn collect_for_interface(&self, iface: &str, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let reply = ctx
            .run(
                "/interface/wireless/monitor",
                &[format!("=numbers={iface}"), "=once=".to_string(), proplist(&PROPS)],
            )
            .await?;

        for re in &reply.re {
            self.collect_metrics_for_interface(iface, re, ctx);
        }

        Ok(())
    }

    fn collect_metrics_for_interface(&self, iface: &str, re: &Record, ctx: &CollectorContext<'_>) {
        let labels = ctx.labels(&[iface, re.value("channel")]);

        for p in &PROPS[1..] {
            ctx.emit_property(&self.descriptions, iface, p, re.get(p), ValueKind::Gauge, &labels, parse_float);
        }
    }
}

impl Default for WlanIfCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for WlanIfCollector {
    fn name(&self) -> &'static str {
        "wlan-interfaces"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(self.descriptions.iter())
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let names = self.fetch_interface_names(ctx).await?;

        for iface in &names {
            self.collect_for_interface(iface, ctx).await?;
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
    async fn monitors_each_interface_once() {
        let device = Device {
            name: "ap1".into(),
            address: "10.0.0.2".into(),
            user: "u".into(),
            password: "p".into(),
            port: None,
        };
        let mut session = FakeSession::new()
            .with_records(
                "/interface/wireless/print",
                vec![Record::from_iter([("name", "wlan1")]), Record::from_iter([("name", "wlan2")])],
            )
            .with_filtered_reply(
                "/interface/wireless/monitor",
                "=numbers=wlan1",
                crate::schema::Reply::new(vec![Record::from_iter([
                    ("channel", "5180/20-Ceee/ac"),
                    ("registered-clients", "12"),
                    ("noise-floor", "-105"),
                    ("overall-tx-ccq", "87"),
                ])]),
            )
            .with_records("/interface/wireless/monitor", vec![]);
        let sink = SampleBuffer::new();

        let mut ctx = CollectorContext::new(&sink, &device, &mut session);
        WlanIfCollector::new().collect(&mut ctx).await.unwrap();

        let samples = sink.drain();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| s.label("channel") == Some("5180/20-Ceee/ac")));
        assert!(samples.iter().all(|s| s.label("interface") == Some("wlan1")));

        let monitor_calls = session
            .requests()
            .iter()
            .filter(|(c, _)| c == "/interface/wireless/monitor")
            .count();
        assert_eq!(monitor_calls, 2);
    }
}
