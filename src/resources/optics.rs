use std::sync::Arc;

use super::collector::RouterOsCollector;
use super::monitor::fetch_ethernet_names;
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::{DescriptorSet, description};
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::{ParseError, parse_bool, parse_float};

const PROPS: [&str; 8] = [
    "name",
    "sfp-rx-loss",
    "sfp-tx-fault",
    "sfp-temperature",
    "sfp-supply-voltage",
    "sfp-tx-bias-current",
    "sfp-tx-power",
    "sfp-rx-power",
];

/// SFP module diagnostics (DDM) for ethernet ports named `sfp*`.
pub struct OpticsCollector {
    descriptions: DescriptorSet,
}

impl OpticsCollector {
    pub fn new() -> Self {
        let mut descriptions = DescriptorSet::new();
        for p in &PROPS[1..] {
            let leaf = p.trim_start_matches("sfp-").replace('-', "_");
            descriptions.insert(p, description("optics", &leaf, p, &["interface"]));
        }

        Self { descriptions }
    }

    fn collect_for_port(&self, re: &Record, ctx: &CollectorContext<'_>) {
        let name = re.value("name");
        let labels = ctx.labels(&[name]);

        for p in &PROPS[1..] {
            ctx.emit_property(&self.descriptions, name, p, re.get(p), ValueKind::Gauge, &labels, |raw| {
                parse_optics_value(p, raw)
            });
        }
    }
}

impl Default for OpticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_optics_value(property: &str, value: &str) -> Result<f64, ParseError> {
    match property {
        "sfp-rx-loss" | "sfp-tx-fault" => Ok(parse_bool(value)),
        _ => parse_float(value),
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for OpticsCollector {
    fn name(&self) -> &'static str {
        "optics"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(self.descriptions.iter())
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let ports: Vec<String> = fetch_ethernet_names(ctx)
            .await?
            .into_iter()
            .filter(|n| n.starts_with("sfp"))
            .collect();
        if ports.is_empty() {
            return Ok(());
        }

        let reply = ctx
            .run(
                "/interface/ethernet/monitor",
                &[format!("=numbers={}", ports.join(",")), "=once=".to_string(), proplist(&PROPS)],
            )
            .await?;

        for re in &reply.re {
            self.collect_for_port(re, ctx);
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

    fn device() -> Device {
        Device {
            name: "r1".into(),
            address: "10.0.0.1".into(),
            user: "u".into(),
            password: "p".into(),
            port: None,
        }
    }

    #[tokio::test]
    async fn only_sfp_ports_are_monitored() {
        let device = device();
        let mut session = FakeSession::new()
            .with_records(
                "/interface/ethernet/print",
                vec![
                    Record::from_iter([("name", "ether1")]),
                    Record::from_iter([("name", "sfp-sfpplus1")]),
                ],
            )
            .with_records(
                "/interface/ethernet/monitor",
                vec![Record::from_iter([
                    ("name", "sfp-sfpplus1"),
                    ("sfp-rx-loss", "false"),
                    ("sfp-temperature", "41"),
                    ("sfp-rx-power", "-7.32"),
                ])],
            );
        let sink = SampleBuffer::new();

        let mut ctx = CollectorContext::new(&sink, &device, &mut session);
        OpticsCollector::new().collect(&mut ctx).await.unwrap();

        let samples = sink.drain();
        let names: Vec<&str> = samples.iter().map(|s| s.descriptor.fq_name()).collect();
        assert_eq!(
            names,
            ["mikrotik_optics_rx_loss", "mikrotik_optics_temperature", "mikrotik_optics_rx_power"]
        );
        assert_eq!(samples[2].value, -7.32);

        let (_, params) = &session.requests()[1];
        assert_eq!(params[0], "=numbers=sfp-sfpplus1");
    }

    #[tokio::test]
    async fn no_sfp_ports_skips_monitor_call() {
        let device = device();
        let mut session = FakeSession::new().with_records(
            "/interface/ethernet/print",
            vec![Record::from_iter([("name", "ether1")])],
        );
        let sink = SampleBuffer::new();

        let mut ctx = CollectorContext::new(&sink, &device, &mut session);
        OpticsCollector::new().collect(&mut ctx).await.unwrap();

        assert!(sink.is_empty());
        assert_eq!(session.requests().len(), 1);
    }
}
