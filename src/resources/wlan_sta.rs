use std::sync::Arc;

use super::collector::RouterOsCollector;
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::{DescriptorSet, description};
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::{ParseError, parse_float, parse_wireless_rate, split_string_to_floats};

const PROPS: [&str; 9] = [
    "interface",
    "mac-address",
    "signal-to-noise",
    "signal-strength",
    "tx-rate",
    "rx-rate",
    "packets",
    "bytes",
    "frames",
];

const GAUGES: [&str; 4] = ["signal-to-noise", "signal-strength", "tx-rate", "rx-rate"];

/// Comma-packed "tx,rx" counters
const PAIRS: [&str; 3] = ["packets", "bytes", "frames"];

const SUBSYSTEM: &str = "wlan_station";
const LABELS: [&str; 2] = ["interface", "mac_address"];

/// Wireless registration table: one set of samples per associated client.
pub struct WlanStaCollector {
    descriptions: DescriptorSet,
}

impl WlanStaCollector {
    pub fn new() -> Self {
        let mut descriptions = DescriptorSet::for_properties(SUBSYSTEM, &GAUGES, &LABELS);
        for p in PAIRS {
            for dir in ["tx", "rx"] {
                let key = format!("{dir}_{p}");
                descriptions.insert(&key, description(SUBSYSTEM, &key, &format!("{p} ({dir})"), &LABELS));
            }
        }

        Self { descriptions }
    }

    fn collect_for_stat(&self, re: &Record, ctx: &CollectorContext<'_>) {
        let mac = re.value("mac-address");
        let labels = ctx.labels(&[re.value("interface"), mac]);

        for p in GAUGES {
            ctx.emit_property(&self.descriptions, mac, p, re.get(p), ValueKind::Gauge, &labels, |raw| {
                parse_gauge(p, raw)
            });
        }

        for p in PAIRS {
            self.collect_pair(p, mac, re, &labels, ctx);
        }
    }

    fn collect_pair(&self, property: &str, mac: &str, re: &Record, labels: &[String], ctx: &CollectorContext<'_>) {
        let Some(raw) = re.get(property).filter(|v| !v.is_empty()) else {
            return;
        };

        let (tx, rx) = match split_string_to_floats(raw) {
            Ok(pair) => pair,
            Err(e) => {
                ctx.skip_field(mac, property, raw, &e);
                return;
            }
        };

        for (dir, value) in [("tx", tx), ("rx", rx)] {
            if let Some(desc) = self.descriptions.get(&format!("{dir}_{property}")) {
                ctx.emit(desc, ValueKind::Counter, value, labels.to_vec());
            }
        }
    }
}

impl Default for WlanStaCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal values may carry a rate suffix ("-62@HT20-7"); only the
/// number before `@` is the measurement.
fn parse_gauge(property: &str, raw: &str) -> Result<f64, ParseError> {
    match property {
        "tx-rate" | "rx-rate" => parse_wireless_rate(raw),
        _ => parse_float(raw.split('@').next().unwrap_or(raw)),
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for WlanStaCollector {
    fn name(&self) -> &'static str {
        "wlan-stations"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(self.descriptions.iter())
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let stats = ctx
            .run("/interface/wireless/registration-table/print", &[proplist(&PROPS)])
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
    async fn splits_pairs_and_parses_rates() {
        let device = Device {
            name: "ap1".into(),
            address: "10.0.0.2".into(),
            user: "u".into(),
            password: "p".into(),
            port: None,
        };
        let mut session = FakeSession::new().with_records(
            "/interface/wireless/registration-table/print",
            vec![Record::from_iter([
                ("interface", "wlan1"),
                ("mac-address", "11:22:33:44:55:66"),
                ("signal-strength", "-62@HT20-7"),
                ("tx-rate", "433.3Mbps-80MHz/1S/SGI"),
                ("rx-rate", "bogus"),
                ("bytes", "1024,2048"),
                ("packets", "10,"),
            ])],
        );
        let sink = SampleBuffer::new();

        let mut ctx = CollectorContext::new(&sink, &device, &mut session);
        WlanStaCollector::new().collect(&mut ctx).await.unwrap();

        let samples = sink.drain();
        let value_of = |name: &str| {
            samples
                .iter()
                .find(|s| s.descriptor.fq_name() == name)
                .map(|s| s.value)
        };

        assert_eq!(value_of("mikrotik_wlan_station_signal_strength"), Some(-62.0));
        assert_eq!(value_of("mikrotik_wlan_station_tx_rate"), Some(433.3));
        assert_eq!(value_of("mikrotik_wlan_station_rx_rate"), None);
        assert_eq!(value_of("mikrotik_wlan_station_tx_bytes"), Some(1024.0));
        assert_eq!(value_of("mikrotik_wlan_station_rx_bytes"), Some(2048.0));
        assert_eq!(value_of("mikrotik_wlan_station_tx_packets"), None);
        assert_eq!(samples.len(), 4);
    }
}
