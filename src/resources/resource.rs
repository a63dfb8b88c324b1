use std::sync::Arc;

use super::collector::RouterOsCollector;
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::DescriptorSet;
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::{parse_duration, parse_float};

const PROPS: [&str; 8] = [
    "free-memory",
    "total-memory",
    "cpu-load",
    "free-hdd-space",
    "total-hdd-space",
    "uptime",
    "board-name",
    "version",
];

const GAUGES: [&str; 5] = [
    "free-memory",
    "total-memory",
    "cpu-load",
    "free-hdd-space",
    "total-hdd-space",
];

const COUNTERS: [&str; 1] = ["uptime"];

/// System resources: memory, CPU load, storage and uptime.
pub struct ResourceCollector {
    descriptions: DescriptorSet,
}

impl ResourceCollector {
    pub fn new() -> Self {
        Self {
            descriptions: DescriptorSet::for_properties("system", &PROPS[..6], &["boardname", "version"]),
        }
    }

    fn collect_for_stat(&self, re: &Record, ctx: &CollectorContext<'_>) {
        let labels = ctx.labels(&[re.value("board-name"), re.value("version")]);
        let id = ctx.device.name.as_str();

        for p in GAUGES {
            ctx.emit_property(&self.descriptions, id, p, re.get(p), ValueKind::Gauge, &labels, parse_float);
        }

        for p in COUNTERS {
            ctx.emit_property(&self.descriptions, id, p, re.get(p), ValueKind::Counter, &labels, parse_duration);
        }
    }
}

impl Default for ResourceCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for ResourceCollector {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(self.descriptions.iter())
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let stats = ctx.run("/system/resource/print", &[proplist(&PROPS)]).await?;

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
    async fn uptime_is_a_duration_counter() {
        let device = Device {
            name: "r1".into(),
            address: "10.0.0.1".into(),
            user: "u".into(),
            password: "p".into(),
            port: None,
        };
        let mut session = FakeSession::new().with_records(
            "/system/resource/print",
            vec![Record::from_iter([
                ("free-memory", "1000"),
                ("cpu-load", "7"),
                ("uptime", "1d2h"),
                ("board-name", "RB4011"),
                ("version", "6.48.6"),
            ])],
        );
        let sink = SampleBuffer::new();

        let mut ctx = CollectorContext::new(&sink, &device, &mut session);
        ResourceCollector::new().collect(&mut ctx).await.unwrap();

        let samples = sink.drain();
        assert_eq!(samples.len(), 3);

        let uptime = samples
            .iter()
            .find(|s| s.descriptor.fq_name() == "mikrotik_system_uptime")
            .unwrap();
        assert_eq!(uptime.value, 93_600.0);
        assert_eq!(uptime.kind, ValueKind::Counter);
        assert_eq!(uptime.label("boardname"), Some("RB4011"));
        assert_eq!(uptime.label("version"), Some("6.48.6"));
    }
}
