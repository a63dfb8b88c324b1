use std::sync::Arc;

use super::collector::RouterOsCollector;
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::description;
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::parse_float;

const PROPS: [&str; 6] = ["instance", "router-id", "address", "interface", "state", "state-changes"];

/// OSPF adjacencies. The neighbor state travels as a label; the only
/// value is the state change counter.
pub struct OspfNeighborCollector {
    state_changes_desc: Arc<Descriptor>,
}

impl OspfNeighborCollector {
    pub fn new() -> Self {
        Self {
            state_changes_desc: description(
                "ospf_neighbor",
                "state_changes",
                "number of OSPF neighbor state changes",
                &["instance", "router_id", "neighbor_address", "interface", "state"],
            ),
        }
    }

    fn collect_for_neighbor(&self, re: &Record, ctx: &CollectorContext<'_>) {
        let router_id = re.value("router-id");
        let labels = ctx.labels(&[
            re.value("instance"),
            router_id,
            re.value("address"),
            re.value("interface"),
            re.value("state"),
        ]);

        let Some(raw) = re.get("state-changes").filter(|v| !v.is_empty()) else {
            return;
        };

        match parse_float(raw) {
            Ok(v) => ctx.emit(&self.state_changes_desc, ValueKind::Counter, v, labels),
            Err(e) => ctx.skip_field(router_id, "state-changes", raw, &e),
        }
    }
}

impl Default for OspfNeighborCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for OspfNeighborCollector {
    fn name(&self) -> &'static str {
        "ospf-neighbor"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(std::iter::once(&self.state_changes_desc))
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let reply = ctx
            .run("/routing/ospf/neighbor/print", &[proplist(&PROPS)])
            .await?;

        for re in &reply.re {
            self.collect_for_neighbor(re, ctx);
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
    async fn neighbor_state_is_a_label() {
        let device = Device {
            name: "core".into(),
            address: "10.1.1.1".into(),
            user: "u".into(),
            password: "p".into(),
            port: None,
        };
        let mut session = FakeSession::new().with_records(
            "/routing/ospf/neighbor/print",
            vec![
                Record::from_iter([
                    ("instance", "default"),
                    ("router-id", "10.255.0.2"),
                    ("address", "10.0.12.2"),
                    ("interface", "ether3"),
                    ("state", "Full"),
                    ("state-changes", "6"),
                ]),
                Record::from_iter([("router-id", "10.255.0.3"), ("state-changes", "many")]),
            ],
        );
        let sink = SampleBuffer::new();

        let mut ctx = CollectorContext::new(&sink, &device, &mut session);
        OspfNeighborCollector::new().collect(&mut ctx).await.unwrap();

        let samples = sink.drain();
        assert_eq!(samples.len(), 1);
        assert_eq!(
            samples[0].label_values,
            ["core", "10.1.1.1", "default", "10.255.0.2", "10.0.12.2", "ether3", "Full"]
        );
        assert_eq!(samples[0].value, 6.0);
        assert_eq!(samples[0].kind, ValueKind::Counter);
    }
}
