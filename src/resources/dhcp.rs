use std::sync::Arc;

use super::collector::{RouterOsCollector, count_from_reply, record_names};
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::description;
use crate::routeros::proplist;
use crate::schema::{Descriptor, ValueKind};

/// Active lease count per DHCP server.
///
/// Server names are discovered first, then each server is asked for
/// a count-only lease listing.
pub struct DhcpCollector {
    leases_active_count_desc: Arc<Descriptor>,
}

impl DhcpCollector {
    pub fn new() -> Self {
        Self {
            leases_active_count_desc: description(
                "dhcp",
                "leases_active_count",
                "number of active leases per DHCP server",
                &["server"],
            ),
        }
    }

    async fn collect_for_server(&self, server: &str, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let reply = ctx
            .run(
                "/ip/dhcp-server/lease/print",
                &["=count-only=".to_string(), format!("?server={server}")],
            )
            .await?;

        let v = count_from_reply(&reply)?;
        let labels = ctx.labels(&[server]);
        ctx.emit(&self.leases_active_count_desc, ValueKind::Gauge, v, labels);

        Ok(())
    }
}

impl Default for DhcpCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for DhcpCollector {
    fn name(&self) -> &'static str {
        "dhcp"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(std::iter::once(&self.leases_active_count_desc))
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let servers = ctx.run("/ip/dhcp-server/print", &[proplist(&["name"])]).await?;

        for server in record_names(&servers) {
            self.collect_for_server(&server, ctx).await?;
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
    use crate::schema::{Record, Reply};

    #[tokio::test]
    async fn counts_leases_per_server() {
        let device = Device {
            name: "r1".into(),
            address: "10.0.0.1".into(),
            user: "u".into(),
            password: "p".into(),
            port: None,
        };
        let mut session = FakeSession::new()
            .with_records(
                "/ip/dhcp-server/print",
                vec![Record::from_iter([("name", "lan")]), Record::from_iter([("name", "guest")])],
            )
            .with_filtered_reply("/ip/dhcp-server/lease/print", "?server=lan", Reply::count("17"))
            .with_filtered_reply("/ip/dhcp-server/lease/print", "?server=guest", Reply::count("3"));
        let sink = SampleBuffer::new();

        let mut ctx = CollectorContext::new(&sink, &device, &mut session);
        DhcpCollector::new().collect(&mut ctx).await.unwrap();

        let samples = sink.drain();
        let counts: Vec<_> = samples
            .iter()
            .map(|s| (s.label("server").unwrap().to_string(), s.value))
            .collect();
        assert_eq!(counts, vec![("lan".to_string(), 17.0), ("guest".to_string(), 3.0)]);
    }
}
