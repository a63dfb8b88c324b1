use std::sync::Arc;

use super::collector::{RouterOsCollector, count_from_reply, record_names};
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::description;
use crate::routeros::proplist;
use crate::schema::{Descriptor, ValueKind};

/// Binding count per DHCPv6 server.
pub struct Dhcpv6Collector {
    binding_count_desc: Arc<Descriptor>,
}

impl Dhcpv6Collector {
    pub fn new() -> Self {
        Self {
            binding_count_desc: description(
                "dhcpv6",
                "binding_count",
                "number of active bindings per DHCPv6 server",
                &["server"],
            ),
        }
    }
}

impl Default for Dhcpv6Collector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for Dhcpv6Collector {
    fn name(&self) -> &'static str {
        "dhcpv6"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(std::iter::once(&self.binding_count_desc))
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let servers = ctx.run("/ipv6/dhcp-server/print", &[proplist(&["name"])]).await?;

        for server in record_names(&servers) {
            let reply = ctx
                .run(
                    "/ipv6/dhcp-server/binding/print",
                    &["=count-only=".to_string(), format!("?server={server}")],
                )
                .await?;

            let v = count_from_reply(&reply)?;
            let labels = ctx.labels(&[server.as_str()]);
            ctx.emit(&self.binding_count_desc, ValueKind::Gauge, v, labels);
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
    async fn counts_bindings_per_server() {
        let mut session = FakeSession::new()
            .with_records(
                "/ipv6/dhcp-server/print",
                vec![Record::from_iter([("name", "pd-lan")]), Record::from_iter([("name", "pd-dmz")])],
            )
            .with_filtered_reply("/ipv6/dhcp-server/binding/print", "?server=pd-lan", Reply::count("4"))
            .with_filtered_reply("/ipv6/dhcp-server/binding/print", "?server=pd-dmz", Reply::count("0"));
        let sink = SampleBuffer::new();

        let dev = device();
        let mut ctx = CollectorContext::new(&sink, &dev, &mut session);
        Dhcpv6Collector::new().collect(&mut ctx).await.unwrap();

        let samples = sink.drain();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].descriptor.fq_name(), "mikrotik_dhcpv6_binding_count");
        assert_eq!(samples[0].label("server"), Some("pd-lan"));
        assert_eq!(samples[0].value, 4.0);
        assert_eq!(samples[1].label("server"), Some("pd-dmz"));
        assert_eq!(samples[1].value, 0.0);

        let (command, params) = &session.requests()[1];
        assert_eq!(command, "/ipv6/dhcp-server/binding/print");
        assert_eq!(params, &["=count-only=".to_string(), "?server=pd-lan".to_string()]);
    }

    #[tokio::test]
    async fn no_servers_emit_nothing() {
        let mut session = FakeSession::new().with_records("/ipv6/dhcp-server/print", vec![]);
        let sink = SampleBuffer::new();

        let dev = device();
        let mut ctx = CollectorContext::new(&sink, &dev, &mut session);
        Dhcpv6Collector::new().collect(&mut ctx).await.unwrap();

        assert!(sink.drain().is_empty());
    }
}
