use std::sync::Arc;

use super::collector::{IpVersion, RouterOsCollector, count_from_reply};
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::description;
use crate::schema::{Descriptor, ValueKind};

const PROTOCOLS: [&str; 5] = ["bgp", "static", "ospf", "dynamic", "connect"];

/// Route counts in the RIB, total and per protocol, for one IP version.
///
/// Every number is a `=count-only=` query; no route records are
/// transferred.
pub struct RoutesCollector {
    version: IpVersion,
    count_desc: Arc<Descriptor>,
    count_protocol_desc: Arc<Descriptor>,
}

impl RoutesCollector {
    pub fn new(version: IpVersion) -> Self {
        let prefix = version.metric_prefix();

        Self {
            version,
            count_desc: description(
                "routes",
                &format!("{prefix}_total_count"),
                &format!("number of {} routes in RIB", version.label()),
                &[],
            ),
            count_protocol_desc: description(
                "routes",
                &format!("{prefix}_protocol_count"),
                &format!("number of {} routes per protocol in RIB", version.label()),
                &["protocol"],
            ),
        }
    }

    fn command(&self) -> String {
        format!("/{}/route/print", self.version.topic())
    }

    async fn collect_count(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let reply = ctx
            .run(
                &self.command(),
                &["?disabled=false".to_string(), "=count-only=".to_string()],
            )
            .await?;

        let v = count_from_reply(&reply)?;
        let labels = ctx.labels(&[]);
        ctx.emit(&self.count_desc, ValueKind::Gauge, v, labels);

        Ok(())
    }

    async fn collect_count_protocol(&self, protocol: &str, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let reply = ctx
            .run(
                &self.command(),
                &[
                    "?disabled=false".to_string(),
                    format!("?{protocol}"),
                    "=count-only=".to_string(),
                ],
            )
            .await?;

        let v = count_from_reply(&reply)?;
        let labels = ctx.labels(&[protocol]);
        ctx.emit(&self.count_protocol_desc, ValueKind::Gauge, v, labels);

        Ok(())
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for RoutesCollector {
    fn name(&self) -> &'static str {
        match self.version {
            IpVersion::V4 => "routes",
            IpVersion::V6 => "routesv6",
        }
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new([&self.count_desc, &self.count_protocol_desc].into_iter())
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        self.collect_count(ctx).await?;

        for protocol in PROTOCOLS {
            self.collect_count_protocol(protocol, ctx).await?;
        }

        Ok(())
    }
}
