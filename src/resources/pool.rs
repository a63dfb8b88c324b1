use std::sync::Arc;

use super::collector::{IpVersion, RouterOsCollector, count_from_reply, record_names};
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::description;
use crate::routeros::proplist;
use crate::schema::{Descriptor, ValueKind};

/// Used address / prefix count per IP pool, for one IP version.
pub struct PoolCollector {
    version: IpVersion,
    used_count_desc: Arc<Descriptor>,
}

impl PoolCollector {
    pub fn new(version: IpVersion) -> Self {
        Self {
            version,
            used_count_desc: description(
                "ip_pool",
                &format!("{}_used_count", version.metric_prefix()),
                &format!("number of used IP/prefixes in a {} pool", version.label()),
                &["pool"],
            ),
        }
    }

    async fn fetch_pool_names(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<Vec<String>> {
        let reply = ctx
            .run(
                &format!("/{}/pool/print", self.version.topic()),
                &[proplist(&["name"])],
            )
            .await?;

        Ok(record_names(&reply))
    }

    async fn collect_for_pool(&self, pool: &str, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let reply = ctx
            .run(
                &format!("/{}/pool/used/print", self.version.topic()),
                &[format!("?pool={pool}"), "=count-only=".to_string()],
            )
            .await?;

        let v = count_from_reply(&reply)?;
        let labels = ctx.labels(&[pool]);
        ctx.emit(&self.used_count_desc, ValueKind::Gauge, v, labels);

        Ok(())
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for PoolCollector {
    fn name(&self) -> &'static str {
        match self.version {
            IpVersion::V4 => "pool",
            IpVersion::V6 => "poolv6",
        }
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(std::iter::once(&self.used_count_desc))
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let names = self.fetch_pool_names(ctx).await?;

        for name in &names {
            self.collect_for_pool(name, ctx).await?;
        }

        Ok(())
    }
}
