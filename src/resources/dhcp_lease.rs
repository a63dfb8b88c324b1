use std::sync::Arc;

use super::collector::RouterOsCollector;
use crate::collector::context::CollectorContext;
use crate::collector::descriptor::description;
use crate::routeros::proplist;
use crate::schema::{Descriptor, Record, ValueKind};
use crate::util::parse_duration;

const PROPS: [&str; 5] = ["active-mac-address", "status", "expires-after", "active-address", "host-name"];

const LABELS: [&str; 5] = ["active_mac_address", "status", "expires_after", "active_address", "hostname"];

/// One info sample (value 1) per DHCP lease, attributes as labels.
///
/// `expires_after` is rendered as whole seconds so the label stays
/// comparable across RouterOS duration spellings.
pub struct DhcpLeaseCollector {
    description: Arc<Descriptor>,
}

impl DhcpLeaseCollector {
    pub fn new() -> Self {
        Self {
            description: description("dhcp", "leases_info", "DHCP lease info", &LABELS),
        }
    }

    fn collect_metric(&self, ctx: &CollectorContext<'_>, re: &Record) {
        let raw = re.value("expires-after");
        let expires = match parse_duration(raw) {
            Ok(secs) => secs,
            Err(e) => {
                ctx.skip_field(re.value("active-address"), "expires-after", raw, &e);
                return;
            }
        };
        let expires = format!("{expires:.0}");

        let labels = ctx.labels(&[
            re.value("active-mac-address"),
            re.value("status"),
            expires.as_str(),
            re.value("active-address"),
            re.value("host-name"),
        ]);

        ctx.emit(&self.description, ValueKind::Gauge, 1.0, labels);
    }
}

impl Default for DhcpLeaseCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RouterOsCollector for DhcpLeaseCollector {
    fn name(&self) -> &'static str {
        "dhcp-leases"
    }

    fn describe(&self) -> Box<dyn Iterator<Item = &Arc<Descriptor>> + '_> {
        Box::new(std::iter::once(&self.description))
    }

    async fn collect(&self, ctx: &mut CollectorContext<'_>) -> anyhow::Result<()> {
        let leases = ctx
            .run("/ip/dhcp-server/lease/print", &[proplist(&PROPS)])
            .await?;

        for re in &leases.re {
            self.collect_metric(ctx, re);
        }

        Ok(())
    }
}
