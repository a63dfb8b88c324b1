use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use log::{debug, error, info};

use super::context::CollectorContext;
use super::descriptor::{NAMESPACE, build_fq_name};
use super::sink::{MetricSink, SampleBuffer};
use crate::config::{Config, Device};
use crate::metrics::METRICS;
use crate::resources::collector::RouterOsCollector;
use crate::resources::collectors_for;
use crate::routeros::{Client, DeviceSession};
use crate::schema::{Descriptor, Sample, ValueKind};

/// Runs every enabled collector against every configured device.
///
/// DESIGN:
/// - One poll cycle per scrape, no background polling
/// - Devices are polled concurrently, one session each
/// - Collectors run sequentially on a device session
/// - Failures are isolated per (device, collector)
///
/// Each (device, collector) pair reports its own duration and
/// success next to the samples it produced.
pub struct Dispatcher {
    devices: Vec<Device>,
    collectors: Vec<Arc<dyn RouterOsCollector>>,
    timeout: Duration,
    duration_desc: Arc<Descriptor>,
    success_desc: Arc<Descriptor>,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Self {
        Self::with_collectors(
            config.devices.clone(),
            collectors_for(&config.features),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_collectors(
        devices: Vec<Device>,
        collectors: Vec<Arc<dyn RouterOsCollector>>,
        timeout: Duration,
    ) -> Self {
        Self {
            devices,
            collectors,
            timeout,
            duration_desc: scrape_description(
                "duration_seconds",
                "mikrotik_exporter: duration of a collector scrape",
            ),
            success_desc: scrape_description(
                "success",
                "mikrotik_exporter: whether a collector succeeded",
            ),
        }
    }

    pub fn collectors(&self) -> &[Arc<dyn RouterOsCollector>] {
        &self.collectors
    }

    /// Every descriptor the dispatcher and its collectors can emit.
    pub fn describe(&self) -> impl Iterator<Item = &Arc<Descriptor>> {
        [&self.duration_desc, &self.success_desc]
            .into_iter()
            .chain(self.collectors.iter().flat_map(|c| c.describe()))
    }

    /// Connects to every device and polls them concurrently.
    ///
    /// Never fails: unreachable devices are logged and reported as
    /// failed collectors.
    pub async fn poll_all(&self, sink: &dyn MetricSink) {
        join_all(self.devices.iter().map(|device| self.connect_and_poll(device, sink))).await;
    }

    async fn connect_and_poll(&self, device: &Device, sink: &dyn MetricSink) {
        METRICS.device_polls.fetch_add(1, Ordering::Relaxed);

        let mut client = match Client::connect(device, self.timeout).await {
            Ok(client) => client,
            Err(e) => {
                METRICS.device_connect_errors.fetch_add(1, Ordering::Relaxed);
                error!(
                    "error connecting to device device={} address={} error={}",
                    device.name,
                    device.api_address(),
                    e
                );

                for collector in &self.collectors {
                    self.emit_scrape(sink, &self.success_desc, 0.0, device, collector.name());
                }
                return;
            }
        };

        self.poll_device(device, &mut client, sink).await;
    }

    /// Runs every collector once against an open session.
    ///
    /// A failing collector is logged and counted and its partial
    /// samples are discarded; the remaining collectors still run on
    /// the same session.
    pub async fn poll_device(&self, device: &Device, session: &mut dyn DeviceSession, sink: &dyn MetricSink) {
        for collector in &self.collectors {
            let started = Instant::now();

            // Samples reach the sink only once the whole collection succeeded
            let staged = SampleBuffer::new();
            let result = {
                let mut ctx = CollectorContext::new(&staged, device, &mut *session);
                collector.collect(&mut ctx).await
            };

            let elapsed = started.elapsed().as_secs_f64();
            let success = match result {
                Ok(()) => {
                    let samples = staged.drain();
                    debug!(
                        "collector finished device={} collector={} samples={} duration={:.3}s",
                        device.name,
                        collector.name(),
                        samples.len(),
                        elapsed
                    );
                    for sample in samples {
                        sink.emit(sample);
                    }
                    1.0
                }
                Err(e) => {
                    METRICS.collector_errors.fetch_add(1, Ordering::Relaxed);
                    error!(
                        "collector failed device={} collector={} discarded={} error={:#}",
                        device.name,
                        collector.name(),
                        staged.len(),
                        e
                    );
                    0.0
                }
            };

            self.emit_scrape(sink, &self.duration_desc, elapsed, device, collector.name());
            self.emit_scrape(sink, &self.success_desc, success, device, collector.name());
        }
    }

    fn emit_scrape(&self, sink: &dyn MetricSink, desc: &Arc<Descriptor>, value: f64, device: &Device, collector: &str) {
        let labels = vec![device.name.clone(), collector.to_string()];

        match Sample::new(desc.clone(), ValueKind::Gauge, value, labels) {
            Ok(sample) => sink.emit(sample),
            Err(e) => error!("dropping scrape sample error={e}"),
        }
    }
}

/// Scrape metrics are labeled by device and collector name, not by
/// the device labels collectors use.
fn scrape_description(name: &str, help: &str) -> Arc<Descriptor> {
    Arc::new(Descriptor::new(
        build_fq_name(NAMESPACE, "scrape", &format!("collector_{name}")),
        help,
        vec!["device".to_string(), "collector".to_string()],
    ))
}

/// Logs the configured inventory once at startup.
pub fn log_inventory(dispatcher: &Dispatcher, config: &Config) {
    let names: Vec<&str> = dispatcher.collectors().iter().map(|c| c.name()).collect();
    info!(
        "exporter configured devices={} collectors={}",
        config.devices.len(),
        names.join(",")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::get_collector;
    use crate::routeros::FakeSession;
    use crate::schema::Record;

    fn device() -> Device {
        Device {
            name: "r1".into(),
            address: "10.0.0.1".into(),
            user: "u".into(),
            password: "p".into(),
            port: None,
        }
    }

    fn dispatcher(names: &[&str]) -> Dispatcher {
        Dispatcher::with_collectors(
            vec![device()],
            names.iter().filter_map(|n| get_collector(n)).collect(),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn failing_collector_does_not_stop_the_others() {
        let dispatcher = dispatcher(&["bgp", "resource"]);
        let mut session = FakeSession::new()
            .with_trap("/routing/bgp/peer/print", "no such command prefix")
            .with_records(
                "/system/resource/print",
                vec![Record::from_iter([("free-memory", "1024"), ("version", "7.14")])],
            );
        let sink = SampleBuffer::new();

        dispatcher.poll_device(&device(), &mut session, &sink).await;

        let samples = sink.drain();
        let success: Vec<(Option<&str>, f64)> = samples
            .iter()
            .filter(|s| s.descriptor.fq_name() == "mikrotik_scrape_collector_success")
            .map(|s| (s.label("collector"), s.value))
            .collect();
        assert_eq!(success, [(Some("bgp"), 0.0), (Some("resource"), 1.0)]);

        assert!(
            samples
                .iter()
                .any(|s| s.descriptor.fq_name() == "mikrotik_system_free_memory" && s.value == 1024.0)
        );
    }

    #[tokio::test]
    async fn partial_samples_of_a_failed_collector_are_discarded() {
        let dispatcher = dispatcher(&["pool"]);
        let mut session = FakeSession::new()
            .with_records(
                "/ip/pool/print",
                vec![Record::from_iter([("name", "lan")]), Record::from_iter([("name", "guest")])],
            )
            .with_filtered_reply("/ip/pool/used/print", "?pool=lan", crate::schema::Reply::count("5"));
        let sink = SampleBuffer::new();

        dispatcher.poll_device(&device(), &mut session, &sink).await;

        let samples = sink.drain();
        assert!(samples.iter().all(|s| s.descriptor.fq_name().starts_with("mikrotik_scrape_")));
        let success = samples
            .iter()
            .find(|s| s.descriptor.fq_name() == "mikrotik_scrape_collector_success")
            .unwrap();
        assert_eq!(success.value, 0.0);
    }

    #[tokio::test]
    async fn unreachable_device_reports_every_collector_failed() {
        let mut unreachable = device();
        unreachable.address = "127.0.0.1".into();
        // port 1 is never an API listener in the test environment
        unreachable.port = Some(1);

        let dispatcher = Dispatcher::with_collectors(
            vec![unreachable],
            ["interfaces", "resource"].iter().filter_map(|n| get_collector(n)).collect(),
            Duration::from_millis(500),
        );
        let sink = SampleBuffer::new();

        dispatcher.poll_all(&sink).await;

        let samples = sink.drain();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.value == 0.0));
        assert!(samples.iter().all(|s| s.label("device") == Some("r1")));
    }

    #[test]
    fn describe_includes_scrape_and_collector_descriptors() {
        let dispatcher = dispatcher(&["ospf-neighbor"]);
        let names: Vec<&str> = dispatcher.describe().map(|d| d.fq_name()).collect();

        assert_eq!(
            names,
            [
                "mikrotik_scrape_collector_duration_seconds",
                "mikrotik_scrape_collector_success",
                "mikrotik_ospf_neighbor_state_changes",
            ]
        );
    }
}
