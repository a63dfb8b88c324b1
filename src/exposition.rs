//! Prometheus exposition through `prometheus-client`.
//!
//! Every scrape builds a short-lived registry holding two collectors:
//! the samples gathered from devices and a snapshot of the exporter's
//! own counters. Samples sharing a metric name become one family, in
//! first-seen order.
//!
//! The text encoder appends `_total` to counter families.

use std::fmt::Write;

use prometheus_client::collector::Collector;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{DescriptorEncoder, EncodeLabelValue, EncodeMetric, LabelValueEncoder};
use prometheus_client::metrics::MetricType;
use prometheus_client::metrics::counter::ConstCounter;
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::registry::Registry;

use crate::metrics::RuntimeMetrics;
use crate::schema::{Sample, ValueKind};

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Prefix of the exporter's own counters.
const SELF_PREFIX: &str = "mikrotik_exporter";

/// Encodes `samples` followed by the exporter's own counters.
pub fn render(samples: &[Sample], runtime: &RuntimeMetrics) -> Result<String, std::fmt::Error> {
    let mut registry = Registry::default();
    registry.register_collector(Box::new(SampleFamilies::from_samples(samples)));
    registry.register_collector(Box::new(RuntimeSnapshot::capture(runtime)));

    let mut out = String::new();
    encode(&mut out, &registry)?;
    Ok(out)
}

/// Encodes samples only.
pub fn encode_samples(samples: &[Sample]) -> Result<String, std::fmt::Error> {
    let mut registry = Registry::default();
    registry.register_collector(Box::new(SampleFamilies::from_samples(samples)));

    let mut out = String::new();
    encode(&mut out, &registry)?;
    Ok(out)
}

fn metric_type(kind: ValueKind) -> MetricType {
    match kind {
        ValueKind::Gauge => MetricType::Gauge,
        ValueKind::Counter => MetricType::Counter,
    }
}

// ------------------------------------------------------------
// Device samples
// ------------------------------------------------------------

#[derive(Debug)]
struct Family {
    name: String,
    help: String,
    kind: ValueKind,
    points: Vec<(Vec<(String, DeviceString)>, f64)>,
}

/// Samples of one scrape, grouped into metric families.
#[derive(Debug)]
struct SampleFamilies {
    families: Vec<Family>,
}

impl SampleFamilies {
    fn from_samples(samples: &[Sample]) -> Self {
        let mut families: Vec<Family> = Vec::new();

        for sample in samples {
            let name = sample.descriptor.fq_name();
            let labels = sample
                .labels()
                .map(|(k, v)| (k.to_string(), DeviceString(v.to_string())))
                .collect();

            match families.iter_mut().find(|f| f.name == name) {
                Some(family) => family.points.push((labels, sample.value)),
                None => families.push(Family {
                    name: name.to_string(),
                    help: sample.descriptor.help().to_string(),
                    kind: sample.kind,
                    points: vec![(labels, sample.value)],
                }),
            }
        }

        Self { families }
    }
}

impl Collector for SampleFamilies {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        for family in &self.families {
            let mut metric_encoder =
                encoder.encode_descriptor(&family.name, &family.help, None, metric_type(family.kind))?;

            for (labels, value) in &family.points {
                let point_encoder = metric_encoder.encode_family(labels)?;
                match family.kind {
                    ValueKind::Gauge => ConstGauge::new(*value).encode(point_encoder)?,
                    ValueKind::Counter => ConstCounter::new(*value).encode(point_encoder)?,
                }
            }
        }

        Ok(())
    }
}

/// Label value copied from a device reply.
///
/// Comments and host names may carry quotes, backslashes and line
/// breaks; they are escaped as the text format requires.
#[derive(Debug, Clone)]
struct DeviceString(String);

impl EncodeLabelValue for DeviceString {
    fn encode(&self, encoder: &mut LabelValueEncoder) -> Result<(), std::fmt::Error> {
        for c in self.0.chars() {
            match c {
                '\\' => encoder.write_str("\\\\")?,
                '"' => encoder.write_str("\\\"")?,
                '\n' => encoder.write_str("\\n")?,
                c => encoder.write_char(c)?,
            }
        }
        Ok(())
    }
}

// ------------------------------------------------------------
// Exporter counters
// ------------------------------------------------------------

#[derive(Debug)]
struct RuntimeSnapshot {
    counters: Vec<(&'static str, &'static str, u64)>,
}

impl RuntimeSnapshot {
    fn capture(runtime: &RuntimeMetrics) -> Self {
        Self {
            counters: runtime
                .snapshot()
                .into_iter()
                .map(|(name, help, value)| (name, help, value as u64))
                .collect(),
        }
    }
}

impl Collector for RuntimeSnapshot {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        for (name, help, value) in &self.counters {
            let counter = ConstCounter::new(*value);
            let fq_name = format!("{SELF_PREFIX}_{name}");
            let metric_encoder = encoder.encode_descriptor(&fq_name, help, None, counter.metric_type())?;
            counter.encode(metric_encoder)?;
        }

        Ok(())
    }
}
