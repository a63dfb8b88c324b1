use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Context;
use log::{debug, error, warn};

use super::descriptor::DescriptorSet;
use super::sink::MetricSink;
use crate::config::Device;
use crate::metrics::METRICS;
use crate::routeros::DeviceSession;
use crate::schema::{Descriptor, Reply, Sample, ValueKind};
use crate::util::ParseError;

/// Everything one `collect` call needs, for one device, for one cycle.
///
/// The dispatcher builds a fresh context per collector invocation;
/// it never outlives that call.
pub struct CollectorContext<'a> {
    pub sink: &'a dyn MetricSink,
    pub device: &'a Device,
    session: &'a mut dyn DeviceSession,
}

impl<'a> CollectorContext<'a> {
    pub fn new(sink: &'a dyn MetricSink, device: &'a Device, session: &'a mut dyn DeviceSession) -> Self {
        Self {
            sink,
            device,
            session,
        }
    }

    /// Device name and address followed by `extra`, in that order.
    pub fn labels(&self, extra: &[&str]) -> Vec<String> {
        let mut values = Vec::with_capacity(extra.len() + 2);
        values.push(self.device.name.clone());
        values.push(self.device.address.clone());
        values.extend(extra.iter().map(|v| v.to_string()));
        values
    }

    /// Runs one command against the device session.
    ///
    /// Failures are logged with device and command identity and
    /// returned; the caller aborts its collection for this cycle.
    pub async fn run(&mut self, command: &str, params: &[String]) -> anyhow::Result<Reply> {
        match self.session.execute(command, params).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                error!(
                    "error running command device={} command={} error={}",
                    self.device.name, command, e
                );
                Err(e).with_context(|| format!("running {command} on {}", self.device.name))
            }
        }
    }

    /// Writes one sample, enforcing the descriptor's label schema.
    ///
    /// A mismatch is a bug in the calling collector: the sample is
    /// dropped and logged instead of being exported mislabeled.
    pub fn emit(&self, descriptor: &Arc<Descriptor>, kind: ValueKind, value: f64, label_values: Vec<String>) {
        match Sample::new(descriptor.clone(), kind, value, label_values) {
            Ok(sample) => {
                METRICS.samples_emitted.fetch_add(1, Ordering::Relaxed);
                self.sink.emit(sample);
            }
            Err(e) => {
                METRICS.label_mismatches.fetch_add(1, Ordering::Relaxed);
                error!("dropping sample device={} error={}", self.device.name, e);
            }
        }
    }

    /// Parses and emits one tracked property of one record.
    ///
    /// - absent or empty value: nothing emitted, not an error
    /// - parse failure: logged, only this property is skipped
    #[allow(clippy::too_many_arguments)]
    pub fn emit_property<F>(
        &self,
        descriptors: &DescriptorSet,
        record_id: &str,
        property: &str,
        raw: Option<&str>,
        kind: ValueKind,
        labels: &[String],
        parse: F,
    ) where
        F: FnOnce(&str) -> Result<f64, ParseError>,
    {
        let Some(raw) = raw.filter(|v| !v.is_empty()) else {
            debug!(
                "property unavailable device={} record={} property={}",
                self.device.name, record_id, property
            );
            return;
        };

        let Some(descriptor) = descriptors.get(property) else {
            warn!("no descriptor registered for property {property}");
            return;
        };

        match parse(raw) {
            Ok(value) => self.emit(descriptor, kind, value, labels.to_vec()),
            Err(e) => self.skip_field(record_id, property, raw, &e),
        }
    }

    /// Logs a field that could not be parsed.
    pub fn skip_field(&self, record_id: &str, property: &str, value: &str, err: &dyn Display) {
        METRICS.field_parse_errors.fetch_add(1, Ordering::Relaxed);
        error!(
            "error parsing metric value device={} record={} property={} value={:?} error={}",
            self.device.name, record_id, property, value, err
        );
    }
}
