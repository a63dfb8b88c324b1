use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;

/// Global runtime metrics of the exporter itself.
///
/// Purpose:
/// - Track scrapes and device connections
/// - Track collector failures (transport / structural)
/// - Track field-level parse skips and dropped samples
///
/// Design:
/// - Lock-free (Atomics)
/// - Cheap to update from concurrent device polls
#[derive(Default)]
pub struct RuntimeMetrics {
    // Scrapes
    pub scrapes: AtomicUsize,

    // Devices
    pub device_polls: AtomicUsize,
    pub device_connect_errors: AtomicUsize,

    // Collectors
    pub collector_errors: AtomicUsize,

    // Fields / samples
    pub field_parse_errors: AtomicUsize,
    pub samples_emitted: AtomicUsize,
    pub label_mismatches: AtomicUsize,
}

impl RuntimeMetrics {
    /// Name, help text and current value of every counter.
    pub fn snapshot(&self) -> [(&'static str, &'static str, usize); 7] {
        [
            ("scrapes", "Number of scrapes served", self.scrapes.load(Ordering::Relaxed)),
            (
                "device_polls",
                "Number of device poll cycles started",
                self.device_polls.load(Ordering::Relaxed),
            ),
            (
                "device_connect_errors",
                "Number of failed device connections",
                self.device_connect_errors.load(Ordering::Relaxed),
            ),
            (
                "collector_errors",
                "Number of collector runs that returned an error",
                self.collector_errors.load(Ordering::Relaxed),
            ),
            (
                "field_parse_errors",
                "Number of device fields skipped because they could not be parsed",
                self.field_parse_errors.load(Ordering::Relaxed),
            ),
            (
                "samples_emitted",
                "Number of samples emitted by collectors",
                self.samples_emitted.load(Ordering::Relaxed),
            ),
            (
                "label_mismatches",
                "Number of samples dropped because of a label schema mismatch",
                self.label_mismatches.load(Ordering::Relaxed),
            ),
        ]
    }
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> = Lazy::new(|| Arc::new(RuntimeMetrics::default()));
