use std::sync::Mutex;

use crate::schema::Sample;

/// Destination of emitted samples.
///
/// Fire-and-forget: collectors never observe a result. Implementations
/// must accept concurrent writers from independent device polls.
pub trait MetricSink: Send + Sync {
    fn emit(&self, sample: Sample);
}

/// In-memory sink gathering the samples of one scrape.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: Mutex<Vec<Sample>>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every sample gathered so far.
    pub fn drain(&self) -> Vec<Sample> {
        std::mem::take(&mut *self.lock())
    }

    /// Copies the samples gathered so far.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sample>> {
        // push is the only mutation, a poisoned vec is still consistent
        self.samples.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MetricSink for SampleBuffer {
    fn emit(&self, sample: Sample) {
        self.lock().push(sample);
    }
}
