use std::sync::Arc;

/// Central data types shared by the whole collection pipeline.
///
/// These types sit between:
/// - The RouterOS transport (which produces `Record`s / `Reply`s)
/// - The resource collectors (which turn records into `Sample`s)
/// - The exposition layer (which renders samples for Prometheus)
///
/// DESIGN NOTES:
/// - `Descriptor` is immutable once built and shared via `Arc`.
/// - `Sample` is short-lived: produced per scrape, never retained.
///

// ------------------------------------------------------------
// Record
// ------------------------------------------------------------
//
// One flat key/value row returned by a device command.
//
// RouterOS returns every value as a string; typing happens in
// the collectors. Field order is preserved as received.
//
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the field value, or `""` when the field is absent.
    ///
    /// Used for label values, where RouterOS itself omits empty
    /// attributes (e.g. an interface without a comment).
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

// ------------------------------------------------------------
// Reply
// ------------------------------------------------------------
//
// Full answer to one command:
// - `re`:   one record per `!re` sentence
// - `done`: attributes of the terminal `!done` sentence
//           (count-only queries put their result in `ret`)
//
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub re: Vec<Record>,
    pub done: Record,
}

impl Reply {
    pub fn new(re: Vec<Record>) -> Self {
        Self {
            re,
            done: Record::new(),
        }
    }

    /// Reply of a `=count-only=` query.
    pub fn count(ret: impl Into<String>) -> Self {
        Self {
            re: Vec::new(),
            done: Record::from_iter([("ret", ret.into())]),
        }
    }
}

// ------------------------------------------------------------
// Value kind
// ------------------------------------------------------------
//
// Fixed per tracked property, never inferred from the value.
//
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Point-in-time state (memory free, link running, uptime)
    Gauge,

    /// Monotonic cumulative total (bytes, packets, errors)
    Counter,
}

// ------------------------------------------------------------
// Metric descriptor
// ------------------------------------------------------------
//
// Static identity of one exposed metric.
//
// IMPORTANT:
// - `label_names` order is the contract every emitted sample's
//   label values must follow.
//
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    fq_name: String,
    help: String,
    label_names: Vec<String>,
}

impl Descriptor {
    pub fn new(fq_name: impl Into<String>, help: impl Into<String>, label_names: Vec<String>) -> Self {
        Self {
            fq_name: fq_name.into(),
            help: help.into(),
            label_names,
        }
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }
}

/// Raised when a sample's label values do not line up with the
/// label schema of its descriptor.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("metric {metric}: expected {expected} label values, got {got}")]
pub struct LabelMismatch {
    pub metric: String,
    pub expected: usize,
    pub got: usize,
}

// ------------------------------------------------------------
// Metric sample
// ------------------------------------------------------------
//
// One observation, produced per record × tracked property.
//
#[derive(Debug, Clone)]
pub struct Sample {
    pub descriptor: Arc<Descriptor>,
    pub kind: ValueKind,
    pub value: f64,
    pub label_values: Vec<String>,
}

impl Sample {
    /// Builds a sample, rejecting label values that do not match the
    /// descriptor's label schema in length.
    pub fn new(
        descriptor: Arc<Descriptor>,
        kind: ValueKind,
        value: f64,
        label_values: Vec<String>,
    ) -> Result<Self, LabelMismatch> {
        if descriptor.label_names.len() != label_values.len() {
            return Err(LabelMismatch {
                metric: descriptor.fq_name.clone(),
                expected: descriptor.label_names.len(),
                got: label_values.len(),
            });
        }

        Ok(Self {
            descriptor,
            kind,
            value,
            label_values,
        })
    }

    /// Label value for `name`, resolved through the descriptor's schema.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.descriptor
            .label_names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.label_values.get(i))
            .map(|v| v.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.descriptor
            .label_names
            .iter()
            .map(|n| n.as_str())
            .zip(self.label_values.iter().map(|v| v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_insert_replaces_in_place() {
        let mut record = Record::from_iter([("name", "ether1"), ("rx-byte", "10")]);
        record.insert("name", "ether2");

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("name"), Some("ether2"));
        assert_eq!(record.iter().next(), Some(("name", "ether2")));
        assert_eq!(record.value("comment"), "");
    }

    #[test]
    fn sample_rejects_wrong_label_count() {
        let desc = Arc::new(Descriptor::new(
            "mikrotik_interface_rx_byte",
            "rx-byte",
            vec!["name".into(), "address".into(), "interface".into()],
        ));

        let err = Sample::new(desc.clone(), ValueKind::Counter, 1.0, vec!["r1".into()]).unwrap_err();
        assert_eq!(err.expected, 3);
        assert_eq!(err.got, 1);

        let sample = Sample::new(
            desc,
            ValueKind::Counter,
            1.0,
            vec!["r1".into(), "10.0.0.1".into(), "ether1".into()],
        )
        .unwrap();
        assert_eq!(sample.label("interface"), Some("ether1"));
        assert_eq!(sample.label("address"), Some("10.0.0.1"));
    }
}
