use std::sync::Arc;

use crate::schema::Descriptor;
use crate::util::metric_string_cleanup;

/// Namespace prefixed to every exported metric.
pub const NAMESPACE: &str = "mikrotik";

/// Labels every collector descriptor starts with: device name, device address.
pub const DEVICE_LABELS: [&str; 2] = ["name", "address"];

/// Joins non-empty name parts with `_`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Device labels followed by the collector-specific ones.
pub fn label_names(extra: &[&str]) -> Vec<String> {
    DEVICE_LABELS
        .iter()
        .chain(extra.iter())
        .map(|l| l.to_string())
        .collect()
}

/// Descriptor with an explicit leaf name and help text.
pub fn description(subsystem: &str, name: &str, help: &str, extra_labels: &[&str]) -> Arc<Descriptor> {
    Arc::new(Descriptor::new(
        build_fq_name(NAMESPACE, subsystem, name),
        help,
        label_names(extra_labels),
    ))
}

/// Descriptor whose leaf name and help come from a RouterOS property.
///
/// "rx-byte" under "interface" -> `mikrotik_interface_rx_byte`
pub fn description_for_property_name(
    subsystem: &str,
    property: &str,
    extra_labels: &[&str],
) -> Arc<Descriptor> {
    description(subsystem, &metric_string_cleanup(property), property, extra_labels)
}

/// Descriptors of one collector, keyed by the property they track.
///
/// Keeps insertion order so `describe` output is stable.
#[derive(Debug, Default, Clone)]
pub struct DescriptorSet {
    entries: Vec<(String, Arc<Descriptor>)>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One property-named descriptor per entry of `properties`.
    pub fn for_properties(subsystem: &str, properties: &[&str], extra_labels: &[&str]) -> Self {
        let mut set = Self::new();
        for p in properties {
            set.insert(p, description_for_property_name(subsystem, p, extra_labels));
        }
        set
    }

    pub fn insert(&mut self, key: &str, descriptor: Arc<Descriptor>) {
        self.entries.push((key.to_string(), descriptor));
    }

    pub fn get(&self, key: &str) -> Option<&Arc<Descriptor>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Descriptor>> {
        self.entries.iter().map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fq_name_skips_empty_parts() {
        assert_eq!(build_fq_name("mikrotik", "interface", "rx_byte"), "mikrotik_interface_rx_byte");
        assert_eq!(build_fq_name("mikrotik", "", "up"), "mikrotik_up");
    }

    #[test]
    fn property_descriptor_normalizes_name() {
        let desc = description_for_property_name("interface", "last-link-up-time", &["interface"]);
        assert_eq!(desc.fq_name(), "mikrotik_interface_last_link_up_time");
        assert_eq!(desc.help(), "last-link-up-time");
        assert_eq!(desc.label_names(), ["name", "address", "interface"]);
    }

    #[test]
    fn set_keeps_insertion_order() {
        let set = DescriptorSet::for_properties("system", &["free-memory", "cpu-load"], &[]);
        let names: Vec<_> = set.iter().map(|d| d.fq_name().to_string()).collect();

        assert_eq!(names, ["mikrotik_system_free_memory", "mikrotik_system_cpu_load"]);
        assert!(set.get("cpu-load").is_some());
        assert!(set.get("uptime").is_none());
    }
}
