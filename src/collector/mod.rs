/// Collector module
///
/// This module groups everything between the device session and the
/// exported samples:
/// - Metric descriptors and their label schema
/// - The per-call collector context
/// - The sample sink
/// - The dispatcher running collectors per device
///
/// Design notes:
/// - Resource-specific logic MUST NOT live here (see `resources`)
/// - This module should remain thin and orchestration-focused
pub mod context;
pub mod descriptor;
pub mod runner;
pub mod sink;
