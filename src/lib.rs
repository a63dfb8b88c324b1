// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:      Configuration structs loaded from JSON
// - schema:      Reply records, metric descriptors and samples
// - util:        Parsers for RouterOS value encodings
// - routeros:    RouterOS API session (wire protocol, login, fake)
// - collector:   Collector context, descriptors, sink and dispatcher
// - resources:   One collector per RouterOS resource family
// - metrics:     Exporter self-metrics
// - exposition:  Prometheus text encoding
// - server:      HTTP routes
// - cli:         Command-line arguments
//
pub mod cli;
pub mod collector;
pub mod config;
pub mod exposition;
pub mod metrics;
pub mod resources;
pub mod routeros;
pub mod schema;
pub mod server;
pub mod util;
