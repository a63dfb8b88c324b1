// ------------------------------------------------------------
// External dependencies
// ------------------------------------------------------------

use std::sync::Arc;

use clap::Parser;
use log::info;

use mikrotik_exporter::cli::CliArgs;
use mikrotik_exporter::collector::runner::{Dispatcher, log_inventory};
use mikrotik_exporter::config::load_config;
use mikrotik_exporter::server::router;

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Initialize logging
// - Load and validate configuration
// - Build the enabled collectors once
// - Serve /metrics until the process is stopped
//
// Devices are only contacted while a scrape is in progress.
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // --------------------------------------------------------
    // Logging
    //
    // RUST_LOG applies unless --log-level is given.
    // --------------------------------------------------------
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = &args.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    // --------------------------------------------------------
    // Load configuration from disk
    //
    // NOTE:
    // - The config file contains device passwords.
    // - It must not be committed to version control.
    // --------------------------------------------------------
    let config = load_config(&args.config)?;

    let dispatcher = Arc::new(Dispatcher::new(&config));
    log_inventory(&dispatcher, &config);

    // --------------------------------------------------------
    // HTTP server
    // --------------------------------------------------------
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(dispatcher)).await?;

    Ok(())
}
