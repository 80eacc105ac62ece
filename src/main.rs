//! hopchain — one hop of a traced, fault-injecting HTTP relay chain.
//!
//! Each process serves a single hop (entry, intermediate, or terminal).
//! Run three processes with the sample configs under `config/` for a full
//! chain.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use hopchain::config::{load_config, ExporterMode};
use hopchain::counter::{CounterStore, RandomCounterStore};
use hopchain::fault::FaultInjector;
use hopchain::http::HttpServer;
use hopchain::lifecycle::{wait_for_signal, Shutdown};
use hopchain::observability::logging;
use hopchain::trace::{LogExporter, NoopExporter, SpanExporter, Tracer};

#[derive(Debug, Parser)]
#[command(name = "hopchain", about = "One hop of a traced HTTP relay chain")]
struct Args {
    /// Path to the hop configuration file.
    #[arg(long, default_value = "hop.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;
    logging::init(&config.observability.log_level);

    tracing::info!(
        role = ?config.role,
        service = %config.service_name,
        bind_address = %config.listener.bind_address,
        next_hop = config.next_hop.as_deref().unwrap_or("-"),
        "configuration loaded"
    );

    let exporter: Arc<dyn SpanExporter> = match config.exporter.mode {
        ExporterMode::Log => Arc::new(LogExporter),
        ExporterMode::Noop => Arc::new(NoopExporter),
    };
    let tracer = Arc::new(Tracer::new(config.service_name.clone(), exporter));
    let fault = Arc::new(match config.fault.seed {
        Some(seed) => FaultInjector::with_seed(seed),
        None => FaultInjector::new(),
    });
    let counters: Arc<dyn CounterStore> = Arc::new(RandomCounterStore::new());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, tracer, fault, counters);
    server.run(listener, receiver).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
