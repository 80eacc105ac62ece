//! Shared helpers for the chain integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use hopchain::config::{HopConfig, HopRole};
use hopchain::counter::{CounterStore, MemoryCounterStore};
use hopchain::fault::FaultInjector;
use hopchain::http::HttpServer;
use hopchain::lifecycle::Shutdown;
use hopchain::trace::{SpanExporter, Tracer};

/// Hop config with delays collapsed and fault injection disabled, to be
/// tightened per test.
#[allow(dead_code)]
pub fn hop_config(
    role: HopRole,
    service: &str,
    hits_field: &str,
    next_hop: Option<String>,
) -> HopConfig {
    let mut config = HopConfig::default();
    config.role = role;
    config.service_name = service.to_string();
    config.hits_field = hits_field.to_string();
    config.next_hop = next_hop;
    config.fault.work_delay_bound_ms = 0;
    config.fault.relay_delay_bound_ms = 5;
    config.fault.failure_denominator = 0;
    config
}

/// Spawn one hop on an ephemeral port; returns its base URL.
#[allow(dead_code)]
pub async fn spawn_hop(
    config: HopConfig,
    exporter: Arc<dyn SpanExporter>,
    shutdown: &Shutdown,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let tracer = Arc::new(Tracer::new(config.service_name.clone(), exporter));
    let fault = Arc::new(match config.fault.seed {
        Some(seed) => FaultInjector::with_seed(seed),
        None => FaultInjector::new(),
    });
    let counters: Arc<dyn CounterStore> = Arc::new(MemoryCounterStore::new());

    let receiver = shutdown.subscribe();
    let server = HttpServer::new(config, tracer, fault, counters);
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    format!("http://{}/", addr)
}

/// Raw backend answering every request with a fixed status line and body,
/// for downstream shapes a real hop never produces.
#[allow(dead_code)]
pub async fn start_raw_backend(status_line: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 8192];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on, for transport-error cases.
#[allow(dead_code)]
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
