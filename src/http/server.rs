//! HTTP surface of a single hop.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (tracing, timeout)
//! - Run the per-request hop pipeline:
//!   filter headers → derive trace context → request span → work span →
//!   fault decision → relay to the next hop (unless terminal) → aggregate →
//!   respond
//! - Bind the server to a listener with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::aggregate;
use crate::config::{HopConfig, HopRole};
use crate::counter::CounterStore;
use crate::fault::FaultInjector;
use crate::http::headers::filter_headers;
use crate::http::request::{parse_body, resolve_identity};
use crate::relay::ChainRelay;
use crate::trace::propagation::{TraceContextPropagator, TRACEPARENT};
use crate::trace::span::{SpanKind, Tracer};

/// Per-hop state injected into the handler. The tracer, fault injector, and
/// counter store are capabilities handed in at construction so tests can
/// substitute deterministic implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HopConfig>,
    pub tracer: Arc<Tracer>,
    pub fault: Arc<FaultInjector>,
    pub counters: Arc<dyn CounterStore>,
    pub relay: Option<Arc<ChainRelay>>,
    pub propagator: Arc<TraceContextPropagator>,
}

/// HTTP server for one hop of the chain.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(
        config: HopConfig,
        tracer: Arc<Tracer>,
        fault: Arc<FaultInjector>,
        counters: Arc<dyn CounterStore>,
    ) -> Self {
        let relay = config.next_hop.as_ref().map(|next| {
            Arc::new(ChainRelay::new(
                next.clone(),
                config.relay.timeout_secs.map(Duration::from_secs),
            ))
        });
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);

        let state = AppState {
            config: Arc::new(config),
            tracer,
            fault,
            counters,
            relay,
            propagator: Arc::new(TraceContextPropagator::new()),
        };

        let router = Router::new()
            .route("/", any(hop_handler))
            .route("/{*path}", any(hop_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "hop listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("hop stopped");
        Ok(())
    }
}

/// Informational delay hint forwarded hop to hop.
#[derive(Debug, Default, Deserialize)]
struct DelayQuery {
    delay: Option<u64>,
}

async fn hop_handler(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<DelayQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let cfg = &state.config;
    let invocation_id = Uuid::new_v4().to_string();

    let mut headers = filter_headers(&headers);
    let body_fields = parse_body(&body);
    let identity = resolve_identity(&body_fields, &headers, cfg.role == HopRole::Entry);

    // Inbound trace identity is authoritative; without it this hop roots a
    // new trace.
    let remote_ctx = state.propagator.extract(&headers);
    let mut request_span = state.tracer.start_span(
        &cfg.request_span_name(),
        SpanKind::Server,
        remote_ctx.as_ref(),
    );
    request_span.set_attribute("invocation_id", invocation_id.as_str());
    request_span.set_attribute("http.method", method.as_str());
    request_span.set_attribute("request_ip", identity.request_ip.as_str());
    request_span.set_attribute("uuid", identity.uuid.as_str());
    if let Some(delay) = query.delay {
        request_span.set_attribute("upstream_delay_hint_ms", delay);
    }

    // The entry hop mints the context downstream hops will receive.
    if cfg.role == HopRole::Entry && !headers.contains_key(TRACEPARENT) {
        state.propagator.inject(request_span.context(), &mut headers);
    }
    let parent_ctx = request_span.context().clone();

    let mut work_span = state
        .tracer
        .start_span("delay_and_error", SpanKind::Internal, Some(&parent_ctx));
    let decision = state
        .fault
        .decide(cfg.fault.work_delay_bound_ms, cfg.fault.failure_denominator);
    tokio::time::sleep(Duration::from_millis(decision.delay_ms)).await;

    let delay_hint = state.fault.delay_hint(cfg.fault.relay_delay_bound_ms);
    work_span.add_event(
        "choosing delay and error",
        vec![
            ("invocation_id".to_owned(), invocation_id.as_str().into()),
            ("delay".to_owned(), delay_hint.into()),
            ("should_fail".to_owned(), decision.should_fail.into()),
        ],
    );

    if decision.should_fail {
        tracing::warn!(
            invocation_id = %invocation_id,
            uuid = %identity.uuid,
            "injected fault, aborting chain"
        );
        work_span.end();
        request_span.end();
        return aggregate::fault_response(&headers).into_response();
    }
    work_span.end();

    let hits = state.counters.increment(&identity.request_ip);

    let response = match &state.relay {
        Some(relay) => {
            let mut call_span =
                state
                    .tracer
                    .start_span("relay_next_hop", SpanKind::Client, Some(&parent_ctx));
            call_span.set_attribute("next_hop", relay.next_hop());
            call_span.set_attribute("delay_hint_ms", delay_hint);

            let result = relay.call(&identity, &headers, delay_hint).await;

            call_span.set_attribute("http.status_code", i64::from(result.status.as_u16()));
            call_span.end();

            aggregate::merge_relayed(result, &headers, &cfg.hits_field, hits)
        }
        None => {
            let mut compose_span =
                state
                    .tracer
                    .start_span("compose_response", SpanKind::Internal, Some(&parent_ctx));
            let response =
                aggregate::terminal_response(body_fields, &identity, &headers, &cfg.hits_field, hits);
            compose_span.end();
            response
        }
    };

    tracing::debug!(
        invocation_id = %invocation_id,
        status = %response.status,
        "hop responding"
    );
    request_span.end();
    response.into_response()
}
