//! hopchain: a chain of HTTP-triggered hops that propagate W3C trace
//! context, inject synthetic latency and faults, and aggregate per-hop
//! counters into one composite response.
//!
//! ```text
//!  caller ──▶ entry hop ──▶ intermediate hop ──▶ terminal hop
//!               │                 │                   │
//!               │  traceparent/tracestate carried forward,
//!               │  headers filtered to an allowlist at every boundary
//!               │                 │                   │
//!               ◀── merged JSON: identity + one counter per hop ◀──
//! ```
//!
//! Each process serves one hop; its role and policy knobs come from a TOML
//! config. One failing hop still yields a well-formed, if degraded, answer
//! to the original caller.

// Core subsystems
pub mod config;
pub mod http;
pub mod relay;
pub mod trace;

// Chain behavior
pub mod aggregate;
pub mod counter;
pub mod fault;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::HopConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
